// Plain event records handed to whatever logs or renders a run.

use std::fmt;

use serde::Serialize;

use crate::coordinates::Coordinates;
use crate::entity::EntityId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Verb {
    Moved,
    Ate,
    Attacked,
    Missed,
    Killed,
    Waited,
    Rested,
    Spawned,
    PlacementFailed,
    Died,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Verb::Moved => "moved",
            Verb::Ate => "ate",
            Verb::Attacked => "attacked",
            Verb::Missed => "missed",
            Verb::Killed => "killed",
            Verb::Waited => "waited",
            Verb::Rested => "rested",
            Verb::Spawned => "spawned",
            Verb::PlacementFailed => "placement failed",
            Verb::Died => "died",
        };
        f.write_str(word)
    }
}

/// One `(verb, detail)` step of a creature's turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub verb: Verb,
    pub detail: String,
}

impl ActionRecord {
    pub fn new(verb: Verb, detail: impl Into<String>) -> Self {
        Self {
            verb,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.detail)
    }
}

/// Names an entity as it was when the event happened; it may be gone since.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: EntityId,
    pub name: String,
}

/// A creature killed in a hunt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeathEvent {
    pub victim: Subject,
    pub killer: Subject,
    pub at: Coordinates,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimEvent {
    pub turn: u64,
    pub subject: Option<Subject>,
    pub verb: Verb,
    pub detail: String,
    pub killer: Option<Subject>,
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[turn {}] ", self.turn)?;
        if let Some(subject) = &self.subject {
            write!(f, "{} ", subject.name)?;
        }
        write!(f, "{} {}", self.verb, self.detail)?;
        if let Some(killer) = &self.killer {
            write!(f, " (by {})", killer.name)?;
        }
        Ok(())
    }
}
