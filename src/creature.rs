// Creature state and the per-turn decision cycle.
//
// A turn is split in two. `plan_turn` reads the board and decides what a
// creature wants to do without touching the world. `execute_plan` applies
// that decision later, re-checking anything another creature may have
// changed in between.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::config::SpeciesConfig;
use crate::coordinates::Coordinates;
use crate::distance::{is_adjacent, manhattan_distance};
use crate::entity::{EntityId, EntityKind};
use crate::error::{SimError, SimResult};
use crate::events::{ActionRecord, DeathEvent, Subject, Verb};
use crate::herbivore;
use crate::path_finder::PathFinder;
use crate::predator::{self, HuntMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Herbivore,
    Predator,
}

impl Species {
    /// What this species eats.
    pub fn target_kind(self) -> EntityKind {
        match self {
            Species::Herbivore => EntityKind::Grass,
            Species::Predator => EntityKind::Herbivore,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Herbivore => f.write_str("Herbivore"),
            Species::Predator => f.write_str("Predator"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DamageCause {
    Hunger,
    Attack(Subject),
}

#[derive(Clone, Debug)]
pub struct Creature {
    pub species: Species,
    pub display_id: u32,
    pub hp: i32,
    pub max_hp: i32,
    /// Manhattan move budget per turn.
    pub speed: u32,
    /// Hp restored by a successful meal.
    pub food_value: i32,
    pub attack_damage: i32,
    pub escape_chance: f64,
    pub available_moves: Vec<Coordinates>,
    pub planned_action: Option<ActionRecord>,
    pub performed_action: Option<ActionRecord>,
    pub last_damage: Option<DamageCause>,
    /// Who attacked this creature during the current turn, if anyone.
    pub wounded_by: Option<Subject>,
}

impl Creature {
    pub fn new(species: Species, display_id: u32, config: &SpeciesConfig) -> Self {
        Self {
            species,
            display_id,
            hp: config.initial_hp,
            max_hp: config.initial_hp,
            speed: config.speed,
            food_value: config.food_value,
            attack_damage: config.attack_damage,
            escape_chance: config.escape_chance,
            available_moves: Vec::new(),
            planned_action: None,
            performed_action: None,
            last_damage: None,
            wounded_by: None,
        }
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp.min(self.max_hp);
        self
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.species, self.display_id)
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn target_kind(&self) -> EntityKind {
        self.species.target_kind()
    }

    /// Seeking stops once a meal could not restore its full value, so
    /// creatures near full health do not oscillate between feeding and idling.
    pub fn needs_food(&self) -> bool {
        self.hp < self.max_hp - self.food_value
    }

    pub fn take_damage(&mut self, amount: i32, cause: DamageCause) {
        self.hp -= amount;
        if let DamageCause::Attack(by) = &cause {
            self.wounded_by = Some(by.clone());
        }
        self.last_damage = Some(cause);
    }

    /// Heal by `amount`, capped at `max_hp`. Returns the hp actually gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitReason {
    NoTarget,
    NoMoves,
    TargetLost,
    Blocked(Coordinates),
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitReason::NoTarget => f.write_str("no target in sight"),
            WaitReason::NoMoves => f.write_str("no free cell to move to"),
            WaitReason::TargetLost => f.write_str("target is gone"),
            WaitReason::Blocked(c) => write!(f, "cell {c} was taken"),
        }
    }
}

/// What a creature intends to do this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plan {
    /// Sated: not hungry enough to look for food.
    Rest,
    Wait(WaitReason),
    Interact { target: EntityId },
    Advance { to: Coordinates, target: EntityId },
}

impl Plan {
    pub fn record(&self, board: &Board) -> ActionRecord {
        let describe = |id: EntityId| {
            board
                .get(id)
                .zip(board.position_of(id))
                .map(|(e, c)| format!("{} at {c}", e.name()))
                .unwrap_or_else(|| "unknown target".to_string())
        };
        match self {
            Plan::Rest => ActionRecord::new(Verb::Rested, "sated"),
            Plan::Wait(reason) => ActionRecord::new(Verb::Waited, reason.to_string()),
            Plan::Interact { target } => {
                let verb = match board.get(*target) {
                    Some(e) if e.is_consumable() => Verb::Ate,
                    _ => Verb::Attacked,
                };
                ActionRecord::new(verb, describe(*target))
            }
            Plan::Advance { to, target } => {
                ActionRecord::new(Verb::Moved, format!("to {to} towards {}", describe(*target)))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub plan: Plan,
    pub available_moves: Vec<Coordinates>,
}

/// Result of a feeding or hunting attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interaction {
    pub success: bool,
    pub actions: Vec<ActionRecord>,
    pub death: Option<DeathEvent>,
}

impl Interaction {
    pub fn failed() -> Self {
        Self::default()
    }
}

/// Everything a creature did during execution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurnOutcome {
    pub actions: Vec<ActionRecord>,
    pub deaths: Vec<DeathEvent>,
}

impl TurnOutcome {
    fn single(record: ActionRecord) -> Self {
        Self {
            actions: vec![record],
            deaths: Vec::new(),
        }
    }

    fn absorb(&mut self, interaction: Interaction) {
        self.actions.extend(interaction.actions);
        self.deaths.extend(interaction.death);
    }
}

fn creature(board: &Board, id: EntityId) -> SimResult<&Creature> {
    board
        .get(id)
        .and_then(|e| e.as_creature())
        .ok_or(SimError::UnknownEntity(id))
}

fn is_live_target(board: &Board, id: EntityId) -> bool {
    board.get(id).is_some_and(|e| e.is_alive())
}

/// Nearest live entity of the creature's target kind by Manhattan distance.
/// Placement order breaks ties.
pub fn find_target(board: &Board, id: EntityId) -> Option<(EntityId, Coordinates)> {
    let origin = board.position_of(id)?;
    let kind = board.get(id)?.as_creature()?.target_kind();

    let mut best: Option<(EntityId, Coordinates, u32)> = None;
    for candidate in board.get_entities_by_type(kind) {
        if candidate == id || !is_live_target(board, candidate) {
            continue;
        }
        let Some(pos) = board.position_of(candidate) else { continue };
        let dist = manhattan_distance(origin, pos);
        match best {
            Some((_, _, best_dist)) if dist >= best_dist => {}
            _ => best = Some((candidate, pos, dist)),
        }
    }
    best.map(|(target, pos, _)| (target, pos))
}

/// The move that ends closest to `target`; ties go to the smallest `(x, y)`.
pub fn find_best_move(moves: &[Coordinates], target: Coordinates) -> Option<Coordinates> {
    moves
        .iter()
        .copied()
        .min_by_key(|m| (manhattan_distance(*m, target), m.x, m.y))
}

/// Decide what creature `id` will do, reading the board only.
pub fn plan_turn(board: &Board, finder: &mut PathFinder, id: EntityId) -> SimResult<Decision> {
    let me = creature(board, id)?;
    let origin = board.position_of(id).ok_or(SimError::UnknownEntity(id))?;
    let available_moves = finder.get_available_moves(board, origin, me.speed);

    let plan = if !me.needs_food() {
        Plan::Rest
    } else {
        match find_target(board, id) {
            None => Plan::Wait(WaitReason::NoTarget),
            Some((target, pos)) if is_adjacent(origin, pos) => Plan::Interact { target },
            Some((target, pos)) => match find_best_move(&available_moves, pos) {
                Some(to) => Plan::Advance { to, target },
                None => Plan::Wait(WaitReason::NoMoves),
            },
        }
    };

    Ok(Decision {
        plan,
        available_moves,
    })
}

/// Feed on or attack `target`, depending on the actor's species. The target
/// must be adjacent and of the actor's target kind; otherwise nothing happens.
pub fn interact_with_target(
    board: &mut Board,
    actor: EntityId,
    target: EntityId,
    hunt: HuntMode,
    rng: &mut impl Rng,
) -> SimResult<Interaction> {
    match creature(board, actor)?.species {
        Species::Herbivore => herbivore::eat(board, actor, target),
        Species::Predator => predator::hunt(board, actor, target, hunt, rng),
    }
}

/// Apply a previously planned action. Plans made stale by earlier creatures
/// in the same turn degrade to a logged wait.
pub fn execute_plan(
    board: &mut Board,
    id: EntityId,
    plan: Plan,
    hunt: HuntMode,
    rng: &mut impl Rng,
) -> SimResult<TurnOutcome> {
    let origin = board.position_of(id).ok_or(SimError::UnknownEntity(id))?;

    let outcome = match plan {
        Plan::Rest | Plan::Wait(_) => TurnOutcome::single(plan.record(board)),
        Plan::Interact { target } => {
            let reachable = is_live_target(board, target)
                && board.position_of(target).is_some_and(|p| is_adjacent(origin, p));
            if reachable {
                let interaction = interact_with_target(board, id, target, hunt, rng)?;
                let mut outcome = TurnOutcome::default();
                outcome.absorb(interaction);
                outcome
            } else {
                TurnOutcome::single(Plan::Wait(WaitReason::TargetLost).record(board))
            }
        }
        Plan::Advance { to, target } => {
            if !is_live_target(board, target) {
                TurnOutcome::single(Plan::Wait(WaitReason::TargetLost).record(board))
            } else if !board.is_position_vacant(to) {
                TurnOutcome::single(Plan::Wait(WaitReason::Blocked(to)).record(board))
            } else {
                board.move_entity(origin, to)?;
                let mut outcome =
                    TurnOutcome::single(ActionRecord::new(Verb::Moved, format!("to {to}")));
                let arrived = is_live_target(board, target)
                    && board.position_of(target).is_some_and(|p| is_adjacent(to, p));
                if arrived {
                    let interaction = interact_with_target(board, id, target, hunt, rng)?;
                    outcome.absorb(interaction);
                }
                outcome
            }
        }
    };

    if let Some(me) = board.get_mut(id).and_then(|e| e.as_creature_mut()) {
        me.performed_action = outcome.actions.last().cloned();
    }
    Ok(outcome)
}

/// Plan and immediately execute a single creature's turn.
pub fn make_move(
    board: &mut Board,
    finder: &mut PathFinder,
    id: EntityId,
    hunt: HuntMode,
    rng: &mut impl Rng,
) -> SimResult<TurnOutcome> {
    let decision = plan_turn(board, finder, id)?;
    let planned = decision.plan.record(board);
    if let Some(me) = board.get_mut(id).and_then(|e| e.as_creature_mut()) {
        me.available_moves = decision.available_moves;
        me.planned_action = Some(planned);
    }
    execute_plan(board, id, decision.plan, hunt, rng)
}
