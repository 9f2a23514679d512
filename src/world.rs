use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::board::Board;
use crate::config::CreatureConfig;
use crate::coordinates::Coordinates;
use crate::creature::{Creature, Species};
use crate::entity::{Entity, EntityId, EntityKind, IdAllocator};
use crate::error::SimResult;
use crate::events::{ActionRecord, SimEvent, Subject, Verb};
use crate::game_state::GameState;
use crate::path_finder::PathFinder;
use crate::predator::HuntMode;

/// Entity counts by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    pub herbivores: usize,
    pub predators: usize,
    pub grass: usize,
    pub stones: usize,
}

/// Everything the action pipeline reads and writes.
pub struct World {
    pub board: Board,
    pub path_finder: PathFinder,
    pub rng: ChaCha8Rng,
    pub ids: IdAllocator,
    pub history: GameState,
    pub creatures: CreatureConfig,
    pub hunt_mode: HuntMode,
    pub turn: u64,
    /// Events from the turn in progress (or the last one finished).
    pub events: Vec<SimEvent>,
}

impl World {
    pub fn new(width: i32, height: i32, creatures: CreatureConfig, seed: u64) -> SimResult<Self> {
        Ok(Self {
            board: Board::new(width, height)?,
            path_finder: PathFinder::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            ids: IdAllocator::new(),
            history: GameState::new(),
            creatures,
            hunt_mode: HuntMode::default(),
            turn: 0,
            events: Vec::new(),
        })
    }

    /// Subject handle for an entity currently on the board.
    pub fn subject(&self, id: EntityId) -> Option<Subject> {
        self.board.get(id).map(|e| Subject { id, name: e.name() })
    }

    pub fn emit(&mut self, subject: Option<Subject>, record: ActionRecord, killer: Option<Subject>) {
        self.events.push(SimEvent {
            turn: self.turn,
            subject,
            verb: record.verb,
            detail: record.detail,
            killer,
        });
    }

    pub fn new_creature(&mut self, species: Species) -> Creature {
        let config = match species {
            Species::Herbivore => &self.creatures.herbivore,
            Species::Predator => &self.creatures.predator,
        };
        Creature::new(species, self.ids.next(species), config)
    }

    /// Place a fresh creature with the next display id for its species.
    pub fn spawn_creature(&mut self, species: Species, at: Coordinates) -> SimResult<EntityId> {
        let creature = self.new_creature(species);
        self.board.place_entity(at, Entity::Creature(creature))
    }

    /// Empty the board and forget all history, keeping configuration and rng.
    pub fn reset(&mut self) {
        self.board.clear();
        self.path_finder.invalidate();
        self.ids.reset();
        self.history.clear();
        self.turn = 0;
        self.events.clear();
    }

    /// Snapshot the board into history under the current turn, then prune.
    pub fn record_history(&mut self, retention: usize) {
        self.history.save_board(self.turn, &self.board);
        self.history.clear_old_states(retention);
    }

    pub fn census(&self) -> Census {
        Census {
            herbivores: self.board.count_of(EntityKind::Herbivore),
            predators: self.board.count_of(EntityKind::Predator),
            grass: self.board.count_of(EntityKind::Grass),
            stones: self.board.count_of(EntityKind::Stone),
        }
    }
}
