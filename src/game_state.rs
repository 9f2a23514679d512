use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::board::Board;
use crate::coordinates::Coordinates;
use crate::entity::EntityId;
use crate::events::ActionRecord;

/// What one entity looked like at the end of a turn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityState {
    pub coordinates: Coordinates,
    /// `None` for grass and stones.
    pub hp: Option<i32>,
    pub planned_action: Option<ActionRecord>,
    pub performed_action: Option<ActionRecord>,
}

impl EntityState {
    pub fn capture(board: &Board, id: EntityId) -> Option<Self> {
        let coordinates = board.position_of(id)?;
        let creature = board.get(id)?.as_creature();
        Some(Self {
            coordinates,
            hp: creature.map(|c| c.hp),
            planned_action: creature.and_then(|c| c.planned_action.clone()),
            performed_action: creature.and_then(|c| c.performed_action.clone()),
        })
    }
}

/// Per-turn snapshot history, keyed `turn -> entity -> state`.
#[derive(Clone, Debug, Default)]
pub struct GameState {
    pub current_turn: u64,
    states: BTreeMap<u64, HashMap<EntityId, EntityState>>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_entity_state(&mut self, turn: u64, id: EntityId, state: EntityState) {
        self.states.entry(turn).or_default().insert(id, state);
        self.current_turn = self.current_turn.max(turn);
    }

    /// Snapshot every entity on the board under `turn`.
    pub fn save_board(&mut self, turn: u64, board: &Board) {
        for (id, _, _) in board.iter() {
            if let Some(state) = EntityState::capture(board, id) {
                self.save_entity_state(turn, id, state);
            }
        }
        self.current_turn = self.current_turn.max(turn);
    }

    pub fn get_entity_state(&self, turn: u64, id: EntityId) -> Option<&EntityState> {
        self.states.get(&turn)?.get(&id)
    }

    /// The entity's state from the turn before the current one.
    pub fn get_previous_state(&self, id: EntityId) -> Option<&EntityState> {
        let previous = self.current_turn.checked_sub(1)?;
        self.get_entity_state(previous, id)
    }

    /// Drop everything but the `keep_turns` most recent turns.
    pub fn clear_old_states(&mut self, keep_turns: usize) {
        while self.states.len() > keep_turns {
            self.states.pop_first();
        }
    }

    /// Turns currently held, oldest first.
    pub fn turns(&self) -> Vec<u64> {
        self.states.keys().copied().collect()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.current_turn = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeciesConfig;
    use crate::creature::{Creature, Species};
    use crate::entity::Entity;

    fn state_at(x: i32) -> EntityState {
        EntityState {
            coordinates: Coordinates::new(x, 1),
            hp: Some(10),
            planned_action: None,
            performed_action: None,
        }
    }

    fn id(index: u32) -> EntityId {
        EntityId {
            index,
            generation: 0,
        }
    }

    #[test]
    fn previous_state_reads_the_prior_turn() {
        let mut history = GameState::new();
        history.save_entity_state(1, id(0), state_at(1));
        history.save_entity_state(2, id(0), state_at(2));

        assert_eq!(history.current_turn, 2);
        assert_eq!(history.get_previous_state(id(0)), Some(&state_at(1)));
        assert_eq!(history.get_entity_state(2, id(0)), Some(&state_at(2)));
        assert!(history.get_entity_state(2, id(1)).is_none());
    }

    #[test]
    fn pruning_keeps_the_most_recent_turns() {
        let mut history = GameState::new();
        for turn in 1..=5 {
            history.save_entity_state(turn, id(0), state_at(turn as i32));
        }
        history.clear_old_states(2);
        assert_eq!(history.turns(), vec![4, 5]);
        assert!(history.get_entity_state(3, id(0)).is_none());
    }

    #[test]
    fn board_snapshot_records_hp_only_for_creatures() {
        let mut board = Board::new(4, 4).unwrap();
        let creature = Creature::new(Species::Herbivore, 1, &SpeciesConfig::herbivore());
        let herbivore = board
            .place_entity(Coordinates::new(1, 1), Entity::Creature(creature))
            .unwrap();
        let stone = board.place_entity(Coordinates::new(2, 2), Entity::Stone).unwrap();

        let mut history = GameState::new();
        history.save_board(1, &board);

        assert_eq!(history.get_entity_state(1, herbivore).and_then(|s| s.hp), Some(70));
        let stone_state = history.get_entity_state(1, stone).unwrap();
        assert_eq!(stone_state.hp, None);
        assert_eq!(stone_state.coordinates, Coordinates::new(2, 2));
    }
}
