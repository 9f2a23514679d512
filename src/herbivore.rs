use tracing::debug;

use crate::board::Board;
use crate::creature::Interaction;
use crate::distance::is_adjacent;
use crate::entity::EntityId;
use crate::error::{SimError, SimResult};
use crate::events::{ActionRecord, Verb};

/// Graze on an adjacent grass tile. Always succeeds when the tile is grass
/// and within reach; the grass is removed and the herbivore heals by its
/// food value, capped at max hp.
pub fn eat(board: &mut Board, herbivore: EntityId, target: EntityId) -> SimResult<Interaction> {
    let at = board.position_of(herbivore).ok_or(SimError::UnknownEntity(herbivore))?;
    let Some(grass_at) = board.position_of(target) else {
        return Ok(Interaction::failed());
    };
    let is_grass = board.get(target).is_some_and(|e| e.is_consumable());
    if !is_grass || !is_adjacent(at, grass_at) {
        return Ok(Interaction::failed());
    }

    board.remove_entity(grass_at);

    let eater = board
        .get_mut(herbivore)
        .and_then(|e| e.as_creature_mut())
        .ok_or(SimError::UnknownEntity(herbivore))?;
    let food = eater.food_value;
    let gained = eater.heal(food);
    debug!(who = %eater.name(), %grass_at, gained, hp = eater.hp, "grazed");

    Ok(Interaction {
        success: true,
        actions: vec![ActionRecord::new(
            Verb::Ate,
            format!("grass at {grass_at} (+{gained} hp)"),
        )],
        death: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeciesConfig;
    use crate::coordinates::Coordinates;
    use crate::creature::{Creature, Species};
    use crate::entity::Entity;

    fn herbivore(hp: i32) -> Entity {
        Entity::Creature(Creature::new(Species::Herbivore, 1, &SpeciesConfig::herbivore()).with_hp(hp))
    }

    fn hp_of(board: &Board, id: EntityId) -> i32 {
        board.get(id).and_then(|e| e.as_creature()).unwrap().hp
    }

    #[test]
    fn eating_adjacent_grass_heals_and_removes_it() {
        // Board(5,5), herbivore at half health next to grass.
        let mut board = Board::new(5, 5).unwrap();
        let me = board.place_entity(Coordinates::new(1, 1), herbivore(35)).unwrap();
        let grass = board.place_entity(Coordinates::new(1, 2), Entity::Grass).unwrap();

        let result = eat(&mut board, me, grass).unwrap();

        assert!(result.success);
        assert!(board.get_entity(Coordinates::new(1, 2)).is_none());
        assert_eq!(hp_of(&board, me), 55);
        assert_eq!(result.actions.len(), 1);
        assert_eq!(result.actions[0].verb, Verb::Ate);
    }

    #[test]
    fn eating_never_exceeds_max_hp() {
        let mut board = Board::new(5, 5).unwrap();
        let me = board.place_entity(Coordinates::new(2, 2), herbivore(65)).unwrap();
        let grass = board.place_entity(Coordinates::new(2, 3), Entity::Grass).unwrap();

        eat(&mut board, me, grass).unwrap();
        assert_eq!(hp_of(&board, me), 70);
    }

    #[test]
    fn grass_out_of_reach_is_left_alone() {
        let mut board = Board::new(5, 5).unwrap();
        let me = board.place_entity(Coordinates::new(1, 1), herbivore(10)).unwrap();
        let grass = board.place_entity(Coordinates::new(2, 2), Entity::Grass).unwrap();

        let result = eat(&mut board, me, grass).unwrap();
        assert!(!result.success);
        assert!(board.contains(grass));
        assert_eq!(hp_of(&board, me), 10);
    }

    #[test]
    fn stones_are_not_food() {
        let mut board = Board::new(5, 5).unwrap();
        let me = board.place_entity(Coordinates::new(1, 1), herbivore(10)).unwrap();
        let stone = board.place_entity(Coordinates::new(2, 1), Entity::Stone).unwrap();

        assert!(!eat(&mut board, me, stone).unwrap().success);
        assert!(board.contains(stone));
    }
}
