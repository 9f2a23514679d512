use std::collections::HashMap;

use tracing::trace;

use crate::coordinates::Coordinates;
use crate::distance::manhattan_distance;
use crate::entity::{Entity, EntityArena, EntityId, EntityKind, Occupant};
use crate::error::{SimError, SimResult};

// Storage starts at most this large and grows with the population.
const INITIAL_CAPACITY: usize = 256;

fn area(width: i32, height: i32) -> usize {
    (width.max(0) as usize).saturating_mul(height.max(0) as usize)
}

/// Rectangular grid owning every entity and its position.
///
/// The board is the only writer of the occupancy index. An entity never
/// stores its own coordinates; they are always looked up through
/// [`Board::position_of`], so the index and the entity cannot disagree.
#[derive(Clone, Debug)]
pub struct Board {
    width: i32,
    height: i32,
    arena: EntityArena,
    occupancy: HashMap<Coordinates, EntityId>,
    next_seq: u64,
    revision: u64,
}

impl Board {
    pub fn new(width: i32, height: i32) -> SimResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(SimError::Configuration(format!(
                "board dimensions must be positive, got {width}x{height}"
            )));
        }
        let capacity = area(width, height).min(INITIAL_CAPACITY);
        Ok(Self {
            width,
            height,
            arena: EntityArena::new(capacity),
            occupancy: HashMap::with_capacity(capacity),
            next_seq: 0,
            revision: 0,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells on the board.
    pub fn area(&self) -> usize {
        area(self.width, self.height)
    }

    /// Bumped on every occupancy change. Caches keyed on board layout
    /// compare against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn is_valid_coordinates(&self, c: Coordinates) -> bool {
        (1..=self.width).contains(&c.x) && (1..=self.height).contains(&c.y)
    }

    pub fn place_entity(&mut self, c: Coordinates, entity: Entity) -> SimResult<EntityId> {
        if !self.is_valid_coordinates(c) {
            return Err(SimError::InvalidCoordinates(c));
        }
        if self.occupancy.contains_key(&c) {
            return Err(SimError::CellOccupied(c));
        }
        let id = self.arena.spawn(Occupant {
            entity,
            position: c,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        self.occupancy.insert(c, id);
        self.touch();
        Ok(id)
    }

    /// Removes whatever sits on `c`. Absent cells are a no-op.
    pub fn remove_entity(&mut self, c: Coordinates) -> Option<Entity> {
        let id = self.occupancy.remove(&c)?;
        let occupant = self.arena.despawn(id)?;
        self.touch();
        Some(occupant.entity)
    }

    pub fn remove_by_id(&mut self, id: EntityId) -> Option<Entity> {
        let position = self.position_of(id)?;
        self.remove_entity(position)
    }

    pub fn move_entity(&mut self, from: Coordinates, to: Coordinates) -> SimResult<()> {
        if !self.is_valid_coordinates(to) {
            return Err(SimError::InvalidCoordinates(to));
        }
        let id = *self
            .occupancy
            .get(&from)
            .ok_or(SimError::EntityNotFound(from))?;
        if self.occupancy.contains_key(&to) {
            return Err(SimError::CellOccupied(to));
        }
        let occupant = self.arena.get_mut(id).ok_or(SimError::UnknownEntity(id))?;
        if occupant.entity.is_obstacle() {
            return Err(SimError::Immovable(from));
        }
        occupant.position = to;
        self.occupancy.remove(&from);
        self.occupancy.insert(to, id);
        self.touch();
        Ok(())
    }

    pub fn get_entity(&self, c: Coordinates) -> Option<&Entity> {
        self.entity_at(c).map(|(_, e)| e)
    }

    pub fn entity_at(&self, c: Coordinates) -> Option<(EntityId, &Entity)> {
        let id = *self.occupancy.get(&c)?;
        self.arena.get(id).map(|o| (id, &o.entity))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id).map(|o| &o.entity)
    }

    /// Mutable access to an entity's own state. Position is not reachable
    /// from here; relocation goes through [`Board::move_entity`].
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.arena.get_mut(id).map(|o| &mut o.entity)
    }

    pub fn position_of(&self, id: EntityId) -> Option<Coordinates> {
        self.arena.get(id).map(|o| o.position)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.arena.get(id).is_some()
    }

    pub fn is_position_vacant(&self, c: Coordinates) -> bool {
        !self.occupancy.contains_key(&c)
    }

    /// The 8-neighbourhood of `c`, clipped to the board.
    pub fn get_adjacent_positions(&self, c: Coordinates) -> Vec<Coordinates> {
        let mut adjacent = Vec::with_capacity(8);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let next = c.offset(dx, dy);
                if self.is_valid_coordinates(next) {
                    adjacent.push(next);
                }
            }
        }
        adjacent
    }

    pub fn get_vacant_adjacent_positions(&self, c: Coordinates) -> Vec<Coordinates> {
        self.get_adjacent_positions(c)
            .into_iter()
            .filter(|p| self.is_position_vacant(*p))
            .collect()
    }

    /// Every unoccupied cell, column by column.
    pub fn empty_cells(&self) -> Vec<Coordinates> {
        let mut cells = Vec::new();
        for x in 1..=self.width {
            for y in 1..=self.height {
                let c = Coordinates::new(x, y);
                if self.is_position_vacant(c) {
                    cells.push(c);
                }
            }
        }
        cells
    }

    /// Entities of one kind in placement order.
    pub fn get_entities_by_type(&self, kind: EntityKind) -> Vec<EntityId> {
        self.arena
            .iter_ordered()
            .into_iter()
            .filter(|(_, o)| o.entity.kind() == kind)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn count_of(&self, kind: EntityKind) -> usize {
        self.get_entities_by_type(kind).len()
    }

    /// Entities within `radius` of `center` (excluding the centre cell),
    /// nearest first. Equal distances keep placement order.
    pub fn get_entities_in_range(&self, center: Coordinates, radius: u32) -> Vec<(EntityId, u32)> {
        let mut found: Vec<(EntityId, u32)> = self
            .arena
            .iter_ordered()
            .into_iter()
            .filter(|(_, o)| o.position != center)
            .map(|(id, o)| (id, manhattan_distance(center, o.position)))
            .filter(|(_, d)| *d <= radius)
            .collect();
        found.sort_by_key(|(_, d)| *d);
        found
    }

    /// Every creature on the board in placement order, dead or alive.
    pub fn creature_ids(&self) -> Vec<EntityId> {
        self.arena
            .iter_ordered()
            .into_iter()
            .filter(|(_, o)| o.entity.as_creature().is_some())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn has_living_creature(&self) -> bool {
        self.arena
            .iter_ordered()
            .iter()
            .any(|(_, o)| o.entity.as_creature().is_some_and(|c| c.is_alive()))
    }

    /// `(id, position, entity)` for everything on the board in placement order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, Coordinates, &Entity)> {
        self.arena
            .iter_ordered()
            .into_iter()
            .map(|(id, o)| (id, o.position, &o.entity))
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.occupancy.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.revision += 1;
        trace!(revision = self.revision, "board layout changed");
    }
}
