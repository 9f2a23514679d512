use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coordinates::Coordinates;
use crate::creature::{Creature, Species};

/// Stable handle to an entity. The generation field invalidates stale references.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

/// Closed set of things that can occupy a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Herbivore,
    Predator,
    Grass,
    Stone,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Herbivore => "Herbivore",
            EntityKind::Predator => "Predator",
            EntityKind::Grass => "Grass",
            EntityKind::Stone => "Stone",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug)]
pub enum Entity {
    Creature(Creature),
    /// Food for herbivores; removed when eaten.
    Grass,
    /// Permanent obstacle.
    Stone,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Creature(c) => match c.species {
                Species::Herbivore => EntityKind::Herbivore,
                Species::Predator => EntityKind::Predator,
            },
            Entity::Grass => EntityKind::Grass,
            Entity::Stone => EntityKind::Stone,
        }
    }

    pub fn is_consumable(&self) -> bool {
        matches!(self, Entity::Grass)
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self, Entity::Stone)
    }

    pub fn as_creature(&self) -> Option<&Creature> {
        match self {
            Entity::Creature(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_creature_mut(&mut self) -> Option<&mut Creature> {
        match self {
            Entity::Creature(c) => Some(c),
            _ => None,
        }
    }

    /// Passive entities are always "alive"; creatures only while hp > 0.
    pub fn is_alive(&self) -> bool {
        self.as_creature().map_or(true, Creature::is_alive)
    }

    pub fn name(&self) -> String {
        match self {
            Entity::Creature(c) => c.name(),
            other => other.kind().to_string(),
        }
    }
}

/// An entity together with the cell it sits on. Only the board writes these.
#[derive(Clone, Debug)]
pub(crate) struct Occupant {
    pub entity: Entity,
    pub position: Coordinates,
    /// Placement order; iteration over the board follows it.
    pub seq: u64,
}

/// Arena-based entity storage with generational indices and free list.
#[derive(Clone, Debug, Default)]
pub(crate) struct EntityArena {
    slots: Vec<Option<Occupant>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    count: usize,
}

impl EntityArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            generations: vec![0; capacity],
            free_list: (0..capacity as u32).rev().collect(),
            count: 0,
        }
    }

    pub fn spawn(&mut self, occupant: Occupant) -> EntityId {
        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            self.slots[idx] = Some(occupant);
            self.count += 1;
            EntityId {
                index,
                generation: self.generations[idx],
            }
        } else {
            // Grow the arena
            let index = self.slots.len() as u32;
            self.slots.push(Some(occupant));
            self.generations.push(0);
            self.count += 1;
            EntityId {
                index,
                generation: 0,
            }
        }
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Occupant> {
        let idx = id.index as usize;
        if idx < self.slots.len() && self.generations[idx] == id.generation {
            let occupant = self.slots[idx].take()?;
            self.generations[idx] += 1;
            self.free_list.push(id.index);
            self.count -= 1;
            Some(occupant)
        } else {
            None
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&Occupant> {
        let idx = id.index as usize;
        if idx < self.slots.len() && self.generations[idx] == id.generation {
            self.slots[idx].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Occupant> {
        let idx = id.index as usize;
        if idx < self.slots.len() && self.generations[idx] == id.generation {
            self.slots[idx].as_mut()
        } else {
            None
        }
    }

    /// All live occupants in placement order.
    pub fn iter_ordered(&self) -> Vec<(EntityId, &Occupant)> {
        let mut live: Vec<(EntityId, &Occupant)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref().map(|o| {
                    (
                        EntityId {
                            index: i as u32,
                            generation: self.generations[i],
                        },
                        o,
                    )
                })
            })
            .collect();
        live.sort_by_key(|(_, o)| o.seq);
        live
    }

    pub fn clear(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.generations[idx] += 1;
                self.free_list.push(idx as u32);
            }
        }
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }
}

/// Per-species sequential display ids ("Herbivore 1", "Predator 2").
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    herbivores: u32,
    predators: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, species: Species) -> u32 {
        let counter = match species {
            Species::Herbivore => &mut self.herbivores,
            Species::Predator => &mut self.predators,
        };
        *counter += 1;
        *counter
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
