// The per-turn pipeline stages and the one-off initial population.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::coordinates::Coordinates;
use crate::creature::{self, DamageCause, Plan, Species};
use crate::entity::{Entity, EntityId, EntityKind};
use crate::error::SimResult;
use crate::events::{ActionRecord, Subject, Verb};
use crate::world::World;

/// A stage applied to the whole world.
pub trait Action {
    fn name(&self) -> &'static str;
    fn execute(&self, world: &mut World) -> SimResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitAction {
    pub herbivores: usize,
    pub predators: usize,
    pub grass: usize,
    pub stones: usize,
}

impl InitAction {
    fn place_many(&self, world: &mut World, kind: EntityKind, count: usize) -> SimResult<()> {
        let max_attempts = world.board.area();
        for _ in 0..count {
            let mut spot = None;
            for _ in 0..max_attempts {
                let c = Coordinates::new(
                    world.rng.gen_range(1..=world.board.width()),
                    world.rng.gen_range(1..=world.board.height()),
                );
                if world.board.is_position_vacant(c) {
                    spot = Some(c);
                    break;
                }
            }

            let Some(at) = spot else {
                warn!(%kind, max_attempts, "no free cell found");
                world.emit(
                    None,
                    ActionRecord::new(
                        Verb::PlacementFailed,
                        format!("{kind} after {max_attempts} attempts"),
                    ),
                    None,
                );
                continue;
            };

            let id = match kind {
                EntityKind::Herbivore => world.spawn_creature(Species::Herbivore, at)?,
                EntityKind::Predator => world.spawn_creature(Species::Predator, at)?,
                EntityKind::Grass => world.board.place_entity(at, Entity::Grass)?,
                EntityKind::Stone => world.board.place_entity(at, Entity::Stone)?,
            };
            let subject = world.subject(id);
            world.emit(subject, ActionRecord::new(Verb::Spawned, format!("at {at}")), None);
        }
        Ok(())
    }
}

impl Action for InitAction {
    fn name(&self) -> &'static str {
        "init"
    }

    fn execute(&self, world: &mut World) -> SimResult<()> {
        self.place_many(world, EntityKind::Herbivore, self.herbivores)?;
        self.place_many(world, EntityKind::Predator, self.predators)?;
        self.place_many(world, EntityKind::Grass, self.grass)?;
        self.place_many(world, EntityKind::Stone, self.stones)?;
        info!(census = ?world.census(), "board populated");
        Ok(())
    }
}

/// Tops grass back up, one tile per turn at most.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnGrassAction {
    pub min_grass: usize,
    pub spawn_chance: f64,
}

impl Action for SpawnGrassAction {
    fn name(&self) -> &'static str {
        "spawn_grass"
    }

    fn execute(&self, world: &mut World) -> SimResult<()> {
        if world.board.count_of(EntityKind::Grass) >= self.min_grass {
            return Ok(());
        }
        if !world.rng.gen_bool(self.spawn_chance.clamp(0.0, 1.0)) {
            return Ok(());
        }
        let Some(&at) = world.board.empty_cells().choose(&mut world.rng) else {
            return Ok(());
        };
        let id = world.board.place_entity(at, Entity::Grass)?;
        debug!(%at, "grass sprouted");
        let subject = world.subject(id);
        world.emit(subject, ActionRecord::new(Verb::Spawned, format!("at {at}")), None);
        Ok(())
    }
}

/// Runs every creature's decision cycle. All plans are made against the
/// board as it stood at the start of the pass, then applied in placement
/// order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveAction;

impl Action for MoveAction {
    fn name(&self) -> &'static str {
        "move"
    }

    fn execute(&self, world: &mut World) -> SimResult<()> {
        let roster = world.board.creature_ids();

        let mut plans: Vec<(EntityId, Plan)> = Vec::with_capacity(roster.len());
        for id in roster {
            if !world.board.get(id).is_some_and(|e| e.is_alive()) {
                continue;
            }
            let decision = creature::plan_turn(&world.board, &mut world.path_finder, id)?;
            let planned = decision.plan.record(&world.board);
            if let Some(me) = world.board.get_mut(id).and_then(|e| e.as_creature_mut()) {
                debug!(who = %me.name(), plan = %planned, "planned");
                me.wounded_by = None;
                me.available_moves = decision.available_moves;
                me.planned_action = Some(planned);
                me.performed_action = None;
            }
            plans.push((id, decision.plan));
        }

        for (id, plan) in plans {
            // Eaten earlier in this pass.
            let Some(subject) = world.subject(id) else { continue };
            let outcome = creature::execute_plan(
                &mut world.board,
                id,
                plan,
                world.hunt_mode,
                &mut world.rng,
            )?;
            for record in outcome.actions {
                world.emit(Some(subject.clone()), record, None);
            }
            for death in outcome.deaths {
                world.emit(
                    Some(death.victim),
                    ActionRecord::new(Verb::Died, format!("killed at {}", death.at)),
                    Some(death.killer),
                );
            }
        }
        Ok(())
    }
}

/// Every creature loses `damage` hp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HungerAction {
    pub damage: i32,
}

impl Action for HungerAction {
    fn name(&self) -> &'static str {
        "hunger"
    }

    fn execute(&self, world: &mut World) -> SimResult<()> {
        for id in world.board.creature_ids() {
            if let Some(c) = world.board.get_mut(id).and_then(|e| e.as_creature_mut()) {
                c.take_damage(self.damage, DamageCause::Hunger);
            }
        }
        Ok(())
    }
}

/// Removes creatures whose hp has run out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HealthCheckAction;

impl Action for HealthCheckAction {
    fn name(&self) -> &'static str {
        "health_check"
    }

    fn execute(&self, world: &mut World) -> SimResult<()> {
        let dead: Vec<_> = world
            .board
            .creature_ids()
            .into_iter()
            .filter(|id| !world.board.get(*id).is_some_and(|e| e.is_alive()))
            .collect();

        for id in dead {
            let Some(at) = world.board.position_of(id) else { continue };
            let Some(Entity::Creature(corpse)) = world.board.remove_by_id(id) else {
                continue;
            };
            let subject = Subject {
                id,
                name: corpse.name(),
            };
            // Prey killed outright never gets here; an attacker is only named
            // when its wound and this turn's hunger finished the creature off.
            let (cause, killer) = match corpse.wounded_by {
                Some(by) => ("wounds", Some(by)),
                None => ("hunger", None),
            };
            info!(who = %subject.name, %at, %cause, "died");
            world.emit(
                Some(subject),
                ActionRecord::new(Verb::Died, format!("of {cause} at {at}")),
                killer,
            );
        }
        Ok(())
    }
}
