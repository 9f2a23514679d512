use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::Board;
use crate::creature::{DamageCause, Interaction, Species};
use crate::distance::is_adjacent;
use crate::entity::EntityId;
use crate::error::{SimError, SimResult};
use crate::events::{ActionRecord, DeathEvent, Subject, Verb};

/// How hunt rolls are resolved. Anything but `Random` is for tests and
/// scripted runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HuntMode {
    #[default]
    Random,
    AlwaysCatch,
    AlwaysEscape,
}

/// Roll whether the prey fails to escape.
pub fn hunt_succeeds(mode: HuntMode, escape_chance: f64, rng: &mut impl Rng) -> bool {
    match mode {
        HuntMode::Random => !rng.gen_bool(escape_chance.clamp(0.0, 1.0)),
        HuntMode::AlwaysCatch => true,
        HuntMode::AlwaysEscape => false,
    }
}

/// Attack an adjacent live herbivore. A successful hunt deals the predator's
/// attack damage; a kill heals the predator by its food value and removes the
/// prey from the board straight away.
pub fn hunt(
    board: &mut Board,
    predator: EntityId,
    target: EntityId,
    mode: HuntMode,
    rng: &mut impl Rng,
) -> SimResult<Interaction> {
    let at = board.position_of(predator).ok_or(SimError::UnknownEntity(predator))?;
    let hunter = board
        .get(predator)
        .and_then(|e| e.as_creature())
        .ok_or(SimError::UnknownEntity(predator))?;
    let killer = Subject {
        id: predator,
        name: hunter.name(),
    };
    let (damage, food, escape_chance) =
        (hunter.attack_damage, hunter.food_value, hunter.escape_chance);

    let Some(prey_at) = board.position_of(target) else {
        return Ok(Interaction::failed());
    };
    let Some(prey) = board.get(target).and_then(|e| e.as_creature()) else {
        return Ok(Interaction::failed());
    };
    if prey.species != Species::Herbivore || !prey.is_alive() || !is_adjacent(at, prey_at) {
        return Ok(Interaction::failed());
    }
    let victim = Subject {
        id: target,
        name: prey.name(),
    };

    if !hunt_succeeds(mode, escape_chance, rng) {
        debug!(hunter = %killer.name, prey = %victim.name, "prey escaped");
        return Ok(Interaction {
            success: false,
            actions: vec![ActionRecord::new(
                Verb::Missed,
                format!("{} at {prey_at} escaped", victim.name),
            )],
            death: None,
        });
    }

    let prey = board
        .get_mut(target)
        .and_then(|e| e.as_creature_mut())
        .ok_or(SimError::UnknownEntity(target))?;
    prey.take_damage(damage, DamageCause::Attack(killer.clone()));
    let killed = !prey.is_alive();

    let mut actions = vec![ActionRecord::new(
        Verb::Attacked,
        format!("{} at {prey_at} for {damage}", victim.name),
    )];
    if !killed {
        return Ok(Interaction {
            success: true,
            actions,
            death: None,
        });
    }

    board.remove_by_id(target);
    let hunter = board
        .get_mut(predator)
        .and_then(|e| e.as_creature_mut())
        .ok_or(SimError::UnknownEntity(predator))?;
    let gained = hunter.heal(food);
    info!(hunter = %killer.name, prey = %victim.name, %prey_at, gained, "kill");

    actions.push(ActionRecord::new(Verb::Killed, victim.name.clone()));
    actions.push(ActionRecord::new(
        Verb::Ate,
        format!("{} (+{gained} hp)", victim.name),
    ));

    Ok(Interaction {
        success: true,
        actions,
        death: Some(DeathEvent {
            victim,
            killer,
            at: prey_at,
        }),
    })
}
