use crossbeam_channel::{Receiver, TryRecvError};
use serde::Serialize;
use tracing::{debug, info};

use crate::actions::{
    Action, HealthCheckAction, HungerAction, InitAction, MoveAction, SpawnGrassAction,
};
use crate::board::Board;
use crate::config::SimulationConfig;
use crate::control::ControlCommand;
use crate::coordinates::Coordinates;
use crate::creature::Species;
use crate::entity::{Entity, EntityId};
use crate::error::SimResult;
use crate::events::{SimEvent, Verb};
use crate::game_state::GameState;
use crate::predator::HuntMode;
use crate::world::{Census, World};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SimulationState {
    Stopped,
    Running,
    Paused,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub turns: u64,
    pub state: SimulationState,
    pub census: Census,
    pub deaths: usize,
    pub kills: usize,
}

/// Turn loop over a [`World`]. Each turn runs the fixed stage order
/// spawn grass, move, hunger, health check.
pub struct Simulation {
    config: SimulationConfig,
    world: World,
    state: SimulationState,
    pipeline: Vec<Box<dyn Action>>,
    controls: Option<Receiver<ControlCommand>>,
    deaths: usize,
    kills: usize,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        let world = World::new(
            config.board_width,
            config.board_height,
            config.creatures.clone(),
            config.seed,
        )?;
        let pipeline: Vec<Box<dyn Action>> = vec![
            Box::new(SpawnGrassAction {
                min_grass: config.min_grass,
                spawn_chance: config.grass_spawn_chance,
            }),
            Box::new(MoveAction),
            Box::new(HungerAction {
                damage: config.hunger_damage,
            }),
            Box::new(HealthCheckAction),
        ];
        Ok(Self {
            config,
            world,
            state: SimulationState::Stopped,
            pipeline,
            controls: None,
            deaths: 0,
            kills: 0,
        })
    }

    /// Clear the board and populate it with the given counts. The run is
    /// `Running` only if at least one creature made it onto the board.
    pub fn initialize(
        &mut self,
        herbivores: usize,
        predators: usize,
        grass: usize,
        stones: usize,
    ) -> SimResult<()> {
        self.world.reset();
        self.deaths = 0;
        self.kills = 0;
        InitAction {
            herbivores,
            predators,
            grass,
            stones,
        }
        .execute(&mut self.world)?;
        self.world.record_history(self.config.history_retention);
        self.refresh_state();
        info!(state = ?self.state, census = ?self.world.census(), "simulation initialized");
        Ok(())
    }

    /// Populate from the configured initial counts.
    pub fn start(&mut self) -> SimResult<()> {
        let c = &self.config;
        let (h, p, g, s) = (
            c.initial_herbivores,
            c.initial_predators,
            c.initial_grass,
            c.initial_stones,
        );
        self.initialize(h, p, g, s)
    }

    /// Put something on the board by hand, for scripted setups. Creatures
    /// placed this way may bring a stopped run back to `Running`.
    pub fn place_entity(&mut self, at: Coordinates, entity: Entity) -> SimResult<EntityId> {
        let id = self.world.board.place_entity(at, entity)?;
        if self.state == SimulationState::Stopped {
            self.refresh_state();
        }
        Ok(id)
    }

    pub fn spawn_creature(&mut self, species: Species, at: Coordinates) -> SimResult<EntityId> {
        let id = self.world.spawn_creature(species, at)?;
        if self.state == SimulationState::Stopped {
            self.refresh_state();
        }
        Ok(id)
    }

    fn refresh_state(&mut self) {
        self.state = if self.world.board.has_living_creature() {
            SimulationState::Running
        } else {
            SimulationState::Stopped
        };
    }

    /// Play one turn. Returns `false` without doing anything while paused or
    /// stopped, and stops the run once no living creature is left.
    pub fn next_turn(&mut self) -> SimResult<bool> {
        if self.state != SimulationState::Running {
            return Ok(false);
        }
        if !self.world.board.has_living_creature() {
            info!(turn = self.world.turn, "no creatures left, stopping");
            self.state = SimulationState::Stopped;
            return Ok(false);
        }

        self.world.turn += 1;
        self.world.events.clear();
        for stage in &self.pipeline {
            debug!(turn = self.world.turn, stage = stage.name(), "stage");
            stage.execute(&mut self.world)?;
        }

        for event in &self.world.events {
            if event.verb == Verb::Died {
                self.deaths += 1;
                if event.killer.is_some() {
                    self.kills += 1;
                }
            }
        }
        self.world.record_history(self.config.history_retention);
        Ok(true)
    }

    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            SimulationState::Running => SimulationState::Paused,
            SimulationState::Paused => SimulationState::Running,
            SimulationState::Stopped => SimulationState::Stopped,
        };
        info!(state = ?self.state, "pause toggled");
    }

    pub fn stop_simulation(&mut self) {
        self.state = SimulationState::Stopped;
        info!(turn = self.world.turn, "simulation stopped");
    }

    pub fn apply_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::Pause if self.state == SimulationState::Running => self.toggle_pause(),
            ControlCommand::Resume if self.state == SimulationState::Paused => self.toggle_pause(),
            ControlCommand::Pause | ControlCommand::Resume => {}
            ControlCommand::TogglePause => self.toggle_pause(),
            ControlCommand::Stop => self.stop_simulation(),
        }
    }

    /// Listen for host commands while [`Simulation::run_with`] is driving.
    pub fn attach_controls(&mut self, commands: Receiver<ControlCommand>) {
        self.controls = Some(commands);
    }

    fn drain_controls(&mut self) {
        let Some(rx) = &self.controls else { return };
        let mut pending = Vec::new();
        let disconnected = loop {
            match rx.try_recv() {
                Ok(command) => pending.push(command),
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => break true,
            }
        };
        if disconnected {
            self.controls = None;
        }
        for command in pending {
            self.apply_command(command);
        }
    }

    /// Block until the next command arrives. `false` when there is nobody
    /// left to send one.
    fn wait_for_command(&mut self) -> bool {
        let received = match &self.controls {
            Some(rx) => rx.recv().ok(),
            None => return false,
        };
        match received {
            Some(command) => {
                self.apply_command(command);
                true
            }
            None => {
                self.controls = None;
                false
            }
        }
    }

    pub fn run(&mut self, steps: Option<u64>) -> SimResult<u64> {
        self.run_with(steps, |_| {})
    }

    /// Play up to `steps` turns (all of them if `None`), calling `on_turn`
    /// after each one. Returns the number of turns played.
    pub fn run_with<F>(&mut self, steps: Option<u64>, mut on_turn: F) -> SimResult<u64>
    where
        F: FnMut(&Simulation),
    {
        let mut played = 0;
        while steps.map_or(true, |limit| played < limit) {
            self.drain_controls();
            match self.state {
                SimulationState::Stopped => break,
                SimulationState::Paused => {
                    if self.wait_for_command() {
                        continue;
                    }
                    break;
                }
                SimulationState::Running => {}
            }
            if !self.next_turn()? {
                break;
            }
            played += 1;
            on_turn(self);
        }
        Ok(played)
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn turn(&self) -> u64 {
        self.world.turn
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.world.board
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn history(&self) -> &GameState {
        &self.world.history
    }

    /// Events recorded during the most recent turn.
    pub fn last_events(&self) -> &[SimEvent] {
        &self.world.events
    }

    pub fn census(&self) -> Census {
        self.world.census()
    }

    pub fn set_hunt_mode(&mut self, mode: HuntMode) {
        self.world.hunt_mode = mode;
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            turns: self.world.turn,
            state: self.state,
            census: self.world.census(),
            deaths: self.deaths,
            kills: self.kills,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::command_channel;
    use std::thread;
    use std::time::Duration;

    fn small_config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            board_width: 6,
            board_height: 6,
            seed,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn start_runs_only_with_creatures() {
        let mut sim = Simulation::new(small_config(1)).unwrap();
        assert_eq!(sim.state(), SimulationState::Stopped);

        sim.initialize(0, 0, 3, 2).unwrap();
        assert_eq!(sim.state(), SimulationState::Stopped);
        assert!(!sim.next_turn().unwrap());
        assert_eq!(sim.turn(), 0);

        sim.start().unwrap();
        assert_eq!(sim.state(), SimulationState::Running);
        assert!(sim.next_turn().unwrap());
        assert_eq!(sim.turn(), 1);
    }

    #[test]
    fn paused_turns_are_no_ops() {
        let mut sim = Simulation::new(small_config(2)).unwrap();
        sim.start().unwrap();

        sim.toggle_pause();
        assert_eq!(sim.state(), SimulationState::Paused);
        assert!(!sim.next_turn().unwrap());
        assert_eq!(sim.turn(), 0);

        sim.toggle_pause();
        assert!(sim.next_turn().unwrap());

        sim.stop_simulation();
        assert_eq!(sim.state(), SimulationState::Stopped);
        assert!(!sim.next_turn().unwrap());
    }

    #[test]
    fn run_stops_once_everyone_starves() {
        let config = SimulationConfig {
            hunger_damage: 100,
            ..small_config(3)
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.initialize(2, 1, 0, 0).unwrap();

        let played = sim.run(Some(10)).unwrap();

        assert_eq!(played, 1);
        assert_eq!(sim.state(), SimulationState::Stopped);
        let summary = sim.summary();
        assert_eq!(summary.deaths, 3);
        assert_eq!(summary.kills, 0);
        assert_eq!(summary.census.herbivores + summary.census.predators, 0);
    }

    #[test]
    fn bounded_run_plays_exactly_that_many_turns() {
        let mut sim = Simulation::new(small_config(4)).unwrap();
        sim.start().unwrap();
        let mut seen = Vec::new();

        let played = sim.run_with(Some(3), |s| seen.push(s.turn())).unwrap();

        assert_eq!(played, 3);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn same_seed_same_run() {
        let play = |seed| {
            let mut sim = Simulation::new(small_config(seed)).unwrap();
            sim.start().unwrap();
            let mut log = Vec::new();
            sim.run_with(Some(15), |s| log.extend(s.last_events().iter().cloned()))
                .unwrap();
            (sim.summary(), log)
        };
        assert_eq!(play(11), play(11));
    }

    #[test]
    fn history_is_pruned_to_retention() {
        let config = SimulationConfig {
            history_retention: 2,
            ..small_config(5)
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.start().unwrap();
        sim.run(Some(4)).unwrap();

        assert_eq!(sim.history().turns(), vec![3, 4]);
        let herbivore = sim.board().creature_ids()[0];
        assert!(sim.history().get_previous_state(herbivore).is_some());
    }

    #[test]
    fn queued_stop_ends_the_run_before_any_turn() {
        let mut sim = Simulation::new(small_config(6)).unwrap();
        sim.start().unwrap();
        let (tx, rx) = command_channel(4);
        sim.attach_controls(rx);
        tx.send(ControlCommand::TogglePause).unwrap();
        tx.send(ControlCommand::Stop).unwrap();

        assert_eq!(sim.run(Some(5)).unwrap(), 0);
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[test]
    fn paused_run_waits_for_resume() {
        let mut sim = Simulation::new(small_config(7)).unwrap();
        sim.start().unwrap();
        let (tx, rx) = command_channel(4);
        sim.attach_controls(rx);
        tx.send(ControlCommand::Pause).unwrap();

        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.send(ControlCommand::Resume).unwrap();
        });
        let played = sim.run(Some(2)).unwrap();
        sender.join().unwrap();

        assert_eq!(played, 2);
        assert_eq!(sim.state(), SimulationState::Running);
    }

    #[test]
    fn paused_run_without_controls_returns() {
        let mut sim = Simulation::new(small_config(8)).unwrap();
        sim.start().unwrap();
        sim.toggle_pause();
        assert_eq!(sim.run(Some(5)).unwrap(), 0);
        assert_eq!(sim.state(), SimulationState::Paused);
    }

    #[test]
    fn scripted_hunt_is_counted_as_a_kill() {
        let config = SimulationConfig {
            min_grass: 0,
            hunger_damage: 0,
            ..small_config(9)
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.initialize(0, 0, 0, 0).unwrap();
        sim.set_hunt_mode(HuntMode::AlwaysCatch);
        let hunter = sim.spawn_creature(Species::Predator, Coordinates::new(1, 1)).unwrap();
        let prey = sim.spawn_creature(Species::Herbivore, Coordinates::new(1, 2)).unwrap();
        // Wound both so they are hungry; the herbivore dies to one bite.
        sim.world.board.get_mut(hunter).and_then(|e| e.as_creature_mut()).unwrap().hp = 50;
        sim.world.board.get_mut(prey).and_then(|e| e.as_creature_mut()).unwrap().hp = 30;
        assert_eq!(sim.state(), SimulationState::Running);

        assert!(sim.next_turn().unwrap());

        let summary = sim.summary();
        assert_eq!(summary.kills, 1);
        assert_eq!(summary.deaths, 1);
        assert_eq!(summary.census.herbivores, 0);
        let killed = sim
            .last_events()
            .iter()
            .find(|e| e.verb == Verb::Died)
            .and_then(|e| e.killer.as_ref())
            .map(|k| k.id);
        assert_eq!(killed, Some(hunter));
    }
}
