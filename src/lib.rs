pub mod actions;
pub mod board;
pub mod config;
pub mod control;
pub mod coordinates;
pub mod creature;
pub mod distance;
pub mod entity;
pub mod error;
pub mod events;
pub mod game_state;
pub mod herbivore;
pub mod path_finder;
pub mod predator;
pub mod simulation;
pub mod world;

pub use board::Board;
pub use config::SimulationConfig;
pub use control::ControlCommand;
pub use coordinates::Coordinates;
pub use entity::{Entity, EntityId, EntityKind};
pub use error::{SimError, SimResult};
pub use simulation::{RunSummary, Simulation, SimulationState};
