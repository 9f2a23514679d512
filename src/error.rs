use thiserror::Error;

use crate::coordinates::Coordinates;
use crate::entity::EntityId;

/// Errors raised by board mutation and simulation construction.
///
/// Ordinary game outcomes (no path, no target, an escaped hunt) are not
/// errors and never surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("coordinates {0} are outside the board")]
    InvalidCoordinates(Coordinates),
    #[error("cell {0} is already occupied")]
    CellOccupied(Coordinates),
    #[error("no entity at {0}")]
    EntityNotFound(Coordinates),
    #[error("entity {0:?} is not on the board")]
    UnknownEntity(EntityId),
    #[error("entity at {0} is a permanent obstacle and cannot move")]
    Immovable(Coordinates),
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

pub type SimResult<T> = Result<T, SimError>;
