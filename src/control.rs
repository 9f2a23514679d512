use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Commands a host can send to a running simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlCommand {
    Pause,
    Resume,
    TogglePause,
    Stop,
}

impl ControlCommand {
    /// Map a line of keyboard input to a command.
    pub fn from_key(input: &str) -> Option<Self> {
        match input.trim_end_matches(&['\r', '\n'][..]) {
            " " => Some(ControlCommand::TogglePause),
            key => match key.trim().to_ascii_lowercase().as_str() {
                "p" | "space" => Some(ControlCommand::TogglePause),
                "pause" => Some(ControlCommand::Pause),
                "r" | "resume" => Some(ControlCommand::Resume),
                "q" | "quit" | "stop" => Some(ControlCommand::Stop),
                _ => None,
            },
        }
    }
}

pub fn command_channel(capacity: usize) -> (Sender<ControlCommand>, Receiver<ControlCommand>) {
    bounded(capacity)
}
