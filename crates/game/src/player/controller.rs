use crate::net::{Message, PlayerInput};

/// Input source attached to the locally controlled player once the server
/// confirms it. Holds the latest sampled input.
#[derive(Debug, Clone, Default)]
pub struct PlayerController {
    input: PlayerInput,
    ticks: u64,
}

impl PlayerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, input: PlayerInput) {
        self.input = input;
        self.ticks += 1;
    }

    pub fn input(&self) -> PlayerInput {
        self.input
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn to_message(&self, player_id: i32) -> Message {
        Message::PlayerInput {
            player_id,
            input: self.input,
        }
    }
}
