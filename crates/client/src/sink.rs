use std::collections::HashMap;

use glam::Vec2;

use cs2d::EntitySink;

/// Stands in for a renderer: tracks positions and logs lifecycle changes.
#[derive(Debug, Default)]
pub struct LoggingSink {
    positions: HashMap<i32, Vec2>,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> impl Iterator<Item = (i32, Vec2)> + '_ {
        self.positions.iter().map(|(&id, &pos)| (id, pos))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

impl EntitySink for LoggingSink {
    fn create(&mut self, player_id: i32) {
        log::info!("spawned player {}", player_id);
        self.positions.insert(player_id, Vec2::ZERO);
    }

    fn destroy(&mut self, player_id: i32) {
        log::info!("removed player {}", player_id);
        self.positions.remove(&player_id);
    }

    fn set_position(&mut self, player_id: i32, position: Vec2) {
        log::trace!("player {} at ({:.2}, {:.2})", player_id, position.x, position.y);
        self.positions.insert(player_id, position);
    }
}
