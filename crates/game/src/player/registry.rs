use std::collections::HashMap;

use glam::Vec2;

/// Host-side representation of players (scene objects, sprites, ...).
pub trait EntitySink {
    fn create(&mut self, player_id: i32);
    fn destroy(&mut self, player_id: i32);
    fn set_position(&mut self, player_id: i32, position: Vec2);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u32);

#[derive(Debug, Clone)]
pub struct PlayerEntity {
    pub player_id: i32,
    pub handle: EntityHandle,
    pub position: Vec2,
}

/// Live players by id. At most one entity per id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    players: HashMap<i32, PlayerEntity>,
    next_handle: u32,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh entity for `player_id`, destroying any existing one.
    pub fn connect(&mut self, player_id: i32, sink: &mut impl EntitySink) -> EntityHandle {
        self.disconnect(player_id, sink);

        let handle = EntityHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        sink.create(player_id);
        self.players.insert(
            player_id,
            PlayerEntity {
                player_id,
                handle,
                position: Vec2::ZERO,
            },
        );

        log::info!("player {} connected", player_id);
        handle
    }

    pub fn disconnect(&mut self, player_id: i32, sink: &mut impl EntitySink) -> bool {
        match self.players.remove(&player_id) {
            Some(_) => {
                sink.destroy(player_id);
                log::info!("player {} disconnected", player_id);
                true
            }
            None => false,
        }
    }

    /// Returns false if `player_id` is not registered.
    pub fn update_position(
        &mut self,
        player_id: i32,
        position: Vec2,
        sink: &mut impl EntitySink,
    ) -> bool {
        match self.players.get_mut(&player_id) {
            Some(player) => {
                player.position = position;
                sink.set_position(player_id, position);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, player_id: i32) -> Option<&PlayerEntity> {
        self.players.get(&player_id)
    }

    pub fn contains(&self, player_id: i32) -> bool {
        self.players.contains_key(&player_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerEntity> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl EntitySink for Recorder {
        fn create(&mut self, player_id: i32) {
            self.events.push(format!("create {}", player_id));
        }

        fn destroy(&mut self, player_id: i32) {
            self.events.push(format!("destroy {}", player_id));
        }

        fn set_position(&mut self, player_id: i32, position: Vec2) {
            self.events
                .push(format!("move {} {} {}", player_id, position.x, position.y));
        }
    }

    #[test]
    fn test_reconnect_replaces_entity() {
        let mut registry = ConnectionRegistry::new();
        let mut sink = Recorder::default();

        let first = registry.connect(5, &mut sink);
        let second = registry.connect(5, &mut sink);

        assert_ne!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(5).unwrap().handle, second);
        assert_eq!(sink.events, vec!["create 5", "destroy 5", "create 5"]);
    }

    #[test]
    fn test_disconnect_unknown_is_noop() {
        let mut registry = ConnectionRegistry::new();
        let mut sink = Recorder::default();

        assert!(!registry.disconnect(9, &mut sink));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_update_position() {
        let mut registry = ConnectionRegistry::new();
        let mut sink = Recorder::default();

        assert!(!registry.update_position(1, Vec2::ONE, &mut sink));
        registry.connect(1, &mut sink);
        assert!(registry.update_position(1, Vec2::new(2.0, 3.0), &mut sink));

        assert_eq!(registry.get(1).unwrap().position, Vec2::new(2.0, 3.0));
        assert_eq!(sink.events, vec!["create 1", "move 1 2 3"]);
    }
}
