mod config;

pub use config::SessionConfig;

use crate::net::{
    Channel, ChannelError, CommunicationManager, GameData, Message, PlayerInput, random_message_id,
};
use crate::player::{ConnectionRegistry, EntitySink, PlayerController};
use crate::snapshot::SnapshotBuffer;

/// One client connection: drives the manager, registry and snapshot buffer
/// from an externally clocked [`advance`](Self::advance).
pub struct ClientSession<C: Channel, S: EntitySink> {
    config: SessionConfig,
    channel: C,
    sink: S,
    manager: CommunicationManager,
    registry: ConnectionRegistry,
    snapshots: SnapshotBuffer,
    controller: Option<PlayerController>,
    connected: bool,
}

impl<C: Channel, S: EntitySink> ClientSession<C, S> {
    pub fn new(config: SessionConfig, channel: C, sink: S) -> Self {
        Self {
            manager: CommunicationManager::new(config.reliability.clone()),
            snapshots: SnapshotBuffer::new(config.interpolation.clone()),
            registry: ConnectionRegistry::new(),
            controller: None,
            connected: false,
            config,
            channel,
            sink,
        }
    }

    /// Queues a connect request and drops all local state from any previous
    /// connection. The local player comes back once the server confirms.
    pub fn request_connect(&mut self) {
        let player_id = self.config.player_id;
        log::info!("requesting connection for player {}", player_id);

        self.manager.send(Message::ConnectPlayer {
            message_id: random_message_id(),
            player_id,
        });

        self.registry.disconnect(player_id, &mut self.sink);
        self.connected = false;
        self.controller = None;
        self.snapshots.reset();
    }

    /// No-op unless connected. The local entity stays until the server
    /// answers with `PlayerDisconnected`.
    pub fn request_disconnect(&mut self) {
        if !self.connected {
            return;
        }

        log::info!("requesting disconnect for player {}", self.config.player_id);
        self.manager.send(Message::DisconnectPlayer {
            message_id: random_message_id(),
            player_id: self.config.player_id,
        });
    }

    pub fn advance(&mut self, delta_time: f64, input: PlayerInput) -> Result<(), ChannelError> {
        self.receive_packets()?;
        self.process_messages();

        if let Some(world) = self.snapshots.advance(delta_time) {
            self.apply_world(&world);
        }

        if let Some(controller) = self.controller.as_mut() {
            controller.record(input);
            self.manager.send(controller.to_message(self.config.player_id));
        }

        if let Some(packet) = self.manager.build_packet() {
            self.channel.send(&packet)?;
        }

        Ok(())
    }

    pub fn close(&mut self) {
        self.channel.close();
    }

    fn receive_packets(&mut self) -> Result<(), ChannelError> {
        while let Some(data) = self.channel.try_receive()? {
            if let Err(err) = self.manager.receive_packet(&data) {
                log::warn!("dropping malformed packet ({} bytes): {}", data.len(), err);
            }
        }
        Ok(())
    }

    fn process_messages(&mut self) {
        while let Some(message) = self.manager.get_message() {
            match message {
                Message::PlayerConnected { player_id, .. } => self.connect_player(player_id),
                Message::PlayerDisconnected { player_id, .. } => self.disconnect_player(player_id),
                Message::Snapshot(data) => {
                    self.snapshots.push(data);
                }
                other => log::trace!("ignoring {:?}", other.kind()),
            }
        }
    }

    fn connect_player(&mut self, player_id: i32) {
        self.registry.connect(player_id, &mut self.sink);

        if player_id == self.config.player_id {
            self.connected = true;
            self.controller = Some(PlayerController::new());
        }
    }

    fn disconnect_player(&mut self, player_id: i32) {
        self.registry.disconnect(player_id, &mut self.sink);

        if player_id == self.config.player_id {
            self.connected = false;
            self.controller = None;
        }
    }

    // Players first seen here had their connect message lost or raced.
    fn apply_world(&mut self, world: &GameData) {
        for player in &world.players {
            if !self.registry.contains(player.player_id) {
                log::debug!("implicit connect for player {}", player.player_id);
                self.connect_player(player.player_id);
            }
            self.registry
                .update_position(player.player_id, player.position, &mut self.sink);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn player_id(&self) -> i32 {
        self.config.player_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn snapshots(&self) -> &SnapshotBuffer {
        &self.snapshots
    }

    pub fn manager(&self) -> &CommunicationManager {
        &self.manager
    }

    pub fn controller(&self) -> Option<&PlayerController> {
        self.controller.as_ref()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}
