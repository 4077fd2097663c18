use cs2d::{InterpolationConfig, PacketLossSimulation, ReliabilityConfig, SessionConfig};

use crate::input::InputState;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_ip: String,
    pub server_port: u16,
    pub local_port: u16,
    pub player_id: i32,
    pub tick_rate: u32,
    pub auto_connect: bool,
    pub input: InputState,
    /// Stops after this many seconds; runs until killed when `None`.
    pub duration_secs: Option<f64>,
    pub stats_interval_secs: f64,
    pub interpolation: InterpolationConfig,
    pub reliability: ReliabilityConfig,
    pub packet_loss: Option<PacketLossSimulation>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_ip: "127.0.0.1".to_string(),
            server_port: cs2d::net::DEFAULT_SERVER_PORT,
            local_port: cs2d::net::DEFAULT_CLIENT_PORT,
            player_id: 0,
            tick_rate: 60,
            auto_connect: true,
            input: InputState::default(),
            duration_secs: None,
            stats_interval_secs: 1.0,
            interpolation: InterpolationConfig::default(),
            reliability: ReliabilityConfig::default(),
            packet_loss: None,
        }
    }
}

impl ClientConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            player_id: self.player_id,
            interpolation: self.interpolation.clone(),
            reliability: self.reliability.clone(),
        }
    }

    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.tick_rate.max(1) as f64
    }
}
