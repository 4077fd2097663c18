use crate::net::ReliabilityConfig;
use crate::snapshot::InterpolationConfig;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Id of the locally controlled player.
    pub player_id: i32,
    pub interpolation: InterpolationConfig,
    pub reliability: ReliabilityConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_id: 0,
            interpolation: InterpolationConfig::default(),
            reliability: ReliabilityConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn for_player(player_id: i32) -> Self {
        Self {
            player_id,
            ..Default::default()
        }
    }
}
