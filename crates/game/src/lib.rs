pub mod net;
pub mod player;
pub mod session;
pub mod snapshot;

pub use net::{
    Channel, ChannelError, CommunicationManager, GameData, MemoryChannel, Message, Packet,
    PacketError, PacketLossSimulation, PlayerData, PlayerInput, Reliability, ReliabilityConfig,
    SimulatedChannel, UdpChannel,
};
pub use player::{ConnectionRegistry, EntityHandle, EntitySink, PlayerController};
pub use session::{ClientSession, SessionConfig};
pub use snapshot::{InterpolationConfig, InterpolationStats, SnapshotBuffer};
