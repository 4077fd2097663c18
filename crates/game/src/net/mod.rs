mod codec;
mod endpoint;
mod manager;
mod protocol;
mod simulator;
mod stats;
mod tracking;
mod transport;

pub use codec::{BitBuffer, PacketError};
pub use endpoint::UdpChannel;
pub use manager::{CommunicationManager, ReliabilityConfig};
pub use protocol::{
    DEFAULT_CLIENT_PORT, DEFAULT_SERVER_PORT, GameData, MAX_PACKET_SIZE, Message, MessageKey,
    MessageKind, Packet, PlayerData, PlayerInput, Reliability,
};
pub use simulator::SimulatedChannel;
pub use stats::{NetworkStats, PacketLossSimulation, random_message_id};
pub use tracking::{AckTracker, ReceiveTracker};
pub use transport::{Channel, ChannelError, MemoryChannel};
