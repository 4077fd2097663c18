use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::codec::{BitBuffer, PacketError};

pub const MAX_PACKET_SIZE: usize = 1200;
pub const DEFAULT_SERVER_PORT: u16 = 27015;
pub const DEFAULT_CLIENT_PORT: u16 = 27016;

const PLAYER_DATA_BITS: usize = 96;
const MESSAGE_MIN_BITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    ConnectPlayer = 0,
    DisconnectPlayer = 1,
    PlayerInput = 2,
    PlayerConnected = 3,
    PlayerDisconnected = 4,
    Snapshot = 5,
    AckReliableMaxWait = 6,
    AckReliableEveryPacket = 7,
}

impl MessageKind {
    /// Upper bound handed to the enum codec.
    pub const TOTAL: u32 = 8;

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::ConnectPlayer),
            1 => Some(Self::DisconnectPlayer),
            2 => Some(Self::PlayerInput),
            3 => Some(Self::PlayerConnected),
            4 => Some(Self::PlayerDisconnected),
            5 => Some(Self::Snapshot),
            6 => Some(Self::AckReliableMaxWait),
            7 => Some(Self::AckReliableEveryPacket),
            _ => None,
        }
    }

    pub fn reliability(self) -> Reliability {
        match self {
            Self::ConnectPlayer | Self::PlayerConnected => {
                Reliability::ReliableResendEveryPacketUntilAck
            }
            Self::DisconnectPlayer | Self::PlayerDisconnected => {
                Reliability::ReliableResendUntilAck
            }
            Self::PlayerInput
            | Self::Snapshot
            | Self::AckReliableMaxWait
            | Self::AckReliableEveryPacket => Reliability::Unreliable,
        }
    }

    pub fn is_from_server(self) -> bool {
        matches!(
            self,
            Self::PlayerConnected
                | Self::PlayerDisconnected
                | Self::Snapshot
                | Self::AckReliableMaxWait
                | Self::AckReliableEveryPacket
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reliability {
    Unreliable,
    ReliableResendUntilAck,
    ReliableResendEveryPacketUntilAck,
}

impl Reliability {
    pub fn is_reliable(self) -> bool {
        !matches!(self, Self::Unreliable)
    }
}

/// Identity of a reliable message for ack matching and dedup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey {
    pub message_id: i32,
    pub player_id: i32,
}

impl MessageKey {
    pub fn new(message_id: i32, player_id: i32) -> Self {
        Self {
            message_id,
            player_id,
        }
    }
}

bitflags::bitflags! {
    /// Input state of one tick, serialized as five bits in declaration order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PlayerInput: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const SHOOT = 1 << 4;
    }
}

impl PlayerInput {
    const WIRE_ORDER: [Self; 5] = [Self::UP, Self::DOWN, Self::LEFT, Self::RIGHT, Self::SHOOT];

    pub fn from_keys(up: bool, down: bool, left: bool, right: bool, shoot: bool) -> Self {
        let mut input = Self::empty();
        input.set(Self::UP, up);
        input.set(Self::DOWN, down);
        input.set(Self::LEFT, left);
        input.set(Self::RIGHT, right);
        input.set(Self::SHOOT, shoot);
        input
    }

    pub fn up(self) -> bool {
        self.contains(Self::UP)
    }

    pub fn down(self) -> bool {
        self.contains(Self::DOWN)
    }

    pub fn left(self) -> bool {
        self.contains(Self::LEFT)
    }

    pub fn right(self) -> bool {
        self.contains(Self::RIGHT)
    }

    pub fn shoot(self) -> bool {
        self.contains(Self::SHOOT)
    }

    pub fn encode(self, buffer: &mut BitBuffer) {
        for flag in Self::WIRE_ORDER {
            buffer.put_bit(self.contains(flag));
        }
    }

    pub fn decode(buffer: &mut BitBuffer) -> Result<Self, PacketError> {
        let mut input = Self::empty();
        for flag in Self::WIRE_ORDER {
            input.set(flag, buffer.get_bit()?);
        }
        Ok(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerData {
    pub player_id: i32,
    pub position: Vec2,
}

impl PlayerData {
    pub fn new(player_id: i32, position: Vec2) -> Self {
        Self {
            player_id,
            position,
        }
    }

    pub fn encode(&self, buffer: &mut BitBuffer) {
        buffer.put_int(self.player_id);
        buffer.put_float(self.position.x);
        buffer.put_float(self.position.y);
    }

    pub fn decode(buffer: &mut BitBuffer) -> Result<Self, PacketError> {
        let player_id = buffer.get_int()?;
        let x = buffer.get_float()?;
        let y = buffer.get_float()?;
        Ok(Self::new(player_id, Vec2::new(x, y)))
    }
}

/// Authoritative world state at one server tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameData {
    pub time: f32,
    pub players: Vec<PlayerData>,
}

impl GameData {
    pub fn new(time: f32) -> Self {
        Self {
            time,
            players: Vec::new(),
        }
    }

    pub fn with_players(time: f32, players: Vec<PlayerData>) -> Self {
        Self { time, players }
    }

    pub fn player(&self, player_id: i32) -> Option<&PlayerData> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn encode(&self, buffer: &mut BitBuffer) {
        buffer.put_float(self.time);
        buffer.put_int(self.players.len() as i32);
        for player in &self.players {
            player.encode(buffer);
        }
    }

    pub fn decode(buffer: &mut BitBuffer) -> Result<Self, PacketError> {
        let time = buffer.get_float()?;
        let count = buffer.get_count(PLAYER_DATA_BITS)?;
        let mut players = Vec::with_capacity(count);
        for _ in 0..count {
            players.push(PlayerData::decode(buffer)?);
        }
        Ok(Self { time, players })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    ConnectPlayer { message_id: i32, player_id: i32 },
    DisconnectPlayer { message_id: i32, player_id: i32 },
    PlayerInput { player_id: i32, input: PlayerInput },
    PlayerConnected { message_id: i32, player_id: i32 },
    PlayerDisconnected { message_id: i32, player_id: i32 },
    Snapshot(GameData),
    AckReliableMaxWait { message_id: i32, player_id: i32 },
    AckReliableEveryPacket { message_id: i32, player_id: i32 },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::ConnectPlayer { .. } => MessageKind::ConnectPlayer,
            Self::DisconnectPlayer { .. } => MessageKind::DisconnectPlayer,
            Self::PlayerInput { .. } => MessageKind::PlayerInput,
            Self::PlayerConnected { .. } => MessageKind::PlayerConnected,
            Self::PlayerDisconnected { .. } => MessageKind::PlayerDisconnected,
            Self::Snapshot(_) => MessageKind::Snapshot,
            Self::AckReliableMaxWait { .. } => MessageKind::AckReliableMaxWait,
            Self::AckReliableEveryPacket { .. } => MessageKind::AckReliableEveryPacket,
        }
    }

    pub fn reliability(&self) -> Reliability {
        self.kind().reliability()
    }

    /// The (message id, player id) pair for messages that carry one.
    pub fn key(&self) -> Option<MessageKey> {
        match *self {
            Self::ConnectPlayer {
                message_id,
                player_id,
            }
            | Self::DisconnectPlayer {
                message_id,
                player_id,
            }
            | Self::PlayerConnected {
                message_id,
                player_id,
            }
            | Self::PlayerDisconnected {
                message_id,
                player_id,
            }
            | Self::AckReliableMaxWait {
                message_id,
                player_id,
            }
            | Self::AckReliableEveryPacket {
                message_id,
                player_id,
            } => Some(MessageKey::new(message_id, player_id)),
            Self::PlayerInput { .. } | Self::Snapshot(_) => None,
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(
            self,
            Self::AckReliableMaxWait { .. } | Self::AckReliableEveryPacket { .. }
        )
    }

    /// The ack a receiver answers with, `None` for unreliable messages.
    pub fn ack(&self) -> Option<Message> {
        let key = self.key()?;
        match self.reliability() {
            Reliability::Unreliable => None,
            Reliability::ReliableResendUntilAck => Some(Self::AckReliableMaxWait {
                message_id: key.message_id,
                player_id: key.player_id,
            }),
            Reliability::ReliableResendEveryPacketUntilAck => Some(Self::AckReliableEveryPacket {
                message_id: key.message_id,
                player_id: key.player_id,
            }),
        }
    }

    pub fn encode(&self, buffer: &mut BitBuffer) {
        buffer.put_enum(self.kind() as u32, MessageKind::TOTAL);
        match self {
            Self::ConnectPlayer {
                message_id,
                player_id,
            }
            | Self::DisconnectPlayer {
                message_id,
                player_id,
            }
            | Self::PlayerConnected {
                message_id,
                player_id,
            }
            | Self::PlayerDisconnected {
                message_id,
                player_id,
            }
            | Self::AckReliableMaxWait {
                message_id,
                player_id,
            }
            | Self::AckReliableEveryPacket {
                message_id,
                player_id,
            } => {
                buffer.put_int(*message_id);
                buffer.put_int(*player_id);
            }
            Self::PlayerInput { player_id, input } => {
                buffer.put_int(*player_id);
                input.encode(buffer);
            }
            Self::Snapshot(data) => data.encode(buffer),
        }
    }

    pub fn decode(buffer: &mut BitBuffer) -> Result<Self, PacketError> {
        let tag = buffer.get_enum(MessageKind::TOTAL)?;
        let kind = MessageKind::from_tag(tag).ok_or(PacketError::TagOutOfRange {
            value: tag,
            max: MessageKind::TOTAL,
        })?;

        let message = match kind {
            MessageKind::PlayerInput => {
                let player_id = buffer.get_int()?;
                let input = PlayerInput::decode(buffer)?;
                Self::PlayerInput { player_id, input }
            }
            MessageKind::Snapshot => Self::Snapshot(GameData::decode(buffer)?),
            MessageKind::ConnectPlayer => {
                let (message_id, player_id) = decode_key(buffer)?;
                Self::ConnectPlayer {
                    message_id,
                    player_id,
                }
            }
            MessageKind::DisconnectPlayer => {
                let (message_id, player_id) = decode_key(buffer)?;
                Self::DisconnectPlayer {
                    message_id,
                    player_id,
                }
            }
            MessageKind::PlayerConnected => {
                let (message_id, player_id) = decode_key(buffer)?;
                Self::PlayerConnected {
                    message_id,
                    player_id,
                }
            }
            MessageKind::PlayerDisconnected => {
                let (message_id, player_id) = decode_key(buffer)?;
                Self::PlayerDisconnected {
                    message_id,
                    player_id,
                }
            }
            MessageKind::AckReliableMaxWait => {
                let (message_id, player_id) = decode_key(buffer)?;
                Self::AckReliableMaxWait {
                    message_id,
                    player_id,
                }
            }
            MessageKind::AckReliableEveryPacket => {
                let (message_id, player_id) = decode_key(buffer)?;
                Self::AckReliableEveryPacket {
                    message_id,
                    player_id,
                }
            }
        };

        Ok(message)
    }

    /// Decodes one message and keeps it only if the server may send it.
    pub fn decode_from_server(buffer: &mut BitBuffer) -> Result<Option<Self>, PacketError> {
        let message = Self::decode(buffer)?;
        if message.kind().is_from_server() {
            Ok(Some(message))
        } else {
            log::trace!("dropping {:?}: not a server message", message.kind());
            Ok(None)
        }
    }
}

// (message id, player id) in wire order.
fn decode_key(buffer: &mut BitBuffer) -> Result<(i32, i32), PacketError> {
    let message_id = buffer.get_int()?;
    let player_id = buffer.get_int()?;
    Ok((message_id, player_id))
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Packet {
    pub messages: Vec<Message>,
}

impl Packet {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = BitBuffer::with_capacity(64);
        buffer.put_int(self.messages.len() as i32);
        for message in &self.messages {
            message.encode(&mut buffer);
        }
        buffer.into_bytes()
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        let mut buffer = BitBuffer::from_bytes(data);
        let count = buffer.get_count(MESSAGE_MIN_BITS)?;
        let mut messages = Vec::with_capacity(count);
        for _ in 0..count {
            messages.push(Message::decode(&mut buffer)?);
        }
        Ok(Self { messages })
    }

    /// Like [`Packet::decode`], but drops messages only a client may send.
    /// Fails as a whole: no message is returned from a malformed packet.
    pub fn decode_from_server(data: &[u8]) -> Result<Vec<Message>, PacketError> {
        let mut buffer = BitBuffer::from_bytes(data);
        let count = buffer.get_count(MESSAGE_MIN_BITS)?;
        let mut messages = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(message) = Message::decode_from_server(&mut buffer)? {
                messages.push(message);
            }
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(message: Message) {
        let mut buffer = BitBuffer::new();
        message.encode(&mut buffer);
        let mut reader = BitBuffer::from_bytes(buffer.as_bytes());
        assert_eq!(Message::decode(&mut reader).unwrap(), message);
    }

    #[test]
    fn test_message_roundtrip_boundaries() {
        roundtrip(Message::ConnectPlayer {
            message_id: 0,
            player_id: i32::MAX,
        });
        roundtrip(Message::DisconnectPlayer {
            message_id: i32::MAX,
            player_id: 0,
        });
        roundtrip(Message::PlayerInput {
            player_id: 3,
            input: PlayerInput::UP | PlayerInput::SHOOT,
        });
        roundtrip(Message::PlayerConnected {
            message_id: 17,
            player_id: -1,
        });
        roundtrip(Message::Snapshot(GameData::new(0.0)));
        roundtrip(Message::Snapshot(GameData::with_players(
            12.75,
            vec![
                PlayerData::new(1, Vec2::new(-3.5, 8.0)),
                PlayerData::new(2, Vec2::new(f32::MAX, f32::MIN)),
            ],
        )));
        roundtrip(Message::AckReliableEveryPacket {
            message_id: 99,
            player_id: 4,
        });
    }

    #[test]
    fn test_every_tag_decodes_to_its_kind() {
        for tag in 0..MessageKind::TOTAL {
            let mut buffer = BitBuffer::new();
            buffer.put_enum(tag, MessageKind::TOTAL);
            buffer.put_int(21);
            buffer.put_int(0);

            let mut reader = BitBuffer::from_bytes(buffer.as_bytes());
            let message = Message::decode(&mut reader).unwrap();
            let kind = MessageKind::from_tag(tag).unwrap();
            assert_eq!(message.kind(), kind);

            match kind {
                MessageKind::PlayerInput | MessageKind::Snapshot => assert!(message.key().is_none()),
                _ => assert_eq!(message.key(), Some(MessageKey::new(21, 0))),
            }
        }
    }

    #[test]
    fn test_wire_layout() {
        let mut buffer = BitBuffer::new();
        Message::ConnectPlayer {
            message_id: 1,
            player_id: 2,
        }
        .encode(&mut buffer);

        // 3-bit tag then two 32-bit ints
        assert_eq!(buffer.bits_written(), 3 + 64);
        let mut reader = BitBuffer::from_bytes(buffer.as_bytes());
        assert_eq!(reader.get_enum(MessageKind::TOTAL).unwrap(), 0);
        assert_eq!(reader.get_int().unwrap(), 1);
        assert_eq!(reader.get_int().unwrap(), 2);
    }

    #[test]
    fn test_input_bit_order() {
        let input = PlayerInput::from_keys(true, false, false, true, false);
        assert!(input.up() && input.right());
        assert!(!input.down() && !input.left() && !input.shoot());

        let mut buffer = BitBuffer::new();
        input.encode(&mut buffer);
        assert_eq!(buffer.as_bytes(), &[0b0000_1001]);
    }

    #[test]
    fn test_packet_roundtrip_preserves_order() {
        let messages: Vec<Message> = (0..200)
            .map(|i| match i % 3 {
                0 => Message::PlayerInput {
                    player_id: i,
                    input: PlayerInput::LEFT,
                },
                1 => Message::PlayerDisconnected {
                    message_id: i * 7,
                    player_id: i,
                },
                _ => Message::Snapshot(GameData::with_players(
                    i as f32,
                    vec![PlayerData::new(i, Vec2::splat(i as f32))],
                )),
            })
            .collect();

        let packet = Packet::new(messages);
        let decoded = Packet::decode(&packet.encode()).unwrap();
        assert_eq!(decoded, packet);

        let empty = Packet::default();
        assert_eq!(Packet::decode(&empty.encode()).unwrap().messages.len(), 0);
    }

    #[test]
    fn test_server_decode_drops_client_messages() {
        let packet = Packet::new(vec![
            Message::ConnectPlayer {
                message_id: 5,
                player_id: 1,
            },
            Message::PlayerConnected {
                message_id: 6,
                player_id: 1,
            },
            Message::PlayerInput {
                player_id: 1,
                input: PlayerInput::DOWN,
            },
            Message::Snapshot(GameData::new(1.0)),
        ]);

        let messages = Packet::decode_from_server(&packet.encode()).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind(), MessageKind::PlayerConnected);
        assert_eq!(messages[1].kind(), MessageKind::Snapshot);
    }

    #[test]
    fn test_truncated_packet_is_malformed() {
        let packet = Packet::new(vec![
            Message::PlayerConnected {
                message_id: 6,
                player_id: 1,
            },
            Message::Snapshot(GameData::with_players(
                1.0,
                vec![PlayerData::new(1, Vec2::ONE)],
            )),
        ]);
        let data = packet.encode();

        let result = Packet::decode_from_server(&data[..data.len() - 4]);
        assert!(matches!(result, Err(PacketError::Underrun { .. })));
    }

    #[test]
    fn test_ack_kind_follows_reliability() {
        let connected = Message::PlayerConnected {
            message_id: 10,
            player_id: 2,
        };
        assert_eq!(
            connected.ack(),
            Some(Message::AckReliableEveryPacket {
                message_id: 10,
                player_id: 2
            })
        );

        let disconnected = Message::PlayerDisconnected {
            message_id: 11,
            player_id: 2,
        };
        assert_eq!(
            disconnected.ack(),
            Some(Message::AckReliableMaxWait {
                message_id: 11,
                player_id: 2
            })
        );

        assert!(Message::Snapshot(GameData::new(0.0)).ack().is_none());
        assert!(connected.ack().unwrap().ack().is_none());
    }
}
