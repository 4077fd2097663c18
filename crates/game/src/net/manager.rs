use std::collections::VecDeque;

use super::codec::PacketError;
use super::protocol::{Message, Packet};
use super::tracking::{AckTracker, ReceiveTracker};

#[derive(Debug, Clone)]
pub struct ReliabilityConfig {
    /// Builds between resends of a `ReliableResendUntilAck` message.
    pub resend_interval: u32,
    pub max_recent_received: usize,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            resend_interval: 1,
            max_recent_received: 1024,
        }
    }
}

/// Outbound queue, reliability bookkeeping and inbound delivery for one
/// endpoint. One packet out per [`build_packet`](Self::build_packet), any
/// number of messages in per received packet.
#[derive(Debug)]
pub struct CommunicationManager {
    config: ReliabilityConfig,
    outbound: VecDeque<Message>,
    inbound: VecDeque<Message>,
    ack_tracker: AckTracker,
    receive_tracker: ReceiveTracker,
    build_count: u64,
}

impl Default for CommunicationManager {
    fn default() -> Self {
        Self::new(ReliabilityConfig::default())
    }
}

impl CommunicationManager {
    pub fn new(config: ReliabilityConfig) -> Self {
        Self {
            receive_tracker: ReceiveTracker::new(config.max_recent_received),
            outbound: VecDeque::new(),
            inbound: VecDeque::new(),
            ack_tracker: AckTracker::new(),
            build_count: 0,
            config,
        }
    }

    pub fn send(&mut self, message: Message) {
        if message.reliability().is_reliable() {
            if let Some(key) = message.key() {
                self.ack_tracker.track(key, message.clone());
            }
        }
        self.outbound.push_back(message);
    }

    pub fn receive(&mut self, message: Message) {
        if message.is_ack() {
            if let Some(key) = message.key() {
                if self.ack_tracker.process_ack(key) {
                    log::trace!("message {:?} acknowledged", key);
                } else {
                    log::trace!("ack for {:?} matches nothing pending", key);
                }
            }
            return;
        }

        if let Some(ack) = message.ack() {
            self.outbound.push_back(ack);

            if let Some(key) = message.key() {
                if !self.receive_tracker.record_received(key) {
                    log::trace!("duplicate {:?} {:?} re-acked", message.kind(), key);
                    return;
                }
            }
        }

        self.inbound.push_back(message);
    }

    /// Decodes a server packet and receives each message in order. A malformed
    /// packet is rejected whole, nothing from it is delivered.
    pub fn receive_packet(&mut self, data: &[u8]) -> Result<usize, PacketError> {
        let messages = Packet::decode_from_server(data)?;
        let count = messages.len();
        for message in messages {
            self.receive(message);
        }
        Ok(count)
    }

    pub fn build_packet(&mut self) -> Option<Vec<u8>> {
        self.build_count += 1;
        let build = self.build_count;

        let mut messages: Vec<Message> = self.outbound.drain(..).collect();
        for message in &messages {
            if message.reliability().is_reliable() {
                if let Some(key) = message.key() {
                    self.ack_tracker.mark_sent(key, build);
                }
            }
        }

        messages.extend(
            self.ack_tracker
                .collect_resends(build, self.config.resend_interval),
        );

        if messages.is_empty() {
            return None;
        }

        Some(Packet::new(messages).encode())
    }

    pub fn get_message(&mut self) -> Option<Message> {
        self.inbound.pop_front()
    }

    pub fn has_message(&self) -> bool {
        !self.inbound.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.ack_tracker.len()
    }

}
