use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use super::stats::PacketLossSimulation;
use super::transport::{Channel, ChannelError};

#[derive(Debug)]
struct DelayedPacket {
    release_time: Instant,
    order: u64,
    data: Vec<u8>,
}

impl PartialEq for DelayedPacket {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DelayedPacket {}

impl PartialOrd for DelayedPacket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedPacket {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .release_time
            .cmp(&self.release_time)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Wraps a channel and applies loss, latency and jitter to inbound packets.
/// Jitter can reorder packets, which is what the snapshot buffer is for.
pub struct SimulatedChannel<C> {
    inner: C,
    config: PacketLossSimulation,
    inbound_queue: BinaryHeap<DelayedPacket>,
    next_order: u64,
    dropped: u64,
}

impl<C: Channel> SimulatedChannel<C> {
    pub fn new(inner: C, config: PacketLossSimulation) -> Self {
        Self {
            inner,
            config,
            inbound_queue: BinaryHeap::new(),
            next_order: 0,
            dropped: 0,
        }
    }

    pub fn config(&self) -> &PacketLossSimulation {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn in_flight(&self) -> usize {
        self.inbound_queue.len()
    }

    fn pull_inner(&mut self) -> Result<(), ChannelError> {
        while let Some(data) = self.inner.try_receive()? {
            if self.config.should_drop() {
                self.dropped += 1;
                continue;
            }

            let delay = Duration::from_millis(self.config.delay_ms() as u64);
            self.inbound_queue.push(DelayedPacket {
                release_time: Instant::now() + delay,
                order: self.next_order,
                data,
            });
            self.next_order += 1;
        }
        Ok(())
    }
}

impl<C: Channel> Channel for SimulatedChannel<C> {
    fn send(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        self.inner.send(data)
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, ChannelError> {
        self.pull_inner()?;

        let now = Instant::now();
        match self.inbound_queue.peek() {
            Some(delayed) if delayed.release_time <= now => {
                Ok(self.inbound_queue.pop().map(|delayed| delayed.data))
            }
            _ => Ok(None),
        }
    }

    fn close(&mut self) {
        self.inbound_queue.clear();
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::transport::MemoryChannel;

    #[test]
    fn test_disabled_passes_through_in_order() {
        let (mut server, client) = MemoryChannel::pair();
        let mut channel = SimulatedChannel::new(client, PacketLossSimulation::default());

        server.send(&[1]).unwrap();
        server.send(&[2]).unwrap();
        server.send(&[3]).unwrap();

        assert_eq!(channel.try_receive().unwrap(), Some(vec![1]));
        assert_eq!(channel.try_receive().unwrap(), Some(vec![2]));
        assert_eq!(channel.try_receive().unwrap(), Some(vec![3]));
        assert_eq!(channel.try_receive().unwrap(), None);
    }

    #[test]
    fn test_total_loss_drops_everything() {
        let (mut server, client) = MemoryChannel::pair();
        let mut channel = SimulatedChannel::new(
            client,
            PacketLossSimulation {
                enabled: true,
                loss_percent: 100.0,
                ..Default::default()
            },
        );

        for i in 0..10 {
            server.send(&[i]).unwrap();
        }

        assert_eq!(channel.try_receive().unwrap(), None);
        assert_eq!(channel.dropped(), 10);
    }

    #[test]
    fn test_latency_holds_packets() {
        let (mut server, client) = MemoryChannel::pair();
        let mut channel = SimulatedChannel::new(
            client,
            PacketLossSimulation {
                enabled: true,
                min_latency_ms: 60_000,
                max_latency_ms: 60_000,
                ..Default::default()
            },
        );

        server.send(&[1]).unwrap();
        assert_eq!(channel.try_receive().unwrap(), None);
        assert_eq!(channel.in_flight(), 1);
    }

    #[test]
    fn test_send_goes_straight_through() {
        let (mut server, client) = MemoryChannel::pair();
        let mut channel = SimulatedChannel::new(client, PacketLossSimulation::default());

        channel.send(&[9]).unwrap();
        assert_eq!(server.try_receive().unwrap(), Some(vec![9]));
    }
}
