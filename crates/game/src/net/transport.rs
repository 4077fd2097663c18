use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use super::stats::NetworkStats;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    #[error("packet of {size} bytes exceeds MTU of {max}")]
    PacketTooLarge { size: usize, max: usize },
    #[error("channel closed")]
    Closed,
}

/// Unreliable datagram link to one fixed remote endpoint.
pub trait Channel {
    fn send(&mut self, data: &[u8]) -> Result<(), ChannelError>;

    /// Non-blocking; `Ok(None)` when nothing is queued.
    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, ChannelError>;

    fn close(&mut self);
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        (**self).send(data)
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, ChannelError> {
        (**self).try_receive()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

type Queue = Rc<RefCell<VecDeque<Vec<u8>>>>;

/// In-process endpoint; see [`MemoryChannel::pair`].
#[derive(Debug)]
pub struct MemoryChannel {
    inbound: Queue,
    outbound: Queue,
    closed: bool,
    stats: NetworkStats,
}

impl MemoryChannel {
    pub fn pair() -> (Self, Self) {
        let a_to_b: Queue = Rc::default();
        let b_to_a: Queue = Rc::default();

        let a = Self {
            inbound: Rc::clone(&b_to_a),
            outbound: Rc::clone(&a_to_b),
            closed: false,
            stats: NetworkStats::default(),
        };
        let b = Self {
            inbound: a_to_b,
            outbound: b_to_a,
            closed: false,
            stats: NetworkStats::default(),
        };
        (a, b)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn queued(&self) -> usize {
        self.inbound.borrow().len()
    }
}

impl Channel for MemoryChannel {
    fn send(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.outbound.borrow_mut().push_back(data.to_vec());
        self.stats.record_sent(data.len());
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        let packet = self.inbound.borrow_mut().pop_front();
        if let Some(data) = &packet {
            self.stats.record_received(data.len());
        }
        Ok(packet)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
