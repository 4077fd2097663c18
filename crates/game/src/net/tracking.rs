use std::collections::{HashSet, VecDeque};

use super::protocol::{Message, MessageKey, Reliability};

#[derive(Debug, Clone)]
struct PendingMessage {
    key: MessageKey,
    message: Message,
    reliability: Reliability,
    /// Build number of the last packet that carried this message.
    last_sent_build: Option<u64>,
}

/// Reliable messages sent but not yet acknowledged, in send order.
#[derive(Debug, Default)]
pub struct AckTracker {
    pending: VecDeque<PendingMessage>,
}

impl AckTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, key: MessageKey, message: Message) {
        let reliability = message.reliability();
        let entry = PendingMessage {
            key,
            message,
            reliability,
            last_sent_build: None,
        };

        if let Some(existing) = self.pending.iter_mut().find(|p| p.key == key) {
            *existing = entry;
        } else {
            self.pending.push_back(entry);
        }
    }

    /// Returns false when nothing was pending under `key`.
    pub fn process_ack(&mut self, key: MessageKey) -> bool {
        match self.pending.iter().position(|p| p.key == key) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn mark_sent(&mut self, key: MessageKey, build: u64) {
        if let Some(pending) = self.pending.iter_mut().find(|p| p.key == key) {
            pending.last_sent_build = Some(build);
        }
    }

    /// Collects the messages due for resend in `build` and marks them sent.
    pub fn collect_resends(&mut self, build: u64, resend_interval: u32) -> Vec<Message> {
        let mut resends = Vec::new();

        for pending in &mut self.pending {
            let due = match (pending.reliability, pending.last_sent_build) {
                (_, Some(last)) if last == build => false,
                (_, None) => true,
                (Reliability::ReliableResendEveryPacketUntilAck, _) => true,
                (_, Some(last)) => build - last >= u64::from(resend_interval.max(1)),
            };

            if due {
                pending.last_sent_build = Some(build);
                resends.push(pending.message.clone());
            }
        }

        resends
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Bounded window of recently delivered reliable keys.
#[derive(Debug)]
pub struct ReceiveTracker {
    recent: VecDeque<MessageKey>,
    seen: HashSet<MessageKey>,
    max_recent: usize,
}

impl Default for ReceiveTracker {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl ReceiveTracker {
    pub fn new(max_recent: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(max_recent),
            seen: HashSet::with_capacity(max_recent),
            max_recent: max_recent.max(1),
        }
    }

    /// Returns false if `key` was already delivered.
    pub fn record_received(&mut self, key: MessageKey) -> bool {
        if self.seen.contains(&key) {
            return false;
        }

        if self.recent.len() >= self.max_recent {
            if let Some(oldest) = self.recent.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.recent.push_back(key);
        self.seen.insert(key);

        true
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(message_id: i32) -> Message {
        Message::ConnectPlayer {
            message_id,
            player_id: 1,
        }
    }

    fn disconnect(message_id: i32) -> Message {
        Message::DisconnectPlayer {
            message_id,
            player_id: 1,
        }
    }

    #[test]
    fn test_duplicate_detection() {
        let mut tracker = ReceiveTracker::new(8);

        assert!(tracker.record_received(MessageKey::new(1, 1)));
        assert!(!tracker.record_received(MessageKey::new(1, 1)));
        assert!(tracker.record_received(MessageKey::new(1, 2)));
    }

    #[test]
    fn test_receive_window_forgets_oldest() {
        let mut tracker = ReceiveTracker::new(2);

        tracker.record_received(MessageKey::new(1, 0));
        tracker.record_received(MessageKey::new(2, 0));
        tracker.record_received(MessageKey::new(3, 0));

        assert_eq!(tracker.len(), 2);
        assert!(tracker.record_received(MessageKey::new(1, 0)));
        assert!(!tracker.record_received(MessageKey::new(3, 0)));
    }

    #[test]
    fn test_ack_removes_pending() {
        let mut tracker = AckTracker::new();
        tracker.track(MessageKey::new(4, 1), connect(4));

        assert!(!tracker.process_ack(MessageKey::new(4, 2)));
        assert!(tracker.process_ack(MessageKey::new(4, 1)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_resend_interval() {
        let mut tracker = AckTracker::new();
        tracker.track(MessageKey::new(1, 1), connect(1));
        tracker.track(MessageKey::new(2, 1), disconnect(2));
        tracker.mark_sent(MessageKey::new(1, 1), 1);
        tracker.mark_sent(MessageKey::new(2, 1), 1);

        assert_eq!(tracker.collect_resends(2, 3), vec![connect(1)]);
        assert_eq!(tracker.collect_resends(3, 3), vec![connect(1)]);
        assert_eq!(tracker.collect_resends(4, 3), vec![connect(1), disconnect(2)]);
        assert_eq!(tracker.collect_resends(4, 3), Vec::<Message>::new());
    }
}
