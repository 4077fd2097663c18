use std::collections::VecDeque;
use std::time::Instant;

const SAMPLE_COUNT: usize = 60;

/// Measured tick rate over the last [`SAMPLE_COUNT`] ticks.
pub struct TickStats {
    tick_times: VecDeque<Instant>,
    tick_rate: f32,
    ticks: u64,
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TickStats {
    pub fn new() -> Self {
        Self {
            tick_times: VecDeque::with_capacity(SAMPLE_COUNT),
            tick_rate: 0.0,
            ticks: 0,
        }
    }

    pub fn record_tick(&mut self) {
        self.record_tick_at(Instant::now());
    }

    fn record_tick_at(&mut self, now: Instant) {
        self.ticks += 1;

        if self.tick_times.len() >= SAMPLE_COUNT {
            self.tick_times.pop_front();
        }
        self.tick_times.push_back(now);

        if let Some(oldest) = self.tick_times.front() {
            let elapsed = now.duration_since(*oldest).as_secs_f32();
            if elapsed > 0.0 {
                self.tick_rate = (self.tick_times.len() - 1) as f32 / elapsed;
            }
        }
    }

    pub fn tick_rate(&self) -> f32 {
        self.tick_rate
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_tick_rate() {
        let mut stats = TickStats::new();
        let start = Instant::now();

        for i in 0..11 {
            stats.record_tick_at(start + Duration::from_millis(i * 100));
        }

        assert_eq!(stats.ticks(), 11);
        assert!((stats.tick_rate() - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut stats = TickStats::new();
        let start = Instant::now();

        for i in 0..(SAMPLE_COUNT as u64 * 2) {
            stats.record_tick_at(start + Duration::from_millis(i * 10));
        }

        assert_eq!(stats.tick_times.len(), SAMPLE_COUNT);
        assert!((stats.tick_rate() - 100.0).abs() < 0.5);
    }
}
