use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::net::GameData;

use super::interpolation::interpolate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Buffer occupancy the playback speed controller steers toward.
    pub desired_buffer_length: usize,
    /// Seconds playback may trail the newest snapshot before it resyncs.
    pub max_snapshot_lag: f64,
    pub max_speed_factor: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            desired_buffer_length: 3,
            max_snapshot_lag: 0.5,
            max_speed_factor: 1.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InterpolationStats {
    pub buffer_size: usize,
    pub simulation_time: f64,
    pub playback_speed: f64,
    pub start_time: Option<f64>,
    pub resyncs: u64,
}

/// Dejitter buffer: snapshots sorted by server time, played back on a local
/// clock whose speed tracks the desired buffer occupancy.
#[derive(Debug)]
pub struct SnapshotBuffer {
    config: InterpolationConfig,
    snapshots: VecDeque<GameData>,
    start_time: Option<f64>,
    simulation_time: f64,
    playback_speed: f64,
    resyncs: u64,
}

impl Default for SnapshotBuffer {
    fn default() -> Self {
        Self::new(InterpolationConfig::default())
    }
}

impl SnapshotBuffer {
    pub fn new(config: InterpolationConfig) -> Self {
        Self {
            config,
            snapshots: VecDeque::new(),
            start_time: None,
            simulation_time: 0.0,
            playback_speed: 1.0,
            resyncs: 0,
        }
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Appends `snapshot` if its time is finite and newer than the last one
    /// buffered. The first snapshot accepted latches the playback start time.
    pub fn push(&mut self, snapshot: GameData) -> bool {
        if !snapshot.time.is_finite() {
            log::debug!("discarding snapshot with time {}", snapshot.time);
            return false;
        }

        if let Some(last) = self.snapshots.back() {
            if !(snapshot.time > last.time) {
                log::debug!(
                    "discarding stale snapshot at {} (last {})",
                    snapshot.time,
                    last.time
                );
                return false;
            }
        }

        if self.start_time.is_none() {
            self.start_time = Some(snapshot.time as f64);
        }

        self.snapshots.push_back(snapshot);
        true
    }

    /// Runs one playback tick and returns the interpolated world, or `None`
    /// when there is nothing to interpolate between yet.
    pub fn advance(&mut self, delta_time: f64) -> Option<GameData> {
        let start_time = self.start_time?;

        self.update_speed();
        self.simulation_time += delta_time * self.playback_speed;
        self.remove_old_snapshots();
        self.update_speed();

        if self.snapshots.len() < 2 {
            return None;
        }

        let last = self.snapshots.back()?;
        let last_relative = last.time as f64 - start_time;
        let lag = last_relative - self.simulation_time;

        if lag > self.config.max_snapshot_lag {
            log::debug!(
                "playback {:.3}s behind newest snapshot, resyncing",
                lag
            );
            self.simulation_time = last_relative;
            self.resyncs += 1;
            return Some(interpolate(last, last, start_time, self.simulation_time));
        }

        Some(interpolate(
            &self.snapshots[0],
            &self.snapshots[1],
            start_time,
            self.simulation_time,
        ))
    }

    /// Nudges playback speed toward keeping `desired_buffer_length` snapshots
    /// buffered. The step shrinks as occupancy nears the target. Speed stays
    /// within `[1 / max_speed_factor, max_speed_factor]`, bounds included.
    pub fn update_speed(&mut self) {
        let len = self.snapshots.len() as f64;
        let target = self.config.desired_buffer_length as f64;
        // A factor below 1 (or NaN) would invert the clamp range.
        let max = self.config.max_speed_factor.max(1.0);

        let normal = 1.0 - 1.0 / ((target - len).abs() + 1.0);
        let factor = (max - 1.0) * normal + 1.0;

        self.playback_speed = if len < target {
            if self.playback_speed > 1.0 {
                1.0 / factor
            } else {
                self.playback_speed / factor
            }
        } else if len > target {
            if self.playback_speed < 1.0 {
                factor
            } else {
                self.playback_speed * factor
            }
        } else {
            1.0
        };

        self.playback_speed = self.playback_speed.clamp(1.0 / max, max);
    }

    // Keeps the newest snapshot at or before playback as the lower bound.
    fn remove_old_snapshots(&mut self) {
        let Some(start_time) = self.start_time else {
            return;
        };

        while self.snapshots.len() >= 2
            && (self.snapshots[1].time as f64 - start_time) < self.simulation_time
        {
            self.snapshots.pop_front();
        }
    }

    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.start_time = None;
        self.simulation_time = 0.0;
        self.playback_speed = 1.0;
    }

    pub fn relative_time(&self, snapshot: &GameData) -> Option<f64> {
        self.start_time.map(|start| snapshot.time as f64 - start)
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    pub fn playback_speed(&self) -> f64 {
        self.playback_speed
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &GameData> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn debug_stats(&self) -> InterpolationStats {
        InterpolationStats {
            buffer_size: self.snapshots.len(),
            simulation_time: self.simulation_time,
            playback_speed: self.playback_speed,
            start_time: self.start_time,
            resyncs: self.resyncs,
        }
    }
}
