//! Engine tuning knobs.
//!
//! ```no_run
//! use hpv::config::EngineOptions;
//!
//! let mut opts = EngineOptions::from_json_file("hpv.json")?;
//! opts.resume_on_speed_change = false;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::time::Duration;

/// Default synchronous seek wait.
pub const DEFAULT_SEEK_TIMEOUT_MS: u64 = 100;
/// Smallest accepted |speed|.
pub const DEFAULT_SPEED_EPSILON:   f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// How long a control call waits for the decode thread to finish a seek.
    pub seek_timeout_ms:        u64,
    /// Nap length of the decode thread while not playing.
    pub idle_interval_us:       u64,
    /// Longest nap while waiting for the next frame to become due.
    pub poll_interval_us:       u64,
    /// The decode thread wakes this long before the next frame is due.
    pub wake_margin_us:         u64,
    pub speed_epsilon:          f64,
    pub gather_stats:           bool,
    /// `set_speed` on a paused stream resumes it.
    pub resume_on_speed_change: bool,
    /// On a loop-in/loop-out conflict the other bound moves by this fraction
    /// of the frame range.
    pub loop_margin_fraction:   f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            seek_timeout_ms:        DEFAULT_SEEK_TIMEOUT_MS,
            idle_interval_us:       1_000,
            poll_interval_us:       250,
            wake_margin_us:         1_000,
            speed_epsilon:          DEFAULT_SPEED_EPSILON,
            gather_stats:           true,
            resume_on_speed_change: true,
            loop_margin_fraction:   0.1,
        }
    }
}

impl EngineOptions {
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn seek_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_timeout_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_micros(self.idle_interval_us)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    pub fn wake_margin(&self) -> Duration {
        Duration::from_micros(self.wake_margin_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = EngineOptions::from_json(br#"{ "seek_timeout_ms": 250, "gather_stats": false }"#).unwrap();
        assert_eq!(opts.seek_timeout(), Duration::from_millis(250));
        assert!(!opts.gather_stats);
        assert_eq!(opts.speed_epsilon, DEFAULT_SPEED_EPSILON);
        assert!(opts.resume_on_speed_change);
    }

    #[test]
    fn json_roundtrip() {
        let mut opts = EngineOptions::default();
        opts.loop_margin_fraction = 0.25;
        let bytes = opts.to_json().unwrap();
        assert_eq!(EngineOptions::from_json(&bytes).unwrap(), opts);
    }
}
