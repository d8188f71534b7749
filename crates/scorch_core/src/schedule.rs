//! Declared dwell durations between match phases.
//!
//! The host's frame loop drives the engine through [`crate::duel::Duel::tick`];
//! these timers decide when a landed shell is resolved and when a CPU
//! combatant pulls the trigger.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Dwell tuning in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Pause between a terrain or combatant impact and its resolution.
    pub impact_dwell_ms: u64,
    /// Pause between a miss and its resolution.
    pub miss_dwell_ms: u64,
    /// Pause before a CPU combatant fires.
    pub cpu_think_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            impact_dwell_ms: 500,
            miss_dwell_ms: 200,
            cpu_think_ms: 1000,
        }
    }
}

impl ScheduleConfig {
    /// Dwell after an impact (`hit`) or a miss.
    #[must_use]
    pub fn dwell(&self, hit: bool) -> Duration {
        Duration::from_millis(if hit {
            self.impact_dwell_ms
        } else {
            self.miss_dwell_ms
        })
    }

    /// Think time before a CPU shot.
    #[must_use]
    pub fn cpu_think(&self) -> Duration {
        Duration::from_millis(self.cpu_think_ms)
    }
}

/// One-shot countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimer {
    remaining: Duration,
}

impl PhaseTimer {
    /// A timer that expires after `duration`.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            remaining: duration,
        }
    }

    /// Count down by `dt`. Returns true once the timer has expired.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(dt);
        self.is_expired()
    }

    /// Whether the timer has run out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Time left.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_expires_after_duration() {
        let mut timer = PhaseTimer::new(Duration::from_millis(500));
        assert!(!timer.tick(Duration::from_millis(300)));
        assert_eq!(timer.remaining(), Duration::from_millis(200));
        assert!(timer.tick(Duration::from_millis(300)));
        assert!(timer.is_expired());
    }

    #[test]
    fn test_zero_timer_is_expired() {
        assert!(PhaseTimer::new(Duration::ZERO).is_expired());
    }

    #[test]
    fn test_dwell_selects_by_outcome() {
        let config = ScheduleConfig::default();
        assert_eq!(config.dwell(true), Duration::from_millis(500));
        assert_eq!(config.dwell(false), Duration::from_millis(200));
        assert_eq!(config.cpu_think(), Duration::from_secs(1));
    }
}
