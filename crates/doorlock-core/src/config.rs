//! Timing and policy configuration.

use std::time::Duration;

use doorlock_proto::{DIGIT_PACING, STORE_BASE_ADDRESS};
use serde::Deserialize;

/// Configuration shared by both nodes.
///
/// Durations counted in ticks are plain integers; the tick itself is
/// nominally one second but only the runtime knows its real length.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Ticks the motor turns clockwise while unlocking
    pub door_unlock_ticks: u32,
    /// Ticks the door stays open with the motor stopped
    pub door_open_ticks: u32,
    /// Ticks the motor turns counter-clockwise while locking
    pub door_lock_ticks: u32,
    /// Consecutive failed verifications that trigger a lockout
    pub max_attempts: u32,
    /// Ticks a lockout lasts
    pub lockout_ticks: u32,
    /// Gap after every transmitted credential digit
    pub digit_pacing: Duration,
    /// How long a transient notice stays on the display
    pub message_hold: Duration,
    /// Real length of one tick
    pub tick_interval: Duration,
    /// Store address of the first credential byte
    pub store_base: u16,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            door_unlock_ticks: 15,
            door_open_ticks: 3,
            door_lock_ticks: 15,
            max_attempts: 3,
            lockout_ticks: 60,
            digit_pacing: DIGIT_PACING,
            message_hold: Duration::from_secs(2),
            tick_interval: Duration::from_secs(1),
            store_base: STORE_BASE_ADDRESS,
        }
    }
}

impl LockConfig {
    /// Total ticks of one door sequence.
    pub fn door_cycle_ticks(&self) -> u32 {
        self.door_unlock_ticks + self.door_open_ticks + self.door_lock_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployed_firmware() {
        let config = LockConfig::default();
        assert_eq!(config.door_cycle_ticks(), 33);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.lockout_ticks, 60);
        assert_eq!(config.digit_pacing, Duration::from_millis(100));
        assert_eq!(config.store_base, 0);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        use serde::de::value::{Error, MapDeserializer};

        let fields = [("max_attempts", 5u32), ("lockout_ticks", 10u32)];
        let config =
            LockConfig::deserialize(MapDeserializer::<_, Error>::new(fields.into_iter())).unwrap();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.lockout_ticks, 10);
        assert_eq!(config.door_cycle_ticks(), 33);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
    }
}
