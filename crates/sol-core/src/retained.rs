//! State that survives deep sleep but resets on a cold boot.
//!
//! On the target this struct lives in RTC-retained memory. The core never
//! touches globals for it; the orchestrator receives it by reference
//! every cycle.

/// Sleep-surviving state: device identity, the drift counter, and the
/// last known network time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetainedState {
    /// Derived once at cold boot from a hardware-unique source; immutable
    /// for the process lifetime.
    pub device_id: u32,
    /// Completed duty cycles since the last time resync.
    pub sleep_count: u32,
    /// Network time captured at the last resync, seconds.
    pub last_network_time: u32,
}

impl RetainedState {
    /// Cold-boot initialization. `hardware_seed` is a hardware-unique
    /// value (MAC, efuse, serial); only its low 32 bits become the device
    /// identity.
    pub fn cold_boot(hardware_seed: u64) -> Self {
        Self {
            device_id: hardware_seed as u32,
            sleep_count: 0,
            last_network_time: 0,
        }
    }

    /// Reconstructs elapsed wall time without a clock: last network time
    /// plus one sleep interval per completed cycle.
    pub fn timestamp(&self, sleep_interval_secs: u32) -> u32 {
        self.last_network_time
            .wrapping_add(self.sleep_count.wrapping_mul(sleep_interval_secs))
    }

    /// Stores a fresh network time and zeroes the drift counter.
    pub fn resync(&mut self, network_time: u32) {
        self.last_network_time = network_time;
        self.sleep_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_accumulates_sleep_intervals() {
        let mut retained = RetainedState::cold_boot(0xAABB_CCDD_EEFF_0011);
        assert_eq!(retained.device_id, 0xEEFF_0011);

        retained.resync(1_000_000);
        retained.sleep_count = 3;
        assert_eq!(retained.timestamp(600), 1_000_000 + 3 * 600);
    }

    #[test]
    fn test_resync_zeroes_drift_counter() {
        let mut retained = RetainedState::cold_boot(1);
        retained.sleep_count = 42;

        retained.resync(500);
        assert_eq!(retained.sleep_count, 0);
        assert_eq!(retained.timestamp(600), 500);
    }
}
