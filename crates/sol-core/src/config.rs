//! Tuning parameters for the duty cycle.

use embassy_time::Duration;

/// Duty-cycle tuning parameters.
///
/// The defaults are the values the deployed hardware ships with; the
/// simulator and tests shrink them to keep scenarios fast.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Time spent in deep sleep between sensing cycles, in seconds.
    pub sleep_interval_secs: u32,
    /// Minimum number of pending records before an upload is attempted.
    pub upload_threshold: u16,
    /// Deadline for joining the network before an upload.
    pub connect_timeout: Duration,
    /// How long the provisioning listener waits for an operator.
    pub provision_timeout: Duration,
    /// Battery charging is only enabled above this temperature.
    pub charge_temp_min_c: f32,
    /// Battery charging is only enabled below this temperature.
    pub charge_temp_max_c: f32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            sleep_interval_secs: 600,
            upload_threshold: 4,
            connect_timeout: Duration::from_secs(10),
            provision_timeout: Duration::from_secs(180),
            charge_temp_min_c: 0.0,
            charge_temp_max_c: 45.0,
        }
    }
}
