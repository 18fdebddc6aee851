//! The fixed-size measurement record, the atomic unit of the log.

use core::fmt::Display;

use serde::{Deserialize, Serialize};

/// One power-sweep measurement, persisted to the circular log.
///
/// Binary format (little-endian, 28 bytes):
/// - timestamp: 4 bytes (u32, seconds)
/// - peak_power_mw: 4 bytes (f32)
/// - peak_current_ma: 4 bytes (f32)
/// - peak_voltage_v: 4 bytes (f32)
/// - temperature_c: 4 bytes (f32)
/// - battery_v: 4 bytes (f32)
/// - device_id: 4 bytes (u32)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Seconds since epoch, reconstructed from the retained time base.
    pub timestamp: u32,
    /// Peak power observed during the sweep, milliwatts.
    pub peak_power_mw: f32,
    /// Peak current observed during the sweep, milliamps.
    pub peak_current_ma: f32,
    /// Peak voltage observed during the sweep, volts.
    pub peak_voltage_v: f32,
    /// Ambient temperature at sample time, Celsius.
    pub temperature_c: f32,
    /// Battery voltage at sample time, volts.
    pub battery_v: f32,
    /// Device identity, re-stamped at upload time so records always carry
    /// the current identity.
    pub device_id: u32,
}

impl DataRecord {
    /// Size of the persisted record in bytes (28).
    pub const SIZE: usize = 28;

    /// Converts the record to its persisted byte layout.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];

        bytes[0..4].copy_from_slice(&self.timestamp.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.peak_power_mw.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.peak_current_ma.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.peak_voltage_v.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.temperature_c.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.battery_v.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.device_id.to_le_bytes());

        bytes
    }

    /// Reads a record back from its persisted byte layout.
    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let field = |range: core::ops::Range<usize>| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[range]);
            buf
        };

        Self {
            timestamp: u32::from_le_bytes(field(0..4)),
            peak_power_mw: f32::from_le_bytes(field(4..8)),
            peak_current_ma: f32::from_le_bytes(field(8..12)),
            peak_voltage_v: f32::from_le_bytes(field(12..16)),
            temperature_c: f32::from_le_bytes(field(16..20)),
            battery_v: f32::from_le_bytes(field(20..24)),
            device_id: u32::from_le_bytes(field(24..28)),
        }
    }
}

impl Display for DataRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[DataRecord] timestamp: {}, power: {:.2} mW, current: {:.2} mA, voltage: {:.2} V, temp: {:.1} C, batt: {:.2} V, id: {}",
            self.timestamp,
            self.peak_power_mw,
            self.peak_current_ma,
            self.peak_voltage_v,
            self.temperature_c,
            self.battery_v,
            self.device_id
        )
    }
}
