//! Platform traits the control core is written against.
//!
//! A firmware target implements these over the real peripherals; the
//! simulator and the unit tests implement them in memory. Everything is
//! blocking with explicit timeouts: there is exactly one duty cycle in
//! flight between sleeps, so no async machinery is needed.

use embassy_time::Duration;

use crate::error::SolError;
use crate::storage::Credentials;

/// Single-byte access to a byte-addressable non-volatile store.
///
/// The circular log and the credential store are built strictly on top of
/// this trait. Bus failures surface as [`SolError::StorageFault`].
pub trait ByteStore {
    fn read_byte(&mut self, address: u16) -> Result<u8, SolError>;

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), SolError>;

    /// Read `buf.len()` consecutive bytes starting at `address`.
    fn read_bytes(&mut self, address: u16, buf: &mut [u8]) -> Result<(), SolError> {
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = self.read_byte(address + i as u16)?;
        }
        Ok(())
    }

    /// Write all of `data` starting at `address`.
    fn write_bytes(&mut self, address: u16, data: &[u8]) -> Result<(), SolError> {
        for (i, byte) in data.iter().enumerate() {
            self.write_byte(address + i as u16, *byte)?;
        }
        Ok(())
    }
}

impl<T: ByteStore + ?Sized> ByteStore for &mut T {
    fn read_byte(&mut self, address: u16) -> Result<u8, SolError> {
        (**self).read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), SolError> {
        (**self).write_byte(address, value)
    }
}

/// Gain stage of the current/voltage sense ADC.
///
/// The sampler sweeps every stage; lower gain provides headroom when the
/// panel output would saturate a higher-gain reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainStage {
    One,
    Two,
    Four,
}

impl GainStage {
    /// All stages, widest full scale first.
    pub const ALL: [GainStage; 3] = [GainStage::One, GainStage::Two, GainStage::Four];

    /// Full-scale input voltage for this gain setting.
    pub const fn full_scale_v(self) -> f32 {
        match self {
            GainStage::One => 4.096,
            GainStage::Two => 2.048,
            GainStage::Four => 1.024,
        }
    }
}

/// Sensor and actuator interface consumed by the power-sweep sampler.
///
/// Raw readings are signed ADC counts; scaling to engineering units is the
/// sampler's job.
pub trait SweepHardware {
    /// Drive the sweep control output (panel load DAC).
    fn set_sweep_output(&mut self, value: u8);

    /// Select the sense ADC gain stage.
    fn set_gain(&mut self, gain: GainStage);

    fn read_current_raw(&mut self) -> i16;

    fn read_voltage_raw(&mut self) -> i16;

    fn read_temperature_c(&mut self) -> f32;

    fn read_battery_voltage_v(&mut self) -> f32;
}

/// Wireless link and time-sync collaborator.
pub trait NetworkInterface {
    /// Client connection accepted while provisioning.
    type Conn: embedded_io::Read + embedded_io::Write;

    /// Join the network with the given credentials, bounded by `timeout`.
    fn connect(&mut self, credentials: &Credentials, timeout: Duration) -> Result<(), SolError>;

    /// Listen for one provisioning client. `Ok(None)` means the window
    /// elapsed with nobody connecting.
    fn listen_and_accept(&mut self, timeout: Duration) -> Result<Option<Self::Conn>, SolError>;

    /// Send one upload frame over the established connection.
    fn send(&mut self, bytes: &[u8]) -> Result<(), SolError>;

    /// Receive a response, bounded by the transport's byte-wait timeout.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, SolError>;

    /// Current network time in seconds (NTP collaborator).
    fn network_time(&mut self) -> Result<u32, SolError>;
}

/// Low-power sleep controller.
pub trait SleepControl {
    fn arm_timer_wake(&mut self, seconds: u32);

    fn arm_external_wake(&mut self);

    /// Enter the lowest-power sleep state. On real hardware this does not
    /// return until the next wake.
    fn enter_deep_sleep(&mut self);
}

/// Milliseconds-granularity clock used for blocking deadlines.
///
/// This is time since boot, not wall time; the retained time base in
/// [`crate::retained::RetainedState`] covers wall time across sleeps.
pub trait Monotonic {
    fn now(&mut self) -> Duration;
}
