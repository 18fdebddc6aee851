//! Shared in-memory test doubles for the platform traits.

use core::convert::Infallible;

use embassy_time::Duration;

use crate::error::SolError;
use crate::hardware::{GainStage, Monotonic, NetworkInterface, SleepControl, SweepHardware};
use crate::storage::Credentials;

/// A client connection backed by a canned request.
pub struct ScriptedConnection {
    request: Vec<u8>,
    position: usize,
    pub response: Vec<u8>,
}

impl ScriptedConnection {
    pub fn new(request: &[u8]) -> Self {
        Self {
            request: request.to_vec(),
            position: 0,
            response: Vec::new(),
        }
    }
}

impl embedded_io::ErrorType for ScriptedConnection {
    type Error = Infallible;
}

impl embedded_io::Read for ScriptedConnection {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.request[self.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

impl embedded_io::Write for ScriptedConnection {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.response.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Network double with scripted connect results and provisioning clients.
pub struct ScriptedNetwork {
    /// Requests handed out by `listen_and_accept`, in order.
    pub clients: Vec<Vec<u8>>,
    /// Connect outcomes, in order; once exhausted, connects succeed.
    pub connect_results: Vec<bool>,
    pub connect_attempts: usize,
    pub connected_with: Option<Credentials>,
    pub sent_frames: Vec<Vec<u8>>,
    /// When set, `send` fails after this many successful frames.
    pub fail_sends_after: Option<usize>,
    pub time: u32,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self {
            clients: Vec::new(),
            connect_results: Vec::new(),
            connect_attempts: 0,
            connected_with: None,
            sent_frames: Vec::new(),
            fail_sends_after: None,
            time: 1_700_000_000,
        }
    }
}

impl NetworkInterface for ScriptedNetwork {
    type Conn = ScriptedConnection;

    fn connect(&mut self, credentials: &Credentials, _timeout: Duration) -> Result<(), SolError> {
        self.connect_attempts += 1;
        let ok = if self.connect_results.is_empty() {
            true
        } else {
            self.connect_results.remove(0)
        };
        if ok {
            self.connected_with = Some(credentials.clone());
            Ok(())
        } else {
            Err(SolError::ConnectionTimeout)
        }
    }

    fn listen_and_accept(&mut self, _timeout: Duration) -> Result<Option<Self::Conn>, SolError> {
        if self.clients.is_empty() {
            return Ok(None);
        }
        Ok(Some(ScriptedConnection::new(&self.clients.remove(0))))
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), SolError> {
        if let Some(budget) = self.fail_sends_after {
            if self.sent_frames.len() >= budget {
                return Err(SolError::ConnectionTimeout);
            }
        }
        self.sent_frames.push(bytes.to_vec());
        Ok(())
    }

    fn receive(&mut self, _buf: &mut [u8]) -> Result<usize, SolError> {
        Ok(0)
    }

    fn network_time(&mut self) -> Result<u32, SolError> {
        Ok(self.time)
    }
}

/// Sleep controller double that records what was armed.
#[derive(Default)]
pub struct RecordingSleep {
    pub timer_armed_secs: Option<u32>,
    pub external_armed: bool,
    pub slept: usize,
}

impl SleepControl for RecordingSleep {
    fn arm_timer_wake(&mut self, seconds: u32) {
        self.timer_armed_secs = Some(seconds);
    }

    fn arm_external_wake(&mut self) {
        self.external_armed = true;
    }

    fn enter_deep_sleep(&mut self) {
        self.slept += 1;
    }
}

/// Clock that advances a fixed step per query.
pub struct SteppingClock {
    pub now_ms: u64,
    pub step_ms: u64,
}

impl SteppingClock {
    pub fn new(step_ms: u64) -> Self {
        Self { now_ms: 0, step_ms }
    }
}

impl Monotonic for SteppingClock {
    fn now(&mut self) -> Duration {
        let now = Duration::from_millis(self.now_ms);
        self.now_ms += self.step_ms;
        now
    }
}

/// Sweep hardware double producing a plausible IV curve.
pub struct SyntheticPanel {
    step: u8,
    pub temperature_c: f32,
    pub battery_v: f32,
}

impl SyntheticPanel {
    pub fn new() -> Self {
        Self {
            step: 0,
            temperature_c: 22.0,
            battery_v: 3.9,
        }
    }
}

impl SweepHardware for SyntheticPanel {
    fn set_sweep_output(&mut self, value: u8) {
        self.step = value;
    }

    fn set_gain(&mut self, _gain: GainStage) {}

    fn read_current_raw(&mut self) -> i16 {
        (self.step as i16) * 3
    }

    fn read_voltage_raw(&mut self) -> i16 {
        1800 - (self.step as i16) * 5
    }

    fn read_temperature_c(&mut self) -> f32 {
        self.temperature_c
    }

    fn read_battery_voltage_v(&mut self) -> f32 {
        self.battery_v
    }
}

/// Charge-enable pin double.
#[derive(Default)]
pub struct RecordingPin {
    pub high: bool,
}

impl embedded_hal::digital::ErrorType for RecordingPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}
