//! Desktop simulator for the sol-rs duty cycle.
//!
//! Runs the sol-core orchestrator against in-memory hardware: an emulated
//! EEPROM, a synthetic solar panel with a day/night curve, and a scripted
//! network. Deep sleep is compressed to nothing, so a full day of duty
//! cycles plays out in milliseconds.
//!
//! The scenario it plays:
//!
//! 1. A provisioning wake with an operator submitting credentials.
//! 2. A run of timer wakes that sample, accumulate, and upload.
//!
//! Run with `RUST_LOG=debug` to see per-cycle storage and sweep activity.

use std::convert::Infallible;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use embassy_time::Duration;
use log::info;

use sol_core::hardware::{
    GainStage, Monotonic, NetworkInterface, SleepControl, SweepHardware,
};
use sol_core::storage::{Credentials, MemoryStore};
use sol_core::{NodeConfig, RetainedState, SolError, SolNode, WakeCause};

/// Timer cycles to play after the provisioning wake.
const TIMER_CYCLES: u32 = 12;

/// The request an operator's browser would submit to the listener.
const OPERATOR_REQUEST: &[u8] =
    b"GET /?SSID=HomeNetwork&PASSWORD=hunter2hunter2&SUBMIT=Submit HTTP/1.1\r\n\
Host: 192.168.4.1\r\n\r\n";

// ---------------------------------------------------------------------------
// Simulated network
// ---------------------------------------------------------------------------

/// One operator connection replaying a canned request.
struct SimConnection {
    request: &'static [u8],
    position: usize,
}

impl embedded_io::ErrorType for SimConnection {
    type Error = Infallible;
}

impl embedded_io::Read for SimConnection {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.request[self.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

impl embedded_io::Write for SimConnection {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        // The form response goes nowhere; the operator is imaginary.
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Network that always joins, hands out one scripted operator client, and
/// serves wall-clock time as the time collaborator.
struct SimNetwork {
    operator_pending: bool,
    frames_received: usize,
}

impl SimNetwork {
    fn new() -> Self {
        Self {
            operator_pending: true,
            frames_received: 0,
        }
    }
}

impl NetworkInterface for SimNetwork {
    type Conn = SimConnection;

    fn connect(&mut self, credentials: &Credentials, _timeout: Duration) -> Result<(), SolError> {
        info!(
            "[net] joined '{}'",
            credentials.ssid_str().unwrap_or("<non-utf8>")
        );
        Ok(())
    }

    fn listen_and_accept(&mut self, _timeout: Duration) -> Result<Option<Self::Conn>, SolError> {
        if !self.operator_pending {
            return Ok(None);
        }
        self.operator_pending = false;
        info!("[net] operator connected to the provisioning listener");
        Ok(Some(SimConnection {
            request: OPERATOR_REQUEST,
            position: 0,
        }))
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), SolError> {
        self.frames_received += 1;
        info!("[net] frame {} uploaded ({} bytes)", self.frames_received, bytes.len());
        Ok(())
    }

    fn receive(&mut self, _buf: &mut [u8]) -> Result<usize, SolError> {
        Ok(0)
    }

    fn network_time(&mut self) -> Result<u32, SolError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Ok(now as u32)
    }
}

// ---------------------------------------------------------------------------
// Simulated panel and sleep
// ---------------------------------------------------------------------------

/// Synthetic panel with an IV curve that brightens and dims across cycles.
struct SimPanel {
    step: u8,
    irradiance: f32,
}

impl SimPanel {
    fn new() -> Self {
        Self {
            step: 0,
            irradiance: 1.0,
        }
    }

    /// Moves the sun: irradiance follows a slow sine across cycles.
    fn advance_cycle(&mut self, cycle: u32) {
        let phase = cycle as f32 / TIMER_CYCLES as f32 * core::f32::consts::PI;
        self.irradiance = 0.2 + 0.8 * phase.sin().abs();
    }
}

impl SweepHardware for SimPanel {
    fn set_sweep_output(&mut self, value: u8) {
        self.step = value;
    }

    fn set_gain(&mut self, _gain: GainStage) {}

    fn read_current_raw(&mut self) -> i16 {
        ((self.step as f32) * 4.0 * self.irradiance) as i16
    }

    fn read_voltage_raw(&mut self) -> i16 {
        (1900.0 - (self.step as f32) * 5.0).max(0.0) as i16
    }

    fn read_temperature_c(&mut self) -> f32 {
        15.0 + 12.0 * self.irradiance
    }

    fn read_battery_voltage_v(&mut self) -> f32 {
        3.6 + 0.4 * self.irradiance
    }
}

/// Sleep controller that just counts; the simulator's wall clock never
/// actually stops.
#[derive(Default)]
struct SimSleep {
    cycles_slept: u32,
}

impl SleepControl for SimSleep {
    fn arm_timer_wake(&mut self, seconds: u32) {
        info!("[sleep] timer wake armed in {}s", seconds);
    }

    fn arm_external_wake(&mut self) {}

    fn enter_deep_sleep(&mut self) {
        self.cycles_slept += 1;
        info!("[sleep] entering deep sleep (cycle {} done)", self.cycles_slept);
    }
}

/// Host monotonic clock for the blocking deadlines.
struct HostClock {
    origin: Instant,
}

impl Monotonic for HostClock {
    fn now(&mut self) -> Duration {
        Duration::from_millis(self.origin.elapsed().as_millis() as u64)
    }
}

/// Charge-enable pin that logs its transitions.
#[derive(Default)]
struct ChargePin {
    high: bool,
}

impl embedded_hal::digital::ErrorType for ChargePin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for ChargePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            info!("[charge] charging disabled");
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            info!("[charge] charging enabled");
        }
        self.high = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting sol-rs simulator");

    let config = NodeConfig {
        // Fast provisioning window; the operator script connects at once.
        provision_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
        ..NodeConfig::default()
    };
    info!(
        "Config: {}s interval, upload threshold {}",
        config.sleep_interval_secs, config.upload_threshold
    );

    let mut node = SolNode::new(
        MemoryStore::new(),
        SimPanel::new(),
        SimNetwork::new(),
        SimSleep::default(),
        ChargePin::default(),
        HostClock {
            origin: Instant::now(),
        },
        config,
    );

    // Cold boot straight into a provisioning wake, as if the operator held
    // the touch pad during power-up.
    let mut retained = RetainedState::cold_boot(0x5EED_CAFE_0042_1337);
    info!("Device id {:#010x}", retained.device_id);

    let outcome = node.run_cycle(&mut retained, WakeCause::Provisioning);
    info!("Provisioning cycle outcome: {:?}", outcome);

    // -----------------------------------------------------------------------
    // Timer wakes
    // -----------------------------------------------------------------------
    for cycle in 0..TIMER_CYCLES {
        node.sweep_hardware_mut().advance_cycle(cycle);

        let outcome = node.run_cycle(&mut retained, WakeCause::Timer);
        if outcome.uploaded > 0 {
            info!(
                "Cycle {}: uploaded {} records, time base resynced",
                cycle, outcome.uploaded
            );
        }
    }

    info!("Simulator finished: {} cycles played", TIMER_CYCLES + 1);
}
