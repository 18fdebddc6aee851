//! The duty-cycle orchestrator: one wake, one cycle, one sleep.
//!
//! State machine over a single wake:
//! `WokeUp -> {Provisioning | Sensing} -> (MaybeUploading) -> Sleeping`.
//! Every failure inside the cycle is logged and recovery is automatic;
//! all paths end by arming the wakes and entering deep sleep.

use embedded_hal::digital::OutputPin;
use log::{error, info, warn};

use crate::config::NodeConfig;
use crate::hardware::{ByteStore, Monotonic, NetworkInterface, SleepControl, SweepHardware};
use crate::provisioning::ProvisioningMachine;
use crate::retained::RetainedState;
use crate::sampling::PowerSweepSampler;
use crate::storage::{CircularLog, CredentialStore, Credentials, DataRecord};
use crate::upload::upload_pending;
use crate::wake::WakeCause;

/// What one cycle did, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub provisioned: bool,
    pub sampled: bool,
    pub appended: bool,
    pub connect_attempted: bool,
    pub uploaded: u16,
}

/// The sensor node's control core, generic over the platform.
pub struct SolNode<S, H, N, W, P, M> {
    store: S,
    sampler: PowerSweepSampler<H>,
    net: N,
    sleep: W,
    charge_enable: P,
    clock: M,
    config: NodeConfig,
}

impl<S, H, N, W, P, M> SolNode<S, H, N, W, P, M>
where
    S: ByteStore,
    H: SweepHardware,
    N: NetworkInterface,
    W: SleepControl,
    P: OutputPin,
    M: Monotonic,
{
    pub fn new(
        store: S,
        sweep_hw: H,
        net: N,
        sleep: W,
        charge_enable: P,
        clock: M,
        config: NodeConfig,
    ) -> Self {
        Self {
            store,
            sampler: PowerSweepSampler::new(sweep_hw),
            net,
            sleep,
            charge_enable,
            clock,
            config,
        }
    }

    /// Direct access to the sweep hardware, for hosts that drive the
    /// simulated environment between cycles.
    pub fn sweep_hardware_mut(&mut self) -> &mut H {
        self.sampler.hardware_mut()
    }

    /// Runs one complete duty cycle and enters deep sleep.
    pub fn run_cycle(&mut self, retained: &mut RetainedState, cause: WakeCause) -> CycleOutcome {
        info!("cycle {} starting, cause {:?}", retained.sleep_count, cause);

        // One tick per cycle: this is how elapsed time is reconstructed
        // across sleeps without a clock.
        retained.sleep_count = retained.sleep_count.wrapping_add(1);

        let mut outcome = CycleOutcome::default();

        match cause {
            WakeCause::Provisioning => self.provision(retained, &mut outcome),
            WakeCause::Timer | WakeCause::ColdBoot => {
                let loaded = CredentialStore::new(&mut self.store).load();
                match loaded {
                    Ok(Some(credentials)) => {
                        self.sense_and_maybe_upload(retained, &credentials, &mut outcome)
                    }
                    Ok(None) => info!("not provisioned yet; skipping sampling"),
                    Err(e) => error!("credential load failed: {}", e),
                }
            }
        }

        self.schedule_sleep();
        outcome
    }

    /// Provisioning cycle: capture credentials, invalidate stale pending
    /// records, and take the chance to resync the time base.
    fn provision(&mut self, retained: &mut RetainedState, outcome: &mut CycleOutcome) {
        let mut machine = ProvisioningMachine::new();
        match machine.run(
            &mut self.net,
            &mut self.store,
            &mut self.clock,
            self.config.provision_timeout,
        ) {
            Ok(credentials) => {
                outcome.provisioned = true;

                // Records captured under the old credentials would carry a
                // stale time base; drop them with the cursor reset.
                if let Err(e) = CircularLog::new(&mut self.store).reset() {
                    error!("log reset after provisioning failed: {}", e);
                }

                self.try_time_resync(retained, &credentials);
            }
            Err(e) => warn!("provisioning ended without credentials: {}", e),
        }
    }

    /// Sensing cycle: sweep, persist, and upload once enough records have
    /// accumulated.
    fn sense_and_maybe_upload(
        &mut self,
        retained: &mut RetainedState,
        credentials: &Credentials,
        outcome: &mut CycleOutcome,
    ) {
        let reading = self.sampler.sample();
        outcome.sampled = true;

        let record = DataRecord {
            timestamp: retained.timestamp(self.config.sleep_interval_secs),
            peak_power_mw: reading.peak_power_mw,
            peak_current_ma: reading.peak_current_ma,
            peak_voltage_v: reading.peak_voltage_v,
            temperature_c: reading.temperature_c,
            battery_v: reading.battery_v,
            device_id: retained.device_id,
        };
        info!("{}", record);

        let mut log = CircularLog::new(&mut self.store);
        match log.append(&record) {
            Ok(()) => outcome.appended = true,
            // Skip this cycle's persistence; the cycle still sleeps.
            Err(e) => error!("failed to persist record: {}", e),
        }

        let pending = match log.pending_count() {
            Ok(count) => count,
            Err(e) => {
                error!("pending count unavailable: {}", e);
                return;
            }
        };
        info!("{} records pending, threshold {}", pending, self.config.upload_threshold);

        if pending < self.config.upload_threshold {
            return;
        }

        outcome.connect_attempted = true;
        if let Err(e) = self.net.connect(credentials, self.config.connect_timeout) {
            // Non-fatal: records stay in the log and the full threshold is
            // re-checked on a future cycle.
            warn!("connect failed, upload deferred: {}", e);
            return;
        }

        match upload_pending(&mut self.store, &mut self.net, retained.device_id) {
            Ok(sent) => {
                outcome.uploaded = sent;
                if let Err(e) = CircularLog::new(&mut self.store).reset() {
                    error!("log reset after upload failed: {}", e);
                }

                // Fresh network time while the link is up, to bound the
                // retained counter's drift.
                match self.net.network_time() {
                    Ok(now) => retained.resync(now),
                    Err(e) => warn!("time resync failed: {}", e),
                }
            }
            // The log keeps every record; nothing is partially discarded.
            Err(e) => warn!("upload failed, records retained: {}", e),
        }
    }

    /// Connects and resyncs the retained time base; failures are logged
    /// and the stale time base stays in use.
    fn try_time_resync(&mut self, retained: &mut RetainedState, credentials: &Credentials) {
        if let Err(e) = self.net.connect(credentials, self.config.connect_timeout) {
            warn!("time resync connect failed: {}", e);
            return;
        }
        match self.net.network_time() {
            Ok(now) => {
                retained.resync(now);
                info!("time base resynced to {}", now);
            }
            Err(e) => warn!("time resync failed: {}", e),
        }
    }

    /// Sleep transition: gate charging on the temperature band, arm both
    /// wake sources, and enter deep sleep.
    fn schedule_sleep(&mut self) {
        let temperature_c = self.sampler.hardware_mut().read_temperature_c();
        let charging_ok = temperature_c > self.config.charge_temp_min_c
            && temperature_c < self.config.charge_temp_max_c;

        let result = if charging_ok {
            self.charge_enable.set_high()
        } else {
            self.charge_enable.set_low()
        };
        if result.is_err() {
            warn!("charge-enable pin unresponsive");
        }

        info!(
            "sleeping {}s (charging {})",
            self.config.sleep_interval_secs,
            if charging_ok { "enabled" } else { "disabled" }
        );
        self.sleep.arm_timer_wake(self.config.sleep_interval_secs);
        self.sleep.arm_external_wake();
        self.sleep.enter_deep_sleep();
    }
}
