//! Power-sweep sampling: find the panel's peak operating point.
//!
//! The sampler drives the load DAC linearly across its full range while
//! reading the paired current/voltage sense channels, and keeps running
//! maxima of power, current, and voltage. No smoothing or hysteresis.
//!
//! Saturation policy: every gain stage in [`GainStage::ALL`] is always
//! swept and saturated counts simply clamp at the stage's full scale.
//! The wider stages provide the headroom, so there is no mid-sweep
//! escalation logic.

use log::debug;

use crate::hardware::{GainStage, SweepHardware};

/// Number of counts at the sense ADC's full scale.
const ADC_COUNTS: f32 = 2048.0;

/// Gain of the voltage sense divider/amplifier chain.
const V_SENSE_AMPLIFICATION: f32 = 4.13333;

/// Gain of the current sense amplifier.
const I_SENSE_AMPLIFICATION: f32 = 101.0;

/// Current sense shunt resistance, Ohms.
const R_SENSE_OHMS: f32 = 0.75;

/// Maxima observed during one sweep, plus one-shot ambient readings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SweepReading {
    pub peak_power_mw: f32,
    pub peak_current_ma: f32,
    pub peak_voltage_v: f32,
    pub temperature_c: f32,
    pub battery_v: f32,
}

/// Sweeps the panel load and reports the maxima.
pub struct PowerSweepSampler<H> {
    hw: H,
}

impl<H: SweepHardware> PowerSweepSampler<H> {
    pub fn new(hw: H) -> Self {
        Self { hw }
    }

    /// Direct access to the sweep hardware, for the one-shot ambient
    /// readings the orchestrator needs outside a sweep.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Runs one full sweep and returns the observed maxima.
    ///
    /// The sweep output is returned to its safe idle state (0) before any
    /// other reading is taken.
    pub fn sample(&mut self) -> SweepReading {
        let mut max_power_w = 0.0f32;
        let mut max_current_a = 0.0f32;
        let mut max_voltage_v = 0.0f32;

        for gain in GainStage::ALL {
            self.hw.set_gain(gain);
            let full_scale_v = gain.full_scale_v();

            for step in 0..=u8::MAX {
                self.hw.set_sweep_output(step);

                // Negative counts are noise around zero; saturated counts
                // clamp at full scale.
                let current_counts = (self.hw.read_current_raw().max(0) as f32).min(ADC_COUNTS);
                let voltage_counts = (self.hw.read_voltage_raw().max(0) as f32).min(ADC_COUNTS);

                let voltage = voltage_counts / ADC_COUNTS * full_scale_v * V_SENSE_AMPLIFICATION;
                let current =
                    current_counts / ADC_COUNTS * full_scale_v / R_SENSE_OHMS / I_SENSE_AMPLIFICATION;
                let power = current * voltage;

                if power > max_power_w {
                    max_power_w = power;
                }
                if current > max_current_a {
                    max_current_a = current;
                }
                if voltage > max_voltage_v {
                    max_voltage_v = voltage;
                }
            }
        }

        // Safe idle before anything else happens.
        self.hw.set_sweep_output(0);

        let temperature_c = self.hw.read_temperature_c();
        let battery_v = self.hw.read_battery_voltage_v();

        let reading = SweepReading {
            peak_power_mw: max_power_w * 1000.0,
            peak_current_ma: max_current_a * 1000.0,
            peak_voltage_v: max_voltage_v,
            temperature_c,
            battery_v,
        };
        debug!(
            "sweep complete: {:.2} mW peak at {:.2} V / {:.2} mA",
            reading.peak_power_mw, reading.peak_voltage_v, reading.peak_current_ma
        );
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Synthetic panel: voltage falls and current rises with the sweep
    /// step, putting the power peak somewhere in the middle.
    struct FakePanel {
        step: u8,
        gain: GainStage,
        last_output: u8,
        outputs_seen: usize,
    }

    impl FakePanel {
        fn new() -> Self {
            Self {
                step: 0,
                gain: GainStage::One,
                last_output: 0,
                outputs_seen: 0,
            }
        }
    }

    impl SweepHardware for FakePanel {
        fn set_sweep_output(&mut self, value: u8) {
            self.step = value;
            self.last_output = value;
            self.outputs_seen += 1;
        }

        fn set_gain(&mut self, gain: GainStage) {
            self.gain = gain;
        }

        fn read_current_raw(&mut self) -> i16 {
            // Rises linearly with the load step.
            (self.step as i16) * 4
        }

        fn read_voltage_raw(&mut self) -> i16 {
            // Falls linearly as the panel is loaded down.
            2047 - (self.step as i16) * 4
        }

        fn read_temperature_c(&mut self) -> f32 {
            21.5
        }

        fn read_battery_voltage_v(&mut self) -> f32 {
            3.8
        }
    }

    #[test]
    fn test_sweep_finds_interior_power_peak() {
        let mut sampler = PowerSweepSampler::new(FakePanel::new());
        let reading = sampler.sample();

        assert!(reading.peak_power_mw > 0.0);
        // Peak power requires both current and voltage to be nonzero, so
        // it must be strictly below the product of the two maxima.
        let bound = reading.peak_current_ma * reading.peak_voltage_v;
        assert!(reading.peak_power_mw < bound);
    }

    #[test]
    fn test_ambient_readings_are_passed_through() {
        let mut sampler = PowerSweepSampler::new(FakePanel::new());
        let reading = sampler.sample();

        assert_eq!(reading.temperature_c, 21.5);
        assert_eq!(reading.battery_v, 3.8);
    }

    #[test]
    fn test_sweep_output_returns_to_idle() {
        let mut sampler = PowerSweepSampler::new(FakePanel::new());
        sampler.sample();

        assert_eq!(sampler.hardware_mut().last_output, 0);
    }

    #[test]
    fn test_all_gain_stages_are_swept() {
        let mut sampler = PowerSweepSampler::new(FakePanel::new());
        sampler.sample();

        // 256 steps per stage, three stages, plus the final idle write.
        assert_eq!(sampler.hardware_mut().outputs_seen, 256 * 3 + 1);
    }

    #[test]
    fn test_saturated_counts_clamp_at_full_scale() {
        struct SaturatedPanel;
        impl SweepHardware for SaturatedPanel {
            fn set_sweep_output(&mut self, _value: u8) {}
            fn set_gain(&mut self, _gain: GainStage) {}
            fn read_current_raw(&mut self) -> i16 {
                i16::MAX
            }
            fn read_voltage_raw(&mut self) -> i16 {
                i16::MAX
            }
            fn read_temperature_c(&mut self) -> f32 {
                0.0
            }
            fn read_battery_voltage_v(&mut self) -> f32 {
                0.0
            }
        }

        let mut sampler = PowerSweepSampler::new(SaturatedPanel);
        let reading = sampler.sample();

        // Full-scale counts at the widest stage bound the result.
        let max_voltage = GainStage::One.full_scale_v() * V_SENSE_AMPLIFICATION;
        assert!(reading.peak_voltage_v <= max_voltage + f32::EPSILON);
    }
}
