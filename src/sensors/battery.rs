//! Battery voltage monitor.
//!
//! The cell is read through a 1:2 resistive divider on ADC1.  Each reading
//! is the integer mean of `samples` raw conversions with a settle delay
//! after every conversion, scaled back to cell voltage:
//!
//! ```text
//!   volts = mean_raw × (3.3 / 4095) × 2
//! ```
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`BatteryAdc`] reads the oneshot channel set up by hw_init.
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::AnalogPort;

const V_REF: f32 = 3.3;
const ADC_MAX: f32 = 4095.0;
const DIVIDER_RATIO: f32 = 2.0;

#[cfg(not(target_os = "espidf"))]
static SIM_BATTERY_ADC: AtomicU16 = AtomicU16::new(2482); // ≈ 4.0 V

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_adc(raw: u16) {
    SIM_BATTERY_ADC.store(raw, Ordering::Relaxed);
}

/// Raw battery-divider ADC channel.
pub struct BatteryAdc {
    channel: u32,
}

impl BatteryAdc {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }
}

impl AnalogPort for BatteryAdc {
    #[cfg(target_os = "espidf")]
    fn read_raw(&mut self) -> u16 {
        crate::drivers::hw_init::adc1_read(self.channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&mut self) -> u16 {
        let _ = self.channel;
        SIM_BATTERY_ADC.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// Integer mean of the raw samples.
    pub mean_raw: u16,
    pub volts: f32,
}

pub struct BatteryMonitor<A> {
    adc: A,
    samples: u8,
    settle_ms: u32,
}

impl<A: AnalogPort> BatteryMonitor<A> {
    pub fn new(adc: A, samples: u8, settle_ms: u32) -> Self {
        Self {
            adc,
            samples: samples.max(1),
            settle_ms,
        }
    }

    /// Take `samples` conversions, waiting `settle_ms` after each one.
    pub fn read<D: DelayNs>(&mut self, delay: &mut D) -> BatteryReading {
        let mut sum: u32 = 0;
        for _ in 0..self.samples {
            sum += self.adc.read_raw() as u32;
            delay.delay_ms(self.settle_ms);
        }
        let mean_raw = (sum / self.samples as u32) as u16;
        let volts = raw_to_volts(mean_raw);
        debug!("battery: mean_raw={} volts={:.3}", mean_raw, volts);
        BatteryReading { mean_raw, volts }
    }

    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }
}

/// Divider-compensated cell voltage for a raw 12-bit reading.
pub fn raw_to_volts(raw: u16) -> f32 {
    raw as f32 * (V_REF / ADC_MAX) * DIVIDER_RATIO
}
