//! Sensor subsystem: battery monitor, optional SHT3x, and the aggregating
//! [`NodeSensors`].
//!
//! `NodeSensors` is what the heartbeat composer reads through
//! [`SensorPort`].  A failing environmental sensor never fails the cycle:
//! the heartbeat carries zeros and a warning goes to the log.

pub mod battery;
pub mod sht3x;

use embedded_hal::delay::DelayNs;
use log::warn;

use crate::app::ports::{AnalogPort, EnvReading, EnvironmentalSensor, SensorPort};
use battery::BatteryMonitor;

/// Aggregates the battery monitor and the (optional) environmental sensor.
pub struct NodeSensors<A, D, E> {
    battery: BatteryMonitor<A>,
    delay: D,
    env: Option<E>,
    env_failures: u32,
}

impl<A: AnalogPort, D: DelayNs, E: EnvironmentalSensor> NodeSensors<A, D, E> {
    /// `env` is `None` for node variants without the SHT3x.
    pub fn new(battery: BatteryMonitor<A>, delay: D, env: Option<E>) -> Self {
        Self {
            battery,
            delay,
            env,
            env_failures: 0,
        }
    }

    /// Environmental reads that fell back to zeros since construction.
    pub fn env_failures(&self) -> u32 {
        self.env_failures
    }
}

impl<A: AnalogPort, D: DelayNs, E: EnvironmentalSensor> SensorPort for NodeSensors<A, D, E> {
    fn battery_volts(&mut self) -> f32 {
        self.battery.read(&mut self.delay).volts
    }

    fn environment(&mut self) -> Option<EnvReading> {
        let sensor = self.env.as_mut()?;
        // The sensor is reset before every read; it is unpowered between cycles.
        let reading = sensor.begin().and_then(|()| sensor.measure());
        match reading {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("Couldn't read environmental sensor ({:?}), reporting zeros", e);
                self.env_failures += 1;
                Some(EnvReading::default())
            }
        }
    }
}
