//! Trap switch input as an `embedded-hal` [`InputPin`].
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the GPIO level configured by `hw_init`.
//! On host/test: reads from a static `AtomicBool` for injection
//! (defaults to high, i.e. trap released).

use core::convert::Infallible;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{ErrorType, InputPin};

#[cfg(not(target_os = "espidf"))]
static SIM_TRAP_LEVEL_HIGH: AtomicBool = AtomicBool::new(true);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_trap_level(high: bool) {
    SIM_TRAP_LEVEL_HIGH.store(high, Ordering::Relaxed);
}

pub struct TrapPin {
    gpio: i32,
}

impl TrapPin {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }

    /// GPIO number, needed again when re-arming the EXT0 wake source.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    #[cfg(target_os = "espidf")]
    fn level_high(&self) -> bool {
        crate::drivers::hw_init::gpio_read(self.gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    fn level_high(&self) -> bool {
        SIM_TRAP_LEVEL_HIGH.load(Ordering::Relaxed)
    }
}

impl ErrorType for TrapPin {
    type Error = Infallible;
}

impl InputPin for TrapPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level_high())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level_high())
    }
}
