//! Peripheral drivers: trap input, debounce, blocking delay, watchdog,
//! and one-shot hardware initialisation.

pub mod debounce;
pub mod delay;
pub mod hw_init;
pub mod trap_pin;
pub mod watchdog;
