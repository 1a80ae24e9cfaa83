//! GPIO / peripheral pin assignments for the trap node (ESP32 DevKit).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Trap switch
// ---------------------------------------------------------------------------

/// Trap micro-switch, RTC-capable so it can serve as the EXT0 wake source.
/// Active-low: internal pull-up, the sprung trap pulls the line to GND.
pub const TRAP_GPIO: i32 = 12;

/// Level that means "trap fired" (EXT0 wakes on this level).
pub const TRAP_ACTIVE_LEVEL_HIGH: bool = false;

// ---------------------------------------------------------------------------
// Battery monitor
// ---------------------------------------------------------------------------

/// Battery voltage through a 1:2 resistive divider.
/// ADC1 channel 0 (GPIO 36 / "A0" on ESP32).
pub const BATTERY_ADC_GPIO: i32 = 36;
pub const BATTERY_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// I²C bus (SHT3x on sensor-equipped variants)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_FREQ_HZ: u32 = 100_000;
