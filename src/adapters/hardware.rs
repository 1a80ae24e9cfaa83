//! Hardware adapter: wake cause and deep-sleep control.
//!
//! Implements [`WakeSourcePort`] and [`SleepPort`].  The service takes
//! both through one value (`H: WakeSourcePort + SleepPort`) since both
//! sit on the same RTC controller.
//!
//! - **`target_os = "espidf"`**: `esp_sleep_*` and RTC GPIO calls.
//! - **all other targets**: a simulated wake cause injected through
//!   [`sim_set_wake_cause`]; "deep sleep" ends the host process.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::app::ports::{SleepPort, WakeSourcePort};
use crate::wake::WakeReason;

/// Raw `esp_sleep_source_t` seen by the simulation (0 = undefined / cold boot).
#[cfg(not(target_os = "espidf"))]
static SIM_WAKE_CAUSE: AtomicU32 = AtomicU32::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_wake_cause(raw: u32) {
    SIM_WAKE_CAUSE.store(raw, Ordering::Relaxed);
}

/// Set up the simulated wake for a command-line wake name: `boot`, `trap`
/// (trap held at its active level) or `timer`.  `None` for anything else.
#[cfg(not(target_os = "espidf"))]
pub fn sim_prepare_wake(name: &str) -> Option<WakeReason> {
    use crate::drivers::trap_pin::sim_set_trap_level;
    use crate::pins::TRAP_ACTIVE_LEVEL_HIGH;

    let (raw, trap_active) = match name {
        "boot" => (0, false),
        "trap" => (2, true),
        "timer" => (4, false),
        _ => return None,
    };
    sim_set_wake_cause(raw);
    sim_set_trap_level(if trap_active { TRAP_ACTIVE_LEVEL_HIGH } else { !TRAP_ACTIVE_LEVEL_HIGH });
    Some(WakeReason::from_raw(raw))
}

pub struct HardwareAdapter {
    /// Exit code the simulated deep sleep ends the process with.
    #[cfg(not(target_os = "espidf"))]
    sim_exit_code: i32,
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_exit_code: 0,
        }
    }
}

// ── WakeSourcePort ────────────────────────────────────────────

impl WakeSourcePort for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn wake_reason(&self) -> WakeReason {
        // SAFETY: read-only query of the RTC wake status register.
        let raw = unsafe { esp_sleep_get_wakeup_cause() };
        WakeReason::from_raw(raw as u32)
    }

    #[cfg(not(target_os = "espidf"))]
    fn wake_reason(&self) -> WakeReason {
        WakeReason::from_raw(SIM_WAKE_CAUSE.load(Ordering::Relaxed))
    }
}

// ── SleepPort ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl SleepPort for HardwareAdapter {
    fn configure_trigger_input(&mut self, gpio: i32) {
        // SAFETY: plain register config on an RTC-capable pin, main task only.
        unsafe {
            gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_INPUT);
            gpio_set_pull_mode(gpio, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
            // Keep the pull-up alive through deep sleep.
            rtc_gpio_pullup_en(gpio);
            rtc_gpio_pulldown_dis(gpio);
        }
    }

    fn arm_trigger_wake(&mut self, gpio: i32, level_high: bool) {
        let ret = unsafe { esp_sleep_enable_ext0_wakeup(gpio, level_high as i32) };
        if ret != ESP_OK as esp_err_t {
            warn!("sleep: ext0 wake on GPIO {} failed ({})", gpio, ret);
        }
    }

    fn arm_timer_wake(&mut self, micros: u64) {
        let ret = unsafe { esp_sleep_enable_timer_wakeup(micros) };
        if ret != ESP_OK as esp_err_t {
            warn!("sleep: timer wake failed ({})", ret);
        }
    }

    #[allow(unreachable_code)]
    fn enter_deep_sleep(&mut self) -> ! {
        info!("sleep: entering deep sleep");
        // SAFETY: wake sources are armed; this call powers down the CPU.
        unsafe { esp_deep_sleep_start() };
        loop {
            core::hint::spin_loop();
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl SleepPort for HardwareAdapter {
    fn configure_trigger_input(&mut self, gpio: i32) {
        info!("sleep(sim): GPIO {} -> input, pull-up", gpio);
    }

    fn arm_trigger_wake(&mut self, gpio: i32, level_high: bool) {
        info!("sleep(sim): ext0 wake on GPIO {} level {}", gpio, level_high as u8);
    }

    fn arm_timer_wake(&mut self, micros: u64) {
        if micros == 0 {
            warn!("sleep(sim): zero timer interval");
        }
        info!("sleep(sim): timer wake in {} us", micros);
    }

    fn enter_deep_sleep(&mut self) -> ! {
        info!("sleep(sim): deep sleep, exiting");
        std::process::exit(self.sim_exit_code)
    }
}
