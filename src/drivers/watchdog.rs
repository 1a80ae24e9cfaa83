//! Task Watchdog Timer (TWDT) driver.
//!
//! Armed at the very start of a wake cycle: WiFi association or NTP sync
//! can hang in ways that never recover, and the watchdog turns that into a
//! reset.  It is never fed; the whole cycle must finish inside the timeout.
//! [`Watchdog::disarm`] runs right before deep sleep.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    timeout_secs: u32,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the current task.
    pub fn arm(timeout_secs: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: timeout_secs * 1000,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK as esp_err_t {
                    // Not initialised yet on this boot.
                    let ret = esp_task_wdt_init(&cfg);
                    if ret != ESP_OK as esp_err_t {
                        log::warn!("Watchdog: init returned {}", ret);
                    }
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK as esp_err_t;
                if subscribed {
                    info!("Watchdog: armed ({}s timeout, panic on trigger)", timeout_secs);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed, timeout_secs }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): armed ({}s, no-op)", timeout_secs);
            Self { timeout_secs }
        }
    }

    pub fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    /// Unsubscribe and tear down the TWDT before entering deep sleep.
    pub fn disarm(self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_delete(core::ptr::null_mut());
                    esp_task_wdt_deinit();
                }
            }
        }
        info!("Watchdog: disarmed");
    }
}
