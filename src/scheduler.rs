//! Deep-sleep re-arm.
//!
//! Every non-fatal cycle ends here: the trap pin goes back to pulled-up
//! input, EXT0 is armed on the trap's active level, the RTC timer is armed
//! for the next heartbeat, and the chip sleeps.
//!
//! Re-arming and entering sleep are split.  [`SleepScheduler::rearm`]
//! returns an [`ArmedSleep`] token, and only that token can
//! [`enter`](ArmedSleep::enter) deep sleep, so sleep without re-armed wake
//! sources cannot be expressed.

use log::info;

use crate::app::ports::SleepPort;
use crate::drivers::watchdog::Watchdog;
use crate::pins;

const MICROS_PER_SEC: u64 = 1_000_000;

/// Proof that both wake sources are armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an armed sleep must be entered"]
pub struct ArmedSleep {
    pub trigger_gpio: i32,
    pub sleep_secs: u32,
}

impl ArmedSleep {
    /// Disarm the watchdog and enter deep sleep.  Never returns.
    pub fn enter<S: SleepPort>(self, sleep: &mut S, watchdog: Watchdog) -> ! {
        watchdog.disarm();
        info!(
            "Going to sleep now (trigger GPIO {}, timer {}s)",
            self.trigger_gpio, self.sleep_secs
        );
        sleep.enter_deep_sleep()
    }
}

pub struct SleepScheduler;

impl SleepScheduler {
    pub fn rearm<S: SleepPort>(sleep: &mut S, trigger_gpio: i32, sleep_secs: u32) -> ArmedSleep {
        sleep.configure_trigger_input(trigger_gpio);
        sleep.arm_trigger_wake(trigger_gpio, pins::TRAP_ACTIVE_LEVEL_HIGH);
        sleep.arm_timer_wake(sleep_secs as u64 * MICROS_PER_SEC);
        info!("Setup ESP32 to sleep for every {} Seconds", sleep_secs);
        ArmedSleep { trigger_gpio, sleep_secs }
    }
}
