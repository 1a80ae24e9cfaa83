//! ESP32 time adapter.
//!
//! - **`target_os = "espidf"`**: monotonic uptime from `esp_timer_get_time()`,
//!   wall clock from `gettimeofday()` (set by SNTP).
//! - **`not(target_os = "espidf")`**: `std::time` for host-side testing
//!   and simulation.

use crate::app::ports::Clock;

/// Reject obviously unsynced wall time (anything before 2020-01-01).
pub const EPOCH_2020_SECS: u64 = 1_577_836_800;

/// Milliseconds since boot (monotonic).
#[cfg(target_os = "espidf")]
pub fn uptime_ms() -> u64 {
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
}

/// Milliseconds since the first call (monotonic).
#[cfg(not(target_os = "espidf"))]
pub fn uptime_ms() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u64
}

/// Wall-clock nanoseconds since the Unix epoch, `None` if the clock has
/// not been synced yet.
#[cfg(target_os = "espidf")]
pub fn wall_clock_nanos() -> Option<u64> {
    let mut tv = esp_idf_svc::sys::timeval { tv_sec: 0, tv_usec: 0 };
    if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
        return None;
    }
    let secs = tv.tv_sec as u64;
    if secs < EPOCH_2020_SECS {
        return None;
    }
    Some(secs * 1_000_000_000 + tv.tv_usec as u64 * 1_000)
}

#[cfg(not(target_os = "espidf"))]
pub fn wall_clock_nanos() -> Option<u64> {
    let d = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?;
    if d.as_secs() < EPOCH_2020_SECS {
        return None;
    }
    Some(d.as_nanos() as u64)
}

/// [`Clock`] over [`uptime_ms`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UptimeClock;

impl Clock for UptimeClock {
    fn uptime_ms(&self) -> u64 {
        uptime_ms()
    }
}
