//! Polled debounce for the trap switch.
//!
//! ## Hardware
//!
//! Active-low micro-switch with pull-up.  A genuine trap event holds the
//! line low for at least one second, so the filter polls the pin every
//! `interval_ms` for `samples` samples and gives up on the first sample
//! that reads the released (high) level.
//!
//! | Pin sequence                 | Samples taken | Verdict     |
//! |------------------------------|---------------|-------------|
//! | low for every sample         | `samples`     | `Confirmed` |
//! | high at sample `k`           | `k + 1`       | `Noise`     |
//!
//! The poll is one-shot and blocking; there is no cancellation.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{debug, info, warn};

/// Result of one debounce poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceVerdict {
    /// The trigger held its active level for the whole window.
    Confirmed,
    /// The pin returned to its inactive level after `samples` reads.
    Noise { samples: u8 },
}

impl DebounceVerdict {
    pub fn is_confirmed(self) -> bool {
        self == Self::Confirmed
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DebounceFilter {
    samples: u8,
    interval_ms: u32,
}

impl DebounceFilter {
    pub fn new(samples: u8, interval_ms: u32) -> Self {
        Self { samples, interval_ms }
    }

    /// `true` only when every sample in the window reads active.
    pub fn confirm<P: InputPin, D: DelayNs>(&self, pin: &mut P, delay: &mut D) -> bool {
        self.poll(pin, delay).is_confirmed()
    }

    /// Poll the pin, stopping at the first inactive sample.
    pub fn poll<P: InputPin, D: DelayNs>(&self, pin: &mut P, delay: &mut D) -> DebounceVerdict {
        for i in 0..self.samples {
            let active = match pin.is_low() {
                Ok(low) => low,
                Err(e) => {
                    warn!("debounce: pin read failed at sample {} ({:?}), treating as noise", i, e);
                    false
                }
            };
            if !active {
                info!("debounce: trigger released after {} samples, likely noise", i + 1);
                return DebounceVerdict::Noise { samples: i + 1 };
            }
            debug!("debounce: sample {} active", i);
            delay.delay_ms(self.interval_ms);
        }
        DebounceVerdict::Confirmed
    }

    /// Longest the poll can block, in milliseconds.
    pub fn window_ms(&self) -> u32 {
        self.samples as u32 * self.interval_ms
    }
}
