//! Bounded send-retry loop.
//!
//! ```text
//!   attempt 1 ──fail──▶ wait ──▶ attempt 2 ──fail──▶ wait ──▶ … attempt N
//!       │                            │                            │
//!    success                      success                      fail
//!       ▼                            ▼                            ▼
//!   Success{1}                   Success{2}                 Exhausted{N}
//! ```
//!
//! Every failure is reported through the event sink.  On success the
//! stream entries are cleared; on exhaustion they are discarded (the node
//! keeps nothing across deep sleep, so the data is lost).  No wait follows
//! the final attempt.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::app::events::CycleEvent;
use crate::app::ports::{Clock, DeliveryClientPort, EventSink, SendError};
use crate::loki::Streams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Success { attempts: u8, elapsed_ms: u64 },
    Exhausted { attempts: u8 },
}

impl DeliveryOutcome {
    pub fn attempts(&self) -> u8 {
        match *self {
            Self::Success { attempts, .. } | Self::Exhausted { attempts } => attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One failed send, as reported to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryAttempt {
    /// 1-based.
    pub ordinal: u8,
    pub of: u8,
    pub error: SendError,
    /// Time since the first attempt started.
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct DeliveryRetryLoop {
    attempts: u8,
    backoff_ms: u32,
}

impl DeliveryRetryLoop {
    /// `attempts` is the total, including the first send.  Zero is treated
    /// as one.
    pub fn new(attempts: u8, backoff_ms: u32) -> Self {
        Self { attempts: attempts.max(1), backoff_ms }
    }

    pub fn max_attempts(&self) -> u8 {
        self.attempts
    }

    pub fn deliver<L, D, C, E>(
        &self,
        streams: &mut Streams,
        client: &mut L,
        delay: &mut D,
        clock: &C,
        sink: &mut E,
    ) -> DeliveryOutcome
    where
        L: DeliveryClientPort,
        D: DelayNs,
        C: Clock,
        E: EventSink,
    {
        let start = clock.uptime_ms();
        for ordinal in 1..=self.attempts {
            match client.send(streams) {
                Ok(()) => {
                    streams.reset_entries();
                    let elapsed_ms = clock.uptime_ms().saturating_sub(start);
                    info!("Send successful in {}ms", elapsed_ms);
                    sink.emit(&CycleEvent::Delivered { attempts: ordinal, elapsed_ms });
                    return DeliveryOutcome::Success { attempts: ordinal, elapsed_ms };
                }
                Err(error) => {
                    let attempt = DeliveryAttempt {
                        ordinal,
                        of: self.attempts,
                        error,
                        elapsed_ms: clock.uptime_ms().saturating_sub(start),
                    };
                    sink.emit(&CycleEvent::AttemptFailed(attempt));
                    if ordinal < self.attempts {
                        delay.delay_ms(self.backoff_ms);
                    }
                }
            }
        }

        let discarded = streams.entry_count();
        streams.reset_entries();
        let outcome = DeliveryOutcome::Exhausted { attempts: self.attempts };
        sink.emit(&CycleEvent::Exhausted { attempts: self.attempts, discarded });
        outcome
    }
}
