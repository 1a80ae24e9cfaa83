//! Outbound cycle events.
//!
//! The [`CycleService`](super::service::CycleService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  The serial-log adapter
//! renders them; tests record them.

use crate::delivery::DeliveryAttempt;
use crate::error::Error;
use crate::fsm::CyclePhase;
use crate::loki::{StreamError, StreamKind};
use crate::wake::{CycleIntent, WakeReason};

/// Structured events emitted during one wake cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleEvent {
    /// Wake cause read at cycle start.
    Woke(WakeReason),

    /// Classification finished.
    Classified(CycleIntent),

    /// The cycle moved between phases.
    PhaseChanged { from: CyclePhase, to: CyclePhase },

    /// A stream refused a composed body.  The cycle continues.
    EntryRejected { stream: StreamKind, error: StreamError },

    /// One send attempt failed.
    AttemptFailed(DeliveryAttempt),

    /// Entries delivered on attempt `attempts`.
    Delivered { attempts: u8, elapsed_ms: u64 },

    /// All attempts failed; `discarded` entries were dropped.
    Exhausted { attempts: u8, discarded: usize },

    /// Wake sources armed; deep sleep is next.
    SleepArmed { trigger_gpio: i32, sleep_secs: u32 },

    /// Fatal failure, no sleep re-arm.
    Halted(Error),
}
