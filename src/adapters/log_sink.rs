//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`CycleEvent`] as one tagged
//! line to the logger (UART on the device, stderr in the simulation).

use log::{error, info, warn};

use crate::app::events::CycleEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`CycleEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &CycleEvent) {
        match event {
            CycleEvent::Woke(reason) => {
                info!("WAKE  | reason={:?}", reason);
            }
            CycleEvent::Classified(intent) => {
                info!(
                    "WAKE  | mouse={} heartbeat={:?}",
                    intent.report_mouse_event, intent.heartbeat
                );
            }
            CycleEvent::PhaseChanged { .. } => {
                // Already logged by the phase tracker.
            }
            CycleEvent::EntryRejected { stream, error } => {
                warn!("SEND  | {} entry rejected: {}", stream.as_str(), error);
            }
            CycleEvent::AttemptFailed(a) => {
                warn!(
                    "SEND  | attempt {}/{} failed after {}ms: {}",
                    a.ordinal, a.of, a.elapsed_ms, a.error
                );
            }
            CycleEvent::Delivered { attempts, elapsed_ms } => {
                info!("SEND  | delivered in {}ms ({} attempt(s))", elapsed_ms, attempts);
            }
            CycleEvent::Exhausted { attempts, discarded } => {
                warn!(
                    "SEND  | gave up after {} attempts, {} entries discarded",
                    attempts, discarded
                );
            }
            CycleEvent::SleepArmed { trigger_gpio, sleep_secs } => {
                info!("SLEEP | armed: ext0 GPIO {}, timer {}s", trigger_gpio, sleep_secs);
            }
            CycleEvent::Halted(e) => {
                error!("HALT  | {}", e);
            }
        }
    }
}
