//! Wake classification: why did we leave deep sleep, and what must be
//! reported this cycle?
//!
//! ```text
//!   esp_sleep_get_wakeup_cause() ──▶ WakeReason ──▶ WakeClassifier ──▶ CycleIntent
//!                                                      │
//!                                 (EXT0 only) DebounceFilter ◀── trap pin
//! ```
//!
//! Classification never fails: any cause that is not one of the deep-sleep
//! wake sources is treated as a cold boot.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::info;

use crate::drivers::debounce::DebounceFilter;

// ---------------------------------------------------------------------------
// Wake reason
// ---------------------------------------------------------------------------

/// Hardware-reported reason for this wake.  Read once at cycle start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WakeReason {
    /// EXT0: single RTC GPIO held at its wake level (the trap switch).
    ExternalTriggerLevel,
    /// EXT1: any of a group of RTC GPIOs.
    ExternalTriggerEdgeGroup,
    /// Deep-sleep timer elapsed.
    TimerElapsed,
    TouchPad,
    UlpProgram,
    /// Power-on, reset, or any cause not attributable to a deep-sleep source.
    ColdBoot,
}

// esp_sleep_source_t discriminants (ESP-IDF v5).
const WAKEUP_EXT0: u32 = 2;
const WAKEUP_EXT1: u32 = 3;
const WAKEUP_TIMER: u32 = 4;
const WAKEUP_TOUCHPAD: u32 = 5;
const WAKEUP_ULP: u32 = 6;

impl WakeReason {
    /// Map a raw `esp_sleep_source_t` value.
    pub fn from_raw(cause: u32) -> Self {
        match cause {
            WAKEUP_EXT0 => Self::ExternalTriggerLevel,
            WAKEUP_EXT1 => Self::ExternalTriggerEdgeGroup,
            WAKEUP_TIMER => Self::TimerElapsed,
            WAKEUP_TOUCHPAD => Self::TouchPad,
            WAKEUP_ULP => Self::UlpProgram,
            _ => Self::ColdBoot,
        }
    }

    /// Whether classification has to confirm the trigger pin first.
    pub fn needs_debounce(self) -> bool {
        self == Self::ExternalTriggerLevel
    }
}

// ---------------------------------------------------------------------------
// Cycle intent
// ---------------------------------------------------------------------------

/// Which heartbeat payload this cycle sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatKind {
    /// Timer wake: build the heartbeat from fresh battery/RSSI/sensor reads.
    Live,
    /// Cold boot: canned power-on marker.
    PowerOn,
}

/// What this cycle must report.  Produced once by [`WakeClassifier`].
///
/// The heartbeat is an `Option<HeartbeatKind>` so "live telemetry implies
/// heartbeat" holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleIntent {
    pub report_mouse_event: bool,
    pub heartbeat: Option<HeartbeatKind>,
}

impl CycleIntent {
    /// Nothing to report; no network activity this cycle.
    pub const fn idle() -> Self {
        Self { report_mouse_event: false, heartbeat: None }
    }

    pub const fn mouse_event() -> Self {
        Self { report_mouse_event: true, heartbeat: None }
    }

    pub const fn heartbeat(kind: HeartbeatKind) -> Self {
        Self { report_mouse_event: false, heartbeat: Some(kind) }
    }

    pub fn report_heartbeat(&self) -> bool {
        self.heartbeat.is_some()
    }

    pub fn needs_live_telemetry(&self) -> bool {
        self.heartbeat == Some(HeartbeatKind::Live)
    }

    /// `false` means the cycle goes straight to sleep.
    pub fn requires_network(&self) -> bool {
        self.report_mouse_event || self.report_heartbeat()
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Turns a [`WakeReason`] into a [`CycleIntent`].
#[derive(Debug, Clone, Copy)]
pub struct WakeClassifier {
    debounce: DebounceFilter,
}

impl WakeClassifier {
    pub fn new(debounce: DebounceFilter) -> Self {
        Self { debounce }
    }

    /// Classify this wake.  For EXT0 wakes this blocks for up to the full
    /// debounce window while the trap pin is polled.
    pub fn classify<P: InputPin, D: DelayNs>(
        &self,
        reason: WakeReason,
        trigger: &mut P,
        delay: &mut D,
    ) -> CycleIntent {
        match reason {
            WakeReason::ExternalTriggerLevel => {
                info!("Wakeup caused by external signal using RTC_IO");
                if self.debounce.confirm(trigger, delay) {
                    info!("mouse trigger confirmed");
                    CycleIntent::mouse_event()
                } else {
                    CycleIntent::idle()
                }
            }
            WakeReason::TimerElapsed => {
                info!("Wakeup caused by timer");
                CycleIntent::heartbeat(HeartbeatKind::Live)
            }
            WakeReason::ColdBoot => {
                info!("Wakeup was not caused by deep sleep");
                CycleIntent::heartbeat(HeartbeatKind::PowerOn)
            }
            WakeReason::ExternalTriggerEdgeGroup => {
                info!("Wakeup caused by external signal using RTC_CNTL");
                CycleIntent::idle()
            }
            WakeReason::TouchPad => {
                info!("Wakeup caused by touchpad");
                CycleIntent::idle()
            }
            WakeReason::UlpProgram => {
                info!("Wakeup caused by ULP program");
                CycleIntent::idle()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Pin that reads a fixed level and counts reads.
    struct FixedPin {
        high: bool,
        reads: usize,
    }

    impl ErrorType for FixedPin {
        type Error = Infallible;
    }

    impl InputPin for FixedPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            self.reads += 1;
            Ok(self.high)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn classify(reason: WakeReason, pin_high: bool) -> (CycleIntent, usize) {
        let classifier = WakeClassifier::new(DebounceFilter::new(100, 10));
        let mut pin = FixedPin { high: pin_high, reads: 0 };
        let intent = classifier.classify(reason, &mut pin, &mut NoDelay);
        (intent, pin.reads)
    }

    #[test]
    fn raw_causes_map_to_reasons() {
        assert_eq!(WakeReason::from_raw(2), WakeReason::ExternalTriggerLevel);
        assert_eq!(WakeReason::from_raw(3), WakeReason::ExternalTriggerEdgeGroup);
        assert_eq!(WakeReason::from_raw(4), WakeReason::TimerElapsed);
        assert_eq!(WakeReason::from_raw(5), WakeReason::TouchPad);
        assert_eq!(WakeReason::from_raw(6), WakeReason::UlpProgram);
    }

    #[test]
    fn unattributed_causes_are_cold_boot() {
        for raw in [0, 1, 7, 8, 9, 12, 255] {
            assert_eq!(WakeReason::from_raw(raw), WakeReason::ColdBoot, "cause {raw}");
        }
    }

    #[test]
    fn timer_wake_requests_live_heartbeat() {
        let (intent, reads) = classify(WakeReason::TimerElapsed, true);
        assert!(intent.report_heartbeat());
        assert!(intent.needs_live_telemetry());
        assert!(!intent.report_mouse_event);
        assert_eq!(reads, 0, "timer wake must not touch the trap pin");
    }

    #[test]
    fn cold_boot_requests_canned_heartbeat() {
        let (intent, _) = classify(WakeReason::ColdBoot, true);
        assert_eq!(intent, CycleIntent::heartbeat(HeartbeatKind::PowerOn));
        assert!(!intent.needs_live_telemetry());
    }

    #[test]
    fn held_trigger_reports_mouse() {
        let (intent, reads) = classify(WakeReason::ExternalTriggerLevel, false);
        assert_eq!(intent, CycleIntent::mouse_event());
        assert_eq!(reads, 100);
    }

    #[test]
    fn released_trigger_is_noise() {
        let (intent, reads) = classify(WakeReason::ExternalTriggerLevel, true);
        assert_eq!(intent, CycleIntent::idle());
        assert_eq!(reads, 1);
    }

    #[test]
    fn other_sources_report_nothing() {
        for reason in [
            WakeReason::ExternalTriggerEdgeGroup,
            WakeReason::TouchPad,
            WakeReason::UlpProgram,
        ] {
            let (intent, reads) = classify(reason, false);
            assert!(!intent.report_mouse_event, "{reason:?}");
            assert!(!intent.report_heartbeat(), "{reason:?}");
            assert!(!intent.requires_network(), "{reason:?}");
            assert_eq!(reads, 0);
        }
    }

    #[test]
    fn only_ext0_needs_debounce() {
        assert!(WakeReason::ExternalTriggerLevel.needs_debounce());
        assert!(!WakeReason::ExternalTriggerEdgeGroup.needs_debounce());
        assert!(!WakeReason::ColdBoot.needs_debounce());
    }
}
