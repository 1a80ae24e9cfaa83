//! Host simulation wake setup, driven through the real sim adapters.
//!
//! The sim wake cause and trap level are process-wide, so every scenario
//! runs inside one test.

use embedded_hal::delay::DelayNs;
use trapnode::adapters::hardware::{HardwareAdapter, sim_prepare_wake};
use trapnode::app::ports::WakeSourcePort;
use trapnode::drivers::debounce::DebounceFilter;
use trapnode::drivers::trap_pin::TrapPin;
use trapnode::pins;
use trapnode::wake::{CycleIntent, HeartbeatKind, WakeClassifier, WakeReason};

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fn classify_sim(name: &str) -> (WakeReason, CycleIntent) {
    let reason = sim_prepare_wake(name).expect("known wake name");
    assert_eq!(HardwareAdapter::new().wake_reason(), reason, "{name}");
    let classifier = WakeClassifier::new(DebounceFilter::new(100, 10));
    let intent = classifier.classify(reason, &mut TrapPin::new(pins::TRAP_GPIO), &mut NoDelay);
    (reason, intent)
}

#[test]
fn sim_wake_names_classify_like_the_device() {
    assert_eq!(
        classify_sim("trap"),
        (WakeReason::ExternalTriggerLevel, CycleIntent::mouse_event())
    );
    assert_eq!(
        classify_sim("timer"),
        (WakeReason::TimerElapsed, CycleIntent::heartbeat(HeartbeatKind::Live))
    );
    assert_eq!(
        classify_sim("boot"),
        (WakeReason::ColdBoot, CycleIntent::heartbeat(HeartbeatKind::PowerOn))
    );
    assert_eq!(sim_prepare_wake("reset"), None);
}
