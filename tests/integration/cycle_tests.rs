//! End-to-end wake cycles through [`CycleService`] with mock adapters.
//!
//! Each test picks a wake cause and a pin/network script, runs exactly one
//! cycle, then checks what was sent, how long the node waited, and that the
//! wake sources were re-armed the right number of times.

use trapnode::app::events::CycleEvent;
use trapnode::app::ports::{SendError, TransportError};
use trapnode::app::service::{CycleOutcome, CycleReport, CycleService};
use trapnode::config::NodeConfig;
use trapnode::delivery::DeliveryOutcome;
use trapnode::error::Error;
use trapnode::fsm::CyclePhase;
use trapnode::pins;
use trapnode::wake::{CycleIntent, HeartbeatKind, WakeReason};

use crate::mock_hw::*;

const BACKOFF_MS: u32 = 1_000;
const DEBOUNCE_INTERVAL_MS: u32 = 10;

fn service() -> CycleService {
    CycleService::new(NodeConfig { wifi_ssid: "trapnet", ..NodeConfig::from_build() }, pins::TRAP_GPIO)
}

fn run(ports: &mut MockPorts) -> (CycleOutcome, RecordingSink) {
    let mut sink = RecordingSink::default();
    let outcome = service().run_cycle(ports, &mut sink);
    (outcome, sink)
}

fn expect_sleep(outcome: CycleOutcome) -> CycleReport {
    match outcome {
        CycleOutcome::Sleep(report) => report,
        CycleOutcome::Halt(e) => panic!("cycle halted: {e}"),
    }
}

fn phases(sink: &RecordingSink) -> Vec<CyclePhase> {
    sink.events
        .iter()
        .filter_map(|e| match e {
            CycleEvent::PhaseChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

// ── Classification ────────────────────────────────────────────

#[test]
fn cold_boot_sends_single_poweron_heartbeat() {
    let mut ports = mock_ports(WakeReason::ColdBoot, ScriptedPin::held(), MockClient::failing(0));
    let report = expect_sleep(run(&mut ports).0);

    assert_eq!(report.intent, CycleIntent::heartbeat(HeartbeatKind::PowerOn));
    assert_eq!(ports.client.sends, vec![(vec!["msg=poweron".to_string()], vec![])]);
    assert_eq!(ports.sensors.reads, 0, "power-on heartbeat must not sample the battery");
    assert_eq!(ports.trigger.reads, 0);
}

#[test]
fn confirmed_trap_sends_single_mouse_entry() {
    let mut ports = mock_ports(
        WakeReason::ExternalTriggerLevel,
        ScriptedPin::held(),
        MockClient::failing(0),
    );
    let (outcome, sink) = run(&mut ports);
    let report = expect_sleep(outcome);

    assert_eq!(report.intent, CycleIntent::mouse_event());
    assert_eq!(ports.client.sends, vec![(vec![], vec!["msg=mouse".to_string()])]);
    assert_eq!(ports.trigger.reads, 100);
    assert_eq!(ports.delay.count(DEBOUNCE_INTERVAL_MS), 100);
    assert!(phases(&sink).contains(&CyclePhase::Debouncing));
}

#[test]
fn trap_noise_goes_back_to_sleep_without_network() {
    let mut ports = mock_ports(
        WakeReason::ExternalTriggerLevel,
        ScriptedPin::released_after(5),
        MockClient::failing(0),
    );
    let (outcome, sink) = run(&mut ports);
    let report = expect_sleep(outcome);

    assert_eq!(report.intent, CycleIntent::idle());
    assert_eq!(report.delivery, None);
    assert_eq!(ports.trigger.reads, 6);
    assert_eq!(ports.transport.begun, 0);
    assert!(ports.client.sends.is_empty());
    assert_eq!(ports.hw.rearm_count(), 1);
    assert_eq!(
        phases(&sink),
        vec![
            CyclePhase::Classifying,
            CyclePhase::Debouncing,
            CyclePhase::Classified,
            CyclePhase::Idle,
            CyclePhase::Sleeping,
        ]
    );
}

#[test]
fn unsupported_wake_sources_report_nothing() {
    for reason in [WakeReason::ExternalTriggerEdgeGroup, WakeReason::TouchPad, WakeReason::UlpProgram] {
        let mut ports = mock_ports(reason, ScriptedPin::held(), MockClient::failing(0));
        let report = expect_sleep(run(&mut ports).0);

        assert_eq!(report.intent, CycleIntent::idle(), "{reason:?}");
        assert_eq!(ports.trigger.reads, 0, "{reason:?} must not poll the trap pin");
        assert_eq!(ports.transport.begun, 0, "{reason:?}");
        assert_eq!(ports.hw.rearm_count(), 1, "{reason:?}");
    }
}

#[test]
fn timer_wake_sends_live_heartbeat() {
    let mut ports = mock_ports(WakeReason::TimerElapsed, ScriptedPin::held(), MockClient::failing(0));
    let report = expect_sleep(run(&mut ports).0);

    assert_eq!(report.intent, CycleIntent::heartbeat(HeartbeatKind::Live));
    assert_eq!(
        ports.client.sends,
        vec![(vec!["msg=heartbeat batt=4.000000 rssi=-67".to_string()], vec![])]
    );
    assert_eq!(ports.sensors.reads, 1);
}

#[test]
fn timer_heartbeat_includes_environment_when_present() {
    let mut ports = mock_ports(WakeReason::TimerElapsed, ScriptedPin::held(), MockClient::failing(0));
    ports.sensors.env = Some(trapnode::app::ports::EnvReading { temperature_c: 21.5, humidity_pct: 40.25 });
    expect_sleep(run(&mut ports).0);

    assert_eq!(
        ports.client.sends[0].0,
        vec!["msg=heartbeat batt=4.000000 rssi=-67 temp=21.50 humidity=40.25".to_string()]
    );
}

// ── Delivery ──────────────────────────────────────────────────

#[test]
fn success_on_fifth_attempt_waits_four_times() {
    let mut ports = mock_ports(WakeReason::TimerElapsed, ScriptedPin::held(), MockClient::failing(4));
    let (outcome, sink) = run(&mut ports);
    let report = expect_sleep(outcome);

    assert_eq!(ports.client.sends.len(), 5);
    assert_eq!(ports.delay.count(BACKOFF_MS), 4);
    assert_eq!(
        report.delivery,
        Some(DeliveryOutcome::Success { attempts: 5, elapsed_ms: 4 * BACKOFF_MS as u64 })
    );
    let failed = sink.events.iter().filter(|e| matches!(e, CycleEvent::AttemptFailed(_))).count();
    assert_eq!(failed, 4);
    assert_eq!(ports.hw.rearm_count(), 1);
}

#[test]
fn every_attempt_failing_discards_entries_and_still_sleeps() {
    let mut ports = mock_ports(WakeReason::ColdBoot, ScriptedPin::held(), MockClient::failing(10));
    let (outcome, sink) = run(&mut ports);
    let report = expect_sleep(outcome);

    assert_eq!(ports.client.sends.len(), 6);
    assert_eq!(ports.delay.count(BACKOFF_MS), 5, "no wait after the last attempt");
    assert_eq!(report.delivery, Some(DeliveryOutcome::Exhausted { attempts: 6 }));
    assert!(sink.events.contains(&CycleEvent::Exhausted { attempts: 6, discarded: 1 }));
    assert!(sink.events.iter().any(|e| matches!(
        e,
        CycleEvent::AttemptFailed(a) if a.ordinal == 6 && a.error == SendError::Status(500)
    )));
    assert_eq!(ports.hw.rearm_count(), 1);
}

#[test]
fn retries_resend_the_same_entries() {
    let mut ports = mock_ports(WakeReason::ColdBoot, ScriptedPin::held(), MockClient::failing(2));
    expect_sleep(run(&mut ports).0);

    assert_eq!(ports.client.sends.len(), 3);
    assert!(ports.client.sends.windows(2).all(|w| w[0] == w[1]));
}

// ── Halt ──────────────────────────────────────────────────────

#[test]
fn network_setup_failure_halts_without_rearm() {
    let mut ports = mock_ports(WakeReason::TimerElapsed, ScriptedPin::held(), MockClient::failing(0));
    ports.transport.result = Err(TransportError::TimeSyncFailed);
    let (outcome, sink) = run(&mut ports);

    assert_eq!(outcome, CycleOutcome::Halt(Error::Provisioning(TransportError::TimeSyncFailed)));
    assert!(ports.client.sends.is_empty());
    assert_eq!(ports.hw.rearm_count(), 0);
    assert!(ports.hw.calls.is_empty());
    assert_eq!(phases(&sink).last(), Some(&CyclePhase::Halted));
}

#[test]
fn client_setup_failure_halts_without_rearm() {
    let mut ports = mock_ports(
        WakeReason::ExternalTriggerLevel,
        ScriptedPin::held(),
        MockClient::failing(0),
    );
    ports.client.begin_result = Err(trapnode::app::ports::ClientError::ClockNotSynced);
    let (outcome, _) = run(&mut ports);

    assert!(matches!(outcome, CycleOutcome::Halt(Error::ClientSetup(_))));
    assert_eq!(ports.hw.rearm_count(), 0);
}

// ── Re-arm ────────────────────────────────────────────────────

#[test]
fn rearm_configures_trap_and_timer() {
    let mut ports = mock_ports(WakeReason::TimerElapsed, ScriptedPin::held(), MockClient::failing(0));
    let report = expect_sleep(run(&mut ports).0);

    assert_eq!(
        ports.hw.calls,
        vec![
            SleepCall::ConfigureInput(pins::TRAP_GPIO),
            SleepCall::ArmTrigger { gpio: pins::TRAP_GPIO, level_high: pins::TRAP_ACTIVE_LEVEL_HIGH },
            SleepCall::ArmTimer { micros: 600 * 1_000_000 },
        ]
    );
    assert_eq!(report.armed.trigger_gpio, pins::TRAP_GPIO);
    assert_eq!(report.armed.sleep_secs, 600);
}

// ── Sensor degrade ────────────────────────────────────────────

#[test]
fn failed_environment_sensor_sends_zeroed_heartbeat() {
    use trapnode::app::service::CyclePorts;
    use trapnode::sensors::NodeSensors;
    use trapnode::sensors::battery::BatteryMonitor;

    let base = mock_ports(WakeReason::TimerElapsed, ScriptedPin::held(), MockClient::failing(0));
    let mut ports = CyclePorts {
        trigger: base.trigger,
        delay: base.delay,
        clock: base.clock,
        hw: base.hw,
        sensors: NodeSensors::new(
            BatteryMonitor::new(FixedAdc(2482), 10, 5),
            NoDelay,
            Some(DeadEnvSensor { begin_calls: 0 }),
        ),
        transport: base.transport,
        client: base.client,
    };
    let mut sink = RecordingSink::default();
    let report = expect_sleep(service().run_cycle(&mut ports, &mut sink));

    assert_eq!(report.delivery.map(|d| d.is_success()), Some(true));
    let heartbeat = &ports.client.sends[0].0[0];
    assert!(heartbeat.starts_with("msg=heartbeat batt=4.0"), "{heartbeat}");
    assert!(heartbeat.ends_with(" rssi=-67 temp=0.00 humidity=0.00"), "{heartbeat}");
    assert_eq!(ports.sensors.env_failures(), 1);
    assert_eq!(ports.hw.rearm_count(), 1);
}
