//! Mock adapters for integration tests.
//!
//! Every mock records what the cycle did to it so tests can assert on the
//! full call history without touching real GPIO, RTC or network.

use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};
use trapnode::app::events::CycleEvent;
use trapnode::app::ports::{
    AnalogPort, ClientError, Clock, DeliveryClientPort, Endpoint, EnvReading, EnvironmentalSensor,
    EventSink, SendError, SensorPort, SleepPort, TransportError, TransportPort, TransportSettings,
    WakeSourcePort,
};
use trapnode::app::service::CyclePorts;
use trapnode::loki::Streams;
use trapnode::wake::WakeReason;

// ── Trap pin ──────────────────────────────────────────────────

/// Active-low pin: reads low (active) for the first `active_reads`
/// samples, high afterwards.
pub struct ScriptedPin {
    pub active_reads: u32,
    pub reads: u32,
}

impl ScriptedPin {
    pub fn held() -> Self {
        Self { active_reads: u32::MAX, reads: 0 }
    }

    pub fn released_after(active_reads: u32) -> Self {
        Self { active_reads, reads: 0 }
    }

    fn active(&mut self) -> bool {
        let active = self.reads < self.active_reads;
        self.reads += 1;
        active
    }
}

impl ErrorType for ScriptedPin {
    type Error = Infallible;
}

impl InputPin for ScriptedPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.active())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.active())
    }
}

// ── Time ──────────────────────────────────────────────────────

/// Delay that advances a shared fake clock instead of sleeping.
pub struct MockDelay {
    pub now_ms: Rc<Cell<u64>>,
    pub waits: Vec<u32>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_us(ns / 1_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.now_ms.set(self.now_ms.get() + (us / 1_000) as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits.push(ms);
        self.now_ms.set(self.now_ms.get() + ms as u64);
    }
}

impl MockDelay {
    /// Waits of exactly `ms`.
    pub fn count(&self, ms: u32) -> usize {
        self.waits.iter().filter(|&&w| w == ms).count()
    }
}

pub struct MockClock {
    pub now_ms: Rc<Cell<u64>>,
}

impl Clock for MockClock {
    fn uptime_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

// ── Wake / sleep hardware ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SleepCall {
    ConfigureInput(i32),
    ArmTrigger { gpio: i32, level_high: bool },
    ArmTimer { micros: u64 },
}

pub struct MockHardware {
    pub reason: WakeReason,
    pub calls: Vec<SleepCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(reason: WakeReason) -> Self {
        Self { reason, calls: Vec::new() }
    }

    /// Number of times the trigger wake source was armed.
    pub fn rearm_count(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, SleepCall::ArmTrigger { .. })).count()
    }
}

impl WakeSourcePort for MockHardware {
    fn wake_reason(&self) -> WakeReason {
        self.reason
    }
}

impl SleepPort for MockHardware {
    fn configure_trigger_input(&mut self, gpio: i32) {
        self.calls.push(SleepCall::ConfigureInput(gpio));
    }

    fn arm_trigger_wake(&mut self, gpio: i32, level_high: bool) {
        self.calls.push(SleepCall::ArmTrigger { gpio, level_high });
    }

    fn arm_timer_wake(&mut self, micros: u64) {
        self.calls.push(SleepCall::ArmTimer { micros });
    }

    fn enter_deep_sleep(&mut self) -> ! {
        panic!("deep sleep entered in test");
    }
}

// ── Sensors ───────────────────────────────────────────────────

pub struct MockSensors {
    pub volts: f32,
    pub env: Option<EnvReading>,
    pub reads: u32,
}

impl SensorPort for MockSensors {
    fn battery_volts(&mut self) -> f32 {
        self.reads += 1;
        self.volts
    }

    fn environment(&mut self) -> Option<EnvReading> {
        self.env
    }
}

/// Battery ADC stuck at one raw value.
pub struct FixedAdc(pub u16);

impl AnalogPort for FixedAdc {
    fn read_raw(&mut self) -> u16 {
        self.0
    }
}

/// Environmental sensor that never answers on the bus.
pub struct DeadEnvSensor {
    pub begin_calls: u32,
}

impl EnvironmentalSensor for DeadEnvSensor {
    type Error = &'static str;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.begin_calls += 1;
        Err("no ack")
    }

    fn measure(&mut self) -> Result<EnvReading, Self::Error> {
        Err("no ack")
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── Network ───────────────────────────────────────────────────

pub struct MockTransport {
    pub result: Result<(), TransportError>,
    pub rssi: i8,
    pub begun: u32,
}

impl TransportPort for MockTransport {
    fn begin(&mut self, _settings: &TransportSettings<'_>) -> Result<(), TransportError> {
        self.begun += 1;
        self.result
    }

    fn rssi_dbm(&self) -> i8 {
        self.rssi
    }
}

/// Answers sends from a script; an empty script means success.
pub struct MockClient {
    pub begin_result: Result<(), ClientError>,
    pub script: VecDeque<Result<(), SendError>>,
    pub now_nanos: u64,
    /// `(heartbeat bodies, mouse bodies)` seen by each send.
    pub sends: Vec<(Vec<String>, Vec<String>)>,
}

impl MockClient {
    pub fn failing(times: usize) -> Self {
        Self {
            begin_result: Ok(()),
            script: std::iter::repeat(Err(SendError::Status(500))).take(times).collect(),
            now_nanos: 1_700_000_000_000_000_000,
            sends: Vec::new(),
        }
    }
}

impl DeliveryClientPort for MockClient {
    fn begin(&mut self, _endpoint: &Endpoint<'_>) -> Result<(), ClientError> {
        self.begin_result
    }

    fn current_time_nanos(&self) -> u64 {
        self.now_nanos
    }

    fn send(&mut self, streams: &Streams) -> Result<(), SendError> {
        let bodies = |s: &trapnode::loki::Stream| s.entries().iter().map(|e| e.body.to_string()).collect();
        self.sends.push((bodies(&streams.heartbeat), bodies(&streams.mouse)));
        self.script.pop_front().unwrap_or(Ok(()))
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<CycleEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &CycleEvent) {
        self.events.push(event.clone());
    }
}

// ── Bundle ────────────────────────────────────────────────────

pub type MockPorts =
    CyclePorts<ScriptedPin, MockDelay, MockClock, MockHardware, MockSensors, MockTransport, MockClient>;

pub fn mock_ports(reason: WakeReason, pin: ScriptedPin, client: MockClient) -> MockPorts {
    let now_ms = Rc::new(Cell::new(0));
    CyclePorts {
        trigger: pin,
        delay: MockDelay { now_ms: now_ms.clone(), waits: Vec::new() },
        clock: MockClock { now_ms },
        hw: MockHardware::new(reason),
        sensors: MockSensors { volts: 4.0, env: None, reads: 0 },
        transport: MockTransport { result: Ok(()), rssi: -67, begun: 0 },
        client,
    }
}
