//! Cycle service: the hexagonal core.
//!
//! [`CycleService`] runs exactly one wake cycle: classify the wake, bring
//! the network up if something must be reported, compose and deliver the
//! entries, and re-arm the wake sources.  All I/O flows through the ports
//! bundled in [`CyclePorts`], so the whole cycle runs against mocks on the
//! host.
//!
//! ```text
//!  WakeSourcePort ──▶ ┌───────────────────────────┐ ──▶ EventSink
//!  InputPin/DelayNs ─▶│        CycleService        │
//!  SensorPort ──────▶ │ classify · compose · send  │ ──▶ SleepPort
//!  Transport/Client ◀▶└───────────────────────────┘
//! ```
//!
//! The service never sleeps or spins itself.  It returns a
//! [`CycleOutcome`] and `main` acts on it.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{error, info, warn};

use crate::compose;
use crate::config::NodeConfig;
use crate::delivery::{DeliveryOutcome, DeliveryRetryLoop};
use crate::drivers::debounce::DebounceFilter;
use crate::error::Result;
use crate::fsm::{CyclePhase, PhaseTracker};
use crate::loki::{StreamKind, Streams};
use crate::scheduler::{ArmedSleep, SleepScheduler};
use crate::wake::{CycleIntent, WakeClassifier, WakeReason};

use super::events::CycleEvent;
use super::ports::{
    Clock, DeliveryClientPort, Endpoint, EventSink, SensorPort, SleepPort, TransportPort,
    TransportSettings, WakeSourcePort,
};

// ───────────────────────────────────────────────────────────────
// Ports bundle
// ───────────────────────────────────────────────────────────────

/// Everything one cycle touches.  Built fresh in `main` on every wake.
pub struct CyclePorts<P, D, C, H, S, T, L> {
    /// Trap switch.
    pub trigger: P,
    /// Shared by debounce polling and send backoff.
    pub delay: D,
    pub clock: C,
    /// Wake cause and deep-sleep control.
    pub hw: H,
    pub sensors: S,
    pub transport: T,
    pub client: L,
}

// ───────────────────────────────────────────────────────────────
// Outcome
// ───────────────────────────────────────────────────────────────

/// Summary of a cycle that ended in re-armed sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub reason: WakeReason,
    pub intent: CycleIntent,
    /// `None` when nothing was sent (idle wake, or every entry rejected).
    pub delivery: Option<DeliveryOutcome>,
    pub armed: ArmedSleep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum CycleOutcome {
    /// Wake sources armed; enter deep sleep.
    Sleep(CycleReport),
    /// Fatal setup failure; idle until the watchdog resets the chip.
    Halt(crate::error::Error),
}

// ───────────────────────────────────────────────────────────────
// CycleService
// ───────────────────────────────────────────────────────────────

pub struct CycleService {
    config: NodeConfig,
    classifier: WakeClassifier,
    retry: DeliveryRetryLoop,
    trigger_gpio: i32,
}

impl CycleService {
    pub fn new(config: NodeConfig, trigger_gpio: i32) -> Self {
        let classifier = WakeClassifier::new(DebounceFilter::new(
            config.debounce_samples,
            config.debounce_interval_ms,
        ));
        let retry = DeliveryRetryLoop::new(config.send_attempts, config.send_backoff_ms);
        Self { config, classifier, retry, trigger_gpio }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Run one wake cycle to its terminal phase.
    pub fn run_cycle<P, D, C, H, S, T, L>(
        &self,
        ports: &mut CyclePorts<P, D, C, H, S, T, L>,
        sink: &mut impl EventSink,
    ) -> CycleOutcome
    where
        P: InputPin,
        D: DelayNs,
        C: Clock,
        H: WakeSourcePort + SleepPort,
        S: SensorPort,
        T: TransportPort,
        L: DeliveryClientPort,
    {
        let mut phases = PhaseTracker::new();

        // 1. Classify
        let reason = ports.hw.wake_reason();
        sink.emit(&CycleEvent::Woke(reason));
        step(&mut phases, CyclePhase::Classifying, sink);
        if reason.needs_debounce() {
            step(&mut phases, CyclePhase::Debouncing, sink);
        }
        let intent = self.classifier.classify(reason, &mut ports.trigger, &mut ports.delay);
        step(&mut phases, CyclePhase::Classified, sink);
        sink.emit(&CycleEvent::Classified(intent));

        if !intent.requires_network() {
            step(&mut phases, CyclePhase::Idle, sink);
            let armed = self.rearm(&mut ports.hw, &mut phases, sink);
            return CycleOutcome::Sleep(CycleReport { reason, intent, delivery: None, armed });
        }

        // 2. Connect
        step(&mut phases, CyclePhase::Connecting, sink);
        if let Err(e) = self.connect(&mut ports.transport, &mut ports.client) {
            error!("Cycle halted: {}", e);
            step(&mut phases, CyclePhase::Halted, sink);
            sink.emit(&CycleEvent::Halted(e));
            return CycleOutcome::Halt(e);
        }

        // 3. Compose
        step(&mut phases, CyclePhase::Composing, sink);
        let mut streams = Streams::new(self.config.node_id);
        self.compose(intent, ports, &mut streams, sink);

        // 4. Deliver
        let delivery = if streams.is_empty() {
            warn!("No entries accepted, skipping send");
            None
        } else {
            step(&mut phases, CyclePhase::Delivering, sink);
            Some(self.retry.deliver(
                &mut streams,
                &mut ports.client,
                &mut ports.delay,
                &ports.clock,
                sink,
            ))
        };

        // 5. Sleep
        let armed = self.rearm(&mut ports.hw, &mut phases, sink);
        CycleOutcome::Sleep(CycleReport { reason, intent, delivery, armed })
    }

    // ── Steps ─────────────────────────────────────────────────

    fn connect<T: TransportPort, L: DeliveryClientPort>(&self, transport: &mut T, client: &mut L) -> Result<()> {
        let c = &self.config;
        c.validate()?;

        info!("Connecting to '{}'", c.wifi_ssid);
        transport.begin(&TransportSettings {
            ssid: c.wifi_ssid,
            password: c.wifi_password,
            use_tls: c.use_tls,
            ntp_server: c.ntp_server,
            setup_budget_ms: c.network_setup_budget_ms,
        })?;

        client.begin(&Endpoint {
            host: c.loki_host,
            path: c.loki_path,
            port: c.loki_port,
            use_tls: c.use_tls,
            timeout_ms: c.http_timeout_ms,
        })?;
        info!("Network ready (rssi={}dBm)", transport.rssi_dbm());
        Ok(())
    }

    fn compose<P, D, C, H, S, T, L>(
        &self,
        intent: CycleIntent,
        ports: &mut CyclePorts<P, D, C, H, S, T, L>,
        streams: &mut Streams,
        sink: &mut impl EventSink,
    ) where
        S: SensorPort,
        T: TransportPort,
        L: DeliveryClientPort,
    {
        let now = ports.client.current_time_nanos();

        if intent.report_mouse_event {
            let body = compose::compose_mouse();
            if let Err(error) = streams.mouse.add_entry(now, &body) {
                warn!("mouse entry rejected: {}", error);
                sink.emit(&CycleEvent::EntryRejected { stream: StreamKind::Mouse, error });
            }
        }

        if let Some(kind) = intent.heartbeat {
            let body = compose::compose_heartbeat(kind, &mut ports.sensors, ports.transport.rssi_dbm());
            if let Err(error) = streams.heartbeat.add_entry(now, &body) {
                warn!("heartbeat entry rejected: {}", error);
                sink.emit(&CycleEvent::EntryRejected { stream: StreamKind::Heartbeat, error });
            }
        }
    }

    fn rearm<H: SleepPort>(
        &self,
        hw: &mut H,
        phases: &mut PhaseTracker,
        sink: &mut impl EventSink,
    ) -> ArmedSleep {
        let armed = SleepScheduler::rearm(hw, self.trigger_gpio, self.config.sleep_secs);
        sink.emit(&CycleEvent::SleepArmed {
            trigger_gpio: armed.trigger_gpio,
            sleep_secs: armed.sleep_secs,
        });
        step(phases, CyclePhase::Sleeping, sink);
        armed
    }
}

/// Advance the tracker and report the transition.
fn step(phases: &mut PhaseTracker, next: CyclePhase, sink: &mut impl EventSink) {
    let from = phases.current();
    match phases.advance(next) {
        Ok(()) => sink.emit(&CycleEvent::PhaseChanged { from, to: next }),
        Err(e) => {
            error!("Cycle step out of order: {}", e);
            debug_assert!(false, "{e}");
        }
    }
}
