//! Message composition: turns a [`CycleIntent`] plus telemetry into the
//! log-line bodies pushed to Loki.
//!
//! | Payload           | Body                                                        |
//! |-------------------|-------------------------------------------------------------|
//! | mouse event       | `msg=mouse`                                                 |
//! | cold boot         | `msg=poweron`                                               |
//! | live heartbeat    | `msg=heartbeat batt=4.001465 rssi=-67`                      |
//! | (+ SHT3x variant) | `... temp=21.37 humidity=48.02`                             |
//!
//! Bodies are fixed-capacity `heapless` strings sized to the stream limits.
//! Telemetry is clamped before formatting so the longest possible live
//! heartbeat (66 characters) fits by construction.

use core::fmt::Write;

use heapless::String;
use log::debug;

use crate::app::ports::{EnvReading, SensorPort};
use crate::wake::HeartbeatKind;

pub const MOUSE_BODY: &str = "msg=mouse";
pub const POWERON_BODY: &str = "msg=poweron";

/// Longest heartbeat body (the heartbeat stream holds up to 99 characters).
pub const HEARTBEAT_CAPACITY: usize = 99;
/// Longest mouse body (the mouse stream holds up to 9 characters).
pub const MOUSE_CAPACITY: usize = 9;

pub type HeartbeatText = String<HEARTBEAT_CAPACITY>;
pub type MouseText = String<MOUSE_CAPACITY>;

const _: () = assert!(MOUSE_BODY.len() <= MOUSE_CAPACITY);
const _: () = assert!(POWERON_BODY.len() <= HEARTBEAT_CAPACITY);

// Clamp ranges.  Wider than anything the hardware can produce; they exist
// only to bound the formatted width.
const BATTERY_MAX_V: f32 = 99.0;
const TEMP_MIN_C: f32 = -99.99;
const TEMP_MAX_C: f32 = 999.99;
const HUMIDITY_MAX_PCT: f32 = 100.0;

/// Fresh readings for one live heartbeat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    pub battery_volts: f32,
    pub rssi_dbm: i8,
    pub environment: Option<EnvReading>,
}

impl TelemetrySnapshot {
    /// Read battery and (if fitted) the environmental sensor.
    pub fn capture<S: SensorPort>(sensors: &mut S, rssi_dbm: i8) -> Self {
        let battery_volts = sensors.battery_volts();
        let environment = sensors.environment();
        Self { battery_volts, rssi_dbm, environment }
    }

    /// Copy with every value forced into its printable range.
    pub fn clamped(&self) -> Self {
        Self {
            battery_volts: clamp_finite(self.battery_volts, 0.0, BATTERY_MAX_V),
            rssi_dbm: self.rssi_dbm,
            environment: self.environment.map(|e| EnvReading {
                temperature_c: clamp_finite(e.temperature_c, TEMP_MIN_C, TEMP_MAX_C),
                humidity_pct: clamp_finite(e.humidity_pct, 0.0, HUMIDITY_MAX_PCT),
            }),
        }
    }
}

/// NaN and infinities become 0.0.
fn clamp_finite(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_finite() { v.clamp(lo, hi) } else { 0.0 }
}

pub fn compose_mouse() -> MouseText {
    let mut text = MouseText::new();
    text.push_str(MOUSE_BODY).expect("mouse body exceeds capacity");
    text
}

/// Build the heartbeat body for `kind`.  Sensors and radio are only read
/// for [`HeartbeatKind::Live`].
pub fn compose_heartbeat<S: SensorPort>(kind: HeartbeatKind, sensors: &mut S, rssi_dbm: i8) -> HeartbeatText {
    match kind {
        HeartbeatKind::PowerOn => {
            let mut text = HeartbeatText::new();
            text.push_str(POWERON_BODY).expect("power-on body exceeds capacity");
            text
        }
        HeartbeatKind::Live => format_heartbeat(&TelemetrySnapshot::capture(sensors, rssi_dbm)),
    }
}

/// Format a live heartbeat from a snapshot.
pub fn format_heartbeat(snapshot: &TelemetrySnapshot) -> HeartbeatText {
    let t = snapshot.clamped();
    let mut text = HeartbeatText::new();
    write!(text, "msg=heartbeat batt={:.6} rssi={}", t.battery_volts, t.rssi_dbm)
        .expect("heartbeat body exceeds capacity");
    if let Some(env) = t.environment {
        write!(text, " temp={:.2} humidity={:.2}", env.temperature_c, env.humidity_pct)
            .expect("heartbeat body exceeds capacity");
    }
    debug!("compose: heartbeat '{}' ({} chars)", text, text.len());
    text
}
