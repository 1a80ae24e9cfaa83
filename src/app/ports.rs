//! Port traits: the hexagonal boundary between the wake-cycle logic and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CycleService (domain)
//! ```
//!
//! Driven adapters (ESP32 peripherals, WiFi, the Loki HTTP client, the
//! serial log) implement these traits.  The
//! [`CycleService`](super::service::CycleService) consumes them via
//! generics, so the cycle logic never touches hardware directly.
//!
//! The trap pin and all blocking waits use the `embedded-hal` traits
//! ([`InputPin`](embedded_hal::digital::InputPin),
//! [`DelayNs`](embedded_hal::delay::DelayNs)) instead of bespoke ports.

use core::fmt;

use crate::loki::Streams;
use crate::wake::WakeReason;

// ───────────────────────────────────────────────────────────────
// Hardware ports (wake cause, sleep control, ADC)
// ───────────────────────────────────────────────────────────────

/// Read-side: why did the chip leave deep sleep?
pub trait WakeSourcePort {
    fn wake_reason(&self) -> WakeReason;
}

/// Deep-sleep controller.  Wake sources armed here are the only state
/// that survives until the next cycle.
pub trait SleepPort {
    /// Put the trigger pin back into pulled-up input mode.
    fn configure_trigger_input(&mut self, gpio: i32);

    /// Arm EXT0: wake when `gpio` reads `level_high`.
    fn arm_trigger_wake(&mut self, gpio: i32, level_high: bool);

    /// Arm the RTC timer wake source.
    fn arm_timer_wake(&mut self, micros: u64);

    /// Enter deep sleep.  Execution resumes at reset on the next wake.
    fn enter_deep_sleep(&mut self) -> !;
}

/// Single-channel raw ADC sampler (battery divider).
pub trait AnalogPort {
    /// One raw sample, 0..=4095 at 12-bit resolution.
    fn read_raw(&mut self) -> u16;
}

/// Monotonic millisecond clock (uptime), used for elapsed-time reporting.
pub trait Clock {
    fn uptime_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → composer)
// ───────────────────────────────────────────────────────────────

/// Temperature / humidity pair from the environmental sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnvReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Optional on-board environmental sensor (SHT3x on some node variants).
pub trait EnvironmentalSensor {
    type Error: fmt::Debug;

    /// Probe and reset the sensor.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// One blocking measurement.
    fn measure(&mut self) -> Result<EnvReading, Self::Error>;
}

/// Live telemetry reads used to build a heartbeat.
pub trait SensorPort {
    /// Averaged battery voltage in volts.
    fn battery_volts(&mut self) -> f32;

    /// `None` for node variants without an environmental sensor.  Variants
    /// with one always return `Some`, zero-filled if the sensor failed.
    fn environment(&mut self) -> Option<EnvReading>;
}

// ───────────────────────────────────────────────────────────────
// Network ports
// ───────────────────────────────────────────────────────────────

/// Everything the transport needs to associate and sync time.
#[derive(Debug, Clone, Copy)]
pub struct TransportSettings<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
    pub use_tls: bool,
    pub ntp_server: &'a str,
    /// Upper bound for association plus time sync (milliseconds).
    pub setup_budget_ms: u32,
}

/// Network association + trusted time base.
pub trait TransportPort {
    /// Associate with the AP and sync the clock.  Blocking.
    fn begin(&mut self, settings: &TransportSettings<'_>) -> Result<(), TransportError>;

    /// Signal strength of the active association (dBm).
    fn rssi_dbm(&self) -> i8;
}

/// Loki push endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    pub host: &'a str,
    pub path: &'a str,
    pub port: u16,
    pub use_tls: bool,
    pub timeout_ms: u32,
}

/// Log delivery client.
pub trait DeliveryClientPort {
    /// Validate the endpoint and prepare the HTTP connection.
    fn begin(&mut self, endpoint: &Endpoint<'_>) -> Result<(), ClientError>;

    /// Wall-clock time in nanoseconds since the Unix epoch.
    fn current_time_nanos(&self) -> u64;

    /// Push every non-empty stream in one request.
    fn send(&mut self, streams: &Streams) -> Result<(), SendError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → diagnostics)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`CycleEvent`](super::events::CycleEvent)s
/// through this port.  The serial-log adapter is the only production sink.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::CycleEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`TransportPort::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The WiFi driver could not be configured or started.
    DriverInit(i32),
    /// Association with the access point failed.
    AssociationFailed,
    /// No IP address was obtained.
    NetifDown,
    /// SNTP did not complete inside the setup budget.
    TimeSyncFailed,
}

/// Errors from [`DeliveryClientPort::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    /// Host, path or port do not form a usable URL.
    InvalidEndpoint,
    /// The HTTP client could not be created.
    ConnectionInit(i32),
    /// The wall clock is not synced, so entry timestamps would be bogus.
    ClockNotSynced,
}

/// Errors from [`DeliveryClientPort::send`].  Always transient from the
/// cycle's point of view: the retry loop handles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// `send` called before a successful `begin`.
    NotStarted,
    /// Push body could not be serialised.
    Encode,
    /// Connect / write / read failed (ESP-IDF error code).
    Io(i32),
    /// Server answered with a non-2xx status.
    Status(u16),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DriverInit(rc) => write!(f, "WiFi driver init failed (rc={})", rc),
            Self::AssociationFailed => write!(f, "WiFi association failed"),
            Self::NetifDown => write!(f, "network interface did not come up"),
            Self::TimeSyncFailed => write!(f, "NTP time sync failed"),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndpoint => write!(f, "invalid Loki endpoint"),
            Self::ConnectionInit(rc) => write!(f, "HTTP client init failed (rc={})", rc),
            Self::ClockNotSynced => write!(f, "wall clock not synced"),
        }
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "client not started"),
            Self::Encode => write!(f, "push body encoding failed"),
            Self::Io(rc) => write!(f, "HTTP I/O error (rc={})", rc),
            Self::Status(code) => write!(f, "server returned HTTP {}", code),
        }
    }
}
