//! Node configuration
//!
//! All tunable parameters for a trap node.  Values are compile-time
//! constants; the string settings can be overridden at build time through
//! `TRAP_*` environment variables (see `build.rs`).

use core::fmt;

use serde::Serialize;

/// Build-time override helper: `option_env!` with a fallback, usable in
/// `const` context.
macro_rules! env_or {
    ($name:literal, $default:expr) => {
        match option_env!($name) {
            Some(v) => v,
            None => $default,
        }
    };
}

/// Core node configuration
#[derive(Debug, Clone, Serialize)]
pub struct NodeConfig {
    // --- Network ---
    /// WiFi SSID (1-32 printable ASCII bytes)
    pub wifi_ssid: &'static str,
    /// WiFi WPA2 passphrase (empty for open networks)
    #[serde(skip_serializing)]
    pub wifi_password: &'static str,
    /// Use HTTPS for the push endpoint
    pub use_tls: bool,
    /// NTP server used to establish the trusted time base
    pub ntp_server: &'static str,

    // --- Loki endpoint ---
    /// Host name or address, no scheme, port or path
    pub loki_host: &'static str,
    /// Push API path
    pub loki_path: &'static str,
    pub loki_port: u16,
    /// Per-request HTTP timeout (milliseconds)
    pub http_timeout_ms: u32,

    // --- Identity ---
    /// Node identity label (`id="..."` on every stream)
    pub node_id: &'static str,
    /// Node variant carries an SHT3x temperature/humidity sensor
    pub has_environmental_sensor: bool,

    // --- Trigger debounce ---
    pub debounce_samples: u8,
    pub debounce_interval_ms: u32,

    // --- Battery sampling ---
    pub battery_samples: u8,
    pub battery_settle_ms: u32,

    // --- Delivery ---
    /// Total send attempts (1 initial + retries)
    pub send_attempts: u8,
    /// Wait between failed attempts (milliseconds)
    pub send_backoff_ms: u32,

    // --- Timing ---
    /// Deep-sleep timer interval (seconds)
    pub sleep_secs: u32,
    /// Task watchdog timeout for one wake cycle (seconds)
    pub watchdog_timeout_secs: u32,
    /// Upper bound for WiFi association plus NTP sync (milliseconds)
    pub network_setup_budget_ms: u32,
}

impl NodeConfig {
    /// Configuration baked in at build time.
    pub const fn from_build() -> Self {
        Self {
            wifi_ssid: env_or!("TRAP_WIFI_SSID", ""),
            wifi_password: env_or!("TRAP_WIFI_PASS", ""),
            use_tls: true,
            ntp_server: env_or!("TRAP_NTP_SERVER", "pool.ntp.org"),

            loki_host: env_or!("TRAP_LOKI_HOST", "loki.edjusted.com"),
            loki_path: env_or!("TRAP_LOKI_PATH", "/loki/api/v1/push"),
            loki_port: 443,
            http_timeout_ms: 10_000,

            node_id: env_or!("TRAP_NODE_ID", "1"),
            has_environmental_sensor: option_env!("TRAP_ENV_SENSOR").is_some(),

            debounce_samples: 100,   // ~1 s window
            debounce_interval_ms: 10,

            battery_samples: 10,
            battery_settle_ms: 5,

            send_attempts: 6, // 1 + 5 retries
            send_backoff_ms: 1_000,

            sleep_secs: 600,           // 10 min heartbeat
            watchdog_timeout_secs: 300,
            network_setup_budget_ms: 60_000,
        }
    }

    /// Longest a single wake cycle can stay awake, in milliseconds.
    ///
    /// Debounce window + battery sampling + network setup + every send
    /// attempt timing out + the backoff waits between them.
    pub fn worst_case_cycle_ms(&self) -> u64 {
        let debounce = self.debounce_samples as u64 * self.debounce_interval_ms as u64;
        let battery = self.battery_samples as u64 * self.battery_settle_ms as u64;
        let attempts = self.send_attempts as u64;
        let sends = attempts * self.http_timeout_ms as u64;
        let backoff = attempts.saturating_sub(1) * self.send_backoff_ms as u64;
        debounce + battery + self.network_setup_budget_ms as u64 + sends + backoff
    }

    /// Reject configurations that cannot work in the field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ssid(self.wifi_ssid)?;
        validate_password(self.wifi_password)?;
        if self.loki_host.is_empty() || self.loki_host.contains("://") || self.loki_host.contains('/') {
            return Err(ConfigError::InvalidHost);
        }
        if !self.loki_path.starts_with('/') {
            return Err(ConfigError::InvalidPath);
        }
        if self.node_id.is_empty() || !is_printable_ascii(self.node_id) || self.node_id.contains('"') {
            return Err(ConfigError::InvalidNodeId);
        }
        if self.send_attempts == 0 {
            return Err(ConfigError::NoSendAttempts);
        }
        if self.sleep_secs == 0 {
            return Err(ConfigError::ZeroSleepInterval);
        }
        let budget_ms = self.watchdog_timeout_secs as u64 * 1000;
        if self.worst_case_cycle_ms() >= budget_ms {
            return Err(ConfigError::CycleExceedsWatchdog);
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_build()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    InvalidSsid,
    InvalidPassword,
    InvalidHost,
    InvalidPath,
    InvalidNodeId,
    NoSendAttempts,
    ZeroSleepInterval,
    /// Worst-case wake time does not fit under the watchdog timeout.
    CycleExceedsWatchdog,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::InvalidHost => write!(f, "Loki host must be a bare host name (no scheme or path)"),
            Self::InvalidPath => write!(f, "Loki path must start with '/'"),
            Self::InvalidNodeId => write!(f, "node id must be non-empty printable ASCII without quotes"),
            Self::NoSendAttempts => write!(f, "send attempts must be at least 1"),
            Self::ZeroSleepInterval => write!(f, "sleep interval must be non-zero"),
            Self::CycleExceedsWatchdog => write!(f, "worst-case cycle time exceeds the watchdog timeout"),
        }
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConfigError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConfigError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConfigError::InvalidPassword);
    }
    Ok(())
}
