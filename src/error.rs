//! Unified error types for the trap-node firmware.
//!
//! Only failures that end a cycle early are represented here; transient
//! send failures and sensor dropouts are handled where they occur and only
//! surface as diagnostic events.  All variants are `Copy` so they can ride
//! along in [`CycleOutcome`](crate::app::service::CycleOutcome) and
//! [`CycleEvent`](crate::app::events::CycleEvent) without allocation.

use core::fmt;

use crate::app::ports::{ClientError, TransportError};
use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// A fatal, cycle-ending failure.  The node halts instead of sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// WiFi association, TLS or NTP time sync could not be established.
    Provisioning(TransportError),
    /// The Loki delivery client could not be configured.
    ClientSetup(ClientError),
    /// Build-time configuration is unusable.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisioning(e) => write!(f, "provisioning: {e}"),
            Self::ClientSetup(e) => write!(f, "client setup: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Provisioning(e)
    }
}

impl From<ClientError> for Error {
    fn from(e: ClientError) -> Self {
        Self::ClientSetup(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
