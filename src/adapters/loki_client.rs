//! Loki HTTP push client.
//!
//! Implements [`DeliveryClientPort`].  `begin` validates the endpoint,
//! builds the push URL once and checks that the wall clock is synced;
//! `send` encodes the streams (see [`crate::loki::push`]) and POSTs them.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client::EspHttpConnection`,
//!   TLS server verification through the ESP-IDF certificate bundle.
//!   A fresh connection is opened for every attempt.
//! - **all other targets**: records pushed bodies; failures injectable.

use core::fmt::Write as _;

use heapless::String;
use log::{debug, info, warn};

use crate::adapters::time;
use crate::app::ports::{ClientError, DeliveryClientPort, Endpoint, SendError};
use crate::loki::{self, PushBody, Streams};

pub const URL_CAPACITY: usize = 256;
pub type PushUrl = String<URL_CAPACITY>;

/// `http[s]://<host>:<port><path>`
pub fn build_url(endpoint: &Endpoint<'_>) -> Result<PushUrl, ClientError> {
    if endpoint.host.is_empty()
        || endpoint.host.contains("://")
        || endpoint.host.contains('/')
        || !endpoint.path.starts_with('/')
        || endpoint.port == 0
    {
        return Err(ClientError::InvalidEndpoint);
    }
    let scheme = if endpoint.use_tls { "https" } else { "http" };
    let mut url = PushUrl::new();
    write!(url, "{}://{}:{}{}", scheme, endpoint.host, endpoint.port, endpoint.path)
        .map_err(|_| ClientError::InvalidEndpoint)?;
    Ok(url)
}

struct Session {
    url: PushUrl,
    timeout_ms: u32,
}

pub struct LokiClient {
    session: Option<Session>,
    #[cfg(not(target_os = "espidf"))]
    sim: sim::SimState,
}

impl Default for LokiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LokiClient {
    pub fn new() -> Self {
        Self {
            session: None,
            #[cfg(not(target_os = "espidf"))]
            sim: sim::SimState::default(),
        }
    }
}

impl DeliveryClientPort for LokiClient {
    fn begin(&mut self, endpoint: &Endpoint<'_>) -> Result<(), ClientError> {
        let url = build_url(endpoint)?;
        if time::wall_clock_nanos().is_none() {
            return Err(ClientError::ClockNotSynced);
        }
        info!("Loki: pushing to {}", url);
        self.session = Some(Session { url, timeout_ms: endpoint.timeout_ms });
        Ok(())
    }

    fn current_time_nanos(&self) -> u64 {
        time::wall_clock_nanos().unwrap_or(0)
    }

    fn send(&mut self, streams: &Streams) -> Result<(), SendError> {
        let Some(session) = self.session.as_ref() else {
            return Err(SendError::NotStarted);
        };
        let body = match loki::encode(streams) {
            Ok(Some(body)) => body,
            Ok(None) => {
                debug!("Loki: nothing to push");
                return Ok(());
            }
            Err(e) => {
                warn!("Loki: encode failed: {}", e);
                return Err(SendError::Encode);
            }
        };
        #[cfg(target_os = "espidf")]
        {
            platform::post(&session.url, session.timeout_ms, &body)
        }
        #[cfg(not(target_os = "espidf"))]
        {
            let _ = session.timeout_ms;
            self.sim.post(body)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use core::fmt::Write as _;
    use core::time::Duration;

    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

    use super::*;

    pub fn post(url: &str, timeout_ms: u32, body: &PushBody) -> Result<(), SendError> {
        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(Duration::from_millis(timeout_ms as u64)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|e| SendError::Io(e.code()))?;

        let mut content_length: String<10> = String::new();
        let _ = write!(content_length, "{}", body.bytes.len());
        let mut headers: heapless::Vec<(&str, &str), 3> = heapless::Vec::new();
        let _ = headers.push(("Content-Type", "application/json"));
        let _ = headers.push(("Content-Length", content_length.as_str()));
        if let Some(encoding) = body.content_encoding() {
            let _ = headers.push(("Content-Encoding", encoding));
        }

        conn.initiate_request(Method::Post, url, &headers)
            .map_err(|e| SendError::Io(e.code()))?;
        let mut written = 0;
        while written < body.bytes.len() {
            let n = conn.write(&body.bytes[written..]).map_err(|e| SendError::Io(e.code()))?;
            if n == 0 {
                return Err(SendError::Io(-1));
            }
            written += n;
        }
        conn.initiate_response().map_err(|e| SendError::Io(e.code()))?;

        let status = conn.status();
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(SendError::Status(status))
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use super::*;

    #[derive(Default)]
    pub struct SimState {
        pub fail_next: u8,
        pub pushed: std::vec::Vec<PushBody>,
    }

    impl SimState {
        pub fn post(&mut self, body: PushBody) -> Result<(), SendError> {
            if self.fail_next > 0 {
                self.fail_next -= 1;
                return Err(SendError::Status(503));
            }
            if !body.deflated {
                info!("Loki(sim): POST {}", std::string::String::from_utf8_lossy(&body.bytes));
            } else {
                info!("Loki(sim): POST {} bytes (deflate)", body.bytes.len());
            }
            self.pushed.push(body);
            Ok(())
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl LokiClient {
    /// Fail the next `n` sends with HTTP 503.
    pub fn sim_fail_next(&mut self, n: u8) {
        self.sim.fail_next = n;
    }

    /// Bodies accepted so far.
    pub fn sim_pushed(&self) -> &[PushBody] {
        &self.sim.pushed
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    fn endpoint(host: &'static str, path: &'static str) -> Endpoint<'static> {
        Endpoint { host, path, port: 443, use_tls: true, timeout_ms: 10_000 }
    }

    #[test]
    fn url_is_assembled_from_parts() {
        let url = build_url(&endpoint("loki.example.com", "/loki/api/v1/push")).unwrap();
        assert_eq!(url.as_str(), "https://loki.example.com:443/loki/api/v1/push");
        let plain = Endpoint { use_tls: false, port: 3100, ..endpoint("10.0.0.2", "/p") };
        assert_eq!(build_url(&plain).unwrap().as_str(), "http://10.0.0.2:3100/p");
    }

    #[test]
    fn malformed_endpoints_are_rejected() {
        assert_eq!(build_url(&endpoint("", "/p")), Err(ClientError::InvalidEndpoint));
        assert_eq!(build_url(&endpoint("https://x", "/p")), Err(ClientError::InvalidEndpoint));
        assert_eq!(build_url(&endpoint("x", "p")), Err(ClientError::InvalidEndpoint));
    }

    #[test]
    fn send_before_begin_fails() {
        let mut c = LokiClient::new();
        assert_eq!(c.send(&Streams::new("1")), Err(SendError::NotStarted));
    }

    #[test]
    fn sim_push_records_body() {
        let mut c = LokiClient::new();
        c.begin(&endpoint("loki.example.com", "/loki/api/v1/push")).unwrap();
        let mut s = Streams::new("1");
        s.mouse.add_entry(c.current_time_nanos(), "msg=mouse").unwrap();
        c.sim_fail_next(1);
        assert_eq!(c.send(&s), Err(SendError::Status(503)));
        assert_eq!(c.send(&s), Ok(()));
        assert_eq!(c.sim_pushed().len(), 1);
    }
}
