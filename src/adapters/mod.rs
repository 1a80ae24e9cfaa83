//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                   | Connects to               |
//! |---------------|------------------------------|---------------------------|
//! | `hardware`    | WakeSourcePort, SleepPort    | ESP32 RTC / sleep control |
//! | `wifi`        | TransportPort                | ESP-IDF WiFi STA + SNTP   |
//! | `loki_client` | DeliveryClientPort           | Loki push API over HTTPS  |
//! | `time`        | Clock                        | ESP32 system timer        |
//! | `log_sink`    | EventSink                    | Serial log output         |
//!
//! Battery ADC and the SHT3x live under [`crate::sensors`]; the trap pin,
//! delay and watchdog under [`crate::drivers`].

pub mod hardware;
pub mod log_sink;
pub mod loki_client;
pub mod time;
pub mod wifi;
