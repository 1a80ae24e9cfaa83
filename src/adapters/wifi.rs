//! WiFi station + SNTP transport adapter.
//!
//! Implements [`TransportPort`]: associate with the configured AP, wait
//! for an IP, then wait for SNTP to set the wall clock.  Every step shares
//! one setup budget; running out of it is a fatal
//! [`TransportError`] for the cycle.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi` and
//!   `esp_idf_svc::sntp::EspSntp`.  The driver is created lazily in
//!   `begin`, so idle wakes never power the radio.
//! - **all other targets**: simulation stub with injectable failure.

use log::{info, warn};

use crate::app::ports::{TransportError, TransportPort, TransportSettings};

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sntp::{EspSntp, SntpConf, SyncStatus};
    use esp_idf_svc::sys::{esp_wifi_sta_get_ap_info, wifi_ap_record_t, ESP_OK, esp_err_t};
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

    use super::*;

    const SNTP_POLL_MS: u32 = 100;

    pub struct WifiTransport {
        modem: Option<Modem>,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        wifi: Option<BlockingWifi<EspWifi<'static>>>,
        sntp: Option<EspSntp<'static>>,
    }

    impl WifiTransport {
        pub fn new(modem: Modem, sysloop: EspSystemEventLoop, nvs: Option<EspDefaultNvsPartition>) -> Self {
            Self { modem: Some(modem), sysloop, nvs, wifi: None, sntp: None }
        }

        fn associate(&mut self, settings: &TransportSettings<'_>) -> Result<(), TransportError> {
            let modem = self.modem.take().ok_or(TransportError::DriverInit(-1))?;
            let driver = EspWifi::new(modem, self.sysloop.clone(), self.nvs.take())
                .map_err(|e| TransportError::DriverInit(e.code()))?;
            let mut wifi = BlockingWifi::wrap(driver, self.sysloop.clone())
                .map_err(|e| TransportError::DriverInit(e.code()))?;

            let auth_method = if settings.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let config = Configuration::Client(ClientConfiguration {
                ssid: settings.ssid.try_into().map_err(|_| TransportError::AssociationFailed)?,
                password: settings.password.try_into().map_err(|_| TransportError::AssociationFailed)?,
                auth_method,
                ..Default::default()
            });
            wifi.set_configuration(&config)
                .map_err(|e| TransportError::DriverInit(e.code()))?;
            wifi.start().map_err(|e| TransportError::DriverInit(e.code()))?;
            info!("WiFi: started, connecting to '{}'", settings.ssid);

            wifi.connect().map_err(|e| {
                warn!("WiFi: connect failed ({})", e);
                TransportError::AssociationFailed
            })?;
            wifi.wait_netif_up().map_err(|e| {
                warn!("WiFi: netif did not come up ({})", e);
                TransportError::NetifDown
            })?;
            info!("WiFi: connected");
            self.wifi = Some(wifi);
            Ok(())
        }

        fn sync_time(&mut self, settings: &TransportSettings<'_>, budget_ms: u32) -> Result<(), TransportError> {
            let mut conf = SntpConf::default();
            conf.servers[0] = settings.ntp_server;
            let sntp = EspSntp::new(&conf).map_err(|e| {
                warn!("SNTP: init failed ({})", e);
                TransportError::TimeSyncFailed
            })?;

            let mut waited = 0;
            while sntp.get_sync_status() != SyncStatus::Completed {
                if waited >= budget_ms {
                    return Err(TransportError::TimeSyncFailed);
                }
                FreeRtos::delay_ms(SNTP_POLL_MS);
                waited += SNTP_POLL_MS;
            }
            info!("SNTP: time synced via {} after {}ms", settings.ntp_server, waited);
            self.sntp = Some(sntp);
            Ok(())
        }
    }

    impl TransportPort for WifiTransport {
        fn begin(&mut self, settings: &TransportSettings<'_>) -> Result<(), TransportError> {
            let start = crate::adapters::time::uptime_ms();
            self.associate(settings)?;
            let spent = crate::adapters::time::uptime_ms().saturating_sub(start) as u32;
            let remaining = settings.setup_budget_ms.saturating_sub(spent);
            if !settings.use_tls {
                warn!("TLS disabled, entries go out in plaintext");
            }
            self.sync_time(settings, remaining)
        }

        fn rssi_dbm(&self) -> i8 {
            if self.wifi.is_none() {
                return 0;
            }
            // SAFETY: zero is a valid bit pattern for this plain C struct.
            let mut ap: wifi_ap_record_t = unsafe { core::mem::zeroed() };
            let ret = unsafe { esp_wifi_sta_get_ap_info(&mut ap) };
            if ret != ESP_OK as esp_err_t {
                return 0;
            }
            ap.rssi
        }
    }
}

#[cfg(target_os = "espidf")]
pub use platform::WifiTransport;

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct WifiTransport {
    fail_with: Option<TransportError>,
    rssi: i8,
    connected: bool,
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiTransport {
    pub fn new() -> Self {
        Self { fail_with: None, rssi: -67, connected: false }
    }

    /// Make the next `begin` fail.
    pub fn sim_fail_with(&mut self, error: TransportError) {
        self.fail_with = Some(error);
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(not(target_os = "espidf"))]
impl TransportPort for WifiTransport {
    fn begin(&mut self, settings: &TransportSettings<'_>) -> Result<(), TransportError> {
        if let Some(e) = self.fail_with.take() {
            warn!("WiFi(sim): simulated failure: {}", e);
            return Err(e);
        }
        info!(
            "WiFi(sim): connected to '{}', time synced via {} (tls={})",
            settings.ssid, settings.ntp_server, settings.use_tls
        );
        self.connected = true;
        Ok(())
    }

    fn rssi_dbm(&self) -> i8 {
        if self.connected { self.rssi } else { 0 }
    }
}
