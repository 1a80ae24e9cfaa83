//! Trap node firmware: main entry point.
//!
//! One process run is one wake cycle: boot, classify the wake, report if
//! needed, re-arm, deep sleep.  Nothing survives between runs except the
//! armed wake sources.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  HardwareAdapter  WifiTransport  LokiClient  UptimeClock      │
//! │  (Wake+Sleep)     (Transport)    (Delivery)  (Clock)          │
//! │  TrapPin  BlockingDelay  NodeSensors  LogEventSink            │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ──────────────────      │
//! │                                                               │
//! │  ┌───────────────────────────────────────────────────────┐    │
//! │  │           CycleService (pure logic)                   │    │
//! │  │  classify · compose · deliver · re-arm                │    │
//! │  └───────────────────────────────────────────────────────┘    │
//! │                                                               │
//! │  Watchdog (armed at boot, disarmed right before deep sleep)   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! On the host this builds a simulation binary: the first argument picks
//! the wake cause (`boot`, `trap`, `timer`), and every adapter is a stub.
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info};

use trapnode::adapters::hardware::HardwareAdapter;
use trapnode::adapters::log_sink::LogEventSink;
use trapnode::adapters::loki_client::LokiClient;
use trapnode::adapters::time::UptimeClock;
use trapnode::adapters::wifi::WifiTransport;
use trapnode::app::service::{CycleOutcome, CyclePorts, CycleService};
use trapnode::config::NodeConfig;
use trapnode::drivers::delay::BlockingDelay;
use trapnode::drivers::trap_pin::TrapPin;
use trapnode::drivers::watchdog::Watchdog;
use trapnode::pins;
use trapnode::sensors::NodeSensors;
use trapnode::sensors::battery::{BatteryAdc, BatteryMonitor};

// ── Main (device) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn main() -> Result<()> {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use trapnode::sensors::sht3x::{DEFAULT_ADDRESS, Sht3x};

    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    let config = NodeConfig::from_build();
    let watchdog = Watchdog::arm(config.watchdog_timeout_secs);
    banner(&config)?;

    if let Err(e) = trapnode::drivers::hw_init::init_peripherals() {
        halt(e, watchdog);
    }

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    let env = if config.has_environmental_sensor {
        let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
        match I2cDriver::new(peripherals.i2c0, peripherals.pins.gpio21, peripherals.pins.gpio22, &i2c_config) {
            Ok(i2c) => Some(Sht3x::new(i2c, BlockingDelay, DEFAULT_ADDRESS)),
            Err(e) => {
                log::warn!("I2C init failed ({}), heartbeat reports zero temp/humidity", e);
                None
            }
        }
    } else {
        None
    };

    // ── 3. Ports + service ────────────────────────────────────
    let battery = BatteryMonitor::new(
        BatteryAdc::new(pins::BATTERY_ADC_CHANNEL),
        config.battery_samples,
        config.battery_settle_ms,
    );
    let mut ports = CyclePorts {
        trigger: TrapPin::new(pins::TRAP_GPIO),
        delay: BlockingDelay,
        clock: UptimeClock,
        hw: HardwareAdapter::new(),
        sensors: NodeSensors::new(battery, BlockingDelay, env),
        transport: WifiTransport::new(peripherals.modem, sysloop, nvs),
        client: LokiClient::new(),
    };
    let service = CycleService::new(config, pins::TRAP_GPIO);

    // ── 4. Run the cycle ──────────────────────────────────────
    match service.run_cycle(&mut ports, &mut LogEventSink::new()) {
        CycleOutcome::Sleep(report) => report.armed.enter(&mut ports.hw, watchdog),
        CycleOutcome::Halt(e) => halt(e, watchdog),
    }
}

// ── Main (host simulation) ────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
fn main() -> Result<()> {
    use trapnode::adapters::hardware::sim_prepare_wake;
    use trapnode::app::ports::EnvReading;
    use trapnode::sensors::sht3x::SimSht3x;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = NodeConfig::from_build();
    if config.wifi_ssid.is_empty() {
        config.wifi_ssid = "simnet";
    }
    let watchdog = Watchdog::arm(config.watchdog_timeout_secs);
    banner(&config)?;
    trapnode::drivers::hw_init::init_peripherals()?;

    let wake = std::env::args().nth(1).unwrap_or_else(|| "boot".into());
    if sim_prepare_wake(&wake).is_none() {
        anyhow::bail!("unknown wake cause '{}' (expected boot, trap or timer)", wake);
    }

    let env = config.has_environmental_sensor.then(|| SimSht3x {
        reading: EnvReading { temperature_c: 21.37, humidity_pct: 48.02 },
    });
    let battery = BatteryMonitor::new(
        BatteryAdc::new(pins::BATTERY_ADC_CHANNEL),
        config.battery_samples,
        config.battery_settle_ms,
    );
    let mut ports = CyclePorts {
        trigger: TrapPin::new(pins::TRAP_GPIO),
        delay: BlockingDelay,
        clock: UptimeClock,
        hw: HardwareAdapter::new(),
        sensors: NodeSensors::new(battery, BlockingDelay, env),
        transport: WifiTransport::new(),
        client: LokiClient::new(),
    };
    let service = CycleService::new(config, pins::TRAP_GPIO);

    match service.run_cycle(&mut ports, &mut LogEventSink::new()) {
        CycleOutcome::Sleep(report) => report.armed.enter(&mut ports.hw, watchdog),
        CycleOutcome::Halt(e) => {
            error!("Simulation halted: {}", e);
            Err(e.into())
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn banner(config: &NodeConfig) -> Result<()> {
    info!("╔══════════════════════════════════════╗");
    info!("║  Trapnode v{:<26}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!("Config: {}", serde_json::to_string(config)?);
    Ok(())
}

/// Fatal: log and idle with the watchdog still armed, so the chip resets
/// once the timeout expires.
#[cfg(target_os = "espidf")]
fn halt(e: impl core::fmt::Display, watchdog: Watchdog) -> ! {
    error!(
        "Halted: {}. Idling until watchdog reset ({}s)",
        e,
        watchdog.timeout_secs()
    );
    loop {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(1_000);
    }
}
