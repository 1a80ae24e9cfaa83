fn main() {
    // Build-time node configuration is read through option_env!() in
    // src/config.rs; rebuild whenever one of those variables changes.
    for var in [
        "TRAP_WIFI_SSID",
        "TRAP_WIFI_PASS",
        "TRAP_LOKI_HOST",
        "TRAP_LOKI_PATH",
        "TRAP_NTP_SERVER",
        "TRAP_NODE_ID",
        "TRAP_ENV_SENSOR",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
