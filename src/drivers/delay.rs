//! Blocking delay provider.
//!
//! Every wait in a wake cycle (debounce polling, ADC settle, send backoff)
//! is a blocking sleep on the main task.  On ESP-IDF this is the FreeRTOS
//! tick delay from `esp-idf-hal`; on the host it is `std::thread::sleep`.

#[cfg(target_os = "espidf")]
pub use esp_idf_hal::delay::FreeRtos as BlockingDelay;

#[cfg(not(target_os = "espidf"))]
pub use host::BlockingDelay;

#[cfg(not(target_os = "espidf"))]
mod host {
    use embedded_hal::delay::DelayNs;

    /// Host stand-in that really sleeps.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct BlockingDelay;

    impl DelayNs for BlockingDelay {
        fn delay_ns(&mut self, ns: u32) {
            std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
        }
    }
}
