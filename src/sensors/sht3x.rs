//! Sensirion SHT3x temperature / humidity sensor on I²C.
//!
//! Single-shot, high-repeatability, no clock stretching.  Each 16-bit word
//! returned by the sensor is followed by a CRC-8 (poly 0x31, init 0xFF)
//! which is checked before conversion:
//!
//! ```text
//!   T  [°C] = -45 + 175 × raw / 65535
//!   RH [%]  =       100 × raw / 65535
//! ```
//!
//! Generic over `embedded_hal::i2c::I2c`, so the same driver runs on
//! `esp_idf_hal::i2c::I2cDriver` and on host mocks.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;

use crate::app::ports::{EnvReading, EnvironmentalSensor};

/// Default address (ADDR pin low).
pub const DEFAULT_ADDRESS: u8 = 0x44;

const CMD_SOFT_RESET: [u8; 2] = [0x30, 0xA2];
const CMD_READ_STATUS: [u8; 2] = [0xF3, 0x2D];
const CMD_MEASURE_HIGH_REP: [u8; 2] = [0x24, 0x00];

/// Max conversion time for high repeatability is 15.5 ms.
const MEASURE_WAIT_MS: u32 = 16;
const RESET_WAIT_MS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sht3xError<E> {
    /// Bus-level failure (NACK, arbitration loss, ...).
    Bus(E),
    /// A data word failed its CRC check.
    Crc,
}

/// CRC-8 as specified by Sensirion: poly 0x31, init 0xFF, no reflection.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x31 } else { crc << 1 };
        }
    }
    crc
}

pub fn raw_to_celsius(raw: u16) -> f32 {
    -45.0 + 175.0 * raw as f32 / 65535.0
}

pub fn raw_to_humidity(raw: u16) -> f32 {
    100.0 * raw as f32 / 65535.0
}

pub struct Sht3x<I, D> {
    i2c: I,
    delay: D,
    address: u8,
}

impl<I: I2c, D: DelayNs> Sht3x<I, D> {
    pub fn new(i2c: I, delay: D, address: u8) -> Self {
        Self { i2c, delay, address }
    }

    /// Release the bus and delay provider.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn read_word_pair(&mut self, cmd: [u8; 2], wait_ms: u32) -> Result<(u16, u16), Sht3xError<I::Error>> {
        self.i2c.write(self.address, &cmd).map_err(Sht3xError::Bus)?;
        self.delay.delay_ms(wait_ms);
        let mut buf = [0u8; 6];
        self.i2c.read(self.address, &mut buf).map_err(Sht3xError::Bus)?;
        let first = checked_word(&buf[0..3])?;
        let second = checked_word(&buf[3..6])?;
        Ok((first, second))
    }

    fn read_status(&mut self) -> Result<u16, Sht3xError<I::Error>> {
        let mut buf = [0u8; 3];
        self.i2c
            .write_read(self.address, &CMD_READ_STATUS, &mut buf)
            .map_err(Sht3xError::Bus)?;
        checked_word(&buf)
    }
}

fn checked_word<E>(chunk: &[u8]) -> Result<u16, Sht3xError<E>> {
    if crc8(&chunk[0..2]) != chunk[2] {
        return Err(Sht3xError::Crc);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

impl<I: I2c, D: DelayNs> EnvironmentalSensor for Sht3x<I, D> {
    type Error = Sht3xError<I::Error>;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &CMD_SOFT_RESET).map_err(Sht3xError::Bus)?;
        self.delay.delay_ms(RESET_WAIT_MS);
        let status = self.read_status()?;
        info!("sht3x: ready at 0x{:02X} (status=0x{:04X})", self.address, status);
        Ok(())
    }

    fn measure(&mut self) -> Result<EnvReading, Self::Error> {
        let (t_raw, rh_raw) = self.read_word_pair(CMD_MEASURE_HIGH_REP, MEASURE_WAIT_MS)?;
        Ok(EnvReading {
            temperature_c: raw_to_celsius(t_raw),
            humidity_pct: raw_to_humidity(rh_raw),
        })
    }
}

// ── Host stand-in ─────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::SimSht3x;

#[cfg(not(target_os = "espidf"))]
mod sim {
    use super::*;

    /// Returns a fixed reading; used by the host simulation binary.
    pub struct SimSht3x {
        pub reading: EnvReading,
    }

    impl EnvironmentalSensor for SimSht3x {
        type Error = core::convert::Infallible;

        fn begin(&mut self) -> Result<(), Self::Error> {
            info!("sht3x(sim): ready");
            Ok(())
        }

        fn measure(&mut self) -> Result<EnvReading, Self::Error> {
            Ok(self.reading)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    /// Scripted bus: records writes, answers reads from `response`.
    struct ScriptedBus {
        writes: Vec<Vec<u8>>,
        response: Vec<u8>,
        fail: bool,
    }

    impl ErrorType for ScriptedBus {
        type Error = ErrorKind;
    }

    impl I2c for ScriptedBus {
        fn transaction(&mut self, address: u8, ops: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
            assert_eq!(address, DEFAULT_ADDRESS);
            if self.fail {
                return Err(ErrorKind::Other);
            }
            for op in ops {
                match op {
                    Operation::Write(bytes) => self.writes.push(bytes.to_vec()),
                    Operation::Read(buf) => {
                        let n = buf.len();
                        buf.copy_from_slice(&self.response[..n]);
                    }
                }
            }
            Ok(())
        }
    }

    struct NoDelay;
    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn word(v: u16) -> [u8; 3] {
        let b = v.to_be_bytes();
        [b[0], b[1], crc8(&b)]
    }

    #[test]
    fn crc_matches_datasheet_vector() {
        // Datasheet example: 0xBEEF → 0x92
        assert_eq!(crc8(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn measure_converts_both_words() {
        let mut response = Vec::new();
        response.extend_from_slice(&word(0x6666)); // ≈ 25 °C
        response.extend_from_slice(&word(0x8000)); // ≈ 50 %
        let bus = ScriptedBus { writes: Vec::new(), response, fail: false };
        let mut sensor = Sht3x::new(bus, NoDelay, DEFAULT_ADDRESS);

        let r = sensor.measure().unwrap();
        assert!((r.temperature_c - 25.0).abs() < 0.05);
        assert!((r.humidity_pct - 50.0).abs() < 0.01);

        let (bus, _) = sensor.release();
        assert_eq!(bus.writes, vec![CMD_MEASURE_HIGH_REP.to_vec()]);
    }

    #[test]
    fn corrupted_crc_is_rejected() {
        let mut response = Vec::new();
        response.extend_from_slice(&word(0x6666));
        response.extend_from_slice(&[0x80, 0x00, 0x00]);
        let bus = ScriptedBus { writes: Vec::new(), response, fail: false };
        let mut sensor = Sht3x::new(bus, NoDelay, DEFAULT_ADDRESS);
        assert_eq!(sensor.measure(), Err(Sht3xError::Crc));
    }

    #[test]
    fn begin_resets_then_reads_status() {
        let bus = ScriptedBus { writes: Vec::new(), response: word(0x8010).to_vec(), fail: false };
        let mut sensor = Sht3x::new(bus, NoDelay, DEFAULT_ADDRESS);
        sensor.begin().unwrap();
        let (bus, _) = sensor.release();
        assert_eq!(bus.writes, vec![CMD_SOFT_RESET.to_vec(), CMD_READ_STATUS.to_vec()]);
    }

    #[test]
    fn bus_failure_surfaces() {
        let bus = ScriptedBus { writes: Vec::new(), response: Vec::new(), fail: true };
        let mut sensor = Sht3x::new(bus, NoDelay, DEFAULT_ADDRESS);
        assert_eq!(sensor.begin(), Err(Sht3xError::Bus(ErrorKind::Other)));
    }
}
