//! Application core: pure domain logic, zero I/O.
//!
//! The wake-cycle rules live in [`service`]: classification, network
//! bring-up, composition, delivery and re-arm.  All interaction with
//! hardware happens through the **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
