//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the wake cycle against
//! mock adapters or the host simulation adapters.  All tests run on the
//! host (x86_64) with no real hardware required.

mod cycle_tests;
mod mock_hw;
mod sim_tests;
