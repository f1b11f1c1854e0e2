//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock or simulated hardware.  All tests run on the host with no
//! GPIO required.

mod control_scenarios;
mod mock_hw;
mod runtime_tests;
mod sampler_tests;
