//! Furnace controller library.
//!
//! Exposes the control logic, drivers and runtime for the binary and for
//! integration testing.  Raspberry Pi GPIO lives behind the `rpi`
//! feature; everything else runs on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod runtime;
pub mod safety;
pub mod sensors;
