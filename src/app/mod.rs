//! Application core: pure control logic, zero I/O.
//!
//! This module contains the decision rules of the furnace controller:
//! the priority chain over the FSM and the overfire supervisor.  All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real relays.

pub mod events;
pub mod ports;
pub mod service;
