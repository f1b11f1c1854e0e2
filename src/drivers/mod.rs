//! Relay and button drivers, the host simulator, and Pi GPIO wiring.

pub mod button;
pub mod relay;
#[cfg(feature = "rpi")]
pub mod rpi;
pub mod sim;
