//! GPIO pin assignments for the furnace controller HAT.
//!
//! Single source of truth: the default [`PinConfig`](crate::config::PinConfig)
//! references this module rather than hard-coding pin numbers.
//!
//! Numbers are BCM (Broadcom) GPIO numbers, as used by `rppal`.  The
//! physical header pin is given alongside each one.
//!
//! ## Relay wiring
//!
//! Force heat shorts W to R (parallel, closest to the Pi).  Overfire
//! shutoff opens W (series, closest to the furnace).  If the force heat
//! relay fails closed, the overfire relay can still cut the furnace; if
//! the overfire relay fails closed, the thermostat still can.

// ---------------------------------------------------------------------------
// MAX6675 thermocouple digitiser (bit-banged)
// ---------------------------------------------------------------------------

/// Digital output: chip select, active LOW.  Header pin 22.
pub const THERMO_CS_GPIO: u8 = 25;
/// Digital output: serial clock.  Header pin 18.
pub const THERMO_SCK_GPIO: u8 = 24;
/// Digital input: serial data out of the MAX6675.  Header pin 16.
pub const THERMO_SO_GPIO: u8 = 23;

// ---------------------------------------------------------------------------
// Relays (active LOW: LOW energises the coil)
// ---------------------------------------------------------------------------

/// K2 normally-open contact: forces a heat call.  Header pin 7.
pub const FORCE_HEAT_GPIO: u8 = 4;
/// K1 normally-closed contact: breaks W on overfire.  Header pin 15.
pub const OVERFIRE_SHUTOFF_GPIO: u8 = 22;

// ---------------------------------------------------------------------------
// Startup push-button (pull-down, rising edge on press)
// ---------------------------------------------------------------------------

/// Momentary push-button for the startup bounce sequence.  Header pin 13.
/// Put a 0.1 uF capacitor across the switch terminals; the edge debounce
/// only ignores repeat edges, it does not filter contact noise.
pub const STARTUP_BUTTON_GPIO: u8 = 27;
