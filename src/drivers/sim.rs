//! In-process hardware simulator.
//!
//! Host builds (no `rpi` feature) and tests drive the real driver code
//! against these `embedded-hal` implementations instead of GPIO:
//!
//! - [`SimThermocouple`] models the MAX6675 shift register: CS falling edge
//!   latches a frame, every SCK falling edge presents the next bit.
//! - [`SimOutputPin`] / [`SimInputPin`] are shared-level digital lines.
//! - [`SimFurnace`] is a first-order thermal model closing the loop
//!   between the relay lines and the thermocouple.
//! - [`NoDelay`] / [`TimedDelay`] stand in for a blocking delay.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use parking_lot::Mutex;

use crate::sensors::max6675::CELSIUS_PER_COUNT;

// ═══════════════════════════════════════════════════════════════════════════
//  MAX6675 model
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct ProbeState {
    celsius: f32,
    raw_override: Option<u16>,
    open_circuit: bool,
    selected: bool,
    sck_high: bool,
    frame: u16,
    bit: u8,
    pulses: u32,
}

impl ProbeState {
    fn latch_frame(&self) -> u16 {
        let raw = self
            .raw_override
            .unwrap_or_else(|| (self.celsius / CELSIUS_PER_COUNT).round().clamp(0.0, 4095.0) as u16);
        ((raw & 0x0FFF) << 3) | (u16::from(self.open_circuit) << 2)
    }
}

/// Simulated thermocouple + MAX6675.  Clones share one device.
#[derive(Debug, Clone)]
pub struct SimThermocouple {
    state: Arc<Mutex<ProbeState>>,
}

impl SimThermocouple {
    pub fn new(celsius: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProbeState {
                celsius,
                raw_override: None,
                open_circuit: false,
                selected: false,
                sck_high: false,
                frame: 0,
                bit: 15,
                pulses: 0,
            })),
        }
    }

    /// The three bus lines wired to this device.
    pub fn pins(&self) -> (SimChipSelect, SimClock, SimDataOut) {
        (
            SimChipSelect(self.clone()),
            SimClock(self.clone()),
            SimDataOut(self.clone()),
        )
    }

    pub fn set_celsius(&self, celsius: f32) {
        let mut s = self.state.lock();
        s.celsius = celsius;
        s.raw_override = None;
    }

    pub fn celsius(&self) -> f32 {
        self.state.lock().celsius
    }

    /// Force the 12-bit reading field regardless of temperature.
    pub fn set_raw(&self, raw: u16) {
        self.state.lock().raw_override = Some(raw);
    }

    pub fn set_open_circuit(&self, open: bool) {
        self.state.lock().open_circuit = open;
    }

    pub fn is_selected(&self) -> bool {
        self.state.lock().selected
    }

    /// SCK pulses seen since the last chip select.
    pub fn clock_pulses(&self) -> u32 {
        self.state.lock().pulses
    }
}

/// Chip-select line of a [`SimThermocouple`].
#[derive(Debug)]
pub struct SimChipSelect(SimThermocouple);

/// Clock line of a [`SimThermocouple`].
#[derive(Debug)]
pub struct SimClock(SimThermocouple);

/// Data-out line of a [`SimThermocouple`].
#[derive(Debug)]
pub struct SimDataOut(SimThermocouple);

impl ErrorType for SimChipSelect {
    type Error = Infallible;
}

impl OutputPin for SimChipSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut s = self.0.state.lock();
        if !s.selected {
            s.selected = true;
            s.frame = s.latch_frame();
            s.bit = 15;
            s.pulses = 0;
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.state.lock().selected = false;
        Ok(())
    }
}

impl ErrorType for SimClock {
    type Error = Infallible;
}

impl OutputPin for SimClock {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut s = self.0.state.lock();
        if s.selected && s.sck_high {
            s.bit = s.bit.saturating_sub(1);
        }
        s.sck_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut s = self.0.state.lock();
        if s.selected && !s.sck_high {
            s.pulses += 1;
        }
        s.sck_high = true;
        Ok(())
    }
}

impl ErrorType for SimDataOut {
    type Error = Infallible;
}

impl InputPin for SimDataOut {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let s = self.0.state.lock();
        Ok(s.selected && (s.frame >> s.bit) & 1 == 1)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Generic digital lines
// ═══════════════════════════════════════════════════════════════════════════

/// Output line whose level can be observed from another handle.
#[derive(Debug, Clone)]
pub struct SimOutputPin {
    high: Arc<AtomicBool>,
    writes: Arc<AtomicU32>,
}

impl SimOutputPin {
    pub fn new(initial_high: bool) -> Self {
        Self {
            high: Arc::new(AtomicBool::new(initial_high)),
            writes: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn level_high(&self) -> bool {
        self.high.load(Ordering::Acquire)
    }

    /// Number of level writes performed through any handle.
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::Relaxed)
    }

    fn write(&self, high: bool) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.high.store(high, Ordering::Release);
    }
}

impl ErrorType for SimOutputPin {
    type Error = Infallible;
}

impl OutputPin for SimOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

impl StatefulOutputPin for SimOutputPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level_high())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level_high())
    }
}

/// Input line driven from another handle (e.g. a simulated button).
#[derive(Debug, Clone, Default)]
pub struct SimInputPin {
    high: Arc<AtomicBool>,
}

impl SimInputPin {
    pub fn set_level(&self, high: bool) {
        self.high.store(high, Ordering::Release);
    }
}

impl ErrorType for SimInputPin {
    type Error = Infallible;
}

impl InputPin for SimInputPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high.load(Ordering::Acquire))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high.load(Ordering::Acquire))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Delays
// ═══════════════════════════════════════════════════════════════════════════

/// Delay that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Delay that returns immediately but accounts for the time requested.
#[derive(Debug, Clone, Default)]
pub struct TimedDelay {
    total_ns: Arc<AtomicU64>,
}

impl TimedDelay {
    pub fn elapsed_us(&self) -> u64 {
        self.total_ns.load(Ordering::Relaxed) / 1_000
    }
}

impl DelayNs for TimedDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.fetch_add(u64::from(ns), Ordering::Relaxed);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Furnace thermal model
// ═══════════════════════════════════════════════════════════════════════════

/// First-order flue temperature model.
///
/// With a heat call (force heat energised, overfire shutoff not) the flue
/// approaches `burn_c`; otherwise it decays towards `idle_c`.
#[derive(Debug)]
pub struct SimFurnace {
    thermo: SimThermocouple,
    force_heat: SimOutputPin,
    overfire_shutoff: SimOutputPin,
    pub burn_c: f32,
    pub idle_c: f32,
    pub time_constant_secs: f32,
}

impl SimFurnace {
    pub fn new(thermo: SimThermocouple, force_heat: SimOutputPin, overfire_shutoff: SimOutputPin) -> Self {
        Self {
            thermo,
            force_heat,
            overfire_shutoff,
            burn_c: 300.0,
            idle_c: 60.0,
            time_constant_secs: 120.0,
        }
    }

    /// True while the relays are calling for heat (active-low lines).
    pub fn heat_call(&self) -> bool {
        !self.force_heat.level_high() && self.overfire_shutoff.level_high()
    }

    /// Advance the model by `dt_secs`.
    pub fn step(&mut self, dt_secs: f32) {
        let target = if self.heat_call() { self.burn_c } else { self.idle_c };
        let current = self.thermo.celsius();
        let alpha = (dt_secs / self.time_constant_secs).clamp(0.0, 1.0);
        self.thermo.set_celsius(current + (target - current) * alpha);
    }
}
