//! MAX6675 K-type thermocouple digitiser, bit-banged over three GPIO lines.
//!
//! ## Frame
//!
//! One read-only transaction clocks 16 bits out of the chip, MSB first:
//!
//! ```text
//!  D15      D14 ........ D3     D2          D1     D0
//!  dummy    12-bit reading      TC open     id     tri-state
//! ```
//!
//! Data is sampled while SCK is HIGH.  Pulling CS high starts the next
//! conversion, which takes up to 220 ms; reading earlier returns the
//! previous result, so the conversion wait is part of every transaction.
//!
//! One LSB is 0.25 °C (1023.75 °C full scale over 4095 counts).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, InputPin, OutputPin};

use super::{TemperatureSource, TemperatureUnit};
use crate::error::SensorError;

/// Degrees Celsius per ADC count.
pub const CELSIUS_PER_COUNT: f32 = 1023.75 / 4095.0;

/// Number of data bits in the reading field (D14..D3).
const DATA_BITS: u8 = 12;

/// Protocol timing.  The defaults respect the datasheet minimums with a
/// wide margin; only tests should shorten them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Max6675Timing {
    /// CS low to first clock edge (microseconds).
    pub select_settle_us: u32,
    /// Time SCK is held in each phase, high and low (microseconds).
    pub clock_phase_us: u32,
    /// CS high hold after a transaction, covering the next conversion (ms).
    pub conversion_ms: u32,
}

impl Default for Max6675Timing {
    fn default() -> Self {
        Self {
            select_settle_us: 2_000,
            clock_phase_us: 1_000,
            conversion_ms: 220,
        }
    }
}

impl Max6675Timing {
    /// SCK periods per frame, D15 through D0.
    const FRAME_CLOCKS: u32 = 16;

    /// Wall time of one [`Max6675::read_raw`], rounded up to whole
    /// milliseconds.
    pub fn transaction_ms(&self) -> u64 {
        let clocked_us = u64::from(self.select_settle_us)
            + u64::from(Self::FRAME_CLOCKS) * 2 * u64::from(self.clock_phase_us);
        clocked_us.div_ceil(1000) + u64::from(self.conversion_ms)
    }
}

/// One decoded transaction, before unit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// 12-bit reading, D14..D3.
    pub value: u16,
    /// Fault bit D2: the thermocouple input is open.
    pub open_circuit: bool,
}

impl RawSample {
    /// Reading in degrees Celsius.
    pub fn celsius(&self) -> f32 {
        f32::from(self.value) * CELSIUS_PER_COUNT
    }
}

/// MAX6675 driver over `embedded-hal` pins.
pub struct Max6675<CS, SCK, SO, D> {
    cs: CS,
    sck: SCK,
    so: SO,
    delay: D,
    unit: TemperatureUnit,
    timing: Max6675Timing,
}

impl<CS, SCK, SO, D> Max6675<CS, SCK, SO, D>
where
    CS: OutputPin,
    SCK: OutputPin,
    SO: InputPin,
    D: DelayNs,
{
    /// Take ownership of the bus lines and park them idle (CS high, SCK low).
    pub fn new(cs: CS, sck: SCK, so: SO, delay: D, unit: TemperatureUnit) -> Result<Self, SensorError> {
        Self::with_timing(cs, sck, so, delay, unit, Max6675Timing::default())
    }

    pub fn with_timing(
        mut cs: CS,
        mut sck: SCK,
        so: SO,
        delay: D,
        unit: TemperatureUnit,
        timing: Max6675Timing,
    ) -> Result<Self, SensorError> {
        cs.set_high().map_err(|e| SensorError::Pin(e.kind()))?;
        sck.set_low().map_err(|e| SensorError::Pin(e.kind()))?;
        Ok(Self {
            cs,
            sck,
            so,
            delay,
            unit,
            timing,
        })
    }

    /// Run one transaction and return the temperature in the configured unit.
    ///
    /// Fails with [`SensorError::ThermocoupleOpen`] when the fault bit is
    /// set; the reading bits are meaningless in that case.
    pub fn read(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_raw()?;
        if raw.open_circuit {
            return Err(SensorError::ThermocoupleOpen);
        }
        Ok(self.unit.convert_from_celsius(raw.celsius()))
    }

    /// Run one transaction and return the undecoded frame fields.
    ///
    /// Chip select is always released, and the conversion wait always
    /// observed, even when a pin fails mid-frame.
    pub fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        self.cs.set_low().map_err(|e| SensorError::Pin(e.kind()))?;
        self.delay.delay_us(self.timing.select_settle_us);

        let frame = self.clock_frame();

        let released = self.cs.set_high().map_err(|e| SensorError::Pin(e.kind()));
        self.delay.delay_ms(self.timing.conversion_ms);

        let raw = frame?;
        released?;
        Ok(raw)
    }

    // ── Internal ──────────────────────────────────────────────

    fn clock_frame(&mut self) -> Result<RawSample, SensorError> {
        // D15: dummy sign bit.
        self.clock(false)?;

        let mut value: u16 = 0;
        for _ in 0..DATA_BITS {
            value = (value << 1) | u16::from(self.clock(true)?);
        }

        let open_circuit = self.clock(true)?;

        // D1, D0.
        self.clock(false)?;
        self.clock(false)?;

        Ok(RawSample {
            value,
            open_circuit,
        })
    }

    /// One full SCK period.  Samples SO during the high phase when asked.
    fn clock(&mut self, sample: bool) -> Result<bool, SensorError> {
        self.sck.set_high().map_err(|e| SensorError::Pin(e.kind()))?;
        self.delay.delay_us(self.timing.clock_phase_us);
        let bit = if sample {
            self.so.is_high().map_err(|e| SensorError::Pin(e.kind()))?
        } else {
            false
        };
        self.sck.set_low().map_err(|e| SensorError::Pin(e.kind()))?;
        self.delay.delay_us(self.timing.clock_phase_us);
        Ok(bit)
    }
}

impl<CS, SCK, SO, D> TemperatureSource for Max6675<CS, SCK, SO, D>
where
    CS: OutputPin,
    SCK: OutputPin,
    SO: InputPin,
    D: DelayNs,
{
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.read()
    }
}
