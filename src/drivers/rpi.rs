//! Raspberry Pi GPIO wiring through `rppal`.
//!
//! Pins come from [`PinConfig`](crate::config::PinConfig) as BCM numbers.
//! The relay lines are claimed first and parked HIGH (off) so nothing
//! later in bring-up can leave a relay floating energised.

use std::sync::Arc;

use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};

use crate::adapters::hardware::RelayBoard;
use crate::adapters::time::StdDelay;
use crate::config::ControllerConfig;
use crate::error::Result;
use crate::runtime::SharedState;
use crate::sensors::max6675::Max6675;

pub type PiThermocouple = Max6675<OutputPin, OutputPin, InputPin, StdDelay>;
pub type PiRelayBoard = RelayBoard<OutputPin, OutputPin>;

/// Every GPIO line the controller uses.
pub struct PiHardware {
    pub thermocouple: PiThermocouple,
    pub relays: PiRelayBoard,
    /// Keep alive while the controller runs: dropping it disarms the
    /// button interrupt.
    pub button: InputPin,
}

impl PiHardware {
    pub fn open(config: &ControllerConfig) -> Result<Self> {
        let gpio = Gpio::new()?;
        let pins = &config.pins;

        let relays = RelayBoard::new(
            gpio.get(pins.force_heat)?.into_output_high(),
            gpio.get(pins.overfire_shutoff)?.into_output_high(),
        )?;

        let thermocouple = Max6675::new(
            gpio.get(pins.thermo_cs)?.into_output_high(),
            gpio.get(pins.thermo_sck)?.into_output_low(),
            gpio.get(pins.thermo_so)?.into_input(),
            StdDelay,
            config.unit,
        )?;

        let button = gpio.get(pins.startup_button)?.into_input_pulldown();

        Ok(Self {
            thermocouple,
            relays,
            button,
        })
    }

    /// Route rising edges on the button line into the shared monitor.
    /// Debouncing is the monitor's job, not rppal's.
    pub fn arm_button(&mut self, shared: Arc<SharedState>) -> Result<()> {
        self.button
            .set_async_interrupt(Trigger::RisingEdge, None, move |_event| {
                shared.button_edge();
            })?;
        Ok(())
    }
}
