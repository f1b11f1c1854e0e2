//! Continuous sampling pipeline.
//!
//! Each cycle takes `reads_per_cycle` reads, drops the failures, and
//! publishes the mean rounded to 0.1 (or "unavailable" when nothing
//! succeeded).  Failed reads are never averaged and never replaced by the
//! previous value.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{error, info, warn};

use super::store::{TemperatureReading, TemperatureStore};
use super::{TemperatureSource, TemperatureUnit};
use crate::config::SamplerConfig;

/// Upper bound on `reads_per_cycle`.
pub const MAX_READS_PER_CYCLE: usize = 8;

pub struct TemperatureSampler<S, D> {
    source: S,
    delay: D,
    config: SamplerConfig,
    unit: TemperatureUnit,
    cycles: u64,
}

impl<S: TemperatureSource, D: DelayNs> TemperatureSampler<S, D> {
    /// `config.reads_per_cycle` above [`MAX_READS_PER_CYCLE`] is clamped;
    /// [`ControllerConfig::validate`](crate::config::ControllerConfig::validate)
    /// rejects it earlier.
    pub fn new(source: S, delay: D, config: SamplerConfig, unit: TemperatureUnit) -> Self {
        Self {
            source,
            delay,
            config,
            unit,
            cycles: 0,
        }
    }

    /// Completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Take one cycle of reads and build the reading to publish.
    pub fn run_cycle(&mut self) -> TemperatureReading {
        let reads = usize::from(self.config.reads_per_cycle).min(MAX_READS_PER_CYCLE);
        let mut good: Vec<f32, MAX_READS_PER_CYCLE> = Vec::new();

        for i in 0..reads {
            match self.source.read_temperature() {
                Ok(t) => {
                    // Capacity equals the loop bound.
                    let _ = good.push(t);
                }
                Err(e) => warn!("temperature read {}/{} failed: {e}", i + 1, reads),
            }
            if i + 1 < reads {
                self.delay.delay_ms(self.config.inter_read_delay_ms);
            }
        }

        self.cycles += 1;
        let value = mean_rounded(&good);
        if value.is_none() {
            error!("no valid temperature reads this cycle, reading unavailable");
        }

        TemperatureReading::now(value, self.unit, good.len() as u8)
    }

    /// Cycle and publish into `store` until `shutdown` is raised.
    pub fn run(&mut self, store: &TemperatureStore, shutdown: &AtomicBool) {
        info!(
            "temperature sampler started: {} reads/cycle, unit {}",
            self.config.reads_per_cycle, self.unit
        );
        while !shutdown.load(Ordering::Acquire) {
            let reading = self.run_cycle();
            store.publish(reading);
            self.delay.delay_ms(self.config.inter_cycle_delay_ms);
        }
        info!("temperature sampler stopped after {} cycles", self.cycles);
    }
}

/// Arithmetic mean rounded to one decimal place, `None` for no samples.
pub fn mean_rounded(samples: &[f32]) -> Option<f32> {
    if samples.is_empty() {
        return None;
    }
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    Some((mean * 10.0).round() / 10.0)
}
