//! Edge-debounced startup button.
//!
//! ## Hardware
//!
//! Momentary switch to 3V3 with the input pulled down, so a press is a
//! rising edge.  Put a 0.1 µF capacitor across the switch terminals: the
//! monitor only ignores edges for the debounce window, it does not
//! filter contact bounce.
//!
//! ## Hand-off
//!
//! The edge handler touches exactly two atomics (last trigger time and the
//! pending flag) and nothing else, so it is safe to call from an interrupt
//! thread.  The control loop [`take_pending`](ButtonMonitor::take_pending)s
//! the flag.  Presses inside the debounce window, or while a press is
//! already pending, collapse into one event.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use embedded_hal::digital::{Error as _, ErrorKind, InputPin};
use log::warn;

/// Sentinel for "never triggered".
const NEVER: u64 = u64::MAX;

/// Single-slot debounced button event.
#[derive(Debug)]
pub struct ButtonMonitor {
    debounce_ms: u64,
    last_trigger_ms: AtomicU64,
    pending: AtomicBool,
    last_level: AtomicBool,
}

impl ButtonMonitor {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms: u64::from(debounce_ms),
            last_trigger_ms: AtomicU64::new(NEVER),
            pending: AtomicBool::new(false),
            last_level: AtomicBool::new(false),
        }
    }

    /// Rising edge observed at `now_ms` (monotonic).  Returns `true` if the
    /// edge triggered, `false` if it fell inside the debounce window.
    pub fn on_edge_at(&self, now_ms: u64) -> bool {
        let last = self.last_trigger_ms.load(Ordering::Acquire);
        if last != NEVER && now_ms.saturating_sub(last) < self.debounce_ms {
            return false;
        }
        self.last_trigger_ms.store(now_ms, Ordering::Release);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Feed a sampled input level.  A LOW→HIGH change counts as an edge.
    pub fn poll_level(&self, level_high: bool, now_ms: u64) -> bool {
        let was_high = self.last_level.swap(level_high, Ordering::AcqRel);
        level_high && !was_high && self.on_edge_at(now_ms)
    }

    /// Consume the pending event.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Drives a [`ButtonMonitor`] from a polled input pin, for platforms
/// without edge interrupts.
pub struct ButtonPoller<P> {
    pin: P,
    failed: Option<ErrorKind>,
}

impl<P: InputPin> ButtonPoller<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, failed: None }
    }

    /// Sample the pin once.  Read errors are logged once and treated as LOW.
    pub fn poll(&mut self, monitor: &ButtonMonitor, now_ms: u64) -> bool {
        let level = match self.pin.is_high() {
            Ok(level) => {
                self.failed = None;
                level
            }
            Err(e) => {
                if self.failed != Some(e.kind()) {
                    warn!("startup button read failed: {:?}", e.kind());
                    self.failed = Some(e.kind());
                }
                false
            }
        };
        monitor.poll_level(level, now_ms)
    }
}
