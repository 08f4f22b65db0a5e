//! The 10 ms tick shared between the timer interrupt and the main loop.
//!
//! The counter is 7 bits wide. It counts 0..=127 and wraps back
//! to 0, so every elapsed-time computation is done modulo 128.

use core::sync::atomic::{AtomicU8, Ordering};

/// Mask selecting the 7 significant bits of a tick.
const TICK_MASK: u8 = 0x7F;

/// A single 7-bit tick value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick(u8);

impl Tick {
    /// Build a tick, discarding anything above bit 6.
    pub const fn new(raw: u8) -> Self {
        Tick(raw & TICK_MASK)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Number of ticks from `earlier` to `self`.
    ///
    /// When the counter wrapped in between, this is `(127 - earlier) + self`,
    /// one tick short of the true interval.
    pub const fn elapsed_since(self, earlier: Tick) -> u8 {
        if self.0 >= earlier.0 {
            self.0 - earlier.0
        } else {
            (TICK_MASK - earlier.0) + self.0
        }
    }

    /// True on every `period`-th tick of the counter.
    pub const fn is_multiple_of(self, period: u8) -> bool {
        period != 0 && self.0 % period == 0
    }
}

/// A tick counter advanced from the timer interrupt.
///
/// Only the interrupt writes, and only the main loop reads, so a plain
/// load/store pair is enough to advance it.
pub struct TickCounter(AtomicU8);

impl TickCounter {
    pub const fn new() -> Self {
        TickCounter(AtomicU8::new(0))
    }

    /// Advance by one tick, wrapping at 128. Call once per 10 ms.
    pub fn advance(&self) {
        let next = self.0.load(Ordering::Relaxed).wrapping_add(1) & TICK_MASK;
        self.0.store(next, Ordering::Relaxed);
    }

    /// The current tick.
    pub fn now(&self) -> Tick {
        Tick::new(self.0.load(Ordering::Relaxed))
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}
