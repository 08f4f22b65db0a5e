//! Boot-time configuration.
//!
//! All delays are given in real microseconds. The board supplies a delay
//! provider that is accurate at that scale; if it is not (a slow core, or a
//! prescaled timer), compensate here and leave the protocol code alone.

use crate::settings::Typematic;

/// Protocol timing, in microseconds.
///
/// The defaults clock the bus at 80 us per bit (12.5 kHz), inside the
/// 10-17 kHz window hosts expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// DATA is set this long before CLOCK falls.
    pub data_setup_us: u16,
    /// CLOCK low time per bit. At least 16.
    pub clock_low_us: u16,
    /// CLOCK high time per bit, after the data setup. At least 14 when
    /// added to `data_setup_us`.
    pub clock_high_us: u16,
    /// Idle gap after each frame of a multi-frame sequence (`BREAK`).
    pub inter_byte_us: u16,
    /// Settling time after switching matrix columns.
    pub column_settle_us: u16,
    /// Pause at the end of every main-loop iteration.
    pub idle_poll_us: u16,
}

impl Timing {
    pub const STANDARD: Timing = Timing {
        data_setup_us: 10,
        clock_low_us: 40,
        clock_high_us: 30,
        inter_byte_us: 336,
        column_settle_us: 100,
        idle_poll_us: 50,
    };

    /// Length of one bit on the wire.
    pub const fn bit_period_us(&self) -> u16 {
        self.data_setup_us + self.clock_low_us + self.clock_high_us
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing::STANDARD
    }
}

/// Keyboard configuration fixed at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub timing: Timing,
    /// Check the parity of bytes received from the host and answer a bad
    /// one with Resend. Off by default.
    pub verify_parity: bool,
    /// Repeat parameters used at power-on and restored by Reset.
    pub typematic: Typematic,
}
