//! Device side of a PS/2 keyboard for a 14x6 switch matrix.
//!
//! The keyboard bit-bangs the PS/2 DATA and CLOCK lines, reports key presses
//! and releases as Scan Code Set 2 make/break sequences with typematic
//! repeat, and answers the host's command set (LEDs, echo, identify, rate,
//! enable/disable, resend, reset).
//!
//! Everything runs on [`embedded_hal`] pins and delays, so the board crate
//! only has to hand over GPIOs, a microsecond delay and a 10 ms tick:
//!
//! ```ignore
//! static TICKS: TickCounter = TickCounter::new();
//!
//! let mut keyboard = Keyboard::new(
//!     Port::new(data, clock),
//!     delay,
//!     Matrix::new(cols, rows),
//!     caps_lock_led,
//!     &TICKS,
//!     Config::default(),
//! );
//! keyboard.power_on()?;
//! keyboard.run()
//! ```
#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod config;
pub mod error;
pub mod frame;
pub mod key_code;
pub mod keyboard;
pub mod matrix;
pub mod port;
pub mod scan;
pub mod settings;
pub mod tick;
pub mod transceiver;
pub mod typematic;

pub use config::{Config, Timing};
pub use error::Error;
pub use frame::Frame;
pub use keyboard::Keyboard;
pub use matrix::{Column, Matrix};
pub use port::{BusState, Port};
pub use settings::Settings;
pub use tick::{Tick, TickCounter};
