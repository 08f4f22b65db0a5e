//! The two open-collector PS/2 lines.
//!
//! Writing high releases a line (the host's pull-up takes it high), writing
//! low pulls it down. Both pins must read back the real line level, which is
//! what an open-drain GPIO configured as output does.

use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::error::Error;

/// What the host is doing with the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// Both lines high; the device may transmit.
    Idle,
    /// CLOCK held low by the host; the device must not transmit.
    Inhibit,
    /// CLOCK high, DATA low; the host wants to send a byte.
    RequestToSend,
}

/// DATA and CLOCK.
pub struct Port<D, C> {
    data: D,
    clock: C,
}

impl<D, C, E> Port<D, C>
where
    D: InputPin<Error = E> + OutputPin<Error = E>,
    C: InputPin<Error = E> + OutputPin<Error = E>,
{
    pub fn new(data: D, clock: C) -> Self {
        Port { data, clock }
    }

    /// Classify the current line levels.
    pub fn state(&self) -> Result<BusState, Error<E>> {
        if self.clock.is_low().map_err(Error::Line)? {
            return Ok(BusState::Inhibit);
        }
        if self.data.is_low().map_err(Error::Line)? {
            Ok(BusState::RequestToSend)
        } else {
            Ok(BusState::Idle)
        }
    }

    pub fn data_is_high(&self) -> Result<bool, Error<E>> {
        self.data.is_high().map_err(Error::Line)
    }

    pub fn set_data(&mut self, high: bool) -> Result<(), Error<E>> {
        let result = if high {
            self.data.set_high()
        } else {
            self.data.set_low()
        };
        result.map_err(Error::Line)
    }

    pub fn set_clock(&mut self, high: bool) -> Result<(), Error<E>> {
        let result = if high {
            self.clock.set_high()
        } else {
            self.clock.set_low()
        };
        result.map_err(Error::Line)
    }

    /// Let go of both lines.
    pub fn release(&mut self) -> Result<(), Error<E>> {
        self.set_data(true)?;
        self.set_clock(true)
    }

    /// Give the pins back.
    pub fn free(self) -> (D, C) {
        (self.data, self.clock)
    }
}
