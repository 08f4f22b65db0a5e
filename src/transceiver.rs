//! Bit-level PS/2 transfers.
//!
//! The keyboard generates CLOCK in both directions. Device-to-host it shifts
//! out a [`Frame`] while CLOCK is high and lets the host sample on the falling
//! edge. Host-to-device, once the host has pulled DATA low (request-to-send),
//! the keyboard clocks in 10 bits, sampling DATA after each rising edge, and
//! then pulses CLOCK once more with DATA held low as the acknowledge.
//!
//! Every transfer runs inside a critical section: a tick interrupt in the
//! middle of a frame would stretch a clock phase far past what hosts accept.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::config::Timing;
use crate::error::Error;
use crate::frame::{Frame, HostFrame, FRAME_BITS};
use crate::port::{BusState, Port};

/// How a multi-frame transmission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Every frame went out.
    Complete,
    /// The host took the bus between two frames; the rest were dropped.
    Interrupted,
}

/// A byte read from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    Byte(u8),
    /// Parity verification is on and the byte failed it.
    BadParity(u8),
}

/// The PS/2 line protocol on top of a [`Port`].
pub struct Transceiver<D, C, DL> {
    port: Port<D, C>,
    delay: DL,
    timing: Timing,
    verify_parity: bool,
    last: Frame,
}

impl<D, C, DL, E> Transceiver<D, C, DL>
where
    D: InputPin<Error = E> + OutputPin<Error = E>,
    C: InputPin<Error = E> + OutputPin<Error = E>,
    DL: DelayUs<u16>,
{
    pub fn new(port: Port<D, C>, delay: DL, timing: Timing, verify_parity: bool) -> Self {
        Transceiver {
            port,
            delay,
            timing,
            verify_parity,
            last: Frame::from_byte(0x00),
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn bus_state(&self) -> Result<BusState, Error<E>> {
        self.port.state()
    }

    /// The frame most recently put on the wire.
    pub fn last_frame(&self) -> Frame {
        self.last
    }

    pub fn wait_us(&mut self, us: u16) {
        self.delay.delay_us(us);
    }

    /// Send `frames` back to back, each followed by the inter-byte gap.
    ///
    /// Between frames the bus is checked again; if the host has pulled CLOCK
    /// low or asked to send, the remaining frames are dropped. A frame that
    /// has started is always finished.
    pub fn send_sequence(&mut self, frames: &[Frame]) -> Result<Delivery, Error<E>> {
        critical_section::with(|_| {
            for (i, frame) in frames.iter().enumerate() {
                if i > 0 && self.port.state()? != BusState::Idle {
                    return Ok(Delivery::Interrupted);
                }
                self.shift_out(*frame)?;
                self.delay.delay_us(self.timing.inter_byte_us);
            }
            Ok(Delivery::Complete)
        })
    }

    /// Send `frames` unconditionally, each followed by the inter-byte gap.
    ///
    /// Used for command replies and the power-on report, which the host is
    /// waiting for.
    pub fn reply(&mut self, frames: &[Frame]) -> Result<(), Error<E>> {
        critical_section::with(|_| {
            for frame in frames {
                self.shift_out(*frame)?;
                self.delay.delay_us(self.timing.inter_byte_us);
            }
            Ok(())
        })
    }

    /// Wait for the host to request-to-send, then clock in one byte and
    /// acknowledge it.
    ///
    /// Blocks for as long as the host keeps the bus idle or inhibited.
    pub fn receive(&mut self) -> Result<Received, Error<E>> {
        let frame = critical_section::with(|_| {
            while self.port.state()? != BusState::RequestToSend {}
            self.shift_in()
        })?;
        if self.verify_parity && !frame.parity_ok() {
            return Ok(Received::BadParity(frame.data()));
        }
        Ok(Received::Byte(frame.data()))
    }

    fn shift_out(&mut self, frame: Frame) -> Result<(), Error<E>> {
        self.last = frame;
        let mut wire = frame.wire();
        for _ in 0..FRAME_BITS {
            self.port.set_data(wire & 1 != 0)?;
            self.delay.delay_us(self.timing.data_setup_us);
            self.port.set_clock(false)?;
            self.delay.delay_us(self.timing.clock_low_us);
            self.port.set_clock(true)?;
            self.delay.delay_us(self.timing.clock_high_us);
            wire >>= 1;
        }
        self.port.release()
    }

    fn shift_in(&mut self) -> Result<HostFrame, Error<E>> {
        let half_period = self.timing.bit_period_us() / 2;
        let mut bits: u16 = 0;
        for i in 0..HostFrame::BITS {
            self.port.set_clock(false)?;
            self.delay.delay_us(half_period);
            self.port.set_clock(true)?;
            if self.port.data_is_high()? {
                bits |= 1 << i;
            }
            self.delay.delay_us(half_period);
        }
        // Acknowledge: one more clock with DATA held low.
        self.port.set_data(false)?;
        self.port.set_clock(false)?;
        self.delay.delay_us(half_period);
        self.port.release()?;
        Ok(HostFrame::from_bits(bits))
    }
}
