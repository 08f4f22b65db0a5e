//! PS/2 wire frames.
//!
//! A device-to-host frame is 11 bits, sent LSB first:
//!
//! ```text
//! bit   0     1..=8     9       10
//!     start  d0..d7  parity   stop
//!       0             odd       1
//! ```
//!
//! The start bit is always 0, so [`Frame`] only stores the upper 10 bits:
//! the data byte in bits 0..=7, parity in bit 8 and stop in bit 9. Parity and
//! stop are computed once, when the frame is built, so the transmitter only
//! has to shift bits onto the line.

/// A device-to-host frame, start bit implied.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame(u16);

const PARITY_BIT: u16 = 1 << 8;
const STOP_BIT: u16 = 1 << 9;

/// Number of bits on the wire, start bit included.
pub const FRAME_BITS: usize = 11;

impl Frame {
    /// Extended key prefix.
    pub const EXT: Frame = Frame::from_byte(0xE0);
    /// Break (release) prefix.
    pub const REL: Frame = Frame::from_byte(0xF0);
    /// Acknowledge.
    pub const ACK: Frame = Frame::from_byte(0xFA);
    /// Ask the host to send its last byte again.
    pub const RESEND: Frame = Frame::from_byte(0xFE);
    /// Echo reply.
    pub const ECHO: Frame = Frame::from_byte(0xEE);
    /// Basic Assurance Test passed.
    pub const BAT_OK: Frame = Frame::from_byte(0xAA);
    /// Keyboard identity, first and second byte.
    pub const ID: [Frame; 2] = [Frame::from_byte(0xAB), Frame::from_byte(0x83)];
    /// Current scan code set report (Set 2).
    pub const SET_2: Frame = Frame::from_byte(0x41);

    /// Frame a data byte with odd parity and a stop bit.
    pub const fn from_byte(byte: u8) -> Self {
        let parity = if byte.count_ones() % 2 == 0 {
            PARITY_BIT
        } else {
            0
        };
        Frame(byte as u16 | parity | STOP_BIT)
    }

    /// The 10 stored bits: data, parity, stop.
    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn data(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// All 11 bits as they go out on the wire, start bit in bit 0.
    pub const fn wire(self) -> u16 {
        self.0 << 1
    }

    /// Start bit low, stop bit high, odd parity over the data byte.
    pub const fn is_well_formed(self) -> bool {
        let ones = (self.0 & 0x1FF).count_ones();
        self.0 & STOP_BIT != 0 && ones % 2 == 1 && self.0 >> 10 == 0
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Frame({:#04x})", self.data())
    }
}

/// Bits clocked in from the host: 8 data bits, parity, stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFrame(u16);

impl HostFrame {
    /// Number of bits the device clocks in after the host's start bit.
    pub const BITS: usize = 10;

    /// Wrap the raw bits, data in bit 0, stop in bit 9.
    pub const fn from_bits(bits: u16) -> Self {
        HostFrame(bits & 0x3FF)
    }

    pub const fn data(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub const fn parity(self) -> bool {
        self.0 & PARITY_BIT != 0
    }

    pub const fn stop(self) -> bool {
        self.0 & STOP_BIT != 0
    }

    /// Odd parity over data and parity bit.
    pub const fn parity_ok(self) -> bool {
        (self.0 & 0x1FF).count_ones() % 2 == 1
    }
}
