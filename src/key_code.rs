//! Scan Code Set 2 codes for the 14x6 matrix, and the byte sequences they
//! turn into on the wire.

use heapless::Vec;

use crate::frame::Frame;

/// Number of matrix columns (strobed outputs).
pub const COLS: usize = 14;
/// Number of matrix rows (sensed inputs).
pub const ROWS: usize = 6;

/// A Set 2 scan code: one primary byte, optionally behind an `E0` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCode {
    pub extended: bool,
    pub code: u8,
}

/// Frames making up one make or break, in wire order.
pub type Sequence = Vec<Frame, 3>;

impl ScanCode {
    pub const fn key(code: u8) -> Self {
        ScanCode {
            extended: false,
            code,
        }
    }

    pub const fn ext(code: u8) -> Self {
        ScanCode {
            extended: true,
            code,
        }
    }

    /// The primary byte, framed.
    pub const fn frame(self) -> Frame {
        Frame::from_byte(self.code)
    }

    /// Frames sent when the key goes down: `[E0] code`.
    pub fn make(self) -> Sequence {
        let mut seq = Sequence::new();
        if self.extended {
            seq.extend([Frame::EXT]);
        }
        seq.extend([self.frame()]);
        seq
    }

    /// Frames sent when the key comes up: `[E0] F0 code`.
    pub fn brk(self) -> Sequence {
        let mut seq = Sequence::new();
        if self.extended {
            seq.extend([Frame::EXT]);
        }
        seq.extend([Frame::REL, self.frame()]);
        seq
    }

    pub fn sequence(self, pressed: bool) -> Sequence {
        if pressed {
            self.make()
        } else {
            self.brk()
        }
    }
}

/// A matrix position, `None` when nothing is fitted there.
pub type Key = Option<ScanCode>;

const __: Key = None;

const fn k(code: u8) -> Key {
    Some(ScanCode::key(code))
}

const fn e(code: u8) -> Key {
    Some(ScanCode::ext(code))
}

/// Mapping from switch positions to scan codes, indexed `[col][row]`.
#[rustfmt::skip]
pub static LAYOUT: [[Key; ROWS]; COLS] = [
    /*           row 0       1          2           3          4          5        */
    /*  0 */ [k(0x14) /*LCtrl*/, k(0x12) /*LShift*/, k(0x58) /*Caps*/, k(0x0D) /*Tab*/,  k(0x0E) /*`*/,   k(0x76) /*Esc*/],
    /*  1 */ [e(0x1F) /*LGui*/,  k(0x1A) /*Z*/,      k(0x1C) /*A*/,    k(0x15) /*Q*/,    k(0x16) /*1*/,   __            ],
    /*  2 */ [k(0x11) /*LAlt*/,  k(0x22) /*X*/,      k(0x1B) /*S*/,    k(0x1D) /*W*/,    k(0x1E) /*2*/,   k(0x05) /*F1*/],
    /*  3 */ [__,                k(0x21) /*C*/,      k(0x23) /*D*/,    k(0x24) /*E*/,    k(0x26) /*3*/,   k(0x06) /*F2*/],
    /*  4 */ [__,                k(0x2A) /*V*/,      k(0x2B) /*F*/,    k(0x2D) /*R*/,    k(0x25) /*4*/,   k(0x04) /*F3*/],
    /*  5 */ [__,                k(0x32) /*B*/,      k(0x34) /*G*/,    k(0x2C) /*T*/,    k(0x2E) /*5*/,   k(0x0C) /*F4*/],
    /*  6 */ [k(0x29) /*Space*/, k(0x31) /*N*/,      k(0x33) /*H*/,    k(0x35) /*Y*/,    k(0x36) /*6*/,   __            ],
    /*  7 */ [__,                k(0x3A) /*M*/,      k(0x3B) /*J*/,    k(0x3C) /*U*/,    k(0x3D) /*7*/,   k(0x03) /*F5*/],
    /*  8 */ [__,                k(0x41) /*,*/,      k(0x42) /*K*/,    k(0x43) /*I*/,    k(0x3E) /*8*/,   k(0x0B) /*F6*/],
    /*  9 */ [e(0x11) /*RAlt*/,  k(0x49) /*.*/,      k(0x4B) /*L*/,    k(0x44) /*O*/,    k(0x46) /*9*/,   k(0x83) /*F7*/],
    /* 10 */ [e(0x27) /*RGui*/,  k(0x4A) /*/ */,     k(0x4C) /*;*/,    k(0x4D) /*P*/,    k(0x45) /*0*/,   k(0x0A) /*F8*/],
    /* 11 */ [e(0x2F) /*Menu*/,  __,                 k(0x52) /*'*/,    k(0x54) /*[*/,    k(0x4E) /*-*/,   k(0x01) /*F9*/],
    /* 12 */ [__,                __,                 k(0x78) /*F11*/,  k(0x5B) /*]*/,    k(0x55) /*=*/,   k(0x09) /*F10*/],
    /* 13 */ [e(0x14) /*RCtrl*/, k(0x59) /*RShift*/, k(0x5A) /*Enter*/, k(0x5D) /*\*/,   k(0x66) /*BkSp*/, k(0x07) /*F12*/],
];

/// Look up the key at `(col, row)`.
pub fn lookup(col: usize, row: usize) -> Key {
    LAYOUT.get(col).and_then(|c| c.get(row)).copied().flatten()
}
