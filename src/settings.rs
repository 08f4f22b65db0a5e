//! Runtime keyboard settings, changed by host commands.

/// Ticks (10 ms) between repeated make codes of a held key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatRate {
    /// 3 ticks, about 33.3 characters per second.
    Ticks3,
    /// 6 ticks, about 16.6 characters per second.
    Ticks6,
    /// 12 ticks, about 8.3 characters per second.
    Ticks12,
    /// 25 ticks, 4 characters per second.
    Ticks25,
    /// 50 ticks, 2 characters per second.
    Ticks50,
}

impl RepeatRate {
    pub const fn ticks(self) -> u8 {
        match self {
            RepeatRate::Ticks3 => 3,
            RepeatRate::Ticks6 => 6,
            RepeatRate::Ticks12 => 12,
            RepeatRate::Ticks25 => 25,
            RepeatRate::Ticks50 => 50,
        }
    }

    /// Decode the 5-bit rate field of a Set Typematic argument.
    ///
    /// Values the keyboard can't honor fall through to the fastest rate.
    pub const fn from_field(field: u8) -> Self {
        match field & 0x1F {
            0x18..=0x1F => RepeatRate::Ticks50,
            0x10..=0x17 => RepeatRate::Ticks25,
            0x08..=0x0F => RepeatRate::Ticks12,
            0x04..=0x07 => RepeatRate::Ticks6,
            _ => RepeatRate::Ticks3,
        }
    }
}

/// Ticks (10 ms) a key must be held before it starts repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatDelay {
    /// 250 ms.
    Ticks25,
    /// 500 ms.
    Ticks50,
    /// 750 ms.
    Ticks75,
    /// 1000 ms.
    Ticks100,
}

impl RepeatDelay {
    pub const fn ticks(self) -> u8 {
        match self {
            RepeatDelay::Ticks25 => 25,
            RepeatDelay::Ticks50 => 50,
            RepeatDelay::Ticks75 => 75,
            RepeatDelay::Ticks100 => 100,
        }
    }

    /// Decode the 2-bit delay field of a Set Typematic argument.
    pub const fn from_field(field: u8) -> Self {
        match field & 0x03 {
            0b01 => RepeatDelay::Ticks50,
            0b10 => RepeatDelay::Ticks75,
            0b11 => RepeatDelay::Ticks100,
            _ => RepeatDelay::Ticks25,
        }
    }
}

/// Auto-repeat parameters shared by every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typematic {
    pub rate: RepeatRate,
    pub delay: RepeatDelay,
}

impl Default for Typematic {
    /// Two repeats per second after a one second hold.
    fn default() -> Self {
        Typematic {
            rate: RepeatRate::Ticks50,
            delay: RepeatDelay::Ticks100,
        }
    }
}

/// Lock-key indicators as last set by the host.
///
/// Only Caps Lock is wired to an LED on this board; the others are only
/// remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Leds {
    pub scroll_lock: bool,
    pub num_lock: bool,
    pub caps_lock: bool,
    pub kana: bool,
}

/// Everything the host may change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Whether matrix scanning produces any traffic.
    pub enabled: bool,
    pub typematic: Typematic,
    pub leds: Leds,
}

impl Settings {
    pub const fn new(typematic: Typematic) -> Self {
        Settings {
            enabled: true,
            typematic,
            leds: Leds {
                scroll_lock: false,
                num_lock: false,
                caps_lock: false,
                kana: false,
            },
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new(Typematic::default())
    }
}
