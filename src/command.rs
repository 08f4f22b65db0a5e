//! Host-to-keyboard commands.
//!
//! The host sends one command byte at a time. Every command except Echo is
//! acknowledged with `FA`; commands that carry an argument read it with a
//! second receive and acknowledge again.
//!
//! | Cmd     | Name          | Reply                                      |
//! |---------|---------------|--------------------------------------------|
//! | `ED`    | Set LEDs      | `FA`, arg, `FA`                            |
//! | `EE`    | Echo          | `EE`                                       |
//! | `F0`    | Scan code set | `FA`, arg, `FA`, then `41` if arg was 0    |
//! | `F2`    | Read ID       | `FA AB 83`                                 |
//! | `F3`    | Set typematic | `FA`, arg, `FA`                            |
//! | `F4`    | Enable        | `FA`                                       |
//! | `F5`    | Disable       | `FA`                                       |
//! | `F6-FA` | Set 3 modes   | `FA`                                       |
//! | `FB-FD` | Set 3 key     | `FA`, arg, `FA`                            |
//! | `FE`    | Resend        | `FA`, last byte sent                       |
//! | `FF`    | Reset         | `FA AA`                                    |
//! | other   |               | `FE`                                       |

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use packed_struct::prelude::*;
use packed_struct::PackingError;

use crate::error::Error;
use crate::frame::Frame;
use crate::settings::{Leds, RepeatDelay, RepeatRate, Settings, Typematic};
use crate::transceiver::{Received, Transceiver};

/// A decoded command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `ED`: one argument, the lock LED bits.
    SetLeds,
    /// `EE`
    Echo,
    /// `F0`: one argument, the requested set (0 asks which one is active).
    ScanCodeSet,
    /// `F2`
    ReadId,
    /// `F3`: one argument, rate and delay.
    SetTypematic,
    /// `F4`
    Enable,
    /// `F5`
    Disable,
    /// `F6`-`FA`: Set 3 modes for every key. Accepted and ignored.
    SetAllKeys(u8),
    /// `FB`-`FD`: Set 3 mode for one key, which follows as an argument.
    /// Accepted and ignored.
    SetKeyType(u8),
    /// `FE`
    Resend,
    /// `FF`
    Reset,
    /// Anything else.
    Unknown(u8),
}

impl From<u8> for Command {
    fn from(byte: u8) -> Self {
        match byte {
            0xED => Command::SetLeds,
            0xEE => Command::Echo,
            0xF0 => Command::ScanCodeSet,
            0xF2 => Command::ReadId,
            0xF3 => Command::SetTypematic,
            0xF4 => Command::Enable,
            0xF5 => Command::Disable,
            0xF6..=0xFA => Command::SetAllKeys(byte),
            0xFB..=0xFD => Command::SetKeyType(byte),
            0xFE => Command::Resend,
            0xFF => Command::Reset,
            other => Command::Unknown(other),
        }
    }
}

/// Argument of Set Typematic Rate/Delay.
///
/// Bit 0 in `msb0` numbering is the most significant bit of the byte, so the
/// rate occupies the low five bits and the delay the two above them. The top
/// bit is reserved.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0")]
pub struct TypematicArg {
    #[packed_field(bits = "1..=2")]
    pub delay: Integer<u8, packed_bits::Bits2>,
    #[packed_field(bits = "3..=7")]
    pub rate: Integer<u8, packed_bits::Bits5>,
}

impl From<TypematicArg> for Typematic {
    fn from(arg: TypematicArg) -> Self {
        Typematic {
            rate: RepeatRate::from_field(arg.rate.into()),
            delay: RepeatDelay::from_field(arg.delay.into()),
        }
    }
}

/// Argument of Set LEDs. The top four bits are reserved.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0")]
pub struct LedArg {
    #[packed_field(bits = "4")]
    pub kana: bool,
    #[packed_field(bits = "5")]
    pub caps_lock: bool,
    #[packed_field(bits = "6")]
    pub num_lock: bool,
    #[packed_field(bits = "7")]
    pub scroll_lock: bool,
}

impl From<LedArg> for Leds {
    fn from(arg: LedArg) -> Self {
        Leds {
            scroll_lock: arg.scroll_lock,
            num_lock: arg.num_lock,
            caps_lock: arg.caps_lock,
            kana: arg.kana,
        }
    }
}

/// Decode a Set Typematic argument. Reserved bits are ignored.
pub fn decode_typematic(arg: u8) -> Result<Typematic, PackingError> {
    TypematicArg::unpack(&[arg]).map(Typematic::from)
}

/// Decode a Set LEDs argument. Reserved bits are ignored.
pub fn decode_leds(arg: u8) -> Result<Leds, PackingError> {
    LedArg::unpack(&[arg]).map(Leds::from)
}

/// Everything a command may touch, borrowed from the keyboard for the
/// duration of one command.
pub struct Interpreter<'a, D, C, DL, L> {
    pub port: &'a mut Transceiver<D, C, DL>,
    pub settings: &'a mut Settings,
    pub caps_lock: &'a mut L,
    /// Restored by Reset.
    pub power_on: Typematic,
}

impl<'a, D, C, DL, L, E> Interpreter<'a, D, C, DL, L>
where
    D: InputPin<Error = E> + OutputPin<Error = E>,
    C: InputPin<Error = E> + OutputPin<Error = E>,
    DL: DelayUs<u16>,
    L: OutputPin<Error = E>,
{
    /// Carry out one command byte, including any argument exchange.
    pub fn execute(&mut self, byte: u8) -> Result<(), Error<E>> {
        let command = Command::from(byte);
        log::debug!("host command {byte:#04x}: {command:?}");
        match command {
            Command::SetLeds => {
                if let Some(arg) = self.argument()? {
                    match decode_leds(arg) {
                        Ok(leds) => {
                            self.show(leds)?;
                            log::debug!("leds: {leds:?}");
                        }
                        Err(err) => log::warn!("led argument {arg:#04x}: {err:?}"),
                    }
                }
            }
            Command::Echo => self.port.reply(&[Frame::ECHO])?,
            Command::ScanCodeSet => {
                if let Some(arg) = self.argument()? {
                    if arg == 0 {
                        self.port.reply(&[Frame::SET_2])?;
                    }
                }
            }
            Command::ReadId => self.port.reply(&[Frame::ACK, Frame::ID[0], Frame::ID[1]])?,
            Command::SetTypematic => {
                if let Some(arg) = self.argument()? {
                    match decode_typematic(arg) {
                        Ok(typematic) => {
                            self.settings.typematic = typematic;
                            log::debug!("typematic: {typematic:?}");
                        }
                        Err(err) => log::warn!("typematic argument {arg:#04x}: {err:?}"),
                    }
                }
            }
            Command::Enable => {
                self.port.reply(&[Frame::ACK])?;
                self.settings.enabled = true;
            }
            Command::Disable => {
                self.port.reply(&[Frame::ACK])?;
                self.settings.enabled = false;
            }
            Command::SetAllKeys(_) => self.port.reply(&[Frame::ACK])?,
            Command::SetKeyType(_) => {
                self.argument()?;
            }
            Command::Resend => {
                let last = self.port.last_frame();
                self.port.reply(&[Frame::ACK, last])?;
            }
            Command::Reset => {
                *self.settings = Settings::new(self.power_on);
                self.show(self.settings.leds)?;
                self.port.reply(&[Frame::ACK, Frame::BAT_OK])?;
            }
            Command::Unknown(byte) => {
                log::warn!("unknown host command {byte:#04x}");
                self.port.reply(&[Frame::RESEND])?;
            }
        }
        Ok(())
    }

    /// Acknowledge the command, read its argument and acknowledge that too.
    ///
    /// A byte that fails parity verification is answered with Resend instead,
    /// and the command is dropped.
    fn argument(&mut self) -> Result<Option<u8>, Error<E>> {
        self.port.reply(&[Frame::ACK])?;
        match self.port.receive()? {
            Received::Byte(arg) => {
                self.port.reply(&[Frame::ACK])?;
                Ok(Some(arg))
            }
            Received::BadParity(arg) => {
                log::warn!("argument {arg:#04x} failed parity");
                self.port.reply(&[Frame::RESEND])?;
                Ok(None)
            }
        }
    }

    fn show(&mut self, leds: Leds) -> Result<(), Error<E>> {
        self.settings.leds = leds;
        let result = if leds.caps_lock {
            self.caps_lock.set_high()
        } else {
            self.caps_lock.set_low()
        };
        result.map_err(Error::Indicator)
    }
}
