//! The main loop: serve the host first, scan when the bus is free.

use core::fmt::Debug;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::command::Interpreter;
use crate::config::Config;
use crate::error::Error;
use crate::frame::Frame;
use crate::matrix::{Column, Matrix};
use crate::port::{BusState, Port};
use crate::scan::{Pass, Scanner};
use crate::settings::Settings;
use crate::tick::TickCounter;
use crate::transceiver::{Received, Transceiver};
use crate::typematic::KeyState;

/// A PS/2 keyboard: bus, matrix, Caps Lock LED and state.
///
/// `ticks` is advanced from a 10 ms timer interrupt owned by the board.
pub struct Keyboard<'t, D, C, DL, COL, ROW, LED> {
    port: Transceiver<D, C, DL>,
    matrix: Matrix<COL, ROW>,
    caps_lock: LED,
    scanner: Scanner,
    settings: Settings,
    config: Config,
    ticks: &'t TickCounter,
}

impl<'t, D, C, DL, COL, ROW, LED, E> Keyboard<'t, D, C, DL, COL, ROW, LED>
where
    D: InputPin<Error = E> + OutputPin<Error = E>,
    C: InputPin<Error = E> + OutputPin<Error = E>,
    DL: DelayUs<u16>,
    COL: Column<Error = E>,
    ROW: InputPin<Error = E>,
    LED: OutputPin<Error = E>,
{
    pub fn new(
        port: Port<D, C>,
        delay: DL,
        matrix: Matrix<COL, ROW>,
        caps_lock: LED,
        ticks: &'t TickCounter,
        config: Config,
    ) -> Self {
        Keyboard {
            port: Transceiver::new(port, delay, config.timing, config.verify_parity),
            matrix,
            caps_lock,
            scanner: Scanner::new(),
            settings: Settings::new(config.typematic),
            config,
            ticks,
        }
    }

    /// Release the bus, darken the LED and report a passed self-test.
    pub fn power_on(&mut self) -> Result<(), Error<E>> {
        self.caps_lock.set_low().map_err(Error::Indicator)?;
        self.matrix.deselect()?;
        self.port.reply(&[Frame::BAT_OK])
    }

    /// One main-loop iteration.
    ///
    /// A host request-to-send is served before anything else. A scan only
    /// starts on an idle bus while scanning is enabled. Every iteration ends
    /// with the idle poll pause.
    pub fn poll(&mut self) -> Result<(), Error<E>> {
        match self.port.bus_state()? {
            BusState::Inhibit => {}
            BusState::RequestToSend => self.serve_host()?,
            BusState::Idle if self.settings.enabled => {
                let pass = self.scanner.pass(
                    &mut self.matrix,
                    &mut self.port,
                    &self.settings.typematic,
                    self.ticks,
                )?;
                if pass == Pass::Aborted {
                    log::trace!("scan aborted by host");
                }
            }
            BusState::Idle => {}
        }
        let pause = self.config.timing.idle_poll_us;
        self.port.wait_us(pause);
        Ok(())
    }

    /// Poll forever. Pin errors are logged and the loop carries on.
    pub fn run(&mut self) -> !
    where
        E: Debug,
    {
        loop {
            if let Err(err) = self.poll() {
                log::warn!("poll failed: {err:?}");
            }
        }
    }

    /// Receive one command and carry it out with the tick interrupt held off.
    fn serve_host(&mut self) -> Result<(), Error<E>> {
        critical_section::with(|_| {
            let byte = match self.port.receive()? {
                Received::Byte(byte) => byte,
                Received::BadParity(byte) => {
                    log::warn!("host byte {byte:#04x} failed parity");
                    return self.port.reply(&[Frame::RESEND]);
                }
            };
            Interpreter {
                port: &mut self.port,
                settings: &mut self.settings,
                caps_lock: &mut self.caps_lock,
                power_on: self.config.typematic,
            }
            .execute(byte)
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The stored typematic state of the key at `(col, row)`.
    pub fn key_state(&self, col: usize, row: usize) -> Option<KeyState> {
        self.scanner.key(col, row)
    }

    /// The frame most recently put on the wire.
    pub fn last_frame(&self) -> Frame {
        self.port.last_frame()
    }
}
