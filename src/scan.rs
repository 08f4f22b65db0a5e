//! One pass over the key matrix.

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::error::Error;
use crate::key_code::{lookup, COLS, ROWS};
use crate::matrix::{Column, Matrix};
use crate::port::BusState;
use crate::settings::Typematic;
use crate::tick::TickCounter;
use crate::transceiver::{Delivery, Transceiver};
use crate::typematic::{Emit, KeyState};

/// How a scan pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Every position was visited.
    Complete,
    /// The host took the bus; the pass stopped early and will be redone.
    Aborted,
}

/// Typematic state of every matrix position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanner {
    keys: [[KeyState; ROWS]; COLS],
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub const fn new() -> Self {
        Scanner {
            keys: [[KeyState::Released; ROWS]; COLS],
        }
    }

    /// The stored state at `(col, row)`.
    pub fn key(&self, col: usize, row: usize) -> Option<KeyState> {
        self.keys.get(col).and_then(|c| c.get(row)).copied()
    }

    /// Strobe each column in turn and step every key on it.
    ///
    /// Before each key the bus is checked; anything but idle ends the pass.
    /// Positions with no scan code are tracked but never transmitted.
    pub fn pass<D, C, DL, COL, ROW, E>(
        &mut self,
        matrix: &mut Matrix<COL, ROW>,
        port: &mut Transceiver<D, C, DL>,
        typematic: &Typematic,
        ticks: &TickCounter,
    ) -> Result<Pass, Error<E>>
    where
        D: InputPin<Error = E> + OutputPin<Error = E>,
        C: InputPin<Error = E> + OutputPin<Error = E>,
        DL: DelayUs<u16>,
        COL: Column<Error = E>,
        ROW: InputPin<Error = E>,
    {
        let settle = port.timing().column_settle_us;
        for col in 0..COLS {
            matrix.select(col)?;
            port.wait_us(settle);
            for row in 0..ROWS {
                if port.bus_state()? != BusState::Idle {
                    matrix.deselect()?;
                    return Ok(Pass::Aborted);
                }
                let pressed = matrix.is_pressed(row)?;
                let key = &mut self.keys[col][row];
                let step = key.step(pressed, ticks.now(), typematic);
                let (Some(emit), Some(code)) = (step.emit, lookup(col, row)) else {
                    *key = step.next;
                    continue;
                };
                let frames = code.sequence(emit == Emit::Make);
                match port.send_sequence(&frames)? {
                    Delivery::Complete => {
                        log::trace!("({col}, {row}) {emit:?} {frames:?}");
                        *key = step.next;
                    }
                    Delivery::Interrupted => {
                        log::trace!("({col}, {row}) {emit:?} interrupted");
                        matrix.deselect()?;
                        return Ok(Pass::Aborted);
                    }
                }
            }
        }
        matrix.deselect()?;
        Ok(Pass::Complete)
    }
}
