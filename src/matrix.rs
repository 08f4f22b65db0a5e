//! Key matrix pins.
//!
//! Columns are strobed one-hot, active high. Only the strobed column is
//! driven; every other column floats, so two keys held on the same row never
//! connect a high output to a low one. Rows are inputs with pull-downs, so a
//! row reads high exactly when the key at the strobed column and that row is
//! down.

use embedded_hal::digital::v2::InputPin;

use crate::error::Error;
use crate::key_code::{COLS, ROWS};

/// A column line that is either driven high or left high-impedance.
pub trait Column {
    type Error;

    /// Drive the column high.
    fn strobe(&mut self) -> Result<(), Self::Error>;

    /// Stop driving the column.
    fn release(&mut self) -> Result<(), Self::Error>;
}

/// Column lines and row inputs of the 14x6 matrix.
pub struct Matrix<C, R> {
    cols: [C; COLS],
    rows: [R; ROWS],
}

impl<C, R, E> Matrix<C, R>
where
    C: Column<Error = E>,
    R: InputPin<Error = E>,
{
    pub fn new(cols: [C; COLS], rows: [R; ROWS]) -> Self {
        Matrix { cols, rows }
    }

    /// Drive column `col` high and release every other column.
    ///
    /// Others are released first, so at no point are two columns driven.
    pub fn select(&mut self, col: usize) -> Result<(), Error<E>> {
        for (i, pin) in self.cols.iter_mut().enumerate() {
            if i != col {
                pin.release().map_err(Error::Matrix)?;
            }
        }
        match self.cols.get_mut(col) {
            Some(pin) => pin.strobe().map_err(Error::Matrix),
            None => Ok(()),
        }
    }

    /// Release every column.
    pub fn deselect(&mut self) -> Result<(), Error<E>> {
        for pin in self.cols.iter_mut() {
            pin.release().map_err(Error::Matrix)?;
        }
        Ok(())
    }

    /// Whether the key on `row` of the selected column is down.
    pub fn is_pressed(&self, row: usize) -> Result<bool, Error<E>> {
        match self.rows.get(row) {
            Some(pin) => pin.is_high().map_err(Error::Matrix),
            None => Ok(false),
        }
    }
}
