//! Error type for keyboard operations.

/// A pin operation failed.
///
/// The variant tells which group of pins was being driven; the inner value is
/// the HAL's own pin error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// DATA or CLOCK line.
    Line(E),
    /// A matrix row or column.
    Matrix(E),
    /// An indicator LED.
    Indicator(E),
}
