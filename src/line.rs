//! GPIO line abstraction for the software two-wire bus.
//!
//! The bus engine needs two lines it can drive, release, and sample at
//! runtime. `embedded-hal` 1.0 has no pin trait that switches between input
//! and output, so the capability is expressed here and implemented once per
//! target.

/// Direction of a bus line.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// The line is released; reads sample the wire.
    Input,
    /// The line is driven by the master.
    Output,
}

/// A single open-drain capable GPIO line.
///
/// A line set high in output mode must still be pullable low by other
/// devices on the wire; on most targets this maps to an open-drain output
/// with an external pull-up.
pub trait BusLine {
    /// Drives the line high or low. Takes effect while the line is an
    /// output; the level is retained across direction changes.
    fn set_level(&mut self, high: bool);

    /// Samples the current wire level.
    fn level(&self) -> bool;

    /// Switches the line between input (released) and output (driven).
    fn set_direction(&mut self, direction: Direction);
}
