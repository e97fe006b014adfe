//! BCD helpers for the DS3231 register encoding.
//!
//! Every BCD register on the device packs a two-digit decimal value into a
//! single byte, tens in the high nibble and ones in the low nibble.

/// Packs a binary value (0-99) into BCD.
pub(crate) fn to_bcd(value: u8) -> u8 {
    (value / 10) * 16 + (value % 10)
}

/// Unpacks a BCD byte into its binary value.
pub(crate) fn from_bcd(value: u8) -> u8 {
    (value / 16) * 10 + (value % 16)
}
