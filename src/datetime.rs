//! Date and time record for the DS3231 RTC.
//!
//! [`DateTime`] mirrors the device's seven date/time registers in binary
//! form and converts to and from the BCD register block. The 12-hour fields
//! are derived from the 24-hour value when a record is decoded; they are
//! ignored when encoding.
//!
//! Conversions to and from chrono's `NaiveDateTime` are provided for hosts
//! that work with calendar types.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::bcd::{from_bcd, to_bcd};

/// Errors that can occur during date/time conversion or validation.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeError {
    /// A field is out of its valid range
    InvalidField(&'static str),
    /// The year cannot be stored in the device's century-relative register
    YearOutOfRange,
}

/// Date and time as kept by the DS3231.
///
/// `year` covers 1901-2099: the century bit in the month register selects
/// the 2000s, a clear bit the 1900s. The year 2000 itself is not encodable
/// (its century-relative offset does not fit the BCD year register) and is
/// rejected on write.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Seconds (0-59)
    pub second: u8,
    /// Minutes (0-59)
    pub minute: u8,
    /// Hours in 24-hour form (0-23)
    pub hour: u8,
    /// Day of week (1-7, 1=Sunday)
    pub day: u8,
    /// Date of month (1-31)
    pub date: u8,
    /// Month (1-12)
    pub month: u8,
    /// Full year (1901-2099, excluding 2000)
    pub year: u16,
    /// Hour on a 12-hour clock, derived on read
    pub twelve_hour: u8,
    /// AM flag, derived on read
    pub am: bool,
}

/// Derives the 12-hour clock fields from a 24-hour hour value.
pub(crate) fn clock12(hour: u8) -> (u8, bool) {
    match hour {
        0 => (0, true),
        1..=11 => (hour, true),
        _ => (hour - 12, false),
    }
}

impl DateTime {
    /// Decodes the seven-register date/time block.
    ///
    /// Register contents are taken at face value; a device holding
    /// malformed BCD yields a malformed record.
    pub(crate) fn from_registers(data: &[u8; 7]) -> Self {
        let hour = from_bcd(data[2] & 0x3F);
        let (twelve_hour, am) = clock12(hour);
        let century = data[5] & 0x80 != 0;
        let year = if century { 2000 } else { 1900 } + u16::from(from_bcd(data[6]));
        DateTime {
            second: from_bcd(data[0] & 0x7F),
            minute: from_bcd(data[1] & 0x7F),
            hour,
            day: data[3] & 0x07,
            date: from_bcd(data[4] & 0x3F),
            month: from_bcd(data[5] & 0x1F),
            year,
            twelve_hour,
            am,
        }
    }

    /// Encodes the record into the seven-register date/time block.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeError`] if a field is out of range or the year
    /// cannot be expressed century-relative.
    pub(crate) fn to_registers(&self) -> Result<[u8; 7], TimeError> {
        if self.second > 59 {
            return Err(TimeError::InvalidField("seconds must be 0-59"));
        }
        if self.minute > 59 {
            return Err(TimeError::InvalidField("minutes must be 0-59"));
        }
        if self.hour > 23 {
            return Err(TimeError::InvalidField("hours must be 0-23"));
        }
        if self.day == 0 || self.day > 7 {
            return Err(TimeError::InvalidField("day of week must be 1-7"));
        }
        if self.date == 0 || self.date > 31 {
            return Err(TimeError::InvalidField("date must be 1-31"));
        }
        if self.month == 0 || self.month > 12 {
            return Err(TimeError::InvalidField("month must be 1-12"));
        }

        let (century, offset) = if self.year > 2000 {
            (true, self.year - 2000)
        } else {
            (
                false,
                self.year.checked_sub(1900).ok_or(TimeError::YearOutOfRange)?,
            )
        };
        if offset > 99 {
            error!("year {} does not fit a century-relative register", self.year);
            return Err(TimeError::YearOutOfRange);
        }
        let offset = offset as u8;

        let mut month = to_bcd(self.month);
        if century {
            month |= 0x80;
        }

        Ok([
            to_bcd(self.second),
            to_bcd(self.minute),
            to_bcd(self.hour),
            self.day,
            to_bcd(self.date),
            month,
            to_bcd(offset),
        ])
    }
}

impl TryFrom<&NaiveDateTime> for DateTime {
    type Error = TimeError;

    fn try_from(dt: &NaiveDateTime) -> Result<Self, TimeError> {
        if !(1901..=2099).contains(&dt.year()) || dt.year() == 2000 {
            return Err(TimeError::YearOutOfRange);
        }
        let hour = dt.hour() as u8;
        let (twelve_hour, am) = clock12(hour);
        Ok(DateTime {
            second: dt.second() as u8,
            minute: dt.minute() as u8,
            hour,
            day: dt.weekday().num_days_from_sunday() as u8 + 1,
            date: dt.day() as u8,
            month: dt.month() as u8,
            year: dt.year() as u16,
            twelve_hour,
            am,
        })
    }
}

impl TryFrom<&DateTime> for NaiveDateTime {
    type Error = TimeError;

    fn try_from(dt: &DateTime) -> Result<Self, TimeError> {
        NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.date))
            .and_then(|d| {
                d.and_hms_opt(
                    u32::from(dt.hour),
                    u32::from(dt.minute),
                    u32::from(dt.second),
                )
            })
            .ok_or(TimeError::InvalidField("not a valid calendar date"))
    }
}
