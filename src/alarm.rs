//! Alarm configuration for the DS3231's two alarms.
//!
//! Each alarm is a block of BCD registers whose top bits select how much of
//! the current time has to match before the alarm fires. [`AlarmConfig`]
//! carries the time fields together with an [`AlarmMode`] naming the match
//! granularity, and converts to and from the register block.
//!
//! Alarm 1 has second resolution (four registers); alarm 2 has no seconds
//! register and fires at second 00 of a matching minute (three registers).

use crate::bcd::{from_bcd, to_bcd};

/// Error type for alarm configuration operations.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmError {
    /// Invalid time component value
    InvalidTime(&'static str),
    /// Invalid day of week (must be 1-7)
    InvalidDayOfWeek,
    /// Invalid date of month (must be 1-31)
    InvalidDateOfMonth,
    /// The mode is not supported by the selected alarm
    UnsupportedMode,
}

/// Alarm selection.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alarm {
    /// Alarm 1, second resolution
    One,
    /// Alarm 2, minute resolution
    Two,
}

impl Alarm {
    /// Start of the alarm's register block.
    pub(crate) fn base_register(self) -> crate::Register {
        match self {
            Alarm::One => crate::Register::Alarm1Seconds,
            Alarm::Two => crate::Register::Alarm2Minutes,
        }
    }

    /// Number of registers in the alarm's block.
    pub(crate) fn block_len(self) -> usize {
        match self {
            Alarm::One => 4,
            Alarm::Two => 3,
        }
    }
}

/// Match granularity of an alarm.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmMode {
    /// Fire every second (alarm 1 only)
    EverySecond,
    /// Fire when the seconds match (alarm 1 only)
    SecondsMatch,
    /// Fire every minute at second 00 (alarm 2 only)
    EveryMinute,
    /// Fire when the minutes (and seconds) match
    MinutesMatch,
    /// Fire when the hours, minutes (and seconds) match
    HoursMatch,
    /// Fire when date of month and time match
    DateMatch,
    /// Fire when day of week and time match
    WeekdayMatch,
}

impl AlarmMode {
    /// How many register fields have to match, counted from the fine end.
    /// A register is masked as don't-care when its position is at or above
    /// this rank.
    fn rank(self) -> u8 {
        match self {
            AlarmMode::EverySecond => 0,
            AlarmMode::SecondsMatch | AlarmMode::EveryMinute => 1,
            AlarmMode::MinutesMatch => 2,
            AlarmMode::HoursMatch => 3,
            AlarmMode::DateMatch | AlarmMode::WeekdayMatch => 4,
        }
    }
}

/// One alarm's time fields, match mode, and interrupt enable.
///
/// Fields finer than the mode's granularity still participate in the match
/// (a [`AlarmMode::MinutesMatch`] alarm 1 fires at `minute:second`);
/// coarser fields are written masked and ignored by the device.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmConfig {
    /// Day of week (1-7) or date of month (1-31), per the mode
    pub day: u8,
    /// Hours (0-23)
    pub hour: u8,
    /// Minutes (0-59)
    pub minute: u8,
    /// Seconds (0-59), unused by alarm 2
    pub second: u8,
    /// Match granularity
    pub mode: AlarmMode,
    /// Route the alarm to the INT/SQW pin
    pub interrupt: bool,
}

impl AlarmConfig {
    /// Validates the configuration for the given alarm.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode does not fit the alarm or a time
    /// component is out of range.
    pub fn validate(&self, alarm: Alarm) -> Result<(), AlarmError> {
        match (alarm, self.mode) {
            (Alarm::Two, AlarmMode::EverySecond | AlarmMode::SecondsMatch)
            | (Alarm::One, AlarmMode::EveryMinute) => return Err(AlarmError::UnsupportedMode),
            _ => {}
        }
        if self.second > 59 {
            return Err(AlarmError::InvalidTime("seconds must be 0-59"));
        }
        if self.minute > 59 {
            return Err(AlarmError::InvalidTime("minutes must be 0-59"));
        }
        if self.hour > 23 {
            return Err(AlarmError::InvalidTime("hours must be 0-23"));
        }
        match self.mode {
            AlarmMode::WeekdayMatch => {
                if self.day == 0 || self.day > 7 {
                    return Err(AlarmError::InvalidDayOfWeek);
                }
            }
            AlarmMode::DateMatch => {
                if self.day == 0 || self.day > 31 {
                    return Err(AlarmError::InvalidDateOfMonth);
                }
            }
            // The day register is written even when masked
            _ => {
                if self.day > 31 {
                    return Err(AlarmError::InvalidDateOfMonth);
                }
            }
        }
        Ok(())
    }

    /// Encodes the register block. Alarm 2 uses the first three bytes.
    ///
    /// The top bit of each register marks it as don't-care for the match;
    /// bit 6 of the day register selects weekday against date matching.
    pub(crate) fn encode(&self, alarm: Alarm) -> [u8; 4] {
        let rank = self.mode.rank();
        let mask = |position: u8| if rank <= position { 0x80 } else { 0x00 };
        let day = match self.mode {
            AlarmMode::WeekdayMatch => 0x40 | (self.day & 0x0F),
            _ => to_bcd(self.day),
        };
        match alarm {
            Alarm::One => [
                mask(0) | to_bcd(self.second),
                mask(1) | to_bcd(self.minute),
                mask(2) | to_bcd(self.hour),
                mask(3) | day,
            ],
            Alarm::Two => [
                mask(1) | to_bcd(self.minute),
                mask(2) | to_bcd(self.hour),
                mask(3) | day,
                0,
            ],
        }
    }

    /// Decodes an alarm register block back into a configuration.
    ///
    /// The day register's weekday bit picks the initial mode; the scan then
    /// walks the mask bits from the coarsest register down, so the finest
    /// masked register determines the granularity.
    pub(crate) fn decode(alarm: Alarm, regs: &[u8], interrupt: bool) -> Self {
        let (second, minute, hour, day_reg) = match alarm {
            Alarm::One => (
                from_bcd(regs[0] & 0x7F),
                from_bcd(regs[1] & 0x7F),
                from_bcd(regs[2] & 0x3F),
                regs[3],
            ),
            Alarm::Two => (0, from_bcd(regs[0] & 0x7F), from_bcd(regs[1] & 0x3F), regs[2]),
        };

        let weekday = day_reg & 0x40 != 0;
        let day = if weekday {
            day_reg & 0x0F
        } else {
            from_bcd(day_reg & 0x3F)
        };
        let mut mode = if weekday {
            AlarmMode::WeekdayMatch
        } else {
            AlarmMode::DateMatch
        };

        let scan: &[(usize, AlarmMode)] = match alarm {
            Alarm::One => &[
                (3, AlarmMode::HoursMatch),
                (2, AlarmMode::MinutesMatch),
                (1, AlarmMode::SecondsMatch),
                (0, AlarmMode::EverySecond),
            ],
            Alarm::Two => &[
                (2, AlarmMode::HoursMatch),
                (1, AlarmMode::MinutesMatch),
                (0, AlarmMode::EveryMinute),
            ],
        };
        for &(index, masked_mode) in scan {
            if regs[index] & 0x80 != 0 {
                mode = masked_mode;
            }
        }

        AlarmConfig {
            day,
            hour,
            minute,
            second,
            mode,
            interrupt,
        }
    }
}
