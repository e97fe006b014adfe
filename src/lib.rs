//! DS3231 real-time clock driver over a software bit-banged two-wire bus.
//!
//! [`Ds3231`] owns a [`SoftTwi`] bus built from two GPIO lines (any type
//! implementing [`BusLine`]) and a delay provider, and exposes the device's
//! clock, alarms, temperature sensor, and output controls. Every operation
//! is a blocking two-phase bus sequence: a write transaction seeks the
//! register pointer, then a second transaction moves the data.

#![no_std]

#[macro_use]
mod fmt;

mod alarm;
mod bcd;
mod bus;
mod datetime;
mod line;
mod registers;

use embedded_hal::delay::DelayNs;

pub use alarm::{Alarm, AlarmConfig, AlarmError, AlarmMode};
pub use bus::{BusConfig, BusError, Checks, SoftTwi, Speed};
pub use datetime::{DateTime, TimeError};
pub use line::{BusLine, Direction};
pub use registers::{Control, Register, Status};

use bcd::{from_bcd, to_bcd};

/// Device address on the bus, write direction.
const ADDR_WRITE: u8 = 0xD0;
/// Device address on the bus, read direction.
const ADDR_READ: u8 = 0xD1;

/// Errors returned by the driver.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ds3231Error {
    /// Bus transaction failure
    Bus(BusError),
    /// Date/time validation failure
    Time(TimeError),
    /// Alarm configuration failure
    Alarm(AlarmError),
}

impl From<BusError> for Ds3231Error {
    fn from(e: BusError) -> Self {
        Ds3231Error::Bus(e)
    }
}

impl From<TimeError> for Ds3231Error {
    fn from(e: TimeError) -> Self {
        Ds3231Error::Time(e)
    }
}

impl From<AlarmError> for Ds3231Error {
    fn from(e: AlarmError) -> Self {
        Ds3231Error::Alarm(e)
    }
}

/// Die temperature reading in quarter-degree resolution.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    /// Whole degrees Celsius, two's complement
    pub degrees: i8,
    /// Additional quarter degrees (0-3)
    pub quarters: u8,
}

impl Temperature {
    /// The reading in thousandths of a degree Celsius.
    pub fn millicelsius(&self) -> i32 {
        i32::from(self.degrees) * 1000 + i32::from(self.quarters) * 250
    }
}

/// DS3231 driver over a software two-wire bus.
pub struct Ds3231<SDA: BusLine, SCL: BusLine, D: DelayNs> {
    bus: SoftTwi<SDA, SCL, D>,
}

impl<SDA: BusLine, SCL: BusLine, D: DelayNs> Ds3231<SDA, SCL, D> {
    pub fn new(bus: SoftTwi<SDA, SCL, D>) -> Self {
        Self { bus }
    }

    /// Releases the bus lines. Must be called once before any other
    /// operation.
    pub fn init(&mut self) {
        self.bus.init();
    }

    /// Positions the device's register pointer.
    fn seek(&mut self, register: Register) -> Result<(), BusError> {
        let mut buf = [ADDR_WRITE, register as u8];
        self.bus.transceive(&mut buf)
    }

    /// Reads consecutive registers starting at `register`. At most the
    /// seven-register date/time block is read at once.
    fn read_registers(&mut self, register: Register, out: &mut [u8]) -> Result<(), BusError> {
        self.seek(register)?;
        let mut buf = [0u8; 8];
        let len = out.len();
        buf[0] = ADDR_READ;
        self.bus.transceive(&mut buf[..=len])?;
        out.copy_from_slice(&buf[1..=len]);
        Ok(())
    }

    /// Writes consecutive registers starting at `register`.
    fn write_registers(&mut self, register: Register, data: &[u8]) -> Result<(), BusError> {
        let mut buf = [0u8; 9];
        buf[0] = ADDR_WRITE;
        buf[1] = register as u8;
        buf[2..2 + data.len()].copy_from_slice(data);
        self.bus.transceive(&mut buf[..2 + data.len()])
    }

    fn control(&mut self) -> Result<Control, BusError> {
        let mut data = [0u8; 1];
        self.read_registers(Register::Control, &mut data)?;
        Ok(Control::from(data[0]))
    }

    fn set_control(&mut self, control: Control) -> Result<(), BusError> {
        self.write_registers(Register::Control, &[control.into()])
    }

    fn status(&mut self) -> Result<Status, BusError> {
        let mut data = [0u8; 1];
        self.read_registers(Register::Status, &mut data)?;
        Ok(Status::from(data[0]))
    }

    fn set_status(&mut self, status: Status) -> Result<(), BusError> {
        self.write_registers(Register::Status, &[status.into()])
    }

    /// Reads the full date and time.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn datetime(&mut self) -> Result<DateTime, Ds3231Error> {
        let mut data = [0u8; 7];
        self.read_registers(Register::Seconds, &mut data)?;
        Ok(DateTime::from_registers(&data))
    }

    /// Writes the full date and time. The record's derived 12-hour fields
    /// are ignored; the device keeps 24-hour form.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is invalid or a bus transaction
    /// fails. The device is not written on a validation failure.
    pub fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), Ds3231Error> {
        let data = datetime.to_registers()?;
        self.write_registers(Register::Seconds, &data)?;
        Ok(())
    }

    /// Reads the time of day as `(hour, minute, second)`.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn time_hms(&mut self) -> Result<(u8, u8, u8), Ds3231Error> {
        let mut data = [0u8; 3];
        self.read_registers(Register::Seconds, &mut data)?;
        Ok((
            from_bcd(data[2] & 0x3F),
            from_bcd(data[1] & 0x7F),
            from_bcd(data[0] & 0x7F),
        ))
    }

    /// Writes the time of day, leaving the calendar registers untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a component is out of range or a bus
    /// transaction fails.
    pub fn set_time_hms(&mut self, hour: u8, minute: u8, second: u8) -> Result<(), Ds3231Error> {
        if hour > 23 {
            return Err(TimeError::InvalidField("hours must be 0-23").into());
        }
        if minute > 59 {
            return Err(TimeError::InvalidField("minutes must be 0-59").into());
        }
        if second > 59 {
            return Err(TimeError::InvalidField("seconds must be 0-59").into());
        }
        self.write_registers(
            Register::Seconds,
            &[to_bcd(second), to_bcd(minute), to_bcd(hour)],
        )?;
        Ok(())
    }

    /// Reads the die temperature.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn temperature(&mut self) -> Result<Temperature, Ds3231Error> {
        let mut data = [0u8; 2];
        self.read_registers(Register::TempMsb, &mut data)?;
        Ok(Temperature {
            degrees: data[0] as i8,
            quarters: data[1] >> 6,
        })
    }

    /// Routes the INT/SQW pin.
    ///
    /// Enabling selects the square wave output (battery-backed) and clears
    /// both alarm interrupt enables; the pin carries either the square
    /// wave or alarm interrupts, never both. Disabling only clears the
    /// battery-backed square wave bit.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails. The control register
    /// is untouched if the read-back fails.
    pub fn set_square_wave(&mut self, enabled: bool) -> Result<(), Ds3231Error> {
        let mut control = self.control()?;
        if enabled {
            control.set_battery_backed_square_wave(true);
            control.set_interrupt_control(false);
            control.set_alarm1_interrupt_enable(false);
            control.set_alarm2_interrupt_enable(false);
        } else {
            control.set_battery_backed_square_wave(false);
        }
        debug!("control: {:?}", control);
        self.set_control(control)?;
        Ok(())
    }

    /// Enables or disables the 32kHz output, leaving the rest of the
    /// status register unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn set_32khz_output(&mut self, enabled: bool) -> Result<(), Ds3231Error> {
        let mut status = self.status()?;
        status.set_enable_32khz_output(enabled);
        self.set_status(status)?;
        Ok(())
    }

    /// Clears an alarm's register block.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn reset_alarm(&mut self, alarm: Alarm) -> Result<(), Ds3231Error> {
        let zeros = [0u8; 4];
        self.write_registers(alarm.base_register(), &zeros[..alarm.block_len()])?;
        Ok(())
    }

    /// Configures an alarm: updates its interrupt enable in the control
    /// register, then writes the encoded alarm block.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a bus
    /// transaction fails. The device is not written on a validation
    /// failure.
    pub fn set_alarm(&mut self, alarm: Alarm, config: &AlarmConfig) -> Result<(), Ds3231Error> {
        config.validate(alarm)?;
        let mut control = self.control()?;
        match alarm {
            Alarm::One => control.set_alarm1_interrupt_enable(config.interrupt),
            Alarm::Two => control.set_alarm2_interrupt_enable(config.interrupt),
        }
        debug!("control: {:?}", control);
        self.set_control(control)?;
        let block = config.encode(alarm);
        self.write_registers(alarm.base_register(), &block[..alarm.block_len()])?;
        Ok(())
    }

    /// Reads an alarm's configuration back from the device.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn alarm(&mut self, alarm: Alarm) -> Result<AlarmConfig, Ds3231Error> {
        let control = self.control()?;
        let interrupt = match alarm {
            Alarm::One => control.alarm1_interrupt_enable(),
            Alarm::Two => control.alarm2_interrupt_enable(),
        };
        let mut block = [0u8; 4];
        let len = alarm.block_len();
        self.read_registers(alarm.base_register(), &mut block[..len])?;
        Ok(AlarmConfig::decode(alarm, &block[..len], interrupt))
    }

    /// Tests whether an alarm's flag is set in the status register. The
    /// flag is left for the caller to clear.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn alarm_triggered(&mut self, alarm: Alarm) -> Result<bool, Ds3231Error> {
        let status = self.status()?;
        Ok(match alarm {
            Alarm::One => status.alarm1_flag(),
            Alarm::Two => status.alarm2_flag(),
        })
    }

    /// Reads the oscillator aging offset.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn aging_offset(&mut self) -> Result<i8, Ds3231Error> {
        let mut data = [0u8; 1];
        self.read_registers(Register::AgingOffset, &mut data)?;
        Ok(data[0] as i8)
    }

    /// Writes the oscillator aging offset.
    ///
    /// # Errors
    ///
    /// Returns an error if a bus transaction fails.
    pub fn set_aging_offset(&mut self, offset: i8) -> Result<(), Ds3231Error> {
        self.write_registers(Register::AgingOffset, &[offset as u8])?;
        Ok(())
    }
}
