//! Register definitions and bitfield structures for the DS3231 RTC.
//!
//! This module contains the register address map and bitfield views for the
//! control and status registers. Time, alarm, and temperature registers are
//! plain BCD or two's-complement bytes and are handled by their own modules.

use bitfield::bitfield;

/// Register addresses for the DS3231 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Seconds register (0-59)
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (0-23)
    Hours = 0x02,
    /// Day of week register (1-7)
    Day = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register (1-12) with century flag
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Alarm 1 seconds register
    Alarm1Seconds = 0x07,
    /// Alarm 1 minutes register
    Alarm1Minutes = 0x08,
    /// Alarm 1 hours register
    Alarm1Hours = 0x09,
    /// Alarm 1 day/date register
    Alarm1DayDate = 0x0A,
    /// Alarm 2 minutes register
    Alarm2Minutes = 0x0B,
    /// Alarm 2 hours register
    Alarm2Hours = 0x0C,
    /// Alarm 2 day/date register
    Alarm2DayDate = 0x0D,
    /// Control register
    Control = 0x0E,
    /// Control/Status register
    Status = 0x0F,
    /// Aging offset register
    AgingOffset = 0x10,
    /// Temperature MSB register
    TempMsb = 0x11,
    /// Temperature LSB register
    TempLsb = 0x12,
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Control register for device configuration.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// Disable the oscillator on battery power
    pub oscillator_disable, set_oscillator_disable: 7;
    /// Enable square wave output on battery power
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// Force temperature conversion
    pub convert_temperature, set_convert_temperature: 5;
    /// Square wave output frequency selection (0b00=1Hz .. 0b11=8.192kHz)
    pub square_wave_frequency, set_square_wave_frequency: 4, 3;
    /// INT/SQW pin function (0=square wave, 1=alarm interrupt)
    pub interrupt_control, set_interrupt_control: 2;
    /// Enable alarm 2 interrupt
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    /// Enable alarm 1 interrupt
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}
from_register_u8!(Control);

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Control(");
        if self.oscillator_disable() {
            defmt::write!(f, "EOSC ");
        }
        if self.battery_backed_square_wave() {
            defmt::write!(f, "BBSQW ");
        }
        if self.convert_temperature() {
            defmt::write!(f, "CONV ");
        }
        defmt::write!(f, "RS={} ", self.square_wave_frequency());
        if self.interrupt_control() {
            defmt::write!(f, "INTCN ");
        }
        if self.alarm2_interrupt_enable() {
            defmt::write!(f, "A2IE ");
        }
        if self.alarm1_interrupt_enable() {
            defmt::write!(f, "A1IE ");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Status register for device state and flags.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Status(u8);
    impl Debug;
    /// Oscillator stop flag
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    /// Enable 32kHz output
    pub enable_32khz_output, set_enable_32khz_output: 3;
    /// Device busy flag
    pub busy, set_busy: 2;
    /// Alarm 2 triggered flag
    pub alarm2_flag, set_alarm2_flag: 1;
    /// Alarm 1 triggered flag
    pub alarm1_flag, set_alarm1_flag: 0;
}
from_register_u8!(Status);

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status(");
        if self.oscillator_stop_flag() {
            defmt::write!(f, "OSF ");
        }
        if self.enable_32khz_output() {
            defmt::write!(f, "EN32kHz ");
        }
        if self.busy() {
            defmt::write!(f, "BSY ");
        }
        if self.alarm2_flag() {
            defmt::write!(f, "A2F ");
        }
        if self.alarm1_flag() {
            defmt::write!(f, "A1F ");
        }
        defmt::write!(f, ")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_addresses() {
        assert_eq!(Register::Seconds as u8, 0x00);
        assert_eq!(Register::Alarm1Seconds as u8, 0x07);
        assert_eq!(Register::Alarm2Minutes as u8, 0x0B);
        assert_eq!(Register::Control as u8, 0x0E);
        assert_eq!(Register::Status as u8, 0x0F);
        assert_eq!(Register::AgingOffset as u8, 0x10);
        assert_eq!(Register::TempMsb as u8, 0x11);
        assert_eq!(Register::TempLsb as u8, 0x12);
    }

    #[test]
    fn test_control_register_conversions() {
        // All bits set
        let control = Control::from(0xFF);
        assert!(control.oscillator_disable());
        assert!(control.battery_backed_square_wave());
        assert!(control.convert_temperature());
        assert_eq!(control.square_wave_frequency(), 0b11);
        assert!(control.interrupt_control());
        assert!(control.alarm2_interrupt_enable());
        assert!(control.alarm1_interrupt_enable());
        assert_eq!(u8::from(control), 0xFF);

        // No bits set
        let control = Control::from(0x00);
        assert!(!control.battery_backed_square_wave());
        assert!(!control.alarm2_interrupt_enable());
        assert!(!control.alarm1_interrupt_enable());
        assert_eq!(u8::from(control), 0x00);

        // BBSQW is bit 6, alarm interrupt enables are bits 1:0
        let mut control = Control::default();
        control.set_battery_backed_square_wave(true);
        assert_eq!(u8::from(control), 0x40);
        control.set_alarm1_interrupt_enable(true);
        control.set_alarm2_interrupt_enable(true);
        assert_eq!(u8::from(control), 0x43);
    }

    #[test]
    fn test_status_register_conversions() {
        let status = Status::from(0x8F);
        assert!(status.oscillator_stop_flag());
        assert!(status.enable_32khz_output());
        assert!(status.busy());
        assert!(status.alarm2_flag());
        assert!(status.alarm1_flag());
        assert_eq!(u8::from(status), 0x8F);

        // EN32kHz is bit 3
        let mut status = Status::from(0x81);
        status.set_enable_32khz_output(true);
        assert_eq!(u8::from(status), 0x89);
        status.set_enable_32khz_output(false);
        assert_eq!(u8::from(status), 0x81);
    }
}
