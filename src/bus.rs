//! Software bit-banged two-wire bus master.
//!
//! [`SoftTwi`] drives a data and a clock line directly, emulating an I2C
//! master in software. One call to [`SoftTwi::transceive`] performs a
//! complete transaction: start condition, address byte, payload bytes in
//! the direction the address selects, and stop condition. Timing comes from
//! a [`DelayNs`] provider; the clock-high wait honors clock stretching by
//! a slave holding the clock low.
//!
//! The engine targets a single-master wire. It detects the conditions a
//! GPIO master can genuinely observe (busy bus, collisions, unexpected
//! start/stop edges, missing acknowledgements) and reports them as
//! [`BusError`] values, but it does not arbitrate or recover.

use embedded_hal::delay::DelayNs;

use crate::line::{BusLine, Direction};

/// Bus clock speed selection.
///
/// The periods are the minimum low/high clock times of the respective I2C
/// modes, rounded up to whole microseconds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// Standard mode, up to 100kHz (4.7us low, 4.0us high)
    Standard,
    /// Fast mode, up to 400kHz (1.3us low, 0.6us high)
    Fast,
}

impl Speed {
    fn low_period_us(self) -> u32 {
        match self {
            Speed::Standard => 5,
            Speed::Fast => 2,
        }
    }

    fn high_period_us(self) -> u32 {
        match self {
            Speed::Standard => 4,
            Speed::Fast => 1,
        }
    }
}

/// Runtime policy for the optional bus checks.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Checks {
    /// Reject transactions shorter than an address byte plus one payload byte
    pub param: bool,
    /// Watch the data line for edges while the clock is high
    pub noise: bool,
    /// Read commanded start/stop levels back from the wire
    pub signal: bool,
}

impl Default for Checks {
    fn default() -> Self {
        Checks {
            param: true,
            noise: true,
            signal: true,
        }
    }
}

/// Bus configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// Clock speed
    pub speed: Speed,
    /// Check policy
    pub checks: Checks,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            speed: Speed::Standard,
            checks: Checks::default(),
        }
    }
}

/// Errors reported by the bus engine.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The transaction buffer holds no payload
    NoData,
    /// A start condition appeared on the wire that the master did not command
    UnexpectedStart,
    /// A stop condition appeared on the wire that the master did not command
    UnexpectedStop,
    /// A driven-high data bit read back low
    DataCollision,
    /// The slave did not acknowledge its address
    NoAckOnAddress,
    /// The slave did not acknowledge a data byte
    NoAckOnData,
    /// The commanded start condition did not appear on the wire
    MissingStart,
    /// The commanded stop condition did not appear on the wire
    MissingStop,
}

/// Software two-wire bus master over two GPIO lines.
pub struct SoftTwi<SDA: BusLine, SCL: BusLine, D: DelayNs> {
    sda: SDA,
    scl: SCL,
    delay: D,
    config: BusConfig,
}

impl<SDA: BusLine, SCL: BusLine, D: DelayNs> SoftTwi<SDA, SCL, D> {
    pub fn new(sda: SDA, scl: SCL, delay: D, config: BusConfig) -> Self {
        Self {
            sda,
            scl,
            delay,
            config,
        }
    }

    /// Releases both lines so the bus idles high. Must be called once
    /// before the first transaction.
    pub fn init(&mut self) {
        self.sda.set_level(true);
        self.scl.set_level(true);
        self.sda.set_direction(Direction::Output);
        self.scl.set_direction(Direction::Output);
    }

    /// Performs one complete bus transaction.
    ///
    /// `buf[0]` is the address byte; its least significant bit selects the
    /// direction. For a write the remaining bytes are sent to the slave;
    /// for a read they are overwritten with the slave's data, every byte
    /// acknowledged except the last, which is answered with a NACK.
    ///
    /// Blocks indefinitely if a slave holds the clock low.
    ///
    /// # Errors
    ///
    /// Returns a [`BusError`] on a missing acknowledgement or, with the
    /// corresponding check enabled, on a malformed buffer, a busy bus, a
    /// collision, or an unexpected edge. A failed transaction is aborted
    /// in place without a stop condition.
    pub fn transceive(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        if buf.is_empty() {
            return Err(BusError::NoData);
        }
        if self.config.checks.param && buf.len() < 2 {
            return Err(BusError::NoData);
        }
        // Another master or a stuck slave holds the data line low.
        if self.config.checks.noise && !self.sda.level() {
            return Err(BusError::UnexpectedStart);
        }

        self.start()?;

        let address = buf[0];
        if !self.write_byte(address)? {
            return Err(BusError::NoAckOnAddress);
        }

        if address & 0x01 == 0 {
            for &byte in buf.iter().skip(1) {
                if !self.write_byte(byte)? {
                    return Err(BusError::NoAckOnData);
                }
            }
        } else {
            let last = buf.len() - 1;
            for index in 1..buf.len() {
                buf[index] = self.read_byte(index == last)?;
            }
        }

        self.stop()
    }

    /// Start condition: data falls while the clock is high.
    fn start(&mut self) -> Result<(), BusError> {
        self.scl.set_level(true);
        self.wait_scl_high();
        self.delay.delay_us(self.config.speed.low_period_us());
        self.sda.set_level(false);
        self.delay.delay_us(self.config.speed.high_period_us());
        if self.config.checks.signal && self.sda.level() {
            return Err(BusError::MissingStart);
        }
        self.scl.set_level(false);
        self.sda.set_level(true);
        Ok(())
    }

    /// Stop condition: data rises while the clock is high.
    fn stop(&mut self) -> Result<(), BusError> {
        self.sda.set_level(false);
        self.scl.set_level(true);
        self.wait_scl_high();
        self.delay.delay_us(self.config.speed.high_period_us());
        self.sda.set_level(true);
        self.delay.delay_us(self.config.speed.low_period_us());
        if self.config.checks.signal && !self.sda.level() {
            return Err(BusError::MissingStop);
        }
        Ok(())
    }

    /// Shifts one byte out MSB first and samples the acknowledge slot.
    /// Returns whether the slave acknowledged.
    fn write_byte(&mut self, byte: u8) -> Result<bool, BusError> {
        for bit in (0..8).rev() {
            self.clock_out_bit(byte & (1 << bit) != 0)?;
        }
        self.sda.set_direction(Direction::Input);
        let ack_bit = self.clock_in_bit();
        self.sda.set_level(true);
        self.sda.set_direction(Direction::Output);
        Ok(!ack_bit?)
    }

    /// Shifts one byte in MSB first and answers with ACK, or NACK on the
    /// final byte of a read.
    fn read_byte(&mut self, last: bool) -> Result<u8, BusError> {
        self.sda.set_direction(Direction::Input);
        let mut byte = 0;
        for _ in 0..8 {
            match self.clock_in_bit() {
                Ok(bit) => byte = (byte << 1) | u8::from(bit),
                Err(e) => {
                    self.sda.set_level(true);
                    self.sda.set_direction(Direction::Output);
                    return Err(e);
                }
            }
        }
        self.sda.set_level(last);
        self.sda.set_direction(Direction::Output);
        self.clock_out_bit(last)?;
        self.sda.set_level(true);
        Ok(byte)
    }

    /// Clocks one driven bit: data set while the clock is low, then one
    /// clock pulse.
    fn clock_out_bit(&mut self, bit: bool) -> Result<(), BusError> {
        self.sda.set_level(bit);
        self.delay.delay_us(self.config.speed.low_period_us());
        self.scl.set_level(true);
        self.wait_scl_high();
        self.delay.delay_us(self.config.speed.high_period_us());
        if self.config.checks.noise && bit && !self.sda.level() {
            return Err(BusError::DataCollision);
        }
        self.scl.set_level(false);
        Ok(())
    }

    /// Clocks one bit in with the data line released. With the noise check
    /// enabled the line is sampled twice during the clock-high phase; a
    /// change means another device produced a start or stop condition.
    fn clock_in_bit(&mut self) -> Result<bool, BusError> {
        self.delay.delay_us(self.config.speed.low_period_us());
        self.scl.set_level(true);
        self.wait_scl_high();
        let bit = self.sda.level();
        self.delay.delay_us(self.config.speed.high_period_us());
        if self.config.checks.noise && self.sda.level() != bit {
            self.scl.set_level(false);
            return Err(if bit {
                BusError::UnexpectedStart
            } else {
                BusError::UnexpectedStop
            });
        }
        self.scl.set_level(false);
        Ok(bit)
    }

    /// Waits for the clock to actually reach high, honoring a slave that
    /// stretches the clock. Blocks for as long as the clock is held low.
    fn wait_scl_high(&mut self) {
        while !self.scl.level() {}
    }
}
