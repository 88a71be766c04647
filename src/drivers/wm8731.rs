//! WM8731 Audio Codec Initializer
//!
//! Brings the codec out of reset into I2S slave mode at 48 kHz. The
//! WM8731 control port takes 7-bit register addresses with 9-bit values,
//! packed into two bytes per write; the chip is write-only over I2C, so
//! the driver keeps no shadow state beyond the probed address.

use embedded_hal_async::i2c::I2c;

/// WM8731 register addresses
mod reg {
    pub const LEFT_LINE_IN: u8 = 0;
    pub const RIGHT_LINE_IN: u8 = 1;
    pub const LEFT_HEADPHONE_OUT: u8 = 2;
    pub const RIGHT_HEADPHONE_OUT: u8 = 3;
    pub const ANALOG_PATH: u8 = 4;
    pub const DIGITAL_PATH: u8 = 5;
    pub const POWER_DOWN: u8 = 6;
    pub const INTERFACE: u8 = 7;
    pub const SAMPLING: u8 = 8;
    pub const ACTIVE: u8 = 9;
    pub const RESET: u8 = 15;
}

/// Init sequence: `(register, 9-bit value)` pairs in write order
///
/// The ordering matters for pop-free startup: the DAC is soft-muted and
/// de-selected before power-up, and only unmuted and routed to the output
/// after the part is active.
static INIT_SEQUENCE: &[(u8, u16)] = &[
    (reg::RESET, 0x000),
    // I2S format, 16 bit words, slave mode
    (reg::INTERFACE, 0x00A),
    // USB mode, 12 MHz MCLK, 48 kHz ADC and DAC
    (reg::SAMPLING, 0x001),
    (reg::DIGITAL_PATH, 0x008),
    (reg::ANALOG_PATH, 0x000),
    (reg::POWER_DOWN, 0x000),
    (reg::LEFT_HEADPHONE_OUT, 0x07F),
    (reg::RIGHT_HEADPHONE_OUT, 0x07F),
    (reg::ACTIVE, 0x001),
    (reg::DIGITAL_PATH, 0x000),
    (reg::ANALOG_PATH, 0x010),
];

/// Codec driver failure
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// Underlying I2C bus error
    I2c(E),
    /// No codec answered at the configured or default address
    NotDetected,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::I2c(error)
    }
}

#[cfg(feature = "embedded")]
impl<E: defmt::Format> defmt::Format for Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::I2c(e) => defmt::write!(f, "I2C error: {}", e),
            Self::NotDetected => defmt::write!(f, "codec not detected"),
        }
    }
}

/// Pack a 7-bit register address and 9-bit value into the two-byte frame
#[must_use]
pub const fn frame(register: u8, value: u16) -> [u8; 2] {
    [(register << 1) | ((value >> 8) & 1) as u8, value as u8]
}

/// WM8731 driver
pub struct Wm8731<I2C> {
    i2c: I2C,
    /// Confirmed device address, set once a probe succeeds
    address: Option<u8>,
}

impl<I2C> Wm8731<I2C>
where
    I2C: I2c,
{
    /// Default I2C address (CSB strapped low)
    pub const DEFAULT_ADDRESS: u8 = 0x1A;

    /// Headphone volume register value for 0 dB
    pub const HEADPHONE_0DB: u8 = 0x79;

    /// Create a driver with a known device address
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address: Some(address),
        }
    }

    /// Create a driver that probes the default address
    pub fn autodetect(i2c: I2C) -> Self {
        Self { i2c, address: None }
    }

    /// Find the codec and run the full init sequence
    ///
    /// With a configured address only that address is tried; otherwise the
    /// default address is probed. On success the address is remembered for
    /// subsequent register writes.
    pub async fn probe(&mut self) -> Result<(), Error<I2C::Error>> {
        let address = self.address.unwrap_or(Self::DEFAULT_ADDRESS);

        self.init_at(address).await?;
        self.address = Some(address);
        Ok(())
    }

    /// Run the init sequence against a specific address
    async fn init_at(&mut self, address: u8) -> Result<(), Error<I2C::Error>> {
        for &(register, value) in INIT_SEQUENCE {
            if self
                .i2c
                .write(address, &frame(register, value))
                .await
                .is_err()
            {
                return Err(Error::NotDetected);
            }
        }
        Ok(())
    }

    /// Write a control register (9-bit value)
    pub async fn write_register(
        &mut self,
        register: u8,
        value: u16,
    ) -> Result<(), Error<I2C::Error>> {
        let address = self.address.ok_or(Error::NotDetected)?;
        self.i2c.write(address, &frame(register, value)).await?;
        Ok(())
    }

    /// Set both headphone channels to the same volume
    ///
    /// `volume` is the raw 7-bit register field; 0x30..=0x7F spans
    /// -73 dB to +6 dB, below 0x30 is mute. Zero-cross update is enabled
    /// to avoid clicks.
    pub async fn set_headphone_volume(&mut self, volume: u8) -> Result<(), Error<I2C::Error>> {
        const ZERO_CROSS: u16 = 0x080;
        let value = ZERO_CROSS | u16::from(volume & 0x7F);
        self.write_register(reg::LEFT_HEADPHONE_OUT, value).await?;
        self.write_register(reg::RIGHT_HEADPHONE_OUT, value).await
    }
}
