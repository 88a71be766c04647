//! MCP23017 GPIO Expander Driver
//!
//! Carries the panel's four rotary encoders and push buttons on its two
//! 8-bit banks. The chip is configured for all-input operation with
//! pull-ups and change interrupts on every pin; on each interrupt the
//! driver reads the signalled bank's port register and hands the sample
//! to the quadrature decoder.
//!
//! Event delivery is exactly-once and in arrival order per bank: each
//! `service` call decodes one sample against the previous one and returns
//! the classified events for the caller to forward (typically into an
//! `embassy-sync` channel).

use embedded_hal_async::i2c::I2c;

use crate::quadrature::{EventQueue, QuadratureDecoder};
use crate::types::{Bank, Channel};

/// MCP23x17 register addresses (IOCON.BANK = 0 layout)
mod reg {
    pub const IODIRA: u8 = 0x00;
    pub const IODIRB: u8 = 0x01;
    pub const IPOLA: u8 = 0x02;
    pub const IPOLB: u8 = 0x03;
    pub const GPINTENA: u8 = 0x04;
    pub const GPINTENB: u8 = 0x05;
    pub const INTCONA: u8 = 0x08;
    pub const INTCONB: u8 = 0x09;
    pub const IOCON: u8 = 0x0A;
    pub const IOCONB: u8 = 0x0B;
    pub const GPPUA: u8 = 0x0C;
    pub const GPPUB: u8 = 0x0D;
    pub const INTCAPA: u8 = 0x10;
    pub const INTCAPB: u8 = 0x11;
    pub const GPIOA: u8 = 0x12;
    pub const GPIOB: u8 = 0x13;
}

/// IOCON bits cleared during init (MIRROR and ODR)
const IOCON_CLEAR_MASK: u8 = 0xBB;

/// IOCON bits set during init (INTPOL, interrupt pins drive high when active)
const IOCON_SET_MASK: u8 = 0x02;

/// Expander driver failure
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// Underlying I2C bus error
    I2c(E),
    /// No device answered at the configured address
    NotPresent,
}

// Allow ergonomic `?` propagation from raw I2C errors.
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
            Self::NotPresent => defmt::write!(f, "device not present"),
        }
    }
}

impl Bank {
    /// Port register holding the bank's current pin levels
    const fn gpio_register(self) -> u8 {
        match self {
            Self::A => reg::GPIOA,
            Self::B => reg::GPIOB,
        }
    }

    /// Interrupt capture register for the bank
    const fn intcap_register(self) -> u8 {
        match self {
            Self::A => reg::INTCAPA,
            Self::B => reg::INTCAPB,
        }
    }
}

/// MCP23017 driver with attached quadrature decoder
pub struct Mcp23017<I2C> {
    i2c: I2C,
    address: u8,
    decoder: QuadratureDecoder,
    /// Previous port sample per bank, baseline for change detection
    last: [u8; 2],
}

impl<I2C> Mcp23017<I2C>
where
    I2C: I2c,
{
    /// Default I2C address (A2..A0 strapped low)
    pub const DEFAULT_ADDRESS: u8 = 0x20;

    /// Create a new expander driver
    ///
    /// The decoder comes pre-configured with the panel's channel mapping;
    /// see `config::panel_channel_map`.
    pub fn new(i2c: I2C, address: u8, decoder: QuadratureDecoder) -> Self {
        Self {
            i2c,
            address,
            decoder,
            last: [0; 2],
        }
    }

    /// Check that the device answers on the bus
    pub async fn probe(&mut self) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[])
            .await
            .map_err(|_| Error::NotPresent)
    }

    /// Bring the expander into panel-input configuration
    ///
    /// All pins become pulled-up inputs with change interrupts enabled on
    /// both banks; the interrupt outputs are per-bank (no mirroring),
    /// push-pull, active high. Pending interrupt state is drained and the
    /// drained port levels seed the decode baselines so the first real
    /// interrupt diffs against actual pin state.
    pub async fn init(&mut self) -> Result<(), Error<I2C::Error>> {
        self.probe().await?;

        // All pins input
        self.write_register(reg::IODIRA, 0xFF).await?;
        self.write_register(reg::IODIRB, 0xFF).await?;
        // Pull-ups on
        self.write_register(reg::GPPUA, 0xFF).await?;
        self.write_register(reg::GPPUB, 0xFF).await?;
        // No input polarity inversion
        self.write_register(reg::IPOLA, 0x00).await?;
        self.write_register(reg::IPOLB, 0x00).await?;
        // Interrupt on change against previous value, not DEFVAL
        self.write_register(reg::INTCONA, 0x00).await?;
        self.write_register(reg::INTCONB, 0x00).await?;

        for ioconf_reg in [reg::IOCON, reg::IOCONB] {
            let ioconf = self.read_register(ioconf_reg).await?;
            self.write_register(ioconf_reg, (ioconf & IOCON_CLEAR_MASK) | IOCON_SET_MASK)
                .await?;
        }

        // Change interrupts on every pin
        self.write_register(reg::GPINTENA, 0xFF).await?;
        self.write_register(reg::GPINTENB, 0xFF).await?;

        // Drain pending interrupts and capture the resting pin levels
        for bank in [Bank::A, Bank::B] {
            let _ = self.read_register(bank.intcap_register()).await?;
            let level = self.read_register(bank.gpio_register()).await?;
            self.last[bank.index()] = level;
        }

        Ok(())
    }

    /// Handle one bank interrupt
    ///
    /// Reads the bank's port register, decodes the sample against the
    /// previous one and returns the classified events in delivery order.
    /// Reading GPIO also clears the bank's interrupt condition.
    pub async fn service(&mut self, bank: Bank) -> Result<EventQueue, Error<I2C::Error>> {
        let sample = self.read_register(bank.gpio_register()).await?;
        let events = self.decoder.decode(bank, sample, self.last[bank.index()]);
        self.last[bank.index()] = sample;
        Ok(events)
    }

    /// Force a channel's decoder state back to idle
    pub fn reset_channel(&mut self, channel: Channel) {
        self.decoder.reset(channel);
    }

    /// Last observed port sample for a bank
    #[must_use]
    pub fn last_sample(&self, bank: Bank) -> u8 {
        self.last[bank.index()]
    }

    /// Write a single register
    pub async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(self.address, &[register, value]).await?;
        Ok(())
    }

    /// Read a single register
    pub async fn read_register(&mut self, register: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .await?;
        Ok(buf[0])
    }
}
