//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the front panel hardware.
//! All pin mappings, bus speeds, and device parameters are centralized here.

use crate::quadrature::{ChannelConfig, ChannelPins};
use crate::types::{Bank, Channel};

/// I2C bus frequency for the MCP23017 and WM8731
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// MCP23017 GPIO expander I2C address
pub const MCP23017_I2C_ADDR: u8 = 0x20;

/// WM8731 codec I2C address (CSB low)
pub const WM8731_I2C_ADDR: u8 = 0x1A;

/// SPI clock for the ILI9341
pub const SPI_CLOCK_HZ: u32 = 15_000_000;

/// SPI clock polarity for the display (mode 2 together with `SPI_CPHA`)
pub const SPI_CPOL: bool = true;

/// SPI clock phase for the display
pub const SPI_CPHA: bool = false;

/// Display width in pixels (landscape)
pub const DISPLAY_WIDTH: u16 = 320;

/// Display height in pixels (landscape)
pub const DISPLAY_HEIGHT: u16 = 240;

/// Settle delay between display init commands in milliseconds
pub const DISPLAY_INIT_DELAY_MS: u32 = 5;

/// Settle delay after switching the display on in milliseconds
pub const DISPLAY_ON_DELAY_MS: u32 = 100;

/// Number of rotary encoder channels on the panel
pub const NUM_CHANNELS: usize = Channel::COUNT;

/// Bounded capacity of the panel event channel
pub const EVENT_CHANNEL_DEPTH: usize = 16;

/// The panel's channel-to-pin mapping
///
/// Two encoders per expander bank, with identical bit placement on both
/// banks: A/B phases on bits 1/2 and 4/5, push buttons on bits 0 and 3.
#[must_use]
pub const fn panel_channel_map() -> [ChannelConfig; NUM_CHANNELS] {
    [
        ChannelConfig {
            channel: Channel::CH0,
            bank: Bank::A,
            pins: ChannelPins {
                a: 1,
                b: 2,
                button: Some(0),
            },
        },
        ChannelConfig {
            channel: Channel::CH1,
            bank: Bank::A,
            pins: ChannelPins {
                a: 4,
                b: 5,
                button: Some(3),
            },
        },
        ChannelConfig {
            channel: Channel::CH2,
            bank: Bank::B,
            pins: ChannelPins {
                a: 1,
                b: 2,
                button: Some(0),
            },
        },
        ChannelConfig {
            channel: Channel::CH3,
            bank: Bank::B,
            pins: ChannelPins {
                a: 4,
                b: 5,
                button: Some(3),
            },
        },
    ]
}

/// Pin assignments for GPIO
pub mod pins {
    //! RP2350 pin assignments matching the schematic

    /// Status LED
    pub const LED_STATUS: &str = "PIN_25";

    /// I2C0 SDA (MCP23017, WM8731)
    pub const I2C0_SDA: &str = "PIN_4";

    /// I2C0 SCL (MCP23017, WM8731)
    pub const I2C0_SCL: &str = "PIN_5";

    /// MCP23017 INTA (bank A change interrupt, active high)
    pub const EXPANDER_INT_A: &str = "PIN_6";

    /// MCP23017 INTB (bank B change interrupt, active high)
    pub const EXPANDER_INT_B: &str = "PIN_7";

    /// SPI0 SCK (display)
    pub const SPI0_SCK: &str = "PIN_18";

    /// SPI0 MOSI (display)
    pub const SPI0_MOSI: &str = "PIN_19";

    /// SPI0 MISO (unused by the display but routed)
    pub const SPI0_MISO: &str = "PIN_16";

    /// Display chip select
    pub const DISPLAY_CS: &str = "PIN_17";

    /// Display data/command select
    pub const DISPLAY_DC: &str = "PIN_20";

    /// Display backlight enable
    pub const DISPLAY_BACKLIGHT: &str = "PIN_21";
}
