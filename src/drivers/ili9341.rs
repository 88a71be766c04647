//! ILI9341 TFT Display Driver
//!
//! Drives the panel's 320x240 SPI display. The controller is brought up
//! with the vendor init command table and then addressed through drawing
//! windows: every drawing primitive sets a column/page window and streams
//! RGB565 pixel data into it.
//!
//! The data/command line is a separate GPIO: command opcodes go out with
//! DC low, parameter and pixel bytes with DC high.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiBus;

use crate::config::{DISPLAY_INIT_DELAY_MS, DISPLAY_ON_DELAY_MS};

/// ILI9341 command opcodes
mod cmd {
    pub const SOFTWARE_RESET: u8 = 0x01;
    pub const SLEEP_OUT: u8 = 0x11;
    pub const GAMMA_SET: u8 = 0x26;
    pub const DISPLAY_OFF: u8 = 0x28;
    pub const DISPLAY_ON: u8 = 0x29;
    pub const COLUMN_ADDRESS_SET: u8 = 0x2A;
    pub const PAGE_ADDRESS_SET: u8 = 0x2B;
    pub const MEMORY_WRITE: u8 = 0x2C;
    pub const MEMORY_ACCESS_CONTROL: u8 = 0x36;
    pub const PIXEL_FORMAT_SET: u8 = 0x3A;
    pub const FRAME_RATE_CONTROL_1: u8 = 0xB1;
    pub const DISPLAY_FUNCTION_CONTROL: u8 = 0xB6;
    pub const ENTRY_MODE_SET: u8 = 0xB7;
    pub const POWER_CONTROL_1: u8 = 0xC0;
    pub const POWER_CONTROL_2: u8 = 0xC1;
    pub const VCOM_CONTROL_1: u8 = 0xC5;
    pub const VCOM_CONTROL_2: u8 = 0xC7;
    pub const POWER_CONTROL_A: u8 = 0xCB;
    pub const POWER_CONTROL_B: u8 = 0xCF;
    pub const DRIVER_TIMING_CONTROL_A: u8 = 0xE8;
    pub const DRIVER_TIMING_CONTROL_B: u8 = 0xEA;
    pub const POWER_ON_SEQUENCE: u8 = 0xED;
    pub const THREE_GAMMA_ENABLE: u8 = 0xF2;
    pub const INTERFACE_CONTROL: u8 = 0xF6;
    pub const PUMP_RATIO_CONTROL: u8 = 0xF7;
}

/// Display orientation via the memory access control register
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Rotation {
    /// 240x320, connector at the bottom
    Portrait,
    /// 320x240
    Landscape,
    /// Portrait turned 180 degrees
    PortraitFlipped,
    /// Landscape turned 180 degrees (the panel's mounting)
    #[default]
    LandscapeFlipped,
}

impl Rotation {
    /// MADCTL register value (BGR order, row/column exchange and mirroring)
    #[must_use]
    pub const fn madctl(self) -> u8 {
        match self {
            Self::Portrait => 0x48,
            Self::Landscape => 0x28,
            Self::PortraitFlipped => 0x88,
            Self::LandscapeFlipped => 0xE8,
        }
    }
}

/// RGB565 color value
pub type Color = u16;

/// Pack 5-bit red, 6-bit green and 5-bit blue fields into RGB565
#[must_use]
pub const fn color(r: u8, g: u8, b: u8) -> Color {
    ((r as u16 & 0x1F) << 11) | ((g as u16 & 0x3F) << 5) | (b as u16 & 0x1F)
}

/// Vendor init command table
///
/// Sent verbatim at power-up with a short settle delay after each entry;
/// the datasheet power-on flow ends in sleep-out plus display-on.
static INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (cmd::SOFTWARE_RESET, &[]),
    (cmd::DISPLAY_OFF, &[]),
    (cmd::POWER_CONTROL_B, &[0x00, 0x83, 0x30]),
    (cmd::POWER_ON_SEQUENCE, &[0x64, 0x03, 0x12, 0x81]),
    (cmd::DRIVER_TIMING_CONTROL_A, &[0x85, 0x01, 0x79]),
    (cmd::POWER_CONTROL_A, &[0x39, 0x2C, 0x00, 0x34, 0x02]),
    (cmd::PUMP_RATIO_CONTROL, &[0x20]),
    (cmd::DRIVER_TIMING_CONTROL_B, &[0x00, 0x00]),
    (cmd::POWER_CONTROL_1, &[0x26]),
    (cmd::POWER_CONTROL_2, &[0x11]),
    (cmd::VCOM_CONTROL_1, &[0x35, 0x3E]),
    (cmd::VCOM_CONTROL_2, &[0xBE]),
    (cmd::MEMORY_ACCESS_CONTROL, &[Rotation::LandscapeFlipped.madctl()]),
    // 16 bit pixels
    (cmd::PIXEL_FORMAT_SET, &[0x55]),
    (cmd::FRAME_RATE_CONTROL_1, &[0x00, 0x1B]),
    (cmd::THREE_GAMMA_ENABLE, &[0x08]),
    (cmd::GAMMA_SET, &[0x01]),
    (cmd::ENTRY_MODE_SET, &[0x06]),
    (cmd::DISPLAY_FUNCTION_CONTROL, &[0x0A, 0x82, 0x27, 0x00]),
    // WEMODE=0
    (cmd::INTERFACE_CONTROL, &[0x00, 0x00, 0x00]),
    (cmd::SLEEP_OUT, &[]),
    (cmd::DISPLAY_ON, &[]),
];

/// Display driver failure
#[derive(Debug, PartialEq, Eq)]
pub enum Error<SE, PE> {
    /// SPI transfer failed
    Spi(SE),
    /// Data/command pin could not be driven
    Pin(PE),
}

#[cfg(feature = "embedded")]
impl<SE: defmt::Format, PE: defmt::Format> defmt::Format for Error<SE, PE> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Spi(e) => defmt::write!(f, "SPI error: {}", e),
            Self::Pin(e) => defmt::write!(f, "DC pin error: {}", e),
        }
    }
}

/// Size of the on-stack pixel chunk used for fills
const FILL_CHUNK_BYTES: usize = 64;

/// ILI9341 driver
pub struct Ili9341<SPI, DC, DELAY> {
    spi: SPI,
    dc: DC,
    delay: DELAY,
    width: u16,
    height: u16,
}

impl<SPI, DC, DELAY> Ili9341<SPI, DC, DELAY>
where
    SPI: SpiBus,
    DC: OutputPin,
    DELAY: DelayNs,
{
    /// Create a new display driver
    pub fn new(spi: SPI, dc: DC, delay: DELAY, width: u16, height: u16) -> Self {
        Self {
            spi,
            dc,
            delay,
            width,
            height,
        }
    }

    /// Display width in pixels
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Display height in pixels
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Run the vendor init sequence and leave the display on
    pub async fn init(&mut self) -> Result<(), Error<SPI::Error, DC::Error>> {
        for &(opcode, data) in INIT_SEQUENCE {
            self.command(opcode).await?;
            if !data.is_empty() {
                self.data(data).await?;
            }
            self.delay.delay_ms(DISPLAY_INIT_DELAY_MS).await;
        }
        self.spi.flush().await.map_err(Error::Spi)?;
        Ok(())
    }

    /// Send a command opcode (DC low)
    async fn command(&mut self, opcode: u8) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.dc.set_low().map_err(Error::Pin)?;
        self.spi.write(&[opcode]).await.map_err(Error::Spi)
    }

    /// Send parameter or pixel bytes (DC high)
    async fn data(&mut self, bytes: &[u8]) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.dc.set_high().map_err(Error::Pin)?;
        self.spi.write(bytes).await.map_err(Error::Spi)
    }

    /// Open a drawing window and start a memory write
    ///
    /// Coordinates are inclusive on both ends and the caller keeps
    /// `x0 <= x1` and `y0 <= y1`. Subsequent pixel data fills the window
    /// row by row.
    pub async fn set_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.command(cmd::COLUMN_ADDRESS_SET).await?;
        self.data(&[(x0 >> 8) as u8, x0 as u8, (x1 >> 8) as u8, x1 as u8])
            .await?;

        self.command(cmd::PAGE_ADDRESS_SET).await?;
        self.data(&[(y0 >> 8) as u8, y0 as u8, (y1 >> 8) as u8, y1 as u8])
            .await?;

        self.command(cmd::MEMORY_WRITE).await
    }

    /// Fill a rectangle with one color, corners inclusive
    ///
    /// An inverted rectangle is empty and writes nothing.
    pub async fn fill_rect(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
        color: Color,
    ) -> Result<(), Error<SPI::Error, DC::Error>> {
        if x1 < x0 || y1 < y0 {
            return Ok(());
        }
        self.set_window(x0, y0, x1, y1).await?;

        let pixels = u32::from(x1 - x0 + 1) * u32::from(y1 - y0 + 1);
        let mut remaining = pixels as usize * 2;

        let mut chunk = [0u8; FILL_CHUNK_BYTES];
        let [hi, lo] = color.to_be_bytes();
        for pair in chunk.chunks_exact_mut(2) {
            pair[0] = hi;
            pair[1] = lo;
        }

        while remaining > 0 {
            let n = remaining.min(FILL_CHUNK_BYTES);
            self.data(&chunk[..n]).await?;
            remaining -= n;
        }
        self.spi.flush().await.map_err(Error::Spi)?;
        Ok(())
    }

    /// Write one pixel
    pub async fn set_pixel(
        &mut self,
        x: u16,
        y: u16,
        color: Color,
    ) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.set_window(x, y, x, y).await?;
        self.data(&color.to_be_bytes()).await
    }

    /// Stream raw RGB565 big-endian pixel data into a window
    pub async fn write_pixels(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
        data: &[u8],
    ) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.set_window(x0, y0, x1, y1).await?;
        self.data(data).await?;
        self.spi.flush().await.map_err(Error::Spi)
    }

    /// Fill the whole screen with one color
    ///
    /// A zero-sized panel writes nothing.
    pub async fn clear(&mut self, color: Color) -> Result<(), Error<SPI::Error, DC::Error>> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }
        self.fill_rect(0, 0, self.width - 1, self.height - 1, color)
            .await
    }

    /// Change the display orientation
    pub async fn set_rotation(
        &mut self,
        rotation: Rotation,
    ) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.command(cmd::MEMORY_ACCESS_CONTROL).await?;
        self.data(&[rotation.madctl()]).await
    }

    /// Switch the display on and let it settle
    pub async fn on(&mut self) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.command(cmd::DISPLAY_ON).await?;
        self.delay.delay_ms(DISPLAY_ON_DELAY_MS).await;
        Ok(())
    }

    /// Switch the display off
    pub async fn off(&mut self) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.command(cmd::DISPLAY_OFF).await
    }
}
