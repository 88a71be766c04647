//! Front Panel Main Application
//!
//! Entry point for the RP2350-based panel firmware. Brings up the WM8731
//! codec, the ILI9341 display and the MCP23017 encoder expander, then
//! runs the interrupt-driven input loop and a simple parameter bar UI.

#![no_std]
#![no_main]

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C0, SPI0};
use embassy_rp::spi::{self, Phase, Polarity, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_time::{Delay, Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use frontpanel_firmware::config;
use frontpanel_firmware::drivers::ili9341::{color, Ili9341};
use frontpanel_firmware::drivers::mcp23017::Mcp23017;
use frontpanel_firmware::drivers::wm8731::Wm8731;
use frontpanel_firmware::hal::gpio::{Backlight, ExpanderInt, StatusLed};
use frontpanel_firmware::quadrature::{ButtonPolarity, QuadratureDecoder, StepMode};
use frontpanel_firmware::types::{Bank, ButtonAction, Direction, EventKind, PanelEvent};

/// Tell the RP2350 Boot ROM about our application
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

/// Shared I2C0 bus - codec and expander access it through I2cDevice
/// wrappers that serialise transactions.
static I2C_BUS: StaticCell<Mutex<CriticalSectionRawMutex, I2c<'static, I2C0, i2c::Async>>> =
    StaticCell::new();

/// Decoded panel events, panel input task -> UI task
static EVENTS: Channel<CriticalSectionRawMutex, PanelEvent, { config::EVENT_CHANNEL_DEPTH }> =
    Channel::new();

/// Concrete shared-bus I2C handle
type PanelI2c = I2cDevice<'static, CriticalSectionRawMutex, I2c<'static, I2C0, i2c::Async>>;

/// Concrete display type
type PanelDisplay = Ili9341<Spi<'static, SPI0, spi::Async>, Output<'static>, Delay>;

/// Concrete codec type
type PanelCodec = Wm8731<PanelI2c>;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Front panel firmware v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_rp::init(Default::default());

    info!("Peripherals initialized");

    let led = StatusLed::new(Output::new(p.PIN_25, Level::Low));

    // I2C0 for the MCP23017 and WM8731
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = config::I2C_FREQUENCY_HZ;
    let i2c = I2c::new_async(p.I2C0, p.PIN_5, p.PIN_4, Irqs, i2c_config);
    let i2c_bus = I2C_BUS.init(Mutex::new(i2c));

    info!("I2C0 initialized at {} Hz", config::I2C_FREQUENCY_HZ);

    // SPI0 for the display, mode 2 per the panel wiring
    let mut spi_config = spi::Config::default();
    spi_config.frequency = config::SPI_CLOCK_HZ;
    spi_config.polarity = Polarity::IdleHigh;
    spi_config.phase = Phase::CaptureOnFirstTransition;
    let spi = Spi::new(
        p.SPI0,
        p.PIN_18, // SCK
        p.PIN_19, // MOSI
        p.PIN_16, // MISO (unused by the display)
        p.DMA_CH0,
        p.DMA_CH1,
        spi_config,
    );

    // The display is the only device on SPI0, keep it selected
    let _cs = Output::new(p.PIN_17, Level::Low);
    let dc = Output::new(p.PIN_20, Level::Low);
    let mut backlight = Backlight::new(Output::new(p.PIN_21, Level::Low));

    // Codec first: it only needs its register sequence once
    let mut codec: PanelCodec = Wm8731::new(I2cDevice::new(i2c_bus), config::WM8731_I2C_ADDR);
    match codec.probe().await {
        Ok(()) => {
            if let Err(e) = codec.set_headphone_volume(PanelCodec::HEADPHONE_0DB).await {
                warn!("headphone volume: {}", e);
            }
            info!("WM8731 codec initialized");
        }
        // Audio is non-essential for panel operation, keep going
        Err(e) => warn!("WM8731 init failed: {}", e),
    }

    let mut display = Ili9341::new(
        spi,
        dc,
        Delay,
        config::DISPLAY_WIDTH,
        config::DISPLAY_HEIGHT,
    );
    match display.init().await {
        Ok(()) => {
            info!("ILI9341 initialized");
            backlight.on();
        }
        Err(e) => warn!("ILI9341 init failed: {}", e),
    }

    // Expander with the panel channel map; encoders and buttons idle high
    let decoder = match QuadratureDecoder::with_channels(
        StepMode::FullStep,
        ButtonPolarity::ActiveLow,
        &config::panel_channel_map(),
    ) {
        Ok(decoder) => decoder,
        Err(e) => {
            defmt::panic!("invalid channel map: {}", e);
        }
    };
    let mut expander = Mcp23017::new(
        I2cDevice::new(i2c_bus),
        config::MCP23017_I2C_ADDR,
        decoder,
    );
    match expander.init().await {
        Ok(()) => info!("MCP23017 initialized"),
        Err(e) => warn!("MCP23017 init failed: {}", e),
    }

    let int_a = ExpanderInt::new(Input::new(p.PIN_6, Pull::Down), Bank::A);
    let int_b = ExpanderInt::new(Input::new(p.PIN_7, Pull::Down), Bank::B);

    unwrap!(spawner.spawn(panel_input_task(int_a, int_b, expander)));
    unwrap!(spawner.spawn(ui_task(display)));
    unwrap!(spawner.spawn(heartbeat_task(led)));

    info!("Tasks spawned");
}

/// Interrupt-driven panel input task
///
/// Waits on both expander interrupt lines, services the signalled bank and
/// forwards the decoded events in order. Per-bank arrival order is
/// preserved because each bank is only ever serviced from this task.
#[embassy_executor::task]
async fn panel_input_task(
    mut int_a: ExpanderInt<'static>,
    mut int_b: ExpanderInt<'static>,
    mut expander: Mcp23017<PanelI2c>,
) {
    info!("Panel input task started");

    loop {
        let bank = match select(int_a.wait_active(), int_b.wait_active()).await {
            Either::First(()) => int_a.bank(),
            Either::Second(()) => int_b.bank(),
        };

        match expander.service(bank).await {
            Ok(events) => {
                for event in events {
                    EVENTS.send(event).await;
                }
            }
            Err(e) => {
                // The GPIO read clears the interrupt; if it failed the
                // line may still be asserted, so back off briefly rather
                // than spinning on the bus.
                warn!("bank {} service failed: {}", bank, e);
                Timer::after(Duration::from_millis(2)).await;
            }
        }
    }
}

/// Parameter bar geometry
const BAR_X: u16 = 40;
const BAR_WIDTH: u16 = 240;
const BAR_HEIGHT: u16 = 24;
const BAR_PITCH: u16 = 56;
const BAR_Y0: u16 = 12;

/// UI task: renders one horizontal bar per encoder channel
#[embassy_executor::task]
async fn ui_task(mut display: PanelDisplay) {
    let background = color(0, 0, 0);
    let fill = color(31, 31, 15);
    let outline = color(8, 16, 8);

    if display.clear(background).await.is_err() {
        warn!("display clear failed");
    }

    let mut values: [u8; 4] = [50; 4];
    for (i, &value) in values.iter().enumerate() {
        let _ = draw_bar(&mut display, i as u16, value, outline, fill).await;
    }

    loop {
        let event = EVENTS.receive().await;
        info!("panel event: {}", event);

        let index = usize::from(event.channel.index());
        match event.kind {
            EventKind::Rotate(Direction::Clockwise) => {
                values[index] = (values[index] + 2).min(100);
            }
            EventKind::Rotate(Direction::CounterClockwise) => {
                values[index] = values[index].saturating_sub(2);
            }
            // Press snaps the parameter back to center; release is
            // logged but has no UI effect
            EventKind::Button(ButtonAction::Pressed) => values[index] = 50,
            EventKind::Button(ButtonAction::Released) => continue,
        }

        if draw_bar(&mut display, index as u16, values[index], outline, fill)
            .await
            .is_err()
        {
            warn!("bar redraw failed");
        }
    }
}

/// Redraw one channel's bar
async fn draw_bar(
    display: &mut PanelDisplay,
    row: u16,
    value: u8,
    outline: u16,
    fill: u16,
) -> Result<(), frontpanel_firmware::drivers::ili9341::Error<spi::Error, core::convert::Infallible>>
{
    let y = BAR_Y0 + row * BAR_PITCH;
    let filled = BAR_X + u16::from(value) * BAR_WIDTH / 100;

    if filled > BAR_X {
        display
            .fill_rect(BAR_X, y, filled - 1, y + BAR_HEIGHT - 1, fill)
            .await?;
    }
    if filled < BAR_X + BAR_WIDTH {
        display
            .fill_rect(filled, y, BAR_X + BAR_WIDTH - 1, y + BAR_HEIGHT - 1, outline)
            .await?;
    }
    Ok(())
}

/// Heartbeat task - blinks LED to show system is running
#[embassy_executor::task]
async fn heartbeat_task(mut led: StatusLed<'static>) {
    loop {
        led.on();
        Timer::after(Duration::from_millis(100)).await;
        led.off();
        Timer::after(Duration::from_millis(900)).await;
    }
}
