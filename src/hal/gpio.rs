//! GPIO Abstractions
//!
//! Type-safe GPIO pin wrappers for the front panel.
//! Provides semantic meaning to pins through the type system.

use embassy_rp::gpio::{Input, Output};

use crate::types::Bank;

/// Status LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Status LED driver
pub struct StatusLed<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> StatusLed<'d> {
    /// Create a new status LED (initially off)
    #[must_use]
    pub fn new(pin: Output<'d>) -> Self {
        Self {
            pin,
            state: LedState::Off,
        }
    }

    /// Turn LED on
    pub fn on(&mut self) {
        self.pin.set_high();
        self.state = LedState::On;
    }

    /// Turn LED off
    pub fn off(&mut self) {
        self.pin.set_low();
        self.state = LedState::Off;
    }

    /// Toggle LED state
    pub fn toggle(&mut self) {
        match self.state {
            LedState::Off => self.on(),
            LedState::On => self.off(),
        }
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}

/// Display backlight control
pub struct Backlight<'d> {
    pin: Output<'d>,
}

impl<'d> Backlight<'d> {
    /// Create backlight control (starts dark, lit after display init)
    #[must_use]
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }

    /// Light the backlight
    pub fn on(&mut self) {
        self.pin.set_high();
    }

    /// Darken the backlight
    pub fn off(&mut self) {
        self.pin.set_low();
    }
}

/// One MCP23017 interrupt line
///
/// The expander is configured with INTPOL set, so the line drives high
/// while its bank has a pending change.
pub struct ExpanderInt<'d> {
    pin: Input<'d>,
    bank: Bank,
}

impl<'d> ExpanderInt<'d> {
    /// Wrap an interrupt input for one bank
    #[must_use]
    pub fn new(pin: Input<'d>, bank: Bank) -> Self {
        Self { pin, bank }
    }

    /// Bank this line reports for
    #[must_use]
    pub const fn bank(&self) -> Bank {
        self.bank
    }

    /// Wait until the line signals a pending bank change
    pub async fn wait_active(&mut self) {
        self.pin.wait_for_high().await;
    }
}
