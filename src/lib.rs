//! Front Panel Firmware Library
//!
//! This library provides the peripheral drivers for an RP2350-based audio
//! front panel: four rotary encoders with push buttons behind an MCP23017
//! I2C GPIO expander, an ILI9341 SPI TFT display, and a WM8731 audio codec.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Panel Input Task  │  UI Task  │  Heartbeat                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     INPUT DECODING                           │
//! │  Quadrature state machines  │  Button edge detection         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   DRIVER LAYER                               │
//! │  MCP23017  │  ILI9341  │  WM8731                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Pure decoding core**: the quadrature decoder performs no I/O and is
//!   a total function over its inputs, suitable for interrupt context
//! - **Type-driven design**: custom types enforce invariants at compile time
//! - **No unsafe in application code**
//! - **Explicit error handling**: all fallible operations return `Result`
//! - **Bus-generic drivers**: drivers take `embedded-hal-async` traits so
//!   the register sequences are testable on the host

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_rp;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Thin wrappers over RP2350 pins used by the panel.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// Register-level drivers for the external ICs (MCP23017, ILI9341, WM8731).
pub mod drivers;

/// Quadrature Decoding
///
/// Pure state machines turning raw expander port samples into panel events.
pub mod quadrature;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::digital::OutputPin;
    pub use embedded_hal_async::i2c::I2c;
    pub use embedded_hal_async::spi::SpiBus;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
