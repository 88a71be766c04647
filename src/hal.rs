//! Hardware Abstraction Layer
//!
//! Thin, semantically named wrappers over the RP2350 pins the panel uses.
//! Bus peripherals are passed to the drivers as `embedded-hal-async`
//! traits directly and need no wrapping here.

pub mod gpio;
