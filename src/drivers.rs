//! Peripheral Drivers
//!
//! Register-level drivers for the external ICs on the panel. These are
//! generic over the `embedded-hal-async` bus traits so the register
//! sequences can be exercised on the host with mock buses.

pub mod ili9341;
pub mod mcp23017;
pub mod wm8731;
