//! Shared types used across the front panel firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

/// Logical encoder/button channel on the panel
///
/// Each channel maps one rotary encoder with its push button. The panel
/// carries four of them, two per expander bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// First encoder (bank A, low bits)
    pub const CH0: Self = Self(0);

    /// Second encoder (bank A, high bits)
    pub const CH1: Self = Self(1);

    /// Third encoder (bank B, low bits)
    pub const CH2: Self = Self(2);

    /// Fourth encoder (bank B, high bits)
    pub const CH3: Self = Self(3);

    /// Number of channels the panel supports
    pub const COUNT: usize = 4;

    /// Create a channel from its index, returns None if out of range
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < Self::COUNT as u8 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Get the channel index (0-3)
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CH{}", self.0);
    }
}

/// One 8-bit GPIO port group on the expander
///
/// Each bank is sampled and interrupted independently; the decoder keeps
/// separate previous-sample state per bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bank {
    /// GPIOA port
    A,
    /// GPIOB port
    B,
}

impl Bank {
    /// Get the bank index (0 for A, 1 for B)
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Bank {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::A => defmt::write!(f, "A"),
            Self::B => defmt::write!(f, "B"),
        }
    }
}

/// Encoder rotation direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Clockwise rotation (increment)
    Clockwise,
    /// Counter-clockwise rotation (decrement)
    CounterClockwise,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Direction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Clockwise => defmt::write!(f, "CW"),
            Self::CounterClockwise => defmt::write!(f, "CCW"),
        }
    }
}

/// Button edge classification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    /// Button went down
    Pressed,
    /// Button came back up
    Released,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ButtonAction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Pressed => defmt::write!(f, "Pressed"),
            Self::Released => defmt::write!(f, "Released"),
        }
    }
}

/// What happened on a channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// The encoder advanced one detent
    Rotate(Direction),
    /// The push button changed level
    Button(ButtonAction),
}

#[cfg(feature = "embedded")]
impl defmt::Format for EventKind {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Rotate(d) => defmt::write!(f, "Rotate({})", d),
            Self::Button(a) => defmt::write!(f, "Button({})", a),
        }
    }
}

/// A classified panel input event
///
/// Typed replacement for the raw `(channel << 6) | code` callback byte the
/// expander used to hand out. The legacy wire form is still available via
/// [`PanelEvent::as_byte`] / [`PanelEvent::from_byte`] for hosts that speak
/// the old encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelEvent {
    /// Channel the event originated from
    pub channel: Channel,
    /// Event classification
    pub kind: EventKind,
}

/// Legacy event code: button down
const CODE_SW_DN: u8 = 0x01;
/// Legacy event code: button up
const CODE_SW_UP: u8 = 0x02;
/// Legacy event code: clockwise detent
const CODE_DIR_CW: u8 = 0x10;
/// Legacy event code: counter-clockwise detent
const CODE_DIR_CCW: u8 = 0x20;
/// Bit position of the channel index in the legacy byte
const CHANNEL_SHIFT: u8 = 6;

impl PanelEvent {
    /// Create a new event
    #[must_use]
    pub const fn new(channel: Channel, kind: EventKind) -> Self {
        Self { channel, kind }
    }

    /// Encode as the legacy wire byte: `(channel << 6) | code`
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        let code = match self.kind {
            EventKind::Rotate(Direction::Clockwise) => CODE_DIR_CW,
            EventKind::Rotate(Direction::CounterClockwise) => CODE_DIR_CCW,
            EventKind::Button(ButtonAction::Pressed) => CODE_SW_DN,
            EventKind::Button(ButtonAction::Released) => CODE_SW_UP,
        };
        (self.channel.index() << CHANNEL_SHIFT) | code
    }

    /// Decode the legacy wire byte, returns None for unknown codes
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        let kind = match byte & !(0x03 << CHANNEL_SHIFT) {
            CODE_DIR_CW => EventKind::Rotate(Direction::Clockwise),
            CODE_DIR_CCW => EventKind::Rotate(Direction::CounterClockwise),
            CODE_SW_DN => EventKind::Button(ButtonAction::Pressed),
            CODE_SW_UP => EventKind::Button(ButtonAction::Released),
            _ => return None,
        };
        match Channel::new(byte >> CHANNEL_SHIFT) {
            Some(channel) => Some(Self { channel, kind }),
            None => None,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PanelEvent {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}: {}", self.channel, self.kind);
    }
}
