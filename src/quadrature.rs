//! Quadrature Event Decoding
//!
//! Turns raw 8-bit expander port samples into classified rotation and
//! button events. Each configured channel owns a small state machine fed
//! with the 2-bit (B, A) pin pattern extracted from the sample; the state
//! table itself rejects bouncing and illegal transitions, so no timing
//! based debounce is needed.
//!
//! The decoder performs no I/O, holds no lock and never blocks: `decode`
//! is a total function over its inputs and completes in time linear in the
//! number of channels configured for the bank, which makes it safe to call
//! from an interrupt handling path. Concurrent calls for *different* banks
//! are fine; calls for the same bank must be serialized by the caller
//! (one hardware interrupt line per bank does this naturally).

use heapless::Vec;

use crate::types::{Bank, ButtonAction, Channel, Direction, EventKind, PanelEvent};

/// Events produced by a single `decode` call, in delivery order
///
/// Capacity covers the worst case of one rotation plus one button event
/// for every channel of a bank.
pub type EventQueue = Vec<PanelEvent, 8>;

// State machine encoding: low nibble is the state index, high nibble
// carries the direction flag on the transition that completes a detent.
const R_START: u8 = 0x0;
const STATE_MASK: u8 = 0x0F;
const DIR_CW: u8 = 0x10;
const DIR_CCW: u8 = 0x20;
const DIR_MASK: u8 = 0x30;

// Full-step states
const R_CW_FINAL: u8 = 0x1;
const R_CW_BEGIN: u8 = 0x2;
const R_CW_NEXT: u8 = 0x3;
const R_CCW_BEGIN: u8 = 0x4;
const R_CCW_FINAL: u8 = 0x5;
const R_CCW_NEXT: u8 = 0x6;

/// Full-step transition table, indexed by `[state][(b << 1) | a]`
///
/// Emits one event per detent, on the transition that lands back on the
/// 11 rest pattern (pulled-up inputs idle at 11).
static FULL_STEP: [[u8; 4]; 7] = [
    // R_START
    [R_START, R_CW_BEGIN, R_CCW_BEGIN, R_START],
    // R_CW_FINAL
    [R_CW_NEXT, R_START, R_CW_FINAL, R_START | DIR_CW],
    // R_CW_BEGIN
    [R_CW_NEXT, R_CW_BEGIN, R_START, R_START],
    // R_CW_NEXT
    [R_CW_NEXT, R_CW_BEGIN, R_CW_FINAL, R_START],
    // R_CCW_BEGIN
    [R_CCW_NEXT, R_START, R_CCW_BEGIN, R_START],
    // R_CCW_FINAL
    [R_CCW_NEXT, R_CCW_FINAL, R_START, R_START | DIR_CCW],
    // R_CCW_NEXT
    [R_CCW_NEXT, R_CCW_FINAL, R_CCW_BEGIN, R_START],
];

// Half-step states
const H_CCW_BEGIN: u8 = 0x1;
const H_CW_BEGIN: u8 = 0x2;
const H_START_M: u8 = 0x3;
const H_CW_BEGIN_M: u8 = 0x4;
const H_CCW_BEGIN_M: u8 = 0x5;

/// Half-step transition table, emits an event at both 00 and 11
static HALF_STEP: [[u8; 4]; 6] = [
    // R_START (00)
    [H_START_M, H_CW_BEGIN, H_CCW_BEGIN, R_START],
    // H_CCW_BEGIN
    [H_START_M | DIR_CCW, R_START, H_CCW_BEGIN, R_START],
    // H_CW_BEGIN
    [H_START_M | DIR_CW, H_CW_BEGIN, R_START, R_START],
    // H_START_M (11)
    [H_START_M, H_CCW_BEGIN_M, H_CW_BEGIN_M, R_START],
    // H_CW_BEGIN_M
    [H_START_M, H_START_M, H_CW_BEGIN_M, R_START | DIR_CW],
    // H_CCW_BEGIN_M
    [H_START_M, H_CCW_BEGIN_M, H_START_M, R_START | DIR_CCW],
];

/// Detent granularity of the rotary state machine
///
/// Selected at construction; the old build-time `HALF_STEP` switch is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StepMode {
    /// One event per full detent (four gray-code transitions)
    #[default]
    FullStep,
    /// One event per half detent (two gray-code transitions)
    HalfStep,
}

impl StepMode {
    const fn table(self) -> &'static [[u8; 4]] {
        match self {
            Self::FullStep => &FULL_STEP,
            Self::HalfStep => &HALF_STEP,
        }
    }
}

/// Electrical polarity of the push button line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ButtonPolarity {
    /// Pulled up, pressed shorts to ground (1 -> 0 is a press)
    #[default]
    ActiveLow,
    /// Pulled down, pressed drives high (0 -> 1 is a press)
    ActiveHigh,
}

impl ButtonPolarity {
    /// Classify a button level change given the new raw level
    const fn classify(self, level_high: bool) -> ButtonAction {
        match (self, level_high) {
            (Self::ActiveLow, true) | (Self::ActiveHigh, false) => ButtonAction::Released,
            (Self::ActiveLow, false) | (Self::ActiveHigh, true) => ButtonAction::Pressed,
        }
    }
}

/// Bit positions of one channel's signals within a bank sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelPins {
    /// Bit carrying the encoder A phase
    pub a: u8,
    /// Bit carrying the encoder B phase
    pub b: u8,
    /// Bit carrying the push button, if the channel has one
    pub button: Option<u8>,
}

/// Placement of a logical channel on the expander
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Logical channel identity
    pub channel: Channel,
    /// Bank the channel's pins live on
    pub bank: Bank,
    /// Bit positions within that bank's sample
    pub pins: ChannelPins,
}

/// Rejected channel mapping
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A bit position exceeds the 8-bit sample width
    PinOutOfRange {
        /// Offending channel
        channel: Channel,
        /// Offending bit position
        pin: u8,
    },
    /// Two signals claim the same bit of the same bank
    PinConflict {
        /// Bank the collision happened on
        bank: Bank,
        /// Contested bit position
        pin: u8,
    },
    /// The channel is already configured
    DuplicateChannel(Channel),
    /// No room for another channel
    CapacityExceeded,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::PinOutOfRange { channel, pin } => {
                defmt::write!(f, "pin {} out of range on {}", pin, channel);
            }
            Self::PinConflict { bank, pin } => {
                defmt::write!(f, "pin {} claimed twice on bank {}", pin, bank);
            }
            Self::DuplicateChannel(channel) => {
                defmt::write!(f, "{} configured twice", channel);
            }
            Self::CapacityExceeded => defmt::write!(f, "too many channels"),
        }
    }
}

/// Per-channel decoder state with precomputed masks
///
/// Masks are derived once at configuration time; the decode path only
/// does AND/XOR work per sample.
#[derive(Clone, Copy, Debug)]
struct ChannelState {
    channel: Channel,
    bank: Bank,
    mask_a: u8,
    mask_b: u8,
    /// 0 when the channel has no button line
    mask_button: u8,
    /// Union of the A and B masks, used for the changed-window test
    mask_pair: u8,
    state: u8,
}

/// Quadrature event decoder for all panel channels
///
/// Owns one rotary state machine per configured channel plus the button
/// edge detector, and classifies bank samples into [`PanelEvent`]s.
///
/// Delivery order within one `decode` call is stable: channels are
/// evaluated in ascending configuration order, and for each channel the
/// rotation event (if any) precedes the button event (if any).
#[derive(Debug)]
pub struct QuadratureDecoder {
    channels: Vec<ChannelState, { Channel::COUNT }>,
    mode: StepMode,
    polarity: ButtonPolarity,
}

impl QuadratureDecoder {
    /// Create a decoder with no channels configured
    #[must_use]
    pub const fn new(mode: StepMode, polarity: ButtonPolarity) -> Self {
        Self {
            channels: Vec::new(),
            mode,
            polarity,
        }
    }

    /// Create a decoder and configure a whole channel map at once
    pub fn with_channels(
        mode: StepMode,
        polarity: ButtonPolarity,
        configs: &[ChannelConfig],
    ) -> Result<Self, ConfigError> {
        let mut decoder = Self::new(mode, polarity);
        for config in configs {
            decoder.configure(config)?;
        }
        Ok(decoder)
    }

    /// Add one channel to the decoder
    ///
    /// Validates the bit mapping and precomputes the masks. Fails without
    /// touching existing channels.
    pub fn configure(&mut self, config: &ChannelConfig) -> Result<(), ConfigError> {
        let pins = config.pins;

        for pin in [Some(pins.a), Some(pins.b), pins.button].into_iter().flatten() {
            if pin > 7 {
                return Err(ConfigError::PinOutOfRange {
                    channel: config.channel,
                    pin,
                });
            }
        }

        if self.channels.iter().any(|c| c.channel == config.channel) {
            return Err(ConfigError::DuplicateChannel(config.channel));
        }

        let mask_a = 1 << pins.a;
        let mask_b = 1 << pins.b;
        let mask_button = pins.button.map_or(0, |pin| 1 << pin);

        // Overlap check covers the new channel against itself and against
        // every channel already placed on the same bank.
        let mut claimed: u8 = 0;
        for c in self.channels.iter().filter(|c| c.bank == config.bank) {
            claimed |= c.mask_a | c.mask_b | c.mask_button;
        }
        for mask in [mask_a, mask_b, mask_button] {
            if mask == 0 {
                continue;
            }
            if claimed & mask != 0 {
                return Err(ConfigError::PinConflict {
                    bank: config.bank,
                    pin: mask.trailing_zeros() as u8,
                });
            }
            claimed |= mask;
        }

        self.channels
            .push(ChannelState {
                channel: config.channel,
                bank: config.bank,
                mask_a,
                mask_b,
                mask_button,
                mask_pair: mask_a | mask_b,
                state: R_START,
            })
            .map_err(|_| ConfigError::CapacityExceeded)?;

        Ok(())
    }

    /// Number of configured channels
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Force a channel's rotary state machine back to the start state
    ///
    /// Used after spurious or conflicting interrupts; a no-op for channels
    /// that were never configured.
    pub fn reset(&mut self, channel: Channel) {
        if let Some(c) = self.channels.iter_mut().find(|c| c.channel == channel) {
            c.state = R_START;
        }
    }

    /// Decode one bank sample against the previous one
    ///
    /// For every channel configured on `bank` whose A/B window changed,
    /// advances the rotary state machine one step; for every changed button
    /// bit, emits an edge event according to the configured polarity.
    /// Channels whose bits did not change are not re-evaluated, so stale
    /// events can never be re-emitted.
    ///
    /// Never fails: an unrecognized state value falls back to the start
    /// state instead of indexing out of the table.
    pub fn decode(&mut self, bank: Bank, current: u8, previous: u8) -> EventQueue {
        let mut events = EventQueue::new();

        let changed = current ^ previous;
        if changed == 0 {
            return events;
        }

        let table = self.mode.table();
        let polarity = self.polarity;

        for c in self.channels.iter_mut().filter(|c| c.bank == bank) {
            if changed & c.mask_pair != 0 {
                let a = u8::from(current & c.mask_a != 0);
                let b = u8::from(current & c.mask_b != 0);
                let input = (b << 1) | a;

                let next = table
                    .get((c.state & STATE_MASK) as usize)
                    .map_or(R_START, |row| row[input as usize]);
                c.state = next;

                let direction = match next & DIR_MASK {
                    DIR_CW => Some(Direction::Clockwise),
                    DIR_CCW => Some(Direction::CounterClockwise),
                    _ => None,
                };
                if let Some(direction) = direction {
                    // Queue capacity covers two events per channel
                    let _ = events.push(PanelEvent::new(c.channel, EventKind::Rotate(direction)));
                }
            }

            if c.mask_button != 0 && changed & c.mask_button != 0 {
                let action = polarity.classify(current & c.mask_button != 0);
                let _ = events.push(PanelEvent::new(c.channel, EventKind::Button(action)));
            }
        }

        events
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new(StepMode::FullStep, ButtonPolarity::ActiveLow)
    }
}
