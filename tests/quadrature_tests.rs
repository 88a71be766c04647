//! Quadrature decoder tests
//!
//! Run with: cargo test --no-default-features --features std --test quadrature_tests
//!
//! Samples are raw 8-bit bank values; the decoder extracts the `(b << 1) | a`
//! input pattern per channel. With pulled-up inputs a detent starts and ends
//! on the 11 rest pattern.

use frontpanel_firmware::config::panel_channel_map;
use frontpanel_firmware::quadrature::{
    ButtonPolarity, ChannelConfig, ChannelPins, ConfigError, QuadratureDecoder, StepMode,
};
use frontpanel_firmware::types::{Bank, ButtonAction, Channel, Direction, EventKind, PanelEvent};

/// One channel on bank A: A phase on bit 0, B phase on bit 1, button on bit 2
fn simple_config() -> ChannelConfig {
    ChannelConfig {
        channel: Channel::CH0,
        bank: Bank::A,
        pins: ChannelPins {
            a: 0,
            b: 1,
            button: Some(2),
        },
    }
}

fn simple_decoder(polarity: ButtonPolarity) -> QuadratureDecoder {
    QuadratureDecoder::with_channels(StepMode::FullStep, polarity, &[simple_config()]).unwrap()
}

/// Feed consecutive samples, collecting every emitted event
fn run(decoder: &mut QuadratureDecoder, bank: Bank, samples: &[u8]) -> Vec<PanelEvent> {
    let mut events = Vec::new();
    for w in samples.windows(2) {
        events.extend(decoder.decode(bank, w[1], w[0]));
    }
    events
}

// Full detent waveforms for the simple_config bit layout, button held high.
// (b, a): 11 -> 01 -> 00 -> 10 -> 11 is one clockwise detent.
const CW_DETENT: [u8; 5] = [0x07, 0x05, 0x04, 0x06, 0x07];
const CCW_DETENT: [u8; 5] = [0x07, 0x06, 0x04, 0x05, 0x07];

/// Bank sample for a 2-bit `(b, a)` input with the button held high
fn sample(input: u8) -> u8 {
    (input & 0x03) | 0x04
}

#[test]
fn unchanged_sample_emits_nothing() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);
    assert!(decoder.decode(Bank::A, 0x07, 0x07).is_empty());
}

#[test]
fn cw_detent_emits_one_clockwise_event() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);
    let events = run(&mut decoder, Bank::A, &CW_DETENT);

    assert_eq!(
        events,
        vec![PanelEvent::new(
            Channel::CH0,
            EventKind::Rotate(Direction::Clockwise)
        )]
    );
}

#[test]
fn ccw_detent_emits_one_counterclockwise_event() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);
    let events = run(&mut decoder, Bank::A, &CCW_DETENT);

    assert_eq!(
        events,
        vec![PanelEvent::new(
            Channel::CH0,
            EventKind::Rotate(Direction::CounterClockwise)
        )]
    );
}

#[test]
fn full_step_table_conformance() {
    // Every reachable (state, input) pair of the full-step machine: the
    // prefix of inputs drives a fresh decoder into the state, then the
    // probed input is applied and its emission checked. Only the two
    // FINAL states emit, and only on the 11 rest input. Re-presenting a
    // state's own entry input is not a pin edge and never reaches the
    // machine, which leaves the state untouched just like the table's
    // self-loop rows.
    let cases: &[(&[u8], u8, Option<Direction>)] = &[
        // START, rest window 11
        (&[], 0b00, None),
        (&[], 0b01, None),
        (&[], 0b10, None),
        // START re-entered via 00, then back to rest
        (&[0b00], 0b11, None),
        // CW_BEGIN
        (&[0b01], 0b00, None),
        (&[0b01], 0b10, None),
        (&[0b01], 0b11, None),
        // CW_NEXT
        (&[0b01, 0b00], 0b01, None),
        (&[0b01, 0b00], 0b10, None),
        (&[0b01, 0b00], 0b11, None),
        // CW_FINAL
        (&[0b01, 0b00, 0b10], 0b00, None),
        (&[0b01, 0b00, 0b10], 0b01, None),
        (&[0b01, 0b00, 0b10], 0b11, Some(Direction::Clockwise)),
        // CCW_BEGIN
        (&[0b10], 0b00, None),
        (&[0b10], 0b01, None),
        (&[0b10], 0b11, None),
        // CCW_NEXT
        (&[0b10, 0b00], 0b01, None),
        (&[0b10, 0b00], 0b10, None),
        (&[0b10, 0b00], 0b11, None),
        // CCW_FINAL
        (&[0b10, 0b00, 0b01], 0b00, None),
        (&[0b10, 0b00, 0b01], 0b10, None),
        (&[0b10, 0b00, 0b01], 0b11, Some(Direction::CounterClockwise)),
    ];

    for &(prefix, input, expected) in cases {
        let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);
        let mut previous = 0b11u8;
        for &step in prefix {
            assert!(
                decoder
                    .decode(Bank::A, sample(step), sample(previous))
                    .is_empty(),
                "prefix {prefix:?} must be silent"
            );
            previous = step;
        }

        let events = decoder.decode(Bank::A, sample(input), sample(previous));
        match expected {
            None => assert!(
                events.is_empty(),
                "state via {prefix:?}, input {input:02b}"
            ),
            Some(direction) => assert_eq!(
                events.as_slice(),
                &[PanelEvent::new(Channel::CH0, EventKind::Rotate(direction))],
                "state via {prefix:?}, input {input:02b}"
            ),
        }
    }
}

#[test]
fn aborted_transitions_land_back_at_start() {
    // Rows that fall back to START silently (e.g. CW_FINAL on 01) leave
    // the machine ready for a clean detent afterwards.
    for prefix in [&[0b01u8, 0b00, 0b10][..], &[0b10, 0b00, 0b01][..]] {
        let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);
        let mut previous = 0b11u8;
        for &step in prefix {
            decoder.decode(Bank::A, sample(step), sample(previous));
            previous = step;
        }
        // Abort one step short of emitting
        let abort = if previous == 0b10 { 0b01 } else { 0b10 };
        assert!(decoder
            .decode(Bank::A, sample(abort), sample(previous))
            .is_empty());
        // Kicked back to START: closing the old waveform emits nothing
        assert!(decoder
            .decode(Bank::A, sample(0b11), sample(abort))
            .is_empty());

        assert_eq!(run(&mut decoder, Bank::A, &CW_DETENT).len(), 1);
    }
}

#[test]
fn repeated_detents_emit_one_event_each() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);

    for _ in 0..10 {
        let events = run(&mut decoder, Bank::A, &CW_DETENT);
        assert_eq!(events.len(), 1);
    }
    for _ in 0..10 {
        let events = run(&mut decoder, Bank::A, &CCW_DETENT);
        assert_eq!(events.len(), 1);
    }
}

#[test]
fn interrupted_rotation_emits_nothing_and_recovers() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);

    // Half a detent forward, then back to rest
    let aborted = [0x07, 0x05, 0x04, 0x05, 0x07];
    assert!(run(&mut decoder, Bank::A, &aborted).is_empty());

    // The next complete detent still registers
    let events = run(&mut decoder, Bank::A, &CW_DETENT);
    assert_eq!(events.len(), 1);
}

#[test]
fn contact_bounce_is_rejected() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);

    // First edge bounces twice before the detent completes
    let bouncy = [0x07, 0x05, 0x07, 0x05, 0x04, 0x06, 0x07];
    let events = run(&mut decoder, Bank::A, &bouncy);
    assert_eq!(
        events,
        vec![PanelEvent::new(
            Channel::CH0,
            EventKind::Rotate(Direction::Clockwise)
        )]
    );
}

#[test]
fn direction_reversal_mid_detent_emits_nothing() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);

    // CW start, CCW finish: the table never reaches an emitting transition
    let reversed = [0x07, 0x05, 0x04, 0x05, 0x07, 0x06, 0x07];
    assert!(run(&mut decoder, Bank::A, &reversed).is_empty());
}

#[test]
fn active_low_button_edges() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);

    let down = decoder.decode(Bank::A, 0x03, 0x07);
    assert_eq!(
        down.as_slice(),
        &[PanelEvent::new(
            Channel::CH0,
            EventKind::Button(ButtonAction::Pressed)
        )]
    );

    let up = decoder.decode(Bank::A, 0x07, 0x03);
    assert_eq!(
        up.as_slice(),
        &[PanelEvent::new(
            Channel::CH0,
            EventKind::Button(ButtonAction::Released)
        )]
    );
}

#[test]
fn active_high_button_edges() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveHigh);

    let down = decoder.decode(Bank::A, 0x07, 0x03);
    assert_eq!(
        down[0],
        PanelEvent::new(Channel::CH0, EventKind::Button(ButtonAction::Pressed))
    );

    let up = decoder.decode(Bank::A, 0x03, 0x07);
    assert_eq!(
        up[0],
        PanelEvent::new(Channel::CH0, EventKind::Button(ButtonAction::Released))
    );
}

#[test]
fn rotation_precedes_button_in_same_sample() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);

    // Walk to the last step of a CW detent
    assert!(run(&mut decoder, Bank::A, &CW_DETENT[..4]).is_empty());

    // Final transition lands on rest while the button falls
    let events = decoder.decode(Bank::A, 0x03, 0x06);
    assert_eq!(
        events.as_slice(),
        &[
            PanelEvent::new(Channel::CH0, EventKind::Rotate(Direction::Clockwise)),
            PanelEvent::new(Channel::CH0, EventKind::Button(ButtonAction::Pressed)),
        ]
    );
}

#[test]
fn channels_report_in_configuration_order() {
    let mut decoder = QuadratureDecoder::with_channels(
        StepMode::FullStep,
        ButtonPolarity::ActiveLow,
        &panel_channel_map(),
    )
    .unwrap();

    // CH0 (a=1, b=2) and CH1 (a=4, b=5) on bank A step through a CW
    // detent in lockstep, buttons (bits 0 and 3) held high.
    let rest = 0xFF;
    let samples = [
        rest,
        rest & !0x24,        // both B phases fall
        rest & !0x36,        // both A phases fall too
        (rest & !0x12) | 0x24, // B phases rise
        rest,                // back to rest, two detents complete
    ];
    let events = run(&mut decoder, Bank::A, &samples);

    assert_eq!(
        events,
        vec![
            PanelEvent::new(Channel::CH0, EventKind::Rotate(Direction::Clockwise)),
            PanelEvent::new(Channel::CH1, EventKind::Rotate(Direction::Clockwise)),
        ]
    );
}

#[test]
fn banks_are_isolated() {
    let mut decoder = QuadratureDecoder::with_channels(
        StepMode::FullStep,
        ButtonPolarity::ActiveLow,
        &panel_channel_map(),
    )
    .unwrap();

    // A full CH2 waveform presented as bank A activity touches nothing:
    // CH2 lives on bank B.
    let samples = [0xFF, 0xFB, 0xF9, 0xFD, 0xFF];
    let mut decoder2 = QuadratureDecoder::with_channels(
        StepMode::FullStep,
        ButtonPolarity::ActiveLow,
        &panel_channel_map(),
    )
    .unwrap();
    // Same bytes on the right bank do produce the detent... (CH0 shares
    // the bit layout, so bank A yields a CH0 event instead)
    let on_b = run(&mut decoder, Bank::B, &samples);
    let on_a = run(&mut decoder2, Bank::A, &samples);

    assert_eq!(
        on_b,
        vec![PanelEvent::new(
            Channel::CH2,
            EventKind::Rotate(Direction::Clockwise)
        )]
    );
    assert_eq!(
        on_a,
        vec![PanelEvent::new(
            Channel::CH0,
            EventKind::Rotate(Direction::Clockwise)
        )]
    );
}

#[test]
fn half_step_emits_twice_per_detent() {
    let mut decoder = QuadratureDecoder::with_channels(
        StepMode::HalfStep,
        ButtonPolarity::ActiveLow,
        &[simple_config()],
    )
    .unwrap();

    let events = run(&mut decoder, Bank::A, &CW_DETENT);
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| e.kind == EventKind::Rotate(Direction::Clockwise)));
}

#[test]
fn reset_discards_partial_rotation() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);

    // Two steps in, then reset
    assert!(run(&mut decoder, Bank::A, &CW_DETENT[..3]).is_empty());
    decoder.reset(Channel::CH0);

    // Finishing the old waveform no longer counts
    assert!(run(&mut decoder, Bank::A, &CW_DETENT[2..]).is_empty());

    // A fresh detent does
    assert_eq!(run(&mut decoder, Bank::A, &CW_DETENT).len(), 1);
}

#[test]
fn reset_of_unconfigured_channel_is_a_noop() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);
    decoder.reset(Channel::CH3);
    assert_eq!(decoder.channel_count(), 1);
}

#[test]
fn pin_out_of_range_is_rejected() {
    let mut config = simple_config();
    config.pins.b = 8;

    let result =
        QuadratureDecoder::with_channels(StepMode::FullStep, ButtonPolarity::ActiveLow, &[config]);
    assert_eq!(
        result.unwrap_err(),
        ConfigError::PinOutOfRange {
            channel: Channel::CH0,
            pin: 8
        }
    );
}

#[test]
fn duplicate_channel_is_rejected() {
    let mut second = simple_config();
    second.pins = ChannelPins {
        a: 4,
        b: 5,
        button: None,
    };

    let result = QuadratureDecoder::with_channels(
        StepMode::FullStep,
        ButtonPolarity::ActiveLow,
        &[simple_config(), second],
    );
    assert_eq!(
        result.unwrap_err(),
        ConfigError::DuplicateChannel(Channel::CH0)
    );
}

#[test]
fn overlapping_pins_within_a_channel_are_rejected() {
    let mut config = simple_config();
    config.pins.b = config.pins.a;

    let result =
        QuadratureDecoder::with_channels(StepMode::FullStep, ButtonPolarity::ActiveLow, &[config]);
    assert_eq!(
        result.unwrap_err(),
        ConfigError::PinConflict {
            bank: Bank::A,
            pin: 0
        }
    );
}

#[test]
fn overlapping_pins_across_channels_are_rejected() {
    let second = ChannelConfig {
        channel: Channel::CH1,
        bank: Bank::A,
        pins: ChannelPins {
            a: 2, // collides with CH0's B phase
            b: 5,
            button: None,
        },
    };

    let result = QuadratureDecoder::with_channels(
        StepMode::FullStep,
        ButtonPolarity::ActiveLow,
        &[simple_config(), second],
    );
    assert_eq!(
        result.unwrap_err(),
        ConfigError::PinConflict {
            bank: Bank::A,
            pin: 2
        }
    );
}

#[test]
fn same_pins_on_different_banks_coexist() {
    let second = ChannelConfig {
        channel: Channel::CH1,
        bank: Bank::B,
        pins: simple_config().pins,
    };

    let decoder = QuadratureDecoder::with_channels(
        StepMode::FullStep,
        ButtonPolarity::ActiveLow,
        &[simple_config(), second],
    )
    .unwrap();
    assert_eq!(decoder.channel_count(), 2);
}

#[test]
fn failed_configure_leaves_decoder_usable() {
    let mut decoder = simple_decoder(ButtonPolarity::ActiveLow);

    let bad = ChannelConfig {
        channel: Channel::CH1,
        bank: Bank::A,
        pins: ChannelPins {
            a: 0, // collides with CH0
            b: 6,
            button: None,
        },
    };
    assert!(decoder.configure(&bad).is_err());
    assert_eq!(decoder.channel_count(), 1);

    assert_eq!(run(&mut decoder, Bank::A, &CW_DETENT).len(), 1);
}
