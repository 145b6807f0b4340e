//! Property tests for frame decoding and response matching.

use proptest::prelude::*;

use ps2_pad_protocol::{
    ExchangeSession, ExpectElement, FRAME_MARKER, PacketBody, PadPacket, ResolvedCommand,
    SendItem, SendPoll, SessionEvent, gesture_label,
};

fn probe(expect: &[ExpectElement]) -> ResolvedCommand {
    ResolvedCommand {
        name: "probe",
        to_send: [SendItem::Byte(0xE6)].into_iter().collect(),
        expect: expect.iter().copied().collect(),
        received: Vec::new(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_sign_extension_matches_reference(
        b0 in any::<u8>().prop_map(|b| b | FRAME_MARKER),
        b1 in any::<u8>(),
        b2 in any::<u8>(),
    ) {
        let reference = |magnitude: u8, sign: bool| {
            i16::from(magnitude) - if sign { 256 } else { 0 }
        };
        let packet = PadPacket::decode([b0, b1, b2, 0x00]);
        match packet.body {
            PacketBody::Motion { x_movement, y_movement, .. } => {
                prop_assert_eq!(x_movement, reference(b1, b0 & 0x10 != 0));
                prop_assert_eq!(y_movement, reference(b2, b0 & 0x20 != 0));
                prop_assert!((-256..=255).contains(&x_movement));
                prop_assert!((-256..=255).contains(&y_movement));
            }
            PacketBody::Gesture { .. } => prop_assert!(false, "zero b3 must decode as motion"),
        }
    }

    #[test]
    fn prop_branch_selected_by_fourth_byte(frame in any::<[u8; 4]>()) {
        let packet = PadPacket::decode(frame);
        match packet.body {
            PacketBody::Motion { .. } => prop_assert_eq!(frame[3], 0),
            PacketBody::Gesture { code, name, x_position, y_position } => {
                prop_assert_ne!(frame[3], 0);
                prop_assert_eq!(code, frame[3]);
                prop_assert_eq!(name, gesture_label(frame[3]));
                prop_assert_eq!(x_position, frame[1]);
                prop_assert_eq!(y_position, frame[2]);
            }
        }
    }

    #[test]
    fn prop_aligned_frame_consumes_exactly_four_bytes(
        b0 in any::<u8>().prop_map(|b| b | FRAME_MARKER),
        rest in any::<[u8; 3]>(),
    ) {
        let mut session = ExchangeSession::new();
        session.push_bytes(&[b0, rest[0], rest[1], rest[2]]);
        prop_assert!(session.buffer().is_empty());
        prop_assert!(matches!(session.take_event(), Some(SessionEvent::Packet(_))));
        prop_assert_eq!(session.take_event(), None);
    }

    #[test]
    fn prop_unaligned_head_flushes_everything(
        head in any::<u8>().prop_map(|b| b & !FRAME_MARKER),
        tail in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        let mut session = ExchangeSession::new();
        let mut pushed = vec![head];
        pushed.extend_from_slice(&tail);
        session.push_bytes(&pushed);
        prop_assert!(session.buffer().is_empty());
        prop_assert_eq!(
            session.take_event(),
            Some(SessionEvent::Desync { discarded: pushed })
        );
    }

    #[test]
    fn prop_wildcard_accepts_any_byte(byte in any::<u8>()) {
        let mut session = ExchangeSession::new();
        prop_assert!(session.invoke(probe(&[ExpectElement::Any])));
        prop_assert_eq!(session.poll_send(), SendPoll::Transmit(0xE6));
        session.push_bytes(&[byte]);
        prop_assert!(!session.is_active());
        let finished = std::iter::from_fn(|| session.take_event()).any(|event| {
            event
                == SessionEvent::Finished {
                    command: "probe",
                    received: vec![byte],
                }
        });
        prop_assert!(finished);
    }

    #[test]
    fn prop_idle_session_never_panics_on_noise(
        noise in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut session = ExchangeSession::new();
        session.push_bytes(&noise);
        while let Some(event) = session.take_event() {
            prop_assert!(
                matches!(
                    event,
                    SessionEvent::Packet(_) | SessionEvent::Desync { .. }
                ),
                "idle session must only emit Packet or Desync events"
            );
        }
        prop_assert_eq!(session.poll_send(), SendPoll::Idle);
    }

    #[test]
    fn prop_gesture_labels_are_total(code in any::<u8>()) {
        let label = gesture_label(code);
        prop_assert!(!label.is_empty());
        if label.starts_with("unknown_") {
            prop_assert_eq!(label, format!("unknown_{code:02x}"));
        }
    }
}
