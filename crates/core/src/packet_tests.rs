// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn round_trip_basic() {
    let wire = create_packet(ToController::NewUserAppEvent as u32, "Test.log(\"hi\");");
    assert_eq!(calc_frame_state(&wire), FrameState::Ready);
    let (packet, consumed) = extract_from_buffer(&wire).expect("valid packet");
    assert_eq!(consumed, wire.len());
    assert_eq!(packet.kind, ToController::NewUserAppEvent as u32);
    assert_eq!(packet.text, "Test.log(\"hi\");");
}

#[test]
fn not_ready_when_buffer_short_of_header() {
    let wire = create_packet(0, "hello");
    assert_eq!(calc_frame_state(&wire[..4]), FrameState::NotReady);
}

#[test]
fn not_ready_when_body_truncated() {
    let wire = create_packet(0, "hello world");
    assert_eq!(calc_frame_state(&wire[..wire.len() - 2]), FrameState::NotReady);
}

#[test]
fn damaged_on_bad_magic() {
    let mut wire = create_packet(0, "hello");
    wire[0] = !wire[0];
    assert_eq!(calc_frame_state(&wire), FrameState::Damaged);
    assert_eq!(extract_from_buffer(&wire), Err(ProtocolError::BadMagic));
}

#[test]
fn damaged_on_oversize_length() {
    let mut wire = create_packet(0, "hello");
    let bad_len = (MAX_PACKET_LEN + 1).to_le_bytes();
    wire[8..12].copy_from_slice(&bad_len);
    assert_eq!(calc_frame_state(&wire), FrameState::Damaged);
    match extract_from_buffer(&wire) {
        Err(ProtocolError::Oversize(n)) => assert_eq!(n, MAX_PACKET_LEN + 1),
        other => panic!("expected Oversize, got {other:?}"),
    }
}

#[test]
fn frame_buffer_peels_packets_byte_at_a_time() {
    let mut wire = create_packet(0, "first");
    wire.extend(create_packet(1, "second"));
    wire.extend(create_packet(2, "third"));

    let mut fb = FrameBuffer::new();
    let mut seen = Vec::new();
    for byte in wire {
        fb.push(&[byte]);
        while let Some(packet) = fb.pop().expect("not damaged") {
            seen.push((packet.kind, packet.text));
        }
    }

    assert_eq!(
        seen,
        vec![
            (0, "first".to_string()),
            (1, "second".to_string()),
            (2, "third".to_string()),
        ]
    );
}

#[test]
fn frame_buffer_handles_whole_buffer_at_once() {
    let mut wire = create_packet(5, "a");
    wire.extend(create_packet(6, "b"));

    let mut fb = FrameBuffer::new();
    fb.push(&wire);
    let first = fb.pop().expect("not damaged").expect("ready");
    let second = fb.pop().expect("not damaged").expect("ready");
    assert!(fb.pop().expect("not damaged").is_none());

    assert_eq!((first.kind, first.text.as_str()), (5, "a"));
    assert_eq!((second.kind, second.text.as_str()), (6, "b"));
}

proptest! {
    #[test]
    fn prop_round_trip_any_text(kind in any::<u32>(), text in "\\PC*") {
        let wire = create_packet(kind, &text);
        let (packet, consumed) = extract_from_buffer(&wire).expect("valid packet");
        prop_assert_eq!(consumed, wire.len());
        prop_assert_eq!(packet.kind, kind);
        prop_assert_eq!(packet.text, text);
    }

    #[test]
    fn prop_chunking_is_irrelevant(
        kinds in prop::collection::vec(any::<u32>(), 1..8),
        texts in prop::collection::vec("[a-zA-Z0-9 ]{0,40}", 1..8),
        chunk_size in 1usize..7,
    ) {
        let n = kinds.len().min(texts.len());
        let mut wire = Vec::new();
        let mut expected = Vec::new();
        for i in 0..n {
            wire.extend(create_packet(kinds[i], &texts[i]));
            expected.push((kinds[i], texts[i].clone()));
        }

        let mut fb = FrameBuffer::new();
        let mut seen = Vec::new();
        for chunk in wire.chunks(chunk_size) {
            fb.push(chunk);
            while let Some(packet) = fb.pop().expect("not damaged") {
                seen.push((packet.kind, packet.text));
            }
        }
        prop_assert_eq!(seen, expected);
    }
}
