// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{Read, Write};
use std::net::TcpListener as StdTcpListener;

use tokio::net::TcpStream;
use wmonkey_core::{create_packet, extract_from_buffer, split_to_executable_parts, ToAgent};

use super::*;

#[derive(Default)]
struct RecordingSink {
    events: Vec<OutgoingEvent>,
}

impl OutputSink for RecordingSink {
    fn emit(&mut self, event: &OutgoingEvent) {
        self.events.push(event.clone());
    }
}

async fn connected_pair() -> (Channel, std::net::TcpStream) {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = std::thread::spawn(move || listener.accept().expect("accept").0);
    let client = TcpStream::connect(addr).await.expect("connect");
    let server_side = server.join().expect("accept thread panicked");
    (Channel::spawn(client, CancellationToken::new()), server_side)
}

#[tokio::test(flavor = "multi_thread")]
async fn try_dispatch_next_sends_filename_then_script() {
    let (channel, mut peer) = connected_pair().await;
    let mut queue = ScriptQueue::new();
    queue.enqueue_all(split_to_executable_parts("a.js", "Test.log(\"hi\");\n"));
    let mut sink = RecordingSink::default();

    try_dispatch_next(&mut queue, &Some(channel), &mut sink).await;
    assert!(queue.script_running());

    let mut buf = vec![0u8; 256];
    let n = peer.read(&mut buf).expect("read");
    buf.truncate(n);
    let (first, consumed) = extract_from_buffer(&buf).expect("first packet");
    assert_eq!(first.kind, ToAgent::SetScriptFileName as u32);
    assert_eq!(first.text, "a.js");
    let (second, _) = extract_from_buffer(&buf[consumed..]).expect("second packet");
    assert_eq!(second.kind, ToAgent::RunScript as u32);
    assert_eq!(second.text, "Test.log(\"hi\");\n");
}

#[tokio::test]
async fn try_dispatch_next_is_a_noop_without_a_connected_agent() {
    let mut queue = ScriptQueue::new();
    queue.enqueue_all(split_to_executable_parts("a.js", "Test.log(\"hi\");\n"));
    let mut sink = RecordingSink::default();

    try_dispatch_next(&mut queue, &None, &mut sink).await;
    assert!(!queue.script_running());
    assert_eq!(queue.action(), QueueAction::Ready);
}

#[tokio::test]
async fn new_user_app_event_emits_a_nested_event_line() {
    let mut queue = ScriptQueue::new();
    let mut sink = RecordingSink::default();
    let mut script_error_seen = false;
    let packet = wmonkey_core::Packet {
        kind: ToController::NewUserAppEvent as u32,
        text: "Test.log(\"hi\");".to_string(),
    };

    handle_agent_packet(packet, &mut queue, None, &mut sink, &mut script_error_seen).await;

    assert_eq!(
        sink.events,
        vec![OutgoingEvent::Event { script: "Test.log(\"hi\");".to_string() }]
    );
    assert!(!script_error_seen);
}

#[tokio::test]
async fn script_error_flags_seen_and_frees_the_queue() {
    let mut queue = ScriptQueue::new();
    queue.enqueue_all(split_to_executable_parts("a.js", "Test.fail();\n"));
    queue.dispatch_next().expect("dispatches");
    assert!(queue.script_running());

    let mut sink = RecordingSink::default();
    let mut script_error_seen = false;
    let packet = wmonkey_core::Packet {
        kind: ToController::ScriptError as u32,
        text: "boom".to_string(),
    };
    handle_agent_packet(packet, &mut queue, None, &mut sink, &mut script_error_seen).await;

    assert!(script_error_seen);
    assert!(!queue.script_running());
    assert_eq!(sink.events, vec![OutgoingEvent::AppErrors("boom".to_string())]);
}

#[tokio::test]
async fn script_end_frees_the_queue_without_flagging_an_error() {
    let mut queue = ScriptQueue::new();
    queue.enqueue_all(split_to_executable_parts("a.js", "Test.log(\"ok\");\n"));
    queue.dispatch_next().expect("dispatches");

    let mut sink = RecordingSink::default();
    let mut script_error_seen = false;
    let packet = wmonkey_core::Packet { kind: ToController::ScriptEnd as u32, text: String::new() };
    handle_agent_packet(packet, &mut queue, None, &mut sink, &mut script_error_seen).await;

    assert!(!script_error_seen);
    assert!(!queue.script_running());
    assert_eq!(sink.events, vec![OutgoingEvent::ScriptEnd]);
}

#[tokio::test(flavor = "multi_thread")]
async fn close_sends_close_ack_back_over_the_channel() {
    let (channel, mut peer) = connected_pair().await;
    let mut queue = ScriptQueue::new();
    let mut sink = RecordingSink::default();
    let mut script_error_seen = false;
    let packet = wmonkey_core::Packet { kind: ToController::Close as u32, text: String::new() };

    handle_agent_packet(packet, &mut queue, Some(&channel), &mut sink, &mut script_error_seen).await;

    let mut buf = vec![0u8; 64];
    let n = peer.read(&mut buf).expect("read close ack");
    buf.truncate(n);
    let (packet, _) = extract_from_buffer(&buf).expect("valid packet");
    assert_eq!(packet.kind, ToAgent::CloseAck as u32);
}

#[test]
fn create_packet_round_trips_for_sanity() {
    let wire = create_packet(0, "hi");
    let (packet, consumed) = extract_from_buffer(&wire).expect("valid");
    assert_eq!(consumed, wire.len());
    assert_eq!(packet.text, "hi");
}
