// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Cursor;
use std::time::Duration;

use super::*;

#[tokio::test]
async fn bytes_written_by_the_source_surface_through_take_bytes() {
    let bridge = StdinBridge::spawn_from(Box::new(Cursor::new(b"hello".to_vec())));

    tokio::time::timeout(Duration::from_secs(1), bridge.notified())
        .await
        .expect("notified within timeout");

    // Give the reader thread a moment to push the remaining bytes too.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let bytes = bridge.take_bytes();
    assert_eq!(bytes, b"hello".to_vec());
}

#[tokio::test]
async fn take_bytes_drains_the_buffer() {
    let bridge = StdinBridge::spawn_from(Box::new(Cursor::new(b"ab".to_vec())));
    tokio::time::sleep(Duration::from_millis(20)).await;
    let first = bridge.take_bytes();
    assert_eq!(first, b"ab".to_vec());
    let second = bridge.take_bytes();
    assert!(second.is_empty());
}
