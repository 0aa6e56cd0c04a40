// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;
use std::thread;

#[test]
fn acquire_blocks_until_release() {
    let sem = Arc::new(Semaphore::new(0));
    let worker_sem = Arc::clone(&sem);

    let handle = thread::spawn(move || {
        worker_sem.acquire();
        "acquired"
    });

    thread::sleep(Duration::from_millis(50));
    sem.release();

    assert_eq!(handle.join().expect("worker panicked"), "acquired");
}

#[test]
fn try_acquire_times_out_with_no_permits() {
    let sem = Semaphore::new(0);
    let start = Instant::now();
    assert!(!sem.try_acquire(Duration::from_millis(100)));
    assert!(start.elapsed() >= Duration::from_millis(90));
}

#[test]
fn try_acquire_succeeds_immediately_with_permit() {
    let sem = Semaphore::new(1);
    assert!(sem.try_acquire(Duration::from_secs(1)));
}

#[test]
fn permits_are_conserved_under_contention() {
    let sem = Arc::new(Semaphore::new(4));
    let mut handles = Vec::new();
    let acquired = Arc::new(std::sync::atomic::AtomicU64::new(0));

    for _ in 0..4 {
        let sem = Arc::clone(&sem);
        let acquired = Arc::clone(&acquired);
        handles.push(thread::spawn(move || {
            sem.acquire();
            acquired.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));
    }
    for h in handles {
        h.join().expect("worker panicked");
    }
    assert_eq!(acquired.load(std::sync::atomic::Ordering::SeqCst), 4);
    assert!(!sem.try_acquire(Duration::from_millis(20)));
}
