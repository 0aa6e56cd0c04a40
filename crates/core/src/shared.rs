// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A mutex-guarded cell reachable only through a scoped handle.

use parking_lot::{Mutex, MutexGuard};

/// A value of type `T` protected by a mutex. The only way to read or
/// mutate it is through [`SharedCell::lock`], which returns a scoped
/// handle holding the mutex for its lifetime.
///
/// Handles must not be held across suspension points (blocking GUI
/// round trips, socket reads); they exist to guard brief, synchronous
/// critical sections only.
#[derive(Debug)]
pub struct SharedCell<T> {
    inner: Mutex<T>,
}

impl<T> SharedCell<T> {
    pub fn new(value: T) -> Self {
        Self { inner: Mutex::new(value) }
    }

    /// Acquire the scoped handle. Blocks until no other handle is live.
    pub fn lock(&self) -> SharedHandle<'_, T> {
        SharedHandle { guard: self.inner.lock() }
    }
}

/// A scoped handle holding the cell's mutex. Dropping it releases the
/// lock.
pub struct SharedHandle<'a, T> {
    guard: MutexGuard<'a, T>,
}

impl<T> std::ops::Deref for SharedHandle<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> std::ops::DerefMut for SharedHandle<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_mutates_through_deref() {
        let cell = SharedCell::new(vec![1, 2, 3]);
        cell.lock().push(4);
        assert_eq!(*cell.lock(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn concurrent_access_is_serialized() {
        use std::sync::Arc;
        use std::thread;

        let cell = Arc::new(SharedCell::new(0u64));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    *cell.lock() += 1;
                }
            }));
        }
        for h in handles {
            h.join().expect("worker thread panicked");
        }
        assert_eq!(*cell.lock(), 8000);
    }
}
