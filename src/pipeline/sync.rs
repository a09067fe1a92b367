// ttacore -- A reentrant, byte-exact codec for the TTA1 lossless format.
// Copyright (C) 2014-2026 ttacore contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Synchronization primitives for the frame pipeline (§4.8/§5): a counting
//! semaphore built on `Mutex`+`Condvar`, and a spinlock-guarded ring cursor
//! built on `AtomicUsize`. The pipeline uses exactly these two primitives
//! rather than a channel abstraction because the handoff they model is not
//! a queue of messages but ownership of a fixed, pre-allocated ring slot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// A classic counting semaphore. `post` increments the count and wakes one
/// waiter; `wait` blocks until the count is positive, then decrements it.
pub struct Semaphore {
    count: Mutex<usize>,
    ready: Condvar,
}

impl Semaphore {
    pub fn new(initial: usize) -> Self {
        Semaphore { count: Mutex::new(initial), ready: Condvar::new() }
    }

    pub fn post(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.ready.notify_one();
    }

    pub fn wait(&self) {
        let mut count = self.count.lock().unwrap();
        while *count == 0 {
            count = self.ready.wait(count).unwrap();
        }
        *count -= 1;
    }
}

/// Monotonic ring cursor shared by every worker. `take_next` is the only
/// contention point in the pipeline (§5): a spin loop on a
/// compare-and-swap rather than a `Mutex`, since the critical section is a
/// single increment-and-wrap.
pub struct RingCursor {
    next: AtomicUsize,
    ring_len: usize,
}

impl RingCursor {
    pub fn new(ring_len: usize) -> Self {
        assert!(ring_len > 0, "ring_len must be positive");
        RingCursor { next: AtomicUsize::new(0), ring_len }
    }

    /// Atomically returns the next ring index and advances the cursor,
    /// wrapping modulo `ring_len`.
    pub fn take_next(&self) -> usize {
        loop {
            let current = self.next.load(Ordering::Acquire);
            let advanced = (current + 1) % self.ring_len;
            if self
                .next
                .compare_exchange_weak(current, advanced, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return current;
            }
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn semaphore_wait_consumes_one_post_per_call() {
        let sem = Semaphore::new(0);
        sem.post();
        sem.post();
        sem.wait();
        sem.wait();
        // A third wait would block forever; we stop here rather than
        // proving a negative.
    }

    #[test]
    fn ring_cursor_wraps_and_never_double_issues_under_contention() {
        let cursor = Arc::new(RingCursor::new(4));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cursor = Arc::clone(&cursor);
            handles.push(thread::spawn(move || {
                let mut taken = Vec::with_capacity(50);
                for _ in 0..50 {
                    taken.push(cursor.take_next());
                }
                taken
            }));
        }
        let mut all = Vec::new();
        for h in handles {
            all.extend(h.join().unwrap());
        }
        assert_eq!(all.len(), 400);
        assert!(all.iter().all(|&i| i < 4));
    }
}
