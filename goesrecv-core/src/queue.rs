//! Bounded hand-off channel shared by exactly one producer and one consumer.
//!
//! Ported from the two-deque `Queue<T>` pattern used by the original
//! `goesrecv` C++ demodulator: a write side holds empty, reusable buffers and
//! a read side holds filled ones. Buffers are minted lazily up to `capacity`
//! and then recycled forever, so steady-state operation does no allocation.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

struct Inner<T> {
    write: VecDeque<T>,
    read: VecDeque<T>,
    elements: usize,
    closed: bool,
}

/// A bounded, two-ended hand-off queue.
///
/// `capacity` bounds the total number of buffers ever minted, which bounds
/// `popForWrite`'s allocation and gives the queue its back-pressure: once all
/// `capacity` buffers are in flight downstream, the producer blocks until the
/// consumer returns one.
pub struct Queue<T> {
    inner: Mutex<Inner<T>>,
    cond: Condvar,
    capacity: usize,
}

impl<T> Queue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            inner: Mutex::new(Inner {
                write: VecDeque::new(),
                read: VecDeque::new(),
                elements: 0,
                closed: false,
            }),
            cond: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffers currently minted (on either side of the queue).
    pub fn minted(&self) -> usize {
        self.inner.lock().unwrap().elements
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    /// Mark the queue closed and wake every waiter.
    ///
    /// Idempotent: closing an already-closed queue is a no-op.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        self.cond.notify_all();
    }
}

impl<T: Default> Queue<T> {
    /// Producer: obtain an owned, empty buffer to fill.
    ///
    /// Mints a fresh `T::default()` while under `capacity`; otherwise blocks
    /// until the consumer returns one via [`push_read`](Self::push_read).
    ///
    /// Calling this on a closed queue is a programming error: a
    /// well-behaved producer checks
    /// [`is_closed`](Self::is_closed) before requesting a buffer instead of
    /// racing this assertion during shutdown.
    pub fn pop_for_write(&self) -> T {
        let mut inner = self.inner.lock().unwrap();
        assert!(
            !inner.closed,
            "pop_for_write called on a closed queue: producer must check is_closed() first"
        );

        if inner.write.is_empty() {
            if inner.elements < self.capacity {
                inner.elements += 1;
                inner.write.push_back(T::default());
            } else {
                while inner.write.is_empty() {
                    inner = self.cond.wait(inner).unwrap();
                }
            }
        }

        inner.write.pop_front().expect("write side non-empty by construction")
    }
}

impl<T> Queue<T> {
    /// Producer: hand a filled buffer to the read side; wakes a waiting consumer.
    pub fn push_write(&self, value: T) {
        let mut inner = self.inner.lock().unwrap();
        assert!(!inner.closed, "push_write called on a closed queue");
        inner.read.push_back(value);
        self.cond.notify_all();
    }

    /// Consumer: obtain the next filled buffer in FIFO order, or `None` at EOF.
    ///
    /// Blocks while the queue is open and empty; once the queue is closed the
    /// remaining filled buffers drain normally and only then does this return
    /// `None`.
    pub fn pop_for_read(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        while inner.read.is_empty() && !inner.closed {
            inner = self.cond.wait(inner).unwrap();
        }

        if let Some(value) = inner.read.pop_front() {
            Some(value)
        } else {
            debug_assert!(inner.closed);
            None
        }
    }

    /// Consumer: return a drained buffer to the write side for reuse.
    ///
    /// A no-op on a closed queue: the buffer is simply dropped. Subsequent
    /// writes are a programming error; a drained-buffer return is always
    /// safe, even after closure.
    pub fn push_read(&self, value: T) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.closed {
            inner.write.push_back(value);
            self.cond.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn pop_for_write_mints_up_to_capacity_then_recycles() {
        let q: Queue<Vec<u8>> = Queue::new(2);
        let a = q.pop_for_write();
        let b = q.pop_for_write();
        assert_eq!(q.minted(), 2);
        q.push_write(a);
        q.push_write(b);

        let ra = q.pop_for_read().unwrap();
        let rb = q.pop_for_read().unwrap();
        q.push_read(ra);
        q.push_read(rb);
        assert_eq!(q.minted(), 2, "recycling must not mint past capacity");
    }

    #[test]
    fn fifo_order_is_preserved() {
        let q: Queue<i32> = Queue::new(4);
        for v in [1, 2, 3] {
            let mut buf = q.pop_for_write();
            buf = v;
            q.push_write(buf);
        }
        assert_eq!(q.pop_for_read(), Some(1));
        assert_eq!(q.pop_for_read(), Some(2));
        assert_eq!(q.pop_for_read(), Some(3));
    }

    #[test]
    fn pop_for_read_returns_none_after_close_drains() {
        let q: Queue<i32> = Queue::new(2);
        let mut buf = q.pop_for_write();
        buf = 42;
        q.push_write(buf);
        q.close();

        assert_eq!(q.pop_for_read(), Some(42), "filled buffers drain before EOF");
        assert_eq!(q.pop_for_read(), None, "closed and empty yields EOF");
    }

    #[test]
    fn push_read_on_closed_queue_drops_buffer() {
        let q: Queue<i32> = Queue::new(1);
        q.close();
        q.push_read(7); // must not panic; buffer is simply dropped
    }

    #[test]
    #[should_panic(expected = "pop_for_write called on a closed queue")]
    fn pop_for_write_on_closed_queue_panics() {
        let q: Queue<i32> = Queue::new(1);
        q.close();
        q.pop_for_write();
    }

    #[test]
    fn blocked_pop_for_write_wakes_on_push_read() {
        let q: Arc<Queue<i32>> = Arc::new(Queue::new(1));
        let first = q.pop_for_write();
        q.push_write(first);
        let taken = q.pop_for_read().unwrap();

        let q2 = Arc::clone(&q);
        let handle = thread::spawn(move || {
            // All `capacity` buffers are out (in the reader's hand); this
            // must block until the main thread calls push_read.
            q2.pop_for_write()
        });

        thread::sleep(Duration::from_millis(50));
        q.push_read(taken);

        let got = handle.join().unwrap();
        assert_eq!(got, 0, "recycled buffer resets to T::default()");
    }

    #[test]
    fn blocked_pop_for_read_wakes_on_close() {
        let q: Arc<Queue<i32>> = Arc::new(Queue::new(1));
        let q2 = Arc::clone(&q);
        let handle = thread::spawn(move || q2.pop_for_read());

        thread::sleep(Duration::from_millis(50));
        q.close();

        assert_eq!(handle.join().unwrap(), None);
    }

    #[test]
    fn bounded_total_live_buffers_never_exceeds_capacity() {
        let q: Queue<i32> = Queue::new(3);
        let mut writes = Vec::new();
        for _ in 0..3 {
            writes.push(q.pop_for_write());
        }
        assert_eq!(q.minted(), 3);
        // A further pop_for_write would block forever (no capacity left and
        // nothing pushed back yet); instead assert the minted count is capped.
        for v in writes {
            q.push_write(v);
        }
    }
}
