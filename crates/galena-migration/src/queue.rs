//! Serial event queue for the driver worker.
//!
//! Single consumer, many producers. Producers append at the tail, prepend
//! at the head, or schedule at a deadline; the worker blocks in
//! [`EventQueue::next`] until an event is runnable. Submission order is
//! preserved within the FIFO, and deferred events with equal deadlines
//! fire in submission order.
//!
//! Close is a soft signal: queued events still drain, not-yet-due
//! deferred events are dropped, and producers get their event handed back
//! (`SubmitResult::Closed`) instead of an accepted submission.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of submitting an event.
#[derive(Debug)]
pub enum SubmitResult<E> {
    /// Event was accepted.
    Accepted,
    /// Queue is closed. Returns the event for the caller to handle.
    Closed(E),
}

impl<E> SubmitResult<E> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitResult::Accepted)
    }
}

/// A deferred entry; ordered by deadline, then submission sequence.
struct Deferred<E> {
    deadline: Instant,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Deferred<E> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<E> Eq for Deferred<E> {}

impl<E> PartialOrd for Deferred<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Deferred<E> {
    // BinaryHeap is a max-heap; invert so the earliest entry surfaces first.
    fn cmp(&self, other: &Self) -> Ordering {
        (other.deadline, other.seq).cmp(&(self.deadline, self.seq))
    }
}

struct Inner<E> {
    fifo: VecDeque<E>,
    deferred: BinaryHeap<Deferred<E>>,
    next_seq: u64,
    closed: bool,
}

/// A serial FIFO with a deadline-ordered side structure.
pub struct EventQueue<E> {
    inner: Mutex<Inner<E>>,
    ready: Condvar,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                fifo: VecDeque::new(),
                deferred: BinaryHeap::new(),
                next_seq: 0,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues at the tail.
    pub fn append(&self, event: E) -> SubmitResult<E> {
        let mut inner = self.lock();
        if inner.closed {
            return SubmitResult::Closed(event);
        }
        inner.fifo.push_back(event);
        drop(inner);
        self.ready.notify_one();
        SubmitResult::Accepted
    }

    /// Enqueues at the head, ahead of everything already queued.
    pub fn prepend(&self, event: E) -> SubmitResult<E> {
        let mut inner = self.lock();
        if inner.closed {
            return SubmitResult::Closed(event);
        }
        inner.fifo.push_front(event);
        drop(inner);
        self.ready.notify_one();
        SubmitResult::Accepted
    }

    /// Enqueues to fire no earlier than `delay` from now.
    pub fn schedule(&self, delay: Duration, event: E) -> SubmitResult<E> {
        let mut inner = self.lock();
        if inner.closed {
            return SubmitResult::Closed(event);
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.deferred.push(Deferred {
            deadline: Instant::now() + delay,
            seq,
            event,
        });
        drop(inner);
        self.ready.notify_one();
        SubmitResult::Accepted
    }

    /// Stops accepting submissions. Already-queued events still drain;
    /// deferred events that are not yet due are discarded.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        drop(inner);
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Moves every due deferred entry to the FIFO tail, in deadline order.
    fn promote_due(inner: &mut Inner<E>, now: Instant) {
        while inner
            .deferred
            .peek()
            .is_some_and(|entry| entry.deadline <= now)
        {
            if let Some(entry) = inner.deferred.pop() {
                inner.fifo.push_back(entry.event);
            }
        }
    }

    /// Blocks until the next event is runnable. Returns `None` once the
    /// queue is closed and drained.
    pub fn next(&self) -> Option<E> {
        let mut inner = self.lock();
        loop {
            Self::promote_due(&mut inner, Instant::now());
            if let Some(event) = inner.fifo.pop_front() {
                return Some(event);
            }
            if inner.closed {
                return None;
            }
            match inner.deferred.peek().map(|entry| entry.deadline) {
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    let (guard, _timed_out) = self
                        .ready
                        .wait_timeout(inner, wait)
                        .unwrap_or_else(PoisonError::into_inner);
                    inner = guard;
                }
                None => {
                    inner = self
                        .ready
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Non-blocking variant of [`EventQueue::next`]: returns a runnable
    /// event if one exists right now.
    pub fn try_next(&self) -> Option<E> {
        let mut inner = self.lock();
        Self::promote_due(&mut inner, Instant::now());
        inner.fifo.pop_front()
    }

    /// Number of immediately runnable events.
    pub fn len(&self) -> usize {
        self.lock().fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().fifo.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
