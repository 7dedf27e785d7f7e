//! One-shot blocking futures.
//!
//! The driver has no async runtime; a long-running event simply blocks
//! its worker. [`Completion`] is the synchronous future the record
//! consumer and the control surface hand back: the worker waits on it
//! with a deadline, the producer resolves it from whichever thread
//! commits the value.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use thiserror::Error;

/// Why a wait on a [`Completion`] returned without a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaitError {
    #[error("wait deadline elapsed")]
    TimedOut,

    #[error("completer dropped without a value")]
    Abandoned,
}

/// Write half of a one-shot completion.
pub struct Completer<T> {
    tx: Sender<T>,
}

impl<T> Completer<T> {
    /// Resolves the completion. A dropped read half is fine; the value is
    /// discarded.
    pub fn complete(self, value: T) {
        let _ = self.tx.send(value);
    }
}

/// Read half: blocks until resolved or a deadline passes.
pub struct Completion<T> {
    rx: Receiver<T>,
}

impl<T> Completion<T> {
    /// An already-resolved completion.
    pub fn ready(value: T) -> Self {
        let (completer, completion) = completion();
        completer.complete(value);
        completion
    }

    /// Blocks until the value arrives.
    pub fn wait(self) -> Result<T, WaitError> {
        self.rx.recv().map_err(|_| WaitError::Abandoned)
    }

    /// Blocks until the value arrives or `timeout` elapses.
    pub fn wait_for(self, timeout: Duration) -> Result<T, WaitError> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => Err(WaitError::TimedOut),
            Err(RecvTimeoutError::Disconnected) => Err(WaitError::Abandoned),
        }
    }

    /// Returns the value if already resolved, without blocking.
    pub fn try_take(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

/// Creates a connected completer/completion pair.
pub fn completion<T>() -> (Completer<T>, Completion<T>) {
    let (tx, rx) = mpsc::channel();
    (Completer { tx }, Completion { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn ready_resolves_immediately() {
        let done = Completion::ready(7);
        assert_eq!(done.wait_for(Duration::from_millis(10)), Ok(7));
    }

    #[test]
    fn wait_times_out() {
        let (_completer, pending) = completion::<u32>();
        assert_eq!(
            pending.wait_for(Duration::from_millis(5)),
            Err(WaitError::TimedOut)
        );
    }

    #[test]
    fn dropped_completer_is_abandoned() {
        let (completer, pending) = completion::<u32>();
        drop(completer);
        assert_eq!(
            pending.wait_for(Duration::from_millis(5)),
            Err(WaitError::Abandoned)
        );
    }

    #[test]
    fn resolves_across_threads() {
        let (completer, pending) = completion();
        let producer = thread::spawn(move || completer.complete("done"));
        assert_eq!(pending.wait_for(Duration::from_secs(5)), Ok("done"));
        producer.join().unwrap();
    }
}
