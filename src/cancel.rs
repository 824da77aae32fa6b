use crossbeam::channel::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Token for cooperative cancellation of the watch loop.
///
/// Besides the flag, the token owns a channel that disconnects on cancel,
/// so a loop blocked in `select!` on [`signal`](Self::signal) wakes up
/// immediately. Clone is cheap and shares state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Create a new cancellation token (not cancelled).
    pub fn new() -> Self {
        let (trigger, signal) = channel::bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation. Safe to call from a signal handler thread.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        if let Ok(mut trigger) = self.inner.trigger.lock() {
            trigger.take();
        }
    }

    /// Channel that never delivers and disconnects once cancelled.
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.signal().recv_timeout(Duration::from_millis(10)).is_err());
    }

    #[test]
    fn cancel_is_shared_by_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_disconnects_signal() {
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(
            token.signal().recv(),
            Err(crossbeam::channel::RecvError)
        );
    }

    #[test]
    fn cancel_wakes_blocked_receiver() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = std::thread::spawn(move || waiter.signal().recv().is_err());
        std::thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert!(handle.join().unwrap());
    }
}
