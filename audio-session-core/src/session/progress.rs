#[cfg(test)]
use std::cell::Cell;
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// Recurring progress timer on a dedicated thread.
///
/// Between ticks the thread waits on a cancellation channel, so `cancel`
/// wakes it immediately instead of letting it sleep out the interval. The
/// tick closure returns `false` to end the loop on its own.
pub(crate) struct ProgressTicker {
    cancel: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressTicker {
    pub(crate) fn spawn<T>(interval: Duration, mut tick: T) -> io::Result<Self>
    where
        T: FnMut() -> bool + Send + 'static,
    {
        #[cfg(test)]
        if FAIL_NEXT_SPAWN.with(|fail| fail.replace(false)) {
            return Err(io::Error::other("thread limit reached"));
        }

        let interval = interval.max(Duration::from_millis(1));
        let (cancel, cancelled) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("recorder-progress".into())
            .spawn(move || loop {
                match cancelled.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !tick() {
                            break;
                        }
                    }
                    // Explicit signal or sender dropped: either way, done.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            cancel: Some(cancel),
            handle: Some(handle),
        })
    }

    /// Wake the thread and make it exit. Does not wait for it.
    pub(crate) fn cancel(&mut self) {
        self.cancel.take();
    }

    /// Cancel and wait for the thread to finish.
    ///
    /// A no-op when called from the progress thread itself (e.g. when a tick
    /// ends the session).
    pub(crate) fn join(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::error!("Progress thread panicked");
            }
        }
    }
}

#[cfg(test)]
thread_local! {
    static FAIL_NEXT_SPAWN: Cell<bool> = const { Cell::new(false) };
}

/// Make the next `spawn` on this thread fail.
#[cfg(test)]
pub(crate) fn fail_next_spawn() {
    FAIL_NEXT_SPAWN.with(|fail| fail.set(true));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn ticks_until_closure_returns_false() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let ticker = ProgressTicker::spawn(Duration::from_millis(2), move || {
            counter.fetch_add(1, Ordering::SeqCst) + 1 < 3
        })
        .unwrap();
        ticker.join_after_exit();

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cancel_wakes_thread_before_interval() {
        let ticker = ProgressTicker::spawn(Duration::from_secs(60), || true).unwrap();

        let started = Instant::now();
        ticker.join();

        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancelled_ticker_never_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let mut ticker = ProgressTicker::spawn(Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();
        ticker.cancel();
        ticker.join();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn spawn_failure_is_reported() {
        fail_next_spawn();
        let err = ProgressTicker::spawn(Duration::from_millis(5), || true).err().unwrap();
        assert_eq!(err.to_string(), "thread limit reached");

        // Only the next spawn fails.
        ProgressTicker::spawn(Duration::from_secs(60), || true).unwrap().join();
    }

    impl ProgressTicker {
        /// Wait for a loop that ends on its own, without cancelling it.
        fn join_after_exit(mut self) {
            if let Some(handle) = self.handle.take() {
                handle.join().unwrap();
            }
        }
    }
}
