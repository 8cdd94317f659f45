use std::time::Duration;

use crossbeam_channel::{bounded, never, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Creates a linked stop handle and signal. Dropping or stopping the handle
/// wakes every clone of the signal.
pub fn stop_pair() -> (StopHandle, StopSignal) {
    let (tx, rx) = bounded(0);
    (StopHandle { _tx: tx }, StopSignal { rx })
}

#[derive(Debug)]
pub struct StopHandle {
    _tx: Sender<()>,
}

impl StopHandle {
    pub fn stop(self) {
        drop(self);
    }
}

/// Cancellation token checked at every sleep boundary of a background loop.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: Receiver<()>,
}

impl StopSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: never() }
    }

    /// Sleeps for `duration` unless stopped first. Returns `true` when the
    /// full duration elapsed and the loop should continue.
    pub fn wait(&self, duration: Duration) -> bool {
        match self.rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => true,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn never_signal_sleeps_full_duration() {
        let signal = StopSignal::never();
        let started = Instant::now();
        assert!(signal.wait(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(!signal.is_stopped());
    }

    #[test]
    fn stop_wakes_sleeping_waiter() {
        let (handle, signal) = stop_pair();
        let waiter = thread::spawn(move || {
            let started = Instant::now();
            let kept_going = signal.wait(Duration::from_secs(60));
            (kept_going, started.elapsed())
        });
        thread::sleep(Duration::from_millis(20));
        handle.stop();
        let (kept_going, elapsed) = waiter.join().unwrap();
        assert!(!kept_going);
        assert!(elapsed < Duration::from_secs(30));
    }

    #[test]
    fn clones_observe_the_same_stop() {
        let (handle, signal) = stop_pair();
        let clone = signal.clone();
        assert!(!clone.is_stopped());
        drop(handle);
        assert!(signal.is_stopped());
        assert!(clone.is_stopped());
        assert!(!clone.wait(Duration::from_secs(5)));
    }
}
