// Recurring task - coarse timer thread driving the scheduler tick
//
// The timer only decides *when* to look ahead; accuracy comes from the
// audio clock. Cancellation wakes the thread immediately and `cancel`
// returns once the last tick has finished.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct RecurringTask {
    cancel_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RecurringTask {
    /// Run `tick` once right away, then every `interval` until cancelled
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (cancel_tx, cancel_rx): (Sender<()>, Receiver<()>) = bounded(1);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                tick();
                loop {
                    match cancel_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => tick(),
                        // Cancelled, or the owner went away
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        log::debug!("Started recurring task '{}' every {:?}", name, interval);

        Ok(Self {
            cancel_tx: Some(cancel_tx),
            handle: Some(handle),
        })
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop the timer and wait for an in-flight tick to finish.
    /// Idempotent. Must not be called while holding a lock the tick takes.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Recurring task panicked");
            }
        }
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_ticks_immediately_and_repeats() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let mut task = RecurringTask::spawn("test-tick", Duration::from_millis(5), move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(60));
        task.cancel();
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_no_tick_after_cancel() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let mut task = RecurringTask::spawn("test-cancel", Duration::from_millis(2), move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(10));
        task.cancel();
        assert!(!task.is_active());

        let after_cancel = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);

        // Second cancel is a no-op
        task.cancel();
    }

    #[test]
    fn test_cancel_interrupts_long_interval() {
        let mut task =
            RecurringTask::spawn("test-long", Duration::from_secs(3600), || {}).unwrap();
        let started = std::time::Instant::now();
        task.cancel();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
