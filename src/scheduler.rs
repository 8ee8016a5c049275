//! Fixed-cadence polling timer.
//!
//! One dedicated thread invokes the tick callback, sleeps for the interval,
//! and repeats. A tick that overruns the interval simply delays the next
//! tick; there is no overlap and no frame-dropping policy. Stop means "no
//! further ticks are scheduled" and joins the thread; it is not an interrupt.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub struct PollTimer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PollTimer {
    /// Spawn the polling thread and start ticking.
    pub fn start<F>(interval: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = std::thread::Builder::new()
            .name("chainwatch-poll".to_string())
            .spawn(move || {
                while flag.load(Ordering::Relaxed) {
                    tick();
                    std::thread::sleep(interval);
                }
            })
            .context("spawn polling thread")?;
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop scheduling ticks and wait for the thread to finish. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("polling thread panicked");
            }
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn ticks_until_stopped_then_never_again() -> Result<()> {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let mut timer = PollTimer::start(Duration::from_millis(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })?;

        while count.load(Ordering::SeqCst) < 3 {
            std::thread::sleep(Duration::from_millis(1));
        }
        timer.stop();

        let after_stop = count.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
        Ok(())
    }

    #[test]
    fn stop_is_idempotent() -> Result<()> {
        let mut timer = PollTimer::start(Duration::from_millis(1), || {})?;
        timer.stop();
        timer.stop();
        Ok(())
    }
}
