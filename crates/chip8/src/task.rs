use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::error::Chip8Error;

/// A named thread running a piece of work at a fixed rate until cancelled.
///
/// The period is asked for again before every firing, so rate changes
/// apply from the next firing on. When the work falls behind, the
/// schedule restarts from the current instant instead of bursting to
/// catch up.
pub struct PeriodicTask {
    name: String,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn a thread named `name` that sleeps for `period()` and then
    /// runs `work()`, over and over.
    pub fn spawn<P, W>(name: &str, mut period: P, mut work: W) -> Result<Self, Chip8Error>
    where
        P: FnMut() -> Duration + Send + 'static,
        W: FnMut() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut next_firing = Instant::now();
                loop {
                    next_firing += period();
                    let now = Instant::now();
                    if next_firing > now {
                        spin_sleep::sleep(next_firing - now);
                    } else {
                        next_firing = now;
                    }

                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    work();
                }
            })
            .map_err(|source| Chip8Error::TaskSpawn {
                name: name.to_string(),
                source,
            })?;

        log::trace!("Spawned {name} task");
        Ok(Self {
            name: name.to_string(),
            cancelled,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the thread is still scheduled.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    /// Stop the task and wait for its thread to exit.
    ///
    /// Once this returns no firing is in progress and none will start.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("The {} task panicked", self.name);
            } else {
                log::trace!("Cancelled {} task", self.name);
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_runs_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut task = PeriodicTask::spawn(
            "test",
            || Duration::from_millis(1),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();
        assert_eq!(task.name(), "test");

        let deadline = Instant::now() + Duration::from_secs(5);
        while count.load(Ordering::SeqCst) < 5 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(task.is_active());
        assert!(count.load(Ordering::SeqCst) >= 5);

        task.cancel();
        assert!(!task.is_active());
        let stopped_at = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), stopped_at);
    }

    #[test]
    fn test_cancel_twice() {
        let mut task = PeriodicTask::spawn("idle", || Duration::from_millis(1), || {}).unwrap();
        task.cancel();
        task.cancel();
        assert!(!task.is_active());
    }

    #[test]
    fn test_panicking_work_is_reported_on_cancel() {
        let mut task =
            PeriodicTask::spawn("panics", || Duration::from_millis(1), || panic!("boom")).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while task.is_active() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!task.is_active());
        task.cancel();
    }
}
