//! Repeating scheduled tasks with an explicit stop handle.
//!
//! A [`Scheduler`] runs a task once immediately and then on a fixed-rate
//! deadline. Deadlines never wait for earlier runs: a run that is still
//! in flight when the next deadline arrives simply overlaps with it.
//! [`ThreadScheduler`] fires each run on its own thread in real time;
//! [`ManualScheduler`] advances a virtual clock under test control and
//! runs tasks inline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Work item run on every tick. Runs may overlap, so it is shared.
pub type Task = Arc<dyn Fn() + Send + Sync + 'static>;

/// Shortest interval a task is scheduled at; shorter ones are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub trait Scheduler {
    /// Start running `task` every `interval` until the handle is stopped.
    fn schedule_repeating(&self, interval: Duration, task: Task) -> TaskHandle;
}

/// Stop handle for a scheduled task. Dropping the handle stops the task.
#[derive(Debug)]
pub struct TaskHandle {
    running: Arc<AtomicBool>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop firing new runs. Runs already in flight finish on their own.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Next fixed-rate deadline strictly after `now`. `interval` must be non-zero.
fn next_deadline(mut next: Instant, interval: Duration, now: Instant) -> Instant {
    while next <= now {
        next += interval;
    }
    next
}

// ---------------------------------------------------------------------------
// Real-time scheduler
// ---------------------------------------------------------------------------

/// Keeps the clock on a worker thread and fires every run on a fresh thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn schedule_repeating(&self, interval: Duration, task: Task) -> TaskHandle {
        let interval = interval.max(MIN_INTERVAL);
        let running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let flag = Arc::clone(&running);

        let worker = thread::spawn(move || {
            let mut next = Instant::now();
            while flag.load(Ordering::SeqCst) {
                let run = Arc::clone(&task);
                if let Err(e) = thread::Builder::new()
                    .name("scheduled-run".to_string())
                    .spawn(move || run())
                {
                    tracing::error!(error = %e, "could not start scheduled run");
                }

                let now = Instant::now();
                next = next_deadline(next + interval, interval, now);
                match stop_rx.recv_timeout(next - now) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            flag.store(false, Ordering::SeqCst);
        });

        TaskHandle {
            running,
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        }
    }
}

// ---------------------------------------------------------------------------
// Virtual-time scheduler
// ---------------------------------------------------------------------------

struct ManualTask {
    interval: Duration,
    next_due: Duration,
    task: Task,
    running: Arc<AtomicBool>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    tasks: Vec<ManualTask>,
}

/// Deterministic scheduler driven by [`advance`](Self::advance).
///
/// Newly scheduled tasks are due at the current virtual time, so
/// `advance(Duration::ZERO)` performs the initial run. Tasks run on the
/// caller's thread with the scheduler unlocked; a task scheduled from
/// inside a run first fires on the next `advance`.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.state.lock().map(|s| s.now).unwrap_or_default()
    }

    /// Move the clock forward, running every task once per deadline reached.
    pub fn advance(&self, by: Duration) {
        let mut due = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            state.now += by;
            let now = state.now;

            state.tasks.retain(|t| t.running.load(Ordering::SeqCst));
            let mut due = Vec::new();
            for t in &mut state.tasks {
                while t.next_due <= now {
                    due.push((t.next_due, Arc::clone(&t.task), Arc::clone(&t.running)));
                    t.next_due += t.interval;
                }
            }
            due
        };

        due.sort_by_key(|(at, _, _)| *at);
        for (_, task, running) in due {
            if running.load(Ordering::SeqCst) {
                task();
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, task: Task) -> TaskHandle {
        let running = Arc::new(AtomicBool::new(true));
        if let Ok(mut state) = self.state.lock() {
            let next_due = state.now;
            state.tasks.push(ManualTask {
                interval: interval.max(MIN_INTERVAL),
                next_due,
                task,
                running: Arc::clone(&running),
            });
        }
        TaskHandle {
            running,
            stop_tx: None,
            worker: None,
        }
    }
}
