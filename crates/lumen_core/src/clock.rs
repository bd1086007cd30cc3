//! Virtual-time scheduler
//!
//! All deferred work in lumen goes through the [`Scheduler`] trait. The
//! provided implementation, [`FrameClock`], never reads the wall clock: time
//! only moves when the owner calls [`FrameClock::advance`] or
//! [`FrameClock::advance_to`], which makes every animation deterministic.
//!
//! Components hold a [`ClockHandle`], a weak reference that won't keep the
//! clock alive. Scheduling through a handle whose clock is gone returns `None`.
//!
//! Tasks run on the thread that drives the clock, one at a time, with no
//! internal borrow held, so a task may freely schedule or cancel other tasks.

use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// Default frame cadence, roughly 60fps
pub const DEFAULT_FRAME_INTERVAL_MS: u32 = 16;

new_key_type! {
    /// Handle to a scheduled task
    pub struct TaskId;
}

/// A unit of deferred work
pub type Task = Box<dyn FnOnce()>;

/// Deferred execution capability
///
/// `after` is the timer primitive and `on_next_frame` the frame-callback
/// primitive. Tasks due at the same instant run in registration order.
pub trait Scheduler {
    /// Current time in milliseconds
    fn now_ms(&self) -> u64;

    /// Spacing between frame callbacks
    fn frame_interval_ms(&self) -> u32;

    /// Run `task` once `delay_ms` has elapsed
    fn after(&self, delay_ms: u32, task: Task) -> Option<TaskId>;

    /// Run `task` on the next frame boundary
    fn on_next_frame(&self, task: Task) -> Option<TaskId>;

    /// Cancel a pending task
    ///
    /// Returns `false` if the task already ran or was cancelled.
    fn cancel(&self, id: TaskId) -> bool;
}

struct Entry {
    /// (due time, registration sequence) - also the queue key
    key: (u64, u64),
    task: Task,
}

struct ClockInner {
    tasks: SlotMap<TaskId, Entry>,
    queue: BTreeMap<(u64, u64), TaskId>,
    now: u64,
    seq: u64,
    frame_interval_ms: u32,
}

impl ClockInner {
    fn insert(&mut self, due: u64, task: Task) -> TaskId {
        let key = (due, self.seq);
        self.seq += 1;
        let id = self.tasks.insert(Entry { key, task });
        self.queue.insert(key, id);
        id
    }

    fn next_frame(&self) -> u64 {
        let interval = self.frame_interval_ms as u64;
        (self.now / interval + 1) * interval
    }

    fn cancel(&mut self, id: TaskId) -> bool {
        match self.tasks.remove(id) {
            Some(entry) => {
                self.queue.remove(&entry.key);
                true
            }
            None => false,
        }
    }

    /// Pop the earliest task due at or before `until`
    fn pop_due(&mut self, until: u64) -> Option<Task> {
        let (key, id) = self.queue.first_key_value().map(|(k, v)| (*k, *v))?;
        if key.0 > until {
            return None;
        }
        self.queue.remove(&key);
        self.now = self.now.max(key.0);
        self.tasks.remove(id).map(|entry| entry.task)
    }
}

/// Deterministic virtual-time scheduler
///
/// ```ignore
/// let clock = FrameClock::new();
/// let handle = clock.handle();
/// handle.after(15, Box::new(|| tracing::info!("tick")));
/// clock.advance(15); // runs the task
/// ```
pub struct FrameClock {
    inner: Rc<RefCell<ClockInner>>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL_MS)
    }

    /// Create a clock whose frame callbacks fire every `frame_interval_ms`
    ///
    /// An interval of zero is raised to one millisecond.
    pub fn with_frame_interval(frame_interval_ms: u32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ClockInner {
                tasks: SlotMap::with_key(),
                queue: BTreeMap::new(),
                now: 0,
                seq: 0,
                frame_interval_ms: frame_interval_ms.max(1),
            })),
        }
    }

    /// Get a handle to this clock for passing to components
    pub fn handle(&self) -> ClockHandle {
        ClockHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.borrow().now
    }

    pub fn frame_interval_ms(&self) -> u32 {
        self.inner.borrow().frame_interval_ms
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().tasks.is_empty()
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<u64> {
        self.inner
            .borrow()
            .queue
            .first_key_value()
            .map(|(key, _)| key.0)
    }

    /// Move time forward by `ms`, running every task that comes due
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.now_ms().saturating_add(ms);
        self.advance_to(target)
    }

    /// Move time forward to `time_ms`, running every task that comes due
    ///
    /// Tasks scheduled by running tasks are picked up in the same call if they
    /// fall due before `time_ms`. Time never moves backwards.
    pub fn advance_to(&self, time_ms: u64) -> usize {
        let mut ran = 0;
        loop {
            // Release the borrow before running so the task can reschedule
            let task = self.inner.borrow_mut().pop_due(time_ms);
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }

        let mut inner = self.inner.borrow_mut();
        inner.now = inner.now.max(time_ms);
        ran
    }

    /// Run tasks until none are left or `horizon_ms` has passed
    ///
    /// Unlike [`advance`](Self::advance), time stops at the last task run when
    /// the queue empties early.
    pub fn run_until_idle(&self, horizon_ms: u64) -> usize {
        let deadline = self.now_ms().saturating_add(horizon_ms);
        let mut ran = 0;
        while let Some(due) = self.next_due() {
            if due > deadline {
                break;
            }
            ran += self.advance_to(due);
        }
        ran
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to a [`FrameClock`]
///
/// This is passed to components that need to schedule work.
/// It won't prevent the clock from being dropped.
#[derive(Clone)]
pub struct ClockHandle {
    inner: Weak<RefCell<ClockInner>>,
}

impl ClockHandle {
    /// Check if the clock is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl Scheduler for ClockHandle {
    fn now_ms(&self) -> u64 {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow().now)
            .unwrap_or(0)
    }

    fn frame_interval_ms(&self) -> u32 {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow().frame_interval_ms)
            .unwrap_or(DEFAULT_FRAME_INTERVAL_MS)
    }

    fn after(&self, delay_ms: u32, task: Task) -> Option<TaskId> {
        self.inner.upgrade().map(|inner| {
            let mut inner = inner.borrow_mut();
            let due = inner.now + delay_ms as u64;
            inner.insert(due, task)
        })
    }

    fn on_next_frame(&self, task: Task) -> Option<TaskId> {
        self.inner.upgrade().map(|inner| {
            let mut inner = inner.borrow_mut();
            let due = inner.next_frame();
            inner.insert(due, task)
        })
    }

    fn cancel(&self, id: TaskId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow_mut().cancel(id))
            .unwrap_or(false)
    }
}
