//! Staggered style application
//!
//! Writes the same value to a list of sinks, the i-th one `i * step_ms` after
//! start. Used for the timeline nodes that start pulsing one after another.

use lumen_core::{DisplaySink, LumenError, Result, Scheduler, TaskId};
use std::cell::Cell;
use std::rc::Rc;

pub struct Stagger<S: Scheduler> {
    scheduler: S,
    tasks: Vec<TaskId>,
    applied: Rc<Cell<usize>>,
    cancelled: Cell<bool>,
}

impl<S: Scheduler> Stagger<S> {
    pub const DEFAULT_STEP_MS: u32 = 500;

    pub fn start(
        scheduler: S,
        sinks: Vec<Box<dyn DisplaySink>>,
        step_ms: u32,
        value: impl Into<String>,
    ) -> Result<Self> {
        let value: Rc<str> = Rc::from(value.into());
        let applied = Rc::new(Cell::new(0));
        let mut tasks = Vec::with_capacity(sinks.len());

        for (index, sink) in sinks.into_iter().enumerate() {
            let delay = step_ms.saturating_mul(index as u32);
            let value = Rc::clone(&value);
            let applied = Rc::clone(&applied);
            let id = scheduler
                .after(
                    delay,
                    Box::new(move || {
                        sink.write(&value);
                        applied.set(applied.get() + 1);
                    }),
                )
                .ok_or(LumenError::SchedulerGone)?;
            tasks.push(id);
        }

        Ok(Self {
            scheduler,
            tasks,
            applied,
            cancelled: Cell::new(false),
        })
    }

    /// Drop every write that hasn't happened yet
    pub fn cancel(&self) {
        if self.cancelled.replace(true) {
            return;
        }
        let dropped = self
            .tasks
            .iter()
            .filter(|id| self.scheduler.cancel(**id))
            .count();
        tracing::debug!(dropped, "Stagger cancelled");
    }

    /// Number of sinks written so far
    pub fn applied(&self) -> usize {
        self.applied.get()
    }

    pub fn is_complete(&self) -> bool {
        self.applied.get() == self.tasks.len()
    }
}
