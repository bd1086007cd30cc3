//! Transient styles
//!
//! Write one value now and another after a hold, like a card that spins on
//! click and then settles back.

use lumen_core::{DisplaySink, LumenError, Result, Scheduler, TaskId};
use std::cell::Cell;
use std::rc::Rc;

struct TransientState {
    sink: Rc<dyn DisplaySink>,
    off: String,
    restore: Cell<Option<TaskId>>,
    settled: Cell<bool>,
}

impl TransientState {
    fn settle(&self) {
        if self.settled.replace(true) {
            return;
        }
        self.restore.set(None);
        self.sink.write(&self.off);
    }
}

/// Handle to a pending restore
pub struct Transient<S: Scheduler> {
    scheduler: S,
    state: Rc<TransientState>,
}

impl<S: Scheduler> Transient<S> {
    /// Write `on` now and `off` after `hold_ms`
    pub fn apply(
        scheduler: S,
        sink: Rc<dyn DisplaySink>,
        on: &str,
        off: impl Into<String>,
        hold_ms: u32,
    ) -> Result<Self> {
        let state = Rc::new(TransientState {
            sink,
            off: off.into(),
            restore: Cell::new(None),
            settled: Cell::new(false),
        });

        let restore = Rc::clone(&state);
        let id = scheduler
            .after(hold_ms, Box::new(move || restore.settle()))
            .ok_or(LumenError::SchedulerGone)?;
        state.restore.set(Some(id));
        state.sink.write(on);

        Ok(Self { scheduler, state })
    }

    /// Restore the `off` value now instead of waiting out the hold
    pub fn finish(&self) {
        if let Some(id) = self.state.restore.get() {
            self.scheduler.cancel(id);
        }
        self.state.settle();
    }

    /// Drop the pending restore, leaving the `on` value in place
    pub fn cancel(&self) {
        if self.state.settled.replace(true) {
            return;
        }
        if let Some(id) = self.state.restore.take() {
            self.scheduler.cancel(id);
        }
    }

    /// Check if the restore has run or been dropped
    pub fn is_settled(&self) -> bool {
        self.state.settled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{FrameClock, RecordingSink};

    const SPIN: &str = "rotateY(360deg) scale(1.1)";
    const REST: &str = "rotateY(0deg) scale(1)";

    #[test]
    fn test_restores_after_hold() {
        let clock = FrameClock::new();
        let sink = RecordingSink::new();

        let spin = Transient::apply(clock.handle(), Rc::new(sink.clone()), SPIN, REST, 1_000)
            .unwrap();
        assert_eq!(sink.writes(), vec![SPIN]);

        clock.advance(999);
        assert!(!spin.is_settled());

        clock.advance(1);
        assert!(spin.is_settled());
        assert_eq!(sink.writes(), vec![SPIN, REST]);
    }

    #[test]
    fn test_finish_restores_once() {
        let clock = FrameClock::new();
        let sink = RecordingSink::new();
        let spin = Transient::apply(clock.handle(), Rc::new(sink.clone()), SPIN, REST, 1_000)
            .unwrap();

        spin.finish();
        spin.finish();
        clock.advance(2_000);

        assert_eq!(sink.writes(), vec![SPIN, REST]);
    }

    #[test]
    fn test_cancel_keeps_on_value() {
        let clock = FrameClock::new();
        let sink = RecordingSink::new();
        let spin = Transient::apply(clock.handle(), Rc::new(sink.clone()), SPIN, REST, 1_000)
            .unwrap();

        spin.cancel();
        clock.advance(2_000);

        assert_eq!(sink.writes(), vec![SPIN]);
        assert!(!clock.has_pending());
    }
}
