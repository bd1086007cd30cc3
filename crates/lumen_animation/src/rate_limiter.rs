//! Leading-edge rate limiter
//!
//! Wraps an action so that a stream of triggers (scroll events, resize
//! events, clicks) runs it at most once per window. The first trigger runs the
//! action immediately and starts a cooldown timer on the scheduler; triggers
//! that arrive during the cooldown are dropped, not deferred.

use lumen_core::{LumenError, Result, Scheduler, TaskId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct LimiterState<T> {
    action: RefCell<Box<dyn FnMut(T)>>,
    suppressed: Cell<bool>,
    cancelled: Cell<bool>,
    cooldown: Cell<Option<TaskId>>,
    invocations: Cell<u64>,
}

/// Throttled action taking an argument of type `T`
///
/// # Example
///
/// ```ignore
/// let limiter = RateLimiter::wrap(clock.handle(), 16, move |event: ScrollEvent| {
///     reveal.check(event);
/// })?;
/// viewport.on_scroll(Box::new(move |event| {
///     limiter.trigger(event);
/// }));
/// ```
pub struct RateLimiter<S: Scheduler, T> {
    scheduler: S,
    window_ms: u32,
    state: Rc<LimiterState<T>>,
}

impl<S: Scheduler, T: 'static> RateLimiter<S, T> {
    /// Wrap `action` so it runs at most once per `window_ms`
    pub fn wrap<F>(scheduler: S, window_ms: u32, action: F) -> Result<Self>
    where
        F: FnMut(T) + 'static,
    {
        if window_ms == 0 {
            return Err(LumenError::InvalidWindow);
        }
        Ok(Self {
            scheduler,
            window_ms,
            state: Rc::new(LimiterState {
                action: RefCell::new(Box::new(action)),
                suppressed: Cell::new(false),
                cancelled: Cell::new(false),
                cooldown: Cell::new(None),
                invocations: Cell::new(0),
            }),
        })
    }

    /// Signal the action
    ///
    /// Returns `true` if the action ran, `false` if the trigger was dropped.
    pub fn trigger(&self, arg: T) -> bool {
        let state = &self.state;
        if state.cancelled.get() || state.suppressed.get() {
            tracing::trace!(window_ms = self.window_ms, "trigger suppressed");
            return false;
        }

        // Suppress before running so a re-entrant trigger is dropped
        state.suppressed.set(true);
        let weak = Rc::downgrade(state);
        let cooldown = self.scheduler.after(
            self.window_ms,
            Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.cooldown.set(None);
                    state.suppressed.set(false);
                }
            }),
        );
        if cooldown.is_none() {
            tracing::warn!("RateLimiter: scheduler dropped, suppression will not clear");
        }
        state.cooldown.set(cooldown);

        (&mut *state.action.borrow_mut())(arg);
        state.invocations.set(state.invocations.get() + 1);
        true
    }

    /// Stop the limiter; every later trigger is dropped
    ///
    /// Calling this more than once has no further effect.
    pub fn cancel(&self) {
        if self.state.cancelled.replace(true) {
            return;
        }
        if let Some(id) = self.state.cooldown.take() {
            self.scheduler.cancel(id);
        }
        tracing::debug!(
            invocations = self.state.invocations.get(),
            "RateLimiter cancelled"
        );
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.get()
    }

    /// Check if a trigger right now would be dropped
    pub fn is_suppressed(&self) -> bool {
        self.state.cancelled.get() || self.state.suppressed.get()
    }

    /// Number of times the action has run
    pub fn invocations(&self) -> u64 {
        self.state.invocations.get()
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }
}
