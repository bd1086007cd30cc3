//! One-shot visibility gate
//!
//! Fires a callback the first time a region's visibility ratio reaches a
//! threshold, then detaches from the source. Typically used to start a
//! counter animation once its section scrolls into view.

use lumen_core::{
    check_unit_interval, IntersectionSource, LumenError, Observation, ObserverId, Phase,
    RegionId, Result,
};
use std::cell::Cell;
use std::rc::Rc;

struct GateState {
    phase: Cell<Phase>,
    observer: Cell<Option<ObserverId>>,
}

/// Handle to a registered visibility gate
///
/// # Example
///
/// ```ignore
/// let gate = VisibilityGate::observe(viewport.clone(), skills, 0.5, move || {
///     tracing::info!("skills in view");
/// })?;
/// ```
pub struct VisibilityGate<V: IntersectionSource> {
    source: V,
    target: RegionId,
    threshold: f32,
    state: Rc<GateState>,
}

impl<V: IntersectionSource> VisibilityGate<V> {
    /// Run `callback` once `target` is at least `threshold` visible
    ///
    /// If the target already meets the threshold, the callback runs before
    /// this returns and no observation is registered.
    pub fn observe<F>(source: V, target: RegionId, threshold: f32, callback: F) -> Result<Self>
    where
        F: FnOnce() + 'static,
    {
        let threshold = check_unit_interval(threshold)?;
        let ratio = source
            .ratio(target)
            .ok_or(LumenError::TargetNotFound(target))?;

        let state = Rc::new(GateState {
            phase: Cell::new(Phase::Pending),
            observer: Cell::new(None),
        });

        if ratio >= threshold {
            state.phase.set(Phase::Done);
            tracing::debug!(region = ?target, ratio, threshold, "VisibilityGate fired on registration");
            callback();
            return Ok(Self {
                source,
                target,
                threshold,
                state,
            });
        }

        let listener_state = Rc::clone(&state);
        let mut callback = Some(callback);
        let observer = source
            .observe(
                target,
                Box::new(move |ratio| {
                    if listener_state.phase.get().is_terminal() {
                        return Observation::Detach;
                    }
                    if ratio < threshold {
                        return Observation::Continue;
                    }
                    listener_state.phase.set(Phase::Done);
                    listener_state.observer.set(None);
                    tracing::debug!(region = ?target, ratio, threshold, "VisibilityGate fired");
                    if let Some(callback) = callback.take() {
                        callback();
                    }
                    Observation::Detach
                }),
            )
            .ok_or(LumenError::TargetNotFound(target))?;

        state.observer.set(Some(observer));
        state.phase.set(Phase::Active);

        Ok(Self {
            source,
            target,
            threshold,
            state,
        })
    }

    /// Stop observing without firing
    ///
    /// Has no effect once the gate has fired or was already cancelled.
    pub fn cancel(&self) {
        if self.state.phase.get().is_terminal() {
            return;
        }
        self.state.phase.set(Phase::Cancelled);
        if let Some(id) = self.state.observer.take() {
            self.source.unobserve(id);
        }
        tracing::debug!(region = ?self.target, "VisibilityGate cancelled");
    }

    pub fn phase(&self) -> Phase {
        self.state.phase.get()
    }

    pub fn has_fired(&self) -> bool {
        self.state.phase.get() == Phase::Done
    }

    pub fn target(&self) -> RegionId {
        self.target
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}
