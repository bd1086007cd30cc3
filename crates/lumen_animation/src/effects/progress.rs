//! Progress groups
//!
//! A batch of counters (skill levels, task progress) that all start the first
//! time their section becomes visible enough.

use crate::tween::{NumericTween, TweenConfig};
use crate::visibility::VisibilityGate;
use lumen_core::{DisplaySink, IntersectionSource, Phase, RegionId, Result, Scheduler};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// One counter in a [`ProgressGroup`]
pub struct ProgressItem {
    pub sink: Box<dyn DisplaySink>,
    pub config: TweenConfig,
}

impl ProgressItem {
    pub fn new(sink: impl DisplaySink + 'static, config: TweenConfig) -> Self {
        Self {
            sink: Box::new(sink),
            config,
        }
    }
}

/// Visibility-gated batch of numeric tweens
///
/// # Example
///
/// ```ignore
/// let items = skills
///     .iter()
///     .map(|(sink, level)| {
///         let config = TweenConfig::new(*level, level * 15).tick(TickSource::timer(15)).suffix("%");
///         ProgressItem::new(sink.clone(), config)
///     })
///     .collect();
/// let group = ProgressGroup::observe(clock.handle(), viewport.clone(), section, 0.5, items)?;
/// ```
pub struct ProgressGroup<S: Scheduler + 'static, V: IntersectionSource> {
    gate: VisibilityGate<V>,
    tweens: Rc<RefCell<Vec<NumericTween<S>>>>,
    failed: Rc<Cell<usize>>,
    len: usize,
}

impl<S, V> ProgressGroup<S, V>
where
    S: Scheduler + Clone + 'static,
    V: IntersectionSource,
{
    /// Start every item's tween once `target` is `threshold` visible
    ///
    /// Item configs are validated here, so a bad duration is reported at
    /// registration rather than when the section scrolls into view.
    pub fn observe(
        scheduler: S,
        source: V,
        target: RegionId,
        threshold: f32,
        items: Vec<ProgressItem>,
    ) -> Result<Self> {
        let frame_interval_ms = scheduler.frame_interval_ms();
        for item in &items {
            item.config.validate(frame_interval_ms)?;
        }

        let len = items.len();
        let tweens = Rc::new(RefCell::new(Vec::with_capacity(len)));
        let failed = Rc::new(Cell::new(0));
        let started = Rc::clone(&tweens);
        let not_started = Rc::clone(&failed);
        let gate = VisibilityGate::observe(source, target, threshold, move || {
            let mut started = started.borrow_mut();
            for item in items {
                match NumericTween::start(scheduler.clone(), item.sink, item.config) {
                    Ok(tween) => started.push(tween),
                    Err(err) => {
                        not_started.set(not_started.get() + 1);
                        tracing::warn!(%err, "ProgressGroup: counter not started");
                    }
                }
            }
            tracing::debug!(count = started.len(), "ProgressGroup started");
        })?;

        Ok(Self {
            gate,
            tweens,
            failed,
            len,
        })
    }

    /// Cancel the gate and every running counter
    pub fn cancel(&self) {
        self.gate.cancel();
        for tween in self.tweens.borrow().iter() {
            tween.cancel();
        }
    }

    /// Gate phase: `Done` once the counters have been started
    pub fn gate_phase(&self) -> Phase {
        self.gate.phase()
    }

    pub fn has_started(&self) -> bool {
        self.gate.has_fired()
    }

    /// Check if every counter has settled
    ///
    /// A counter that failed to start (see [`failed`](Self::failed)) counts as
    /// settled; the rest must have reached their targets.
    pub fn is_complete(&self) -> bool {
        let tweens = self.tweens.borrow();
        self.gate.has_fired()
            && tweens.len() + self.failed.get() == self.len
            && tweens.iter().all(|t| t.is_done())
    }

    /// Number of counters that could not be started when the gate fired
    pub fn failed(&self) -> usize {
        self.failed.get()
    }

    /// Number of counters in the group
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::TickSource;
    use lumen_core::{FrameClock, LumenError, RecordingSink, Viewport};

    fn skill(level: u32) -> (RecordingSink, ProgressItem) {
        let sink = RecordingSink::new();
        let config = TweenConfig::new(level, level * 15)
            .tick(TickSource::timer(15))
            .suffix("%");
        (sink.clone(), ProgressItem::new(sink, config))
    }

    #[test]
    fn test_counters_start_when_visible() {
        let clock = FrameClock::new();
        let viewport = Viewport::new(800.0);
        let section = viewport.add_region(1200.0, 400.0);

        let (rust, rust_item) = skill(90);
        let (go, go_item) = skill(60);
        let group = ProgressGroup::observe(
            clock.handle(),
            viewport.clone(),
            section,
            0.5,
            vec![rust_item, go_item],
        )
        .unwrap();

        clock.advance(2_000);
        assert!(!group.has_started());
        assert!(rust.is_empty());

        viewport.scroll_to(600.0);
        assert!(group.has_started());

        clock.advance(90 * 15);
        assert_eq!(rust.len(), 90);
        assert_eq!(rust.last().as_deref(), Some("90%"));
        assert_eq!(go.len(), 60);
        assert_eq!(go.last().as_deref(), Some("60%"));
        assert!(group.is_complete());
    }

    #[test]
    fn test_invalid_item_reported_at_registration() {
        let clock = FrameClock::new();
        let viewport = Viewport::new(800.0);
        let section = viewport.add_region(1200.0, 400.0);

        let bad = ProgressItem::new(RecordingSink::new(), TweenConfig::new(50, 0));
        let result =
            ProgressGroup::observe(clock.handle(), viewport.clone(), section, 0.5, vec![bad]);

        assert!(matches!(result, Err(LumenError::InvalidDuration { .. })));
        assert_eq!(viewport.observer_count(), 0);
    }

    #[test]
    fn test_failed_starts_still_settle() {
        let clock = FrameClock::new();
        let viewport = Viewport::new(800.0);
        let section = viewport.add_region(1200.0, 400.0);
        let (sink, item) = skill(40);
        let (_, other) = skill(20);

        let group = ProgressGroup::observe(
            clock.handle(),
            viewport.clone(),
            section,
            0.5,
            vec![item, other],
        )
        .unwrap();

        // Nothing left to schedule on once the gate fires
        drop(clock);
        viewport.scroll_to(600.0);

        assert!(group.has_started());
        assert_eq!(group.failed(), 2);
        assert!(group.is_complete());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_cancel_mid_count() {
        let clock = FrameClock::new();
        let viewport = Viewport::new(800.0);
        let section = viewport.add_region(0.0, 400.0);
        let (sink, item) = skill(80);

        // Already visible: counting starts right away
        let group =
            ProgressGroup::observe(clock.handle(), viewport, section, 0.5, vec![item]).unwrap();
        assert!(group.has_started());

        clock.advance(150);
        group.cancel();
        group.cancel();
        clock.advance(5_000);

        assert_eq!(sink.len(), 10);
        assert!(!group.is_complete());
    }
}
