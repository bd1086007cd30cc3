//! Numeric counter tween
//!
//! Counts a displayed integer up from zero to a target over a fixed duration.
//! Tick `n` shows `n * target / (duration / tick_interval)` rounded; tick
//! `ceil(duration / tick_interval)` writes the target itself, so the display
//! never overshoots and never ends on a rounding artifact.
//!
//! The tick can come from a fixed-interval timer or from the scheduler's frame
//! callback; both drive the same state machine.

use lumen_core::{DisplaySink, LumenError, Phase, Result, Scheduler, TaskId};
use std::cell::Cell;
use std::rc::Rc;

/// Where tween ticks come from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickSource {
    /// Fixed-interval timer
    Timer { interval_ms: u32 },
    /// The scheduler's frame callback
    Frame,
}

impl TickSource {
    pub fn timer(interval_ms: u32) -> Self {
        TickSource::Timer { interval_ms }
    }
}

/// Parameters for a [`NumericTween`]
#[derive(Clone, Debug, PartialEq)]
pub struct TweenConfig {
    pub target: u32,
    pub duration_ms: u32,
    pub tick: TickSource,
    /// Appended to every written value, e.g. `%`
    pub suffix: String,
}

impl TweenConfig {
    pub fn new(target: u32, duration_ms: u32) -> Self {
        Self {
            target,
            duration_ms,
            tick: TickSource::Frame,
            suffix: String::new(),
        }
    }

    pub fn tick(mut self, tick: TickSource) -> Self {
        self.tick = tick;
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Tick spacing used to size each increment
    pub fn tick_interval_ms(&self, frame_interval_ms: u32) -> u32 {
        match self.tick {
            TickSource::Timer { interval_ms } => interval_ms,
            TickSource::Frame => frame_interval_ms,
        }
    }

    /// Check duration and tick interval against a frame interval
    pub fn validate(&self, frame_interval_ms: u32) -> Result<()> {
        let tick_interval_ms = self.tick_interval_ms(frame_interval_ms);
        if self.duration_ms == 0 || tick_interval_ms == 0 {
            return Err(LumenError::InvalidDuration {
                duration_ms: self.duration_ms,
                tick_interval_ms,
            });
        }
        Ok(())
    }

    /// Number of ticks from start to the final write
    pub fn tick_count(&self, frame_interval_ms: u32) -> u32 {
        let interval = self.tick_interval_ms(frame_interval_ms).max(1) as u64;
        let ticks = (self.duration_ms as u64 + interval - 1) / interval;
        ticks.clamp(1, u32::MAX as u64) as u32
    }

    /// Amount added per tick
    pub fn increment(&self, frame_interval_ms: u32) -> f64 {
        let ticks = self.duration_ms as f64 / self.tick_interval_ms(frame_interval_ms) as f64;
        self.target as f64 / ticks
    }
}

struct TweenState<S: Scheduler> {
    scheduler: S,
    sink: Box<dyn DisplaySink>,
    config: TweenConfig,
    increment: f64,
    tick_count: u32,
    current: Cell<f64>,
    ticks: Cell<u32>,
    phase: Cell<Phase>,
    pending: Cell<Option<TaskId>>,
}

impl<S: Scheduler + 'static> TweenState<S> {
    fn schedule(state: &Rc<Self>) {
        let next = Rc::clone(state);
        let task = Box::new(move || Self::tick(&next));
        let id = match state.config.tick {
            TickSource::Timer { interval_ms } => state.scheduler.after(interval_ms, task),
            TickSource::Frame => state.scheduler.on_next_frame(task),
        };
        if id.is_none() {
            tracing::warn!("NumericTween: scheduler dropped mid-animation");
            state.phase.set(Phase::Cancelled);
        }
        state.pending.set(id);
    }

    fn tick(state: &Rc<Self>) {
        state.pending.set(None);
        if state.phase.get().is_terminal() {
            return;
        }
        state.phase.set(Phase::Active);
        let ticks = state.ticks.get() + 1;
        state.ticks.set(ticks);

        // Scaled from the tick count so rounding can't push the finish a tick late
        let target = state.config.target;
        let next = state.increment * ticks as f64;
        if ticks >= state.tick_count || next >= target as f64 {
            state.current.set(target as f64);
            state.phase.set(Phase::Done);
            state.write(target);
            tracing::debug!(value = target, ticks = state.ticks.get(), "NumericTween finished");
            return;
        }

        state.current.set(next);
        let shown = (next.round() as u32).min(target);
        tracing::trace!(value = shown, "NumericTween tick");
        state.write(shown);
        Self::schedule(state);
    }

    fn write(&self, value: u32) {
        self.sink.write(&format!("{}{}", value, self.config.suffix));
    }
}

/// Handle to a running counter animation
///
/// # Example
///
/// ```ignore
/// // Count 0 -> 42 in steps of one every 15ms
/// let tween = NumericTween::animate(clock.handle(), sink, 42, 630, 15)?;
/// ```
pub struct NumericTween<S: Scheduler + 'static> {
    state: Rc<TweenState<S>>,
}

impl<S: Scheduler + 'static> NumericTween<S> {
    /// Timer-driven tween from 0 to `target`
    pub fn animate<D>(
        scheduler: S,
        sink: D,
        target: u32,
        duration_ms: u32,
        tick_interval_ms: u32,
    ) -> Result<Self>
    where
        D: DisplaySink + 'static,
    {
        let config =
            TweenConfig::new(target, duration_ms).tick(TickSource::timer(tick_interval_ms));
        Self::start(scheduler, sink, config)
    }

    /// Start a tween; the first tick comes one tick interval later
    pub fn start<D>(scheduler: S, sink: D, config: TweenConfig) -> Result<Self>
    where
        D: DisplaySink + 'static,
    {
        let frame_interval_ms = scheduler.frame_interval_ms();
        config.validate(frame_interval_ms)?;
        let increment = config.increment(frame_interval_ms);
        let tick_count = config.tick_count(frame_interval_ms);

        let state = Rc::new(TweenState {
            scheduler,
            sink: Box::new(sink),
            config,
            increment,
            tick_count,
            current: Cell::new(0.0),
            ticks: Cell::new(0),
            phase: Cell::new(Phase::Pending),
            pending: Cell::new(None),
        });

        TweenState::schedule(&state);
        if state.pending.get().is_none() {
            return Err(LumenError::SchedulerGone);
        }
        tracing::debug!(
            to = state.config.target,
            duration_ms = state.config.duration_ms,
            increment,
            "NumericTween started"
        );
        Ok(Self { state })
    }

    /// Stop ticking; nothing more is written
    ///
    /// Calling this more than once, or after the tween finished, has no effect.
    pub fn cancel(&self) {
        if self.state.phase.get().is_terminal() {
            return;
        }
        self.state.phase.set(Phase::Cancelled);
        if let Some(id) = self.state.pending.take() {
            self.state.scheduler.cancel(id);
        }
        tracing::debug!(ticks = self.state.ticks.get(), "NumericTween cancelled");
    }

    pub fn phase(&self) -> Phase {
        self.state.phase.get()
    }

    pub fn is_done(&self) -> bool {
        self.state.phase.get() == Phase::Done
    }

    /// Running (unrounded) value
    pub fn current(&self) -> f64 {
        self.state.current.get()
    }

    pub fn target(&self) -> u32 {
        self.state.config.target
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u32 {
        self.state.ticks.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{FrameClock, RecordingSink};

    fn values(sink: &RecordingSink) -> Vec<u32> {
        sink.writes()
            .iter()
            .map(|text| text.trim_end_matches('%').parse().unwrap())
            .collect()
    }

    #[test]
    fn test_counts_to_42() {
        let clock = FrameClock::new();
        let sink = RecordingSink::new();

        let tween = NumericTween::animate(clock.handle(), sink.clone(), 42, 630, 15).unwrap();
        assert_eq!(tween.phase(), Phase::Pending);

        clock.advance(630);

        assert_eq!(values(&sink), (1..=42).collect::<Vec<_>>());
        assert_eq!(tween.ticks(), 42);
        assert!(tween.is_done());
        assert!(!clock.has_pending());
    }

    #[test]
    fn test_final_value_is_exact_target() {
        let cases = [
            (0, 1000, 16),
            (1, 1000, 16),
            (7, 100, 3),
            (42, 1000, 16),
            (75, 1000, 15),
            (99, 333, 7),
            (100, 1000, 1000),
            (100, 50, 200),
            (1_000, 1000, 16),
        ];

        for (target, duration, tick) in cases {
            let clock = FrameClock::new();
            let sink = RecordingSink::new();
            let tween =
                NumericTween::animate(clock.handle(), sink.clone(), target, duration, tick)
                    .unwrap();

            clock.run_until_idle(u64::MAX / 2);

            let written = values(&sink);
            let case = format!("target {target}, {duration}ms / {tick}ms");
            assert!(tween.is_done(), "{case}");
            assert_eq!(written.last().copied(), Some(target), "{case}");
            assert!(written.iter().all(|v| *v <= target), "{case}");
            assert!(written.windows(2).all(|w| w[0] <= w[1]), "{case}");
        }
    }

    #[test]
    fn test_finishes_at_duration() {
        // Increments like 0.1 don't sum to the target exactly
        let cases = [(7, 700, 10), (3, 300, 10), (30, 3000, 10), (99, 333, 7), (42, 630, 15)];

        for (target, duration, tick) in cases {
            let clock = FrameClock::new();
            let sink = RecordingSink::new();
            let tween =
                NumericTween::animate(clock.handle(), sink.clone(), target, duration, tick)
                    .unwrap();
            let expected_ticks = duration.div_ceil(tick);
            let case = format!("target {target}, {duration}ms / {tick}ms");

            clock.advance((expected_ticks * tick) as u64);

            assert!(tween.is_done(), "{case}");
            assert_eq!(tween.ticks(), expected_ticks, "{case}");
            assert_eq!(sink.len(), expected_ticks as usize, "{case}");
            assert_eq!(values(&sink).last().copied(), Some(target), "{case}");
            assert!(!clock.has_pending(), "{case}");
        }
    }

    #[test]
    fn test_frame_ticks() {
        let clock = FrameClock::with_frame_interval(16);
        let sink = RecordingSink::new();

        let config = TweenConfig::new(100, 1600).suffix("%");
        let tween = NumericTween::start(clock.handle(), sink.clone(), config).unwrap();

        clock.advance(1600);

        assert_eq!(sink.len(), 100);
        assert_eq!(sink.writes()[0], "1%");
        assert_eq!(sink.last().as_deref(), Some("100%"));
        assert!(tween.is_done());
    }

    #[test]
    fn test_cancel_stops_writes() {
        let clock = FrameClock::new();
        let sink = RecordingSink::new();
        let tween = NumericTween::animate(clock.handle(), sink.clone(), 42, 630, 15).unwrap();

        clock.advance(150);
        assert_eq!(sink.len(), 10);

        tween.cancel();
        tween.cancel();
        assert_eq!(tween.phase(), Phase::Cancelled);

        clock.advance(1_000);
        assert_eq!(sink.len(), 10);
        assert!(!clock.has_pending());
    }

    #[test]
    fn test_dropping_handle_keeps_running() {
        let clock = FrameClock::new();
        let sink = RecordingSink::new();
        drop(NumericTween::animate(clock.handle(), sink.clone(), 10, 100, 10).unwrap());

        clock.advance(100);
        assert_eq!(sink.last().as_deref(), Some("10"));
    }

    #[test]
    fn test_invalid_duration() {
        let clock = FrameClock::new();

        let zero_duration = NumericTween::animate(clock.handle(), RecordingSink::new(), 10, 0, 15);
        assert!(matches!(
            zero_duration,
            Err(LumenError::InvalidDuration { duration_ms: 0, .. })
        ));

        let zero_tick = NumericTween::animate(clock.handle(), RecordingSink::new(), 10, 100, 0);
        assert!(matches!(
            zero_tick,
            Err(LumenError::InvalidDuration {
                tick_interval_ms: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_scheduler_gone() {
        let handle = FrameClock::new().handle();
        let result = NumericTween::animate(handle, RecordingSink::new(), 10, 100, 10);
        assert!(matches!(result, Err(LumenError::SchedulerGone)));
    }
}
