//! Glitch flicker
//!
//! Every period, roll for a glitch; on a hit, swap in the glitch style for a
//! short hold and then restore the resting style. Runs until cancelled.

use super::transient::Transient;
use lumen_core::{check_unit_interval, DisplaySink, LumenError, Result, Scheduler, TaskId};
use rand::Rng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Timing, odds and styles for a [`GlitchFlicker`]
#[derive(Clone, Debug, PartialEq)]
pub struct GlitchConfig {
    pub period_ms: u32,
    /// Probability of a glitch each period
    pub chance: f32,
    pub hold_ms: u32,
    pub glitch_style: String,
    pub rest_style: String,
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            chance: 0.05,
            hold_ms: 100,
            glitch_style: "2px 0 0 var(--neon-pink), -2px 0 0 var(--neon-blue)".to_string(),
            rest_style:
                "0 0 10px var(--neon-pink), 0 0 20px var(--neon-pink), 0 0 30px var(--neon-pink)"
                    .to_string(),
        }
    }
}

struct GlitchState<S: Scheduler, R> {
    scheduler: S,
    sink: Rc<dyn DisplaySink>,
    config: GlitchConfig,
    rng: RefCell<R>,
    next: Cell<Option<TaskId>>,
    burst: RefCell<Option<Transient<S>>>,
    bursts: Cell<u32>,
    cancelled: Cell<bool>,
}

impl<S, R> GlitchState<S, R>
where
    S: Scheduler + Clone + 'static,
    R: Rng + 'static,
{
    fn schedule(state: &Rc<Self>) -> bool {
        let next = Rc::clone(state);
        let id = state
            .scheduler
            .after(state.config.period_ms, Box::new(move || Self::period(&next)));
        state.next.set(id);
        id.is_some()
    }

    fn period(state: &Rc<Self>) {
        state.next.set(None);
        if state.cancelled.get() {
            return;
        }
        if !Self::schedule(state) {
            tracing::warn!("GlitchFlicker: scheduler dropped, stopping");
            return;
        }

        let hit = state
            .rng
            .borrow_mut()
            .gen_bool(state.config.chance as f64);
        if !hit {
            return;
        }

        // A burst longer than the period is cut short by the next one
        if let Some(previous) = state.burst.borrow_mut().take() {
            previous.finish();
        }
        match Transient::apply(
            state.scheduler.clone(),
            Rc::clone(&state.sink),
            &state.config.glitch_style,
            state.config.rest_style.clone(),
            state.config.hold_ms,
        ) {
            Ok(burst) => {
                *state.burst.borrow_mut() = Some(burst);
                state.bursts.set(state.bursts.get() + 1);
                tracing::trace!(bursts = state.bursts.get(), "glitch burst");
            }
            Err(err) => tracing::warn!(%err, "GlitchFlicker: burst not applied"),
        }
    }
}

/// Handle to a running glitch flicker
pub struct GlitchFlicker<S, R>
where
    S: Scheduler + Clone + 'static,
    R: Rng + 'static,
{
    state: Rc<GlitchState<S, R>>,
}

impl<S, R> GlitchFlicker<S, R>
where
    S: Scheduler + Clone + 'static,
    R: Rng + 'static,
{
    /// Start rolling every `config.period_ms`
    pub fn start(
        scheduler: S,
        sink: Rc<dyn DisplaySink>,
        config: GlitchConfig,
        rng: R,
    ) -> Result<Self> {
        check_unit_interval(config.chance)?;
        if config.period_ms == 0 {
            return Err(LumenError::InvalidDuration {
                duration_ms: config.hold_ms,
                tick_interval_ms: config.period_ms,
            });
        }

        let state = Rc::new(GlitchState {
            scheduler,
            sink,
            config,
            rng: RefCell::new(rng),
            next: Cell::new(None),
            burst: RefCell::new(None),
            bursts: Cell::new(0),
            cancelled: Cell::new(false),
        });
        if !GlitchState::schedule(&state) {
            return Err(LumenError::SchedulerGone);
        }
        Ok(Self { state })
    }

    /// Stop rolling; a burst in progress is restored immediately
    pub fn cancel(&self) {
        if self.state.cancelled.replace(true) {
            return;
        }
        if let Some(id) = self.state.next.take() {
            self.state.scheduler.cancel(id);
        }
        if let Some(burst) = self.state.burst.borrow_mut().take() {
            burst.finish();
        }
        tracing::debug!(bursts = self.state.bursts.get(), "GlitchFlicker cancelled");
    }

    /// Number of glitches so far
    pub fn bursts(&self) -> u32 {
        self.state.bursts.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{FrameClock, RecordingSink};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flicker(
        clock: &FrameClock,
        chance: f32,
        seed: u64,
    ) -> (RecordingSink, GlitchFlicker<lumen_core::ClockHandle, StdRng>) {
        let sink = RecordingSink::new();
        let config = GlitchConfig {
            chance,
            ..GlitchConfig::default()
        };
        let glitch = GlitchFlicker::start(
            clock.handle(),
            Rc::new(sink.clone()),
            config,
            StdRng::seed_from_u64(seed),
        )
        .unwrap();
        (sink, glitch)
    }

    #[test]
    fn test_always_glitches() {
        let clock = FrameClock::new();
        let (sink, glitch) = flicker(&clock, 1.0, 7);
        let config = GlitchConfig::default();

        clock.advance(1_050);
        assert_eq!(sink.writes(), vec![config.glitch_style.clone()]);

        clock.advance(50);
        assert_eq!(sink.last(), Some(config.rest_style.clone()));

        clock.advance(2_000);
        assert_eq!(glitch.bursts(), 3);
        assert_eq!(sink.len(), 6);
    }

    #[test]
    fn test_never_glitches() {
        let clock = FrameClock::new();
        let (sink, glitch) = flicker(&clock, 0.0, 7);

        clock.advance(10_000);
        assert_eq!(glitch.bursts(), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_bursts_alternate_styles() {
        let clock = FrameClock::new();
        let (sink, glitch) = flicker(&clock, 0.5, 42);
        let config = GlitchConfig::default();

        // Past the last restore so every burst is closed
        clock.advance(60_500);

        let writes = sink.writes();
        assert_eq!(writes.len() as u32, glitch.bursts() * 2);
        assert!(glitch.bursts() <= 60);
        for pair in writes.chunks(2) {
            assert_eq!(pair[0], config.glitch_style);
            assert_eq!(pair[1], config.rest_style);
        }
    }

    #[test]
    fn test_cancel_restores_and_stops() {
        let clock = FrameClock::new();
        let (sink, glitch) = flicker(&clock, 1.0, 7);
        let config = GlitchConfig::default();

        clock.advance(1_010);
        glitch.cancel();
        glitch.cancel();

        assert_eq!(sink.writes(), vec![config.glitch_style, config.rest_style]);
        clock.advance(10_000);
        assert_eq!(sink.len(), 2);
        assert!(!clock.has_pending());
    }

    #[test]
    fn test_invalid_config() {
        let clock = FrameClock::new();
        let sink: Rc<dyn DisplaySink> = Rc::new(RecordingSink::new());

        let bad_chance = GlitchConfig {
            chance: 2.0,
            ..GlitchConfig::default()
        };
        assert!(matches!(
            GlitchFlicker::start(clock.handle(), Rc::clone(&sink), bad_chance, StdRng::seed_from_u64(1)),
            Err(LumenError::InvalidThreshold(_))
        ));

        let bad_period = GlitchConfig {
            period_ms: 0,
            ..GlitchConfig::default()
        };
        assert!(matches!(
            GlitchFlicker::start(clock.handle(), sink, bad_period, StdRng::seed_from_u64(1)),
            Err(LumenError::InvalidDuration { .. })
        ));
    }
}
