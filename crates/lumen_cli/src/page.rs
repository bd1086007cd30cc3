//! Page simulation
//!
//! Wires every configured behavior onto a [`FrameClock`] and a [`Viewport`],
//! replays the scroll script, and records each sink write with the virtual
//! time it happened at.

use crate::config::{PageConfig, ScriptConfig};
use anyhow::{Context, Result};
use lumen_animation::{
    GlitchConfig, GlitchFlicker, Parallax, ProgressGroup, ProgressItem, RateLimiter,
    ScrollReveal, Stagger, TickSource, Transient, TweenConfig,
};
use lumen_core::{
    ClockHandle, DisplaySink, FnSink, FrameClock, RegionId, Scheduler, ScrollEvent, Viewport,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const CARD_SPIN: &str = "rotateY(360deg) scale(1.1)";
pub const CARD_REST: &str = "rotateY(0deg) scale(1)";

/// One value written to one element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkWrite {
    pub at_ms: u64,
    pub element: String,
    pub text: String,
}

#[derive(Clone)]
struct Recorder {
    clock: ClockHandle,
    writes: Rc<RefCell<Vec<SinkWrite>>>,
}

impl Recorder {
    /// Sink that timestamps writes to `element`
    fn sink(&self, element: impl Into<String>) -> impl DisplaySink + 'static {
        let element = element.into();
        let clock = self.clock.clone();
        let writes = Rc::clone(&self.writes);
        FnSink(move |text: &str| {
            tracing::debug!(element = %element, text, "write");
            writes.borrow_mut().push(SinkWrite {
                at_ms: clock.now_ms(),
                element: element.clone(),
                text: text.to_string(),
            });
        })
    }
}

enum Step<'a> {
    Scroll(f32),
    Click(&'a str),
}

/// A page with every behavior attached
pub struct Page {
    clock: FrameClock,
    viewport: Viewport,
    recorder: Recorder,
    reveal: Rc<ScrollReveal>,
    throttle: Rc<RateLimiter<ClockHandle, ScrollEvent>>,
    skills: Option<ProgressGroup<ClockHandle, Viewport>>,
    tasks: Option<ProgressGroup<ClockHandle, Viewport>>,
    timeline: Option<Stagger<ClockHandle>>,
    glitch: Option<GlitchFlicker<ClockHandle, StdRng>>,
    cards: HashMap<String, Rc<dyn DisplaySink>>,
    card_hold_ms: u32,
    spins: Vec<Transient<ClockHandle>>,
}

impl Page {
    pub fn build(config: &PageConfig) -> Result<Self> {
        config.validate()?;

        let clock = FrameClock::with_frame_interval(config.viewport.frame_interval_ms);
        let viewport = Viewport::new(config.viewport.height);
        let recorder = Recorder {
            clock: clock.handle(),
            writes: Rc::default(),
        };

        let regions: HashMap<&str, RegionId> = config
            .sections
            .iter()
            .map(|s| (s.name.as_str(), viewport.add_region(s.top, s.height)))
            .collect();
        let region = |name: &str| {
            regions
                .get(name)
                .copied()
                .with_context(|| format!("Unknown section '{}'", name))
        };

        // Reveal and parallax follow every scroll; only the position sampler is throttled
        let mut reveal_sections = Vec::with_capacity(config.sections.len());
        for section in &config.sections {
            let sink: Box<dyn DisplaySink> = Box::new(recorder.sink(section.name.as_str()));
            reveal_sections.push((region(&section.name)?, sink));
        }
        let (reveal, _) =
            ScrollReveal::new(&viewport, config.scroll.reveal_fraction, reveal_sections)
                .context("Failed to set up scroll reveal")?
                .attach(&viewport);
        let sampler = recorder.sink("scroll");
        let throttle = Rc::new(RateLimiter::wrap(
            clock.handle(),
            config.scroll.throttle_ms,
            move |event: ScrollEvent| sampler.write(&format!("{}px", event.scroll_y)),
        )?);
        let throttled = Rc::clone(&throttle);
        viewport.on_scroll(Box::new(move |event| {
            throttled.trigger(event);
        }));
        Parallax::new(config.scroll.parallax_factor, recorder.sink("header")).attach(&viewport);

        let skills = match &config.skills {
            Some(skills) => {
                let items = skills
                    .items
                    .iter()
                    .map(|item| {
                        let tween = TweenConfig::new(
                            item.level,
                            item.level.saturating_mul(skills.tick_ms),
                        )
                        .tick(TickSource::timer(skills.tick_ms))
                        .suffix("%");
                        ProgressItem::new(recorder.sink(format!("skill:{}", item.name)), tween)
                    })
                    .collect();
                let group = ProgressGroup::observe(
                    clock.handle(),
                    viewport.clone(),
                    region(&skills.section)?,
                    skills.threshold,
                    items,
                )
                .context("Failed to set up skill counters")?;
                Some(group)
            }
            None => None,
        };

        let tasks = match &config.tasks {
            Some(tasks) => {
                let items = tasks
                    .items
                    .iter()
                    .map(|item| {
                        let tween = TweenConfig::new(item.progress, tasks.duration_ms).suffix("%");
                        ProgressItem::new(recorder.sink(format!("task:{}", item.name)), tween)
                    })
                    .collect();
                let group = ProgressGroup::observe(
                    clock.handle(),
                    viewport.clone(),
                    region(&tasks.section)?,
                    tasks.threshold,
                    items,
                )
                .context("Failed to set up task progress")?;
                Some(group)
            }
            None => None,
        };

        let timeline = match &config.timeline {
            Some(timeline) => {
                let nodes = (0..timeline.nodes)
                    .map(|i| {
                        Box::new(recorder.sink(format!("timeline:{}", i))) as Box<dyn DisplaySink>
                    })
                    .collect();
                Some(Stagger::start(
                    clock.handle(),
                    nodes,
                    timeline.step_ms,
                    timeline.animation.clone(),
                )?)
            }
            None => None,
        };

        let glitch = match &config.glitch {
            Some(settings) => {
                let rng = match settings.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let glitch_config = GlitchConfig {
                    period_ms: settings.period_ms,
                    chance: settings.chance,
                    hold_ms: settings.hold_ms,
                    ..GlitchConfig::default()
                };
                let flicker = GlitchFlicker::start(
                    clock.handle(),
                    Rc::new(recorder.sink("title")),
                    glitch_config,
                    rng,
                )
                .context("Failed to start glitch flicker")?;
                Some(flicker)
            }
            None => None,
        };

        let mut cards = HashMap::new();
        for name in config.cards.iter().flat_map(|c| c.names.iter()) {
            let sink: Rc<dyn DisplaySink> = Rc::new(recorder.sink(format!("card:{}", name)));
            cards.insert(name.clone(), sink);
        }
        let card_hold_ms = config.cards.as_ref().map_or(0, |c| c.hold_ms);

        tracing::debug!(
            sections = config.sections.len(),
            cards = cards.len(),
            "page built"
        );

        Ok(Self {
            clock,
            viewport,
            recorder,
            reveal,
            throttle,
            skills,
            tasks,
            timeline,
            glitch,
            cards,
            card_hold_ms,
            spins: Vec::new(),
        })
    }

    /// Move virtual time forward, running whatever comes due
    pub fn advance_to(&self, time_ms: u64) {
        self.clock.advance_to(time_ms);
    }

    pub fn scroll_to(&self, y: f32) {
        self.viewport.scroll_to(y);
    }

    /// Spin a card and schedule it to settle back
    pub fn click(&mut self, card: &str) -> Result<()> {
        let sink = self
            .cards
            .get(card)
            .with_context(|| format!("Unknown card '{}'", card))?;
        let spin = Transient::apply(
            self.clock.handle(),
            Rc::clone(sink),
            CARD_SPIN,
            CARD_REST,
            self.card_hold_ms,
        )?;
        self.spins.push(spin);
        Ok(())
    }

    /// Replay scrolls and clicks in time order, then run to `script.run_ms`
    pub fn run(&mut self, script: &ScriptConfig) -> Result<()> {
        let mut steps: Vec<(u64, Step<'_>)> = script
            .scroll
            .iter()
            .map(|s| (s.at_ms, Step::Scroll(s.y)))
            .chain(
                script
                    .clicks
                    .iter()
                    .map(|c| (c.at_ms, Step::Click(c.card.as_str()))),
            )
            .collect();
        steps.sort_by_key(|(at_ms, _)| *at_ms);

        for (at_ms, step) in steps {
            self.advance_to(at_ms);
            match step {
                Step::Scroll(y) => self.scroll_to(y),
                Step::Click(card) => self.click(card)?,
            }
        }
        self.advance_to(script.run_ms);
        Ok(())
    }

    /// Cancel everything still running and hand back the recorded writes
    pub fn finish(self) -> Vec<SinkWrite> {
        self.throttle.cancel();
        if let Some(skills) = &self.skills {
            skills.cancel();
        }
        if let Some(tasks) = &self.tasks {
            tasks.cancel();
        }
        if let Some(timeline) = &self.timeline {
            timeline.cancel();
        }
        if let Some(glitch) = &self.glitch {
            glitch.cancel();
        }
        for spin in &self.spins {
            spin.cancel();
        }

        tracing::info!(
            at_ms = self.clock.now_ms(),
            revealed = self.reveal.revealed(),
            left_pending = self.clock.pending(),
            "simulation finished"
        );
        self.recorder.writes.take()
    }
}

/// Build the page, replay its script, and return every write
pub fn simulate(config: &PageConfig) -> Result<Vec<SinkWrite>> {
    let mut page = Page::build(config)?;
    page.run(&config.script)?;
    Ok(page.finish())
}
