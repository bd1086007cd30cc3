//! Scroll reveal
//!
//! A section is revealed once its top edge rises above a fraction of the
//! viewport height. Reveal is one-way: scrolling back up never hides it.

use lumen_core::{
    check_unit_interval, DisplaySink, LumenError, RegionId, Result, ScrollEvent,
    ScrollListenerId, Viewport,
};
use std::cell::RefCell;
use std::rc::Rc;

struct RevealSection {
    region: RegionId,
    top: f32,
    sink: Box<dyn DisplaySink>,
    revealed: bool,
}

/// Reveals sections as they scroll into the upper part of the viewport
pub struct ScrollReveal {
    fraction: f32,
    sections: RefCell<Vec<RevealSection>>,
}

impl ScrollReveal {
    /// Reveal once the section top is above 80% of the viewport height
    pub const DEFAULT_FRACTION: f32 = 0.8;

    /// Written to a section's sink when it is revealed
    pub const VISIBLE_CLASS: &'static str = "visible";

    /// Set up reveal for `sections` and check them against the current scroll
    pub fn new(
        viewport: &Viewport,
        fraction: f32,
        sections: Vec<(RegionId, Box<dyn DisplaySink>)>,
    ) -> Result<Self> {
        let fraction = check_unit_interval(fraction)?;
        let sections = sections
            .into_iter()
            .map(|(region, sink)| {
                let placed = viewport
                    .region(region)
                    .ok_or(LumenError::TargetNotFound(region))?;
                Ok(RevealSection {
                    region,
                    top: placed.top,
                    sink,
                    revealed: false,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let reveal = Self {
            fraction,
            sections: RefCell::new(sections),
        };
        reveal.check(ScrollEvent {
            scroll_y: viewport.scroll_y(),
            viewport_height: viewport.height(),
        });
        Ok(reveal)
    }

    /// Check on every scroll of `viewport`
    pub fn attach(self, viewport: &Viewport) -> (Rc<Self>, ScrollListenerId) {
        let reveal = Rc::new(self);
        let listener = Rc::clone(&reveal);
        let id = viewport.on_scroll(Box::new(move |event| {
            listener.check(event);
        }));
        (reveal, id)
    }

    /// Reveal every section now above the line; returns how many were newly revealed
    pub fn check(&self, event: ScrollEvent) -> usize {
        let line = event.viewport_height * self.fraction;
        let mut newly = 0;
        for section in self.sections.borrow_mut().iter_mut() {
            if section.revealed || section.top - event.scroll_y >= line {
                continue;
            }
            section.revealed = true;
            section.sink.write(Self::VISIBLE_CLASS);
            tracing::debug!(region = ?section.region, scroll_y = event.scroll_y, "section revealed");
            newly += 1;
        }
        newly
    }

    pub fn is_revealed(&self, region: RegionId) -> bool {
        self.sections
            .borrow()
            .iter()
            .any(|section| section.region == region && section.revealed)
    }

    /// Number of sections revealed so far
    pub fn revealed(&self) -> usize {
        self.sections
            .borrow()
            .iter()
            .filter(|section| section.revealed)
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.sections.borrow().iter().all(|section| section.revealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::RecordingSink;

    fn sections(
        viewport: &Viewport,
        tops: &[f32],
    ) -> (Vec<RegionId>, Vec<RecordingSink>, Vec<(RegionId, Box<dyn DisplaySink>)>) {
        let mut ids = Vec::new();
        let mut sinks = Vec::new();
        let mut entries: Vec<(RegionId, Box<dyn DisplaySink>)> = Vec::new();
        for &top in tops {
            let id = viewport.add_region(top, 300.0);
            let sink = RecordingSink::new();
            ids.push(id);
            sinks.push(sink.clone());
            entries.push((id, Box::new(sink)));
        }
        (ids, sinks, entries)
    }

    #[test]
    fn test_initial_check_reveals_above_the_line() {
        let viewport = Viewport::new(1000.0);
        let (ids, sinks, entries) = sections(&viewport, &[0.0, 700.0, 900.0]);

        let reveal = ScrollReveal::new(&viewport, 0.8, entries).unwrap();

        // Line is at 800px
        assert!(reveal.is_revealed(ids[0]));
        assert!(reveal.is_revealed(ids[1]));
        assert!(!reveal.is_revealed(ids[2]));
        assert_eq!(sinks[0].writes(), vec!["visible"]);
        assert!(sinks[2].is_empty());
    }

    #[test]
    fn test_reveal_on_scroll_is_one_way() {
        let viewport = Viewport::new(1000.0);
        let (ids, sinks, entries) = sections(&viewport, &[0.0, 1500.0]);
        let (reveal, _) = ScrollReveal::new(&viewport, 0.8, entries)
            .unwrap()
            .attach(&viewport);

        viewport.scroll_to(600.0);
        assert!(!reveal.is_revealed(ids[1]));

        viewport.scroll_to(701.0);
        assert!(reveal.is_revealed(ids[1]));
        assert!(reveal.is_complete());

        viewport.scroll_to(0.0);
        viewport.scroll_to(900.0);
        assert_eq!(sinks[1].writes(), vec!["visible"]);
        assert_eq!(reveal.revealed(), 2);
    }

    #[test]
    fn test_missing_section() {
        let viewport = Viewport::new(1000.0);
        let (ids, _, entries) = sections(&viewport, &[0.0, 100.0]);
        viewport.remove_region(ids[1]);

        let result = ScrollReveal::new(&viewport, 0.8, entries);
        assert!(matches!(result, Err(LumenError::TargetNotFound(id)) if id == ids[1]));
    }

    #[test]
    fn test_invalid_fraction() {
        let viewport = Viewport::new(1000.0);
        let result = ScrollReveal::new(&viewport, 1.2, Vec::new());
        assert!(matches!(result, Err(LumenError::InvalidThreshold(_))));
    }
}
