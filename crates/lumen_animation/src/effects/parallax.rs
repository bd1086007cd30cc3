//! Parallax header

use lumen_core::{DisplaySink, ScrollEvent, ScrollListenerId, Viewport};
use std::cell::Cell;

/// Translates an element by `factor` times the scroll offset
pub struct Parallax {
    factor: f32,
    sink: Box<dyn DisplaySink>,
    last: Cell<Option<f32>>,
}

impl Parallax {
    pub const DEFAULT_FACTOR: f32 = 0.5;

    pub fn new(factor: f32, sink: impl DisplaySink + 'static) -> Self {
        Self {
            factor,
            sink: Box::new(sink),
            last: Cell::new(None),
        }
    }

    /// Apply on every scroll of `viewport`
    pub fn attach(self, viewport: &Viewport) -> ScrollListenerId {
        viewport.on_scroll(Box::new(move |event| self.apply(event)))
    }

    /// Write the transform for `event`, skipping unchanged offsets
    pub fn apply(&self, event: ScrollEvent) {
        let offset = event.scroll_y * self.factor;
        if self.last.replace(Some(offset)) == Some(offset) {
            return;
        }
        self.sink.write(&format!("translateY({}px)", offset));
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Offset written last
    pub fn offset(&self) -> Option<f32> {
        self.last.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::RecordingSink;

    #[test]
    fn test_translates_with_scroll() {
        let viewport = Viewport::new(800.0);
        let sink = RecordingSink::new();
        Parallax::new(0.5, sink.clone()).attach(&viewport);

        viewport.scroll_to(100.0);
        viewport.scroll_to(25.0);
        viewport.scroll_to(25.0);

        assert_eq!(sink.writes(), vec!["translateY(50px)", "translateY(12.5px)"]);
    }

    #[test]
    fn test_apply_directly() {
        let sink = RecordingSink::new();
        let parallax = Parallax::new(Parallax::DEFAULT_FACTOR, sink.clone());

        parallax.apply(ScrollEvent {
            scroll_y: 300.0,
            viewport_height: 800.0,
        });

        assert_eq!(parallax.offset(), Some(150.0));
        assert_eq!(sink.last().as_deref(), Some("translateY(150px)"));
    }
}
