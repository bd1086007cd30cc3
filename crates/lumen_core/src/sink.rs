//! Display sinks
//!
//! A [`DisplaySink`] is wherever a behavior's output ends up: a counter's
//! text, a style value, a class name. Behaviors only ever write strings to
//! it, which keeps them testable without a rendering surface.

use std::cell::RefCell;
use std::rc::Rc;

/// Destination for rendered text
pub trait DisplaySink {
    fn write(&self, text: &str);
}

impl<T: DisplaySink + ?Sized> DisplaySink for Rc<T> {
    fn write(&self, text: &str) {
        (**self).write(text)
    }
}

impl<T: DisplaySink + ?Sized> DisplaySink for Box<T> {
    fn write(&self, text: &str) {
        (**self).write(text)
    }
}

/// Adapts a closure into a sink
///
/// ```ignore
/// let sink = FnSink(|text: &str| println!("{text}"));
/// ```
pub struct FnSink<F>(pub F);

impl<F: Fn(&str)> DisplaySink for FnSink<F> {
    fn write(&self, text: &str) {
        (self.0)(text)
    }
}

/// Sink that keeps every write, shared between its clones
///
/// Clone it before handing it to a behavior, then inspect the one you kept.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    writes: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes so far, oldest first
    pub fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.writes.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.writes.borrow_mut().clear();
    }
}

impl DisplaySink for RecordingSink {
    fn write(&self, text: &str) {
        self.writes.borrow_mut().push(text.to_string());
    }
}

/// Sink that emits a `tracing` event per write
#[derive(Clone, Debug)]
pub struct TracingSink {
    label: String,
}

impl TracingSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl DisplaySink for TracingSink {
    fn write(&self, text: &str) {
        tracing::info!(target: "lumen::sink", sink = %self.label, "{}", text);
    }
}
