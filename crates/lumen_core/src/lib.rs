//! Lumen Core Runtime
//!
//! The capabilities that page behaviors are built on, with no rendering
//! surface attached:
//!
//! - [`Scheduler`] - deferred work (`after`, `on_next_frame`, `cancel`)
//! - [`IntersectionSource`] - visibility ratio of a region, on demand or via notification
//! - [`DisplaySink`] - wherever a value ends up being shown
//!
//! Concrete implementations are provided for each: [`FrameClock`] is a
//! deterministic virtual-time scheduler, [`Viewport`] is a geometric scroll
//! model, and [`RecordingSink`] / [`TracingSink`] capture writes.
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::{FrameClock, Scheduler};
//!
//! let clock = FrameClock::new();
//! let handle = clock.handle();
//! handle.after(100, Box::new(|| println!("fired")));
//! clock.advance(100);
//! ```

pub mod clock;
pub mod error;
pub mod phase;
pub mod sink;
pub mod viewport;

pub use clock::{
    ClockHandle, FrameClock, Scheduler, Task, TaskId, DEFAULT_FRAME_INTERVAL_MS,
};
pub use error::{check_unit_interval, LumenError, Result};
pub use phase::Phase;
pub use sink::{DisplaySink, FnSink, RecordingSink, TracingSink};
pub use viewport::{
    IntersectionListener, IntersectionSource, Observation, ObserverId, Region, RegionId,
    ScrollEvent, ScrollListener, ScrollListenerId, Viewport,
};
