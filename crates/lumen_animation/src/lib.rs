//! Lumen Animation
//!
//! Event rate limiting and visibility-gated animation.
//!
//! # Features
//!
//! - **RateLimiter**: leading-edge throttle; triggers during the cooldown are dropped
//! - **VisibilityGate**: one-shot callback when a region first becomes visible enough
//! - **NumericTween**: counts a display up to a target, timer- or frame-driven
//! - **Effects**: scroll reveal, parallax, progress groups, stagger, transient
//!   styles and glitch flicker, all built on the three primitives
//!
//! Every component is constructed with its scheduler, source and sink passed
//! in. Dropping a component's handle does not stop it; use `cancel()`.

pub mod effects;
pub mod rate_limiter;
pub mod tween;
pub mod visibility;

pub use effects::{
    GlitchConfig, GlitchFlicker, Parallax, ProgressGroup, ProgressItem, ScrollReveal, Stagger,
    Transient,
};
pub use rate_limiter::RateLimiter;
pub use tween::{NumericTween, TickSource, TweenConfig};
pub use visibility::VisibilityGate;

// Re-export the core capabilities for convenience
pub use lumen_core::{DisplaySink, LumenError, Phase, Result, Scheduler};
