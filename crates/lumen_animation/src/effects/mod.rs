//! Page behaviors composed from the animation primitives
//!
//! - [`ScrollReveal`] - mark sections visible once they scroll far enough up
//! - [`Parallax`] - translate an element by a fraction of the scroll offset
//! - [`ProgressGroup`] - a visibility gate that starts a batch of counters
//! - [`Stagger`] - apply a style to a list of elements one step apart
//! - [`Transient`] - apply a style, then restore another after a hold
//! - [`GlitchFlicker`] - random periodic transient bursts

mod glitch;
mod parallax;
mod progress;
mod reveal;
mod stagger;
mod transient;

pub use glitch::{GlitchConfig, GlitchFlicker};
pub use parallax::Parallax;
pub use progress::{ProgressGroup, ProgressItem};
pub use reveal::ScrollReveal;
pub use stagger::Stagger;
pub use transient::Transient;
