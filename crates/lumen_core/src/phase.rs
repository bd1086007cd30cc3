/// Lifecycle shared by gates, tweens and the effects built on them
///
/// `Pending -> Active -> Done`, with `Cancelled` as the other way out.
/// Both terminal states ignore any further signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Registered, not yet triggered
    #[default]
    Pending,
    /// Observing or ticking
    Active,
    /// Ran to completion
    Done,
    /// Stopped by `cancel()`
    Cancelled,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Cancelled)
    }
}
