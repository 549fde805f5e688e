/// The current phase of a session sync.
/// Transitions run strictly forward and always end in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// No sync is running for this pane.
    #[default]
    Idle,

    /// Enumerating cookies across the domain set.
    Collecting,

    /// Partitioning cookies into important and ordinary.
    Classifying,

    /// Writing session-priority cookies (including fallback writes).
    ApplyingSession,

    /// Writing the remaining cookies with the ordinary policy.
    ApplyingOrdinary,

    /// Re-applying auth cookies for multi-host providers.
    SpecialDomainPass,
}

impl SyncPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, SyncPhase::Idle)
    }

    /// Position in the pipeline; `Idle` is 0.
    pub fn ordinal(&self) -> u8 {
        match self {
            SyncPhase::Idle => 0,
            SyncPhase::Collecting => 1,
            SyncPhase::Classifying => 2,
            SyncPhase::ApplyingSession => 3,
            SyncPhase::ApplyingOrdinary => 4,
            SyncPhase::SpecialDomainPass => 5,
        }
    }
}
