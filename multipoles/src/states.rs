/// One of the three charge states a segment can be evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeState {
    /// The anionic state (-1).
    Anion,
    /// The neutral state (0).
    Neutral,
    /// The cationic state (+1).
    Cation,
}

impl ChargeState {
    /// The order in which the states of a segment are evaluated.
    pub const EVAL_ORDER: [ChargeState; 3] =
        [ChargeState::Neutral, ChargeState::Anion, ChargeState::Cation];

    /// Returns the slot of this state in the per-state tables.
    pub const fn index(self) -> usize {
        match self {
            ChargeState::Anion => 0,
            ChargeState::Neutral => 1,
            ChargeState::Cation => 2,
        }
    }

    /// Returns the net charge of this state.
    pub const fn as_int(self) -> i32 {
        match self {
            ChargeState::Anion => -1,
            ChargeState::Neutral => 0,
            ChargeState::Cation => 1,
        }
    }

    /// Creates a [`ChargeState`] from a net charge.
    pub const fn from_int(state: i32) -> Option<Self> {
        match state {
            -1 => Some(ChargeState::Anion),
            0 => Some(ChargeState::Neutral),
            1 => Some(ChargeState::Cation),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChargeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChargeState::Anion => write!(f, "-1"),
            ChargeState::Neutral => write!(f, "0"),
            ChargeState::Cation => write!(f, "+1"),
        }
    }
}
