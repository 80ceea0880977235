use thiserror::Error;

/// Error produced while reading a bus schedule or a notes file.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ParseError {
    /// A token is neither a bus period nor the `x` placeholder.
    #[error("invalid token '{token}' at position {position}")]
    InvalidToken { token: String, position: usize },

    /// A bus period of zero can never depart.
    #[error("bus at position {position} has period 0")]
    ZeroPeriod { position: usize },

    /// The first line of the notes is not a timestamp.
    #[error("invalid earliest departure timestamp '{0}'")]
    InvalidTimestamp(String),

    /// The notes contain no schedule line.
    #[error("notes contain no bus schedule")]
    MissingSchedule,
}

/// Error reported by a solver backend.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum BackendError {
    /// The model uses a shape the backend cannot solve.
    #[error("unsupported model: {0}")]
    Unsupported(String),

    /// The underlying solver failed; carries its message.
    #[error("solver failure: {0}")]
    Solver(String),

    /// Intermediate arithmetic left the 128-bit range.
    #[error("arithmetic overflow while solving")]
    Overflow,
}

/// Error returned when synchronizing the departures of a schedule.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SolveError {
    /// The schedule has only placeholders.
    #[error("schedule contains no real buses")]
    NoBuses,

    /// The notes lack the earliest departure timestamp.
    #[error("notes contain no earliest departure timestamp")]
    MissingTimestamp,

    /// No timestamp satisfies every bus within the search bound.
    #[error("no synchronized timestamp found within bound {bound}")]
    Infeasible { bound: u128 },

    /// The solver reported an unbounded objective.
    #[error("objective is unbounded")]
    Unbounded,

    /// A computed value, such as a timestamp beyond `u64`, left its integer range.
    #[error("value exceeds the supported integer range")]
    Overflow,

    /// The solver returned values that do not satisfy the schedule.
    #[error("timestamp {timestamp} misses the bus at position {position}")]
    InvalidSolution { timestamp: u128, position: usize },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<super::Overflow> for BackendError {
    fn from(_: super::Overflow) -> Self {
        Self::Overflow
    }
}

impl From<super::Overflow> for SolveError {
    fn from(_: super::Overflow) -> Self {
        Self::Overflow
    }
}
