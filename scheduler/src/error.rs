use std::fmt::{self, Display};

use crate::BurstKind;

/// Errors reported before or while running a simulation.
///
/// Malformed rosters are rejected when a process is admitted, so a run never
/// starts with input it cannot finish. Engine invariant violations are not
/// represented here: those panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The process has no bursts at all.
    EmptyBursts { name: String },

    /// The first burst of the process is an I/O burst.
    FirstBurstNotCpu { name: String },

    /// Two bursts of the same kind follow each other.
    ConsecutiveBursts {
        name: String,
        /// Position of the second burst of the pair.
        index: usize,
        kind: BurstKind,
    },

    /// A burst with a duration of zero time units.
    ZeroLengthBurst { name: String, index: usize },

    /// Another process with the same name was already admitted.
    DuplicateName { name: String },

    /// The simulated clock went past the configured budget.
    TickBudgetExceeded { budget: u64, clock: u64 },
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyBursts { name } => write!(f, "process {name} has no bursts"),
            Error::FirstBurstNotCpu { name } => {
                write!(f, "process {name} must start with a CPU burst")
            }
            Error::ConsecutiveBursts { name, index, kind } => write!(
                f,
                "process {name}: burst {index} is a second consecutive {kind} burst"
            ),
            Error::ZeroLengthBurst { name, index } => {
                write!(f, "process {name}: burst {index} has a duration of 0")
            }
            Error::DuplicateName { name } => write!(f, "process {name} was already admitted"),
            Error::TickBudgetExceeded { budget, clock } => write!(
                f,
                "simulation reached clock {clock}, over the budget of {budget} time units"
            ),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
