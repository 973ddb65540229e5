//! The scheduling policies.
//!
//! Every policy keeps its own ready queues and leaves the clock, the
//! processes and the completion list to the shared [`crate::Machine`].

mod fcfs;
pub use fcfs::Fcfs;

mod sjf;
pub use sjf::{Sjf, TieBreak};

mod round_robin;
pub use round_robin::RoundRobin;

mod priority;
pub use priority::{Priority, PriorityOrder};

mod mlq;
pub use mlq::{Band, Mlq};

mod mlfq;
pub use mlfq::Mlfq;
