//! A CPU scheduling library.
//!
//! This library simulates a single CPU that runs processes made of
//! alternating CPU and I/O bursts, on a discrete clock, under one of six
//! scheduling policies.
//!
//! ```
//! use scheduler::{fcfs, ProcessSpec, Scheduler};
//!
//! let mut scheduler = fcfs();
//! scheduler.admit(ProcessSpec::alternating("A", 0, &[3, 2, 1])).unwrap();
//! scheduler.admit(ProcessSpec::alternating("B", 0, &[2])).unwrap();
//! scheduler.run().unwrap();
//!
//! let order: Vec<_> = scheduler.completion_order().into_iter().map(|p| p.name()).collect();
//! assert_eq!(order, ["B", "A"]);
//! assert_eq!(scheduler.metrics().elapsed, 6);
//! ```

use std::num::NonZeroU64;

mod error;
mod machine;
mod process;
mod scheduler;
mod schedulers;

pub use crate::error::{Error, Result};
pub use crate::machine::Machine;
pub use crate::process::{Burst, BurstKind, Process, ProcessSpec};
pub use crate::scheduler::{
    Metrics, Pid, ProcessState, Scheduler, SchedulingDecision, Step, StopReason,
};
pub use crate::schedulers::{
    Band, Fcfs, Mlfq, Mlq, Priority, PriorityOrder, RoundRobin, Sjf, TieBreak,
};

/// Returns a structure that implements the `Scheduler` trait with a first come, first served policy
pub fn fcfs() -> Fcfs {
    Fcfs::new()
}

/// Returns a structure that implements the `Scheduler` trait with a non-preemptive shortest job first policy
///
/// * `tie_break` - how processes with next CPU bursts of the same length are ordered
pub fn sjf(tie_break: TieBreak) -> Sjf {
    Sjf::new(tie_break)
}

/// Returns a structure that implements the `Scheduler` trait with a round robin policy
///
/// * `timeslice` - the time quanta that a process can run before it is preempted
pub fn round_robin(timeslice: NonZeroU64) -> RoundRobin {
    RoundRobin::new(timeslice)
}

/// Returns a structure that implements the `Scheduler` trait with a non-preemptive priority policy
///
/// * `timeslice` - the time quanta used to rotate processes that share the most important priority
/// * `order` - whether lower or higher priority values run first
pub fn priority(timeslice: NonZeroU64, order: PriorityOrder) -> Priority {
    Priority::new(timeslice, order)
}

/// Returns a structure that implements the `Scheduler` trait with a two level queue policy
///
/// * `timeslice` - the time quanta of the foreground round robin queue
/// * `foreground` - the names of the foreground processes, every other process
///                  is a background process
pub fn mlq<I, N>(timeslice: NonZeroU64, foreground: I) -> Mlq
where
    I: IntoIterator<Item = N>,
    N: Into<String>,
{
    Mlq::new(timeslice, foreground)
}

/// Returns a structure that implements the `Scheduler` trait with a three level feedback queue policy
///
/// * `first` - the time quanta of level 0
/// * `second` - the time quanta of level 1, level 2 runs whole bursts
pub fn mlfq(first: NonZeroU64, second: NonZeroU64) -> Mlfq {
    Mlfq::new(first, second)
}
