use std::fmt::{self, Display};
use std::num::{NonZeroU64, NonZeroUsize};

use log::warn;

use crate::{Machine, Process, ProcessSpec, Result};

/// The PID of a process
///
/// The PID cannot be 0, PIDs start from 1 and follow the admission order.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Pid(NonZeroUsize);

impl Pid {
    pub fn new(pid: usize) -> Pid {
        Pid(NonZeroUsize::new(pid).expect("PIDs start from 1"))
    }

    pub(crate) fn from_index(index: usize) -> Pid {
        Pid(NonZeroUsize::MIN.saturating_add(index))
    }

    pub(crate) fn index(self) -> usize {
        self.0.get() - 1
    }
}

impl PartialEq<usize> for Pid {
    fn eq(&self, other: &usize) -> bool {
        self.0.get() == *other
    }
}

impl Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The state of a process.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProcessState {
    /// The process waits for the CPU, or has not arrived yet.
    Waiting,

    /// The process is on the CPU.
    Running,

    /// The process is consuming an I/O burst.
    Io,

    /// The process has consumed all of its bursts.
    Finished,
}

impl Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Waiting => write!(f, "WAITING"),
            ProcessState::Running => write!(f, "RUNNING"),
            ProcessState::Io => write!(f, "IO"),
            ProcessState::Finished => write!(f, "FINISHED"),
        }
    }
}

/// The action a scheduler took during one [`Scheduler::step`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SchedulingDecision {
    /// Run the process with PID `pid` for a maximum of `timeslice` time units.
    Run { pid: Pid, timeslice: NonZeroU64 },

    /// Nothing was ready, the CPU stayed idle for this many time units.
    Idle(NonZeroU64),

    /// There are no more processes to schedule.
    Done,
}

impl Display for SchedulingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingDecision::Run { pid, timeslice } => {
                write!(f, "Run {} for {} units", pid, timeslice)
            }
            SchedulingDecision::Idle(amount) => {
                write!(f, "Idle for {} units", amount)
            }
            SchedulingDecision::Done => {
                write!(f, "Done, no more processes")
            }
        }
    }
}

/// The reason a process left the CPU.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The CPU burst ended and the process moved on to an I/O burst.
    Io,

    /// The CPU burst ended and it was the last burst.
    Finished,

    /// The timeslice expired before the CPU burst ended.
    Expired,

    /// A process from a more important queue became ready.
    Preempted,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Io => write!(f, "Sent to IO"),
            StopReason::Finished => write!(f, "Finished"),
            StopReason::Expired => write!(f, "Expired"),
            StopReason::Preempted => write!(f, "Preempted"),
        }
    }
}

/// What happened during one call to [`Scheduler::step`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Step {
    /// The clock value when the step started.
    pub clock: u64,
    pub decision: SchedulingDecision,
    /// Why the dispatched process left the CPU, for [`SchedulingDecision::Run`] steps.
    pub stop: Option<StopReason>,
}

impl Step {
    pub(crate) fn run(clock: u64, pid: Pid, timeslice: NonZeroU64, stop: StopReason) -> Step {
        Step {
            clock,
            decision: SchedulingDecision::Run { pid, timeslice },
            stop: Some(stop),
        }
    }

    pub(crate) fn idle(clock: u64, amount: NonZeroU64) -> Step {
        Step {
            clock,
            decision: SchedulingDecision::Idle(amount),
            stop: None,
        }
    }

    pub(crate) fn done(clock: u64) -> Step {
        Step {
            clock,
            decision: SchedulingDecision::Done,
            stop: None,
        }
    }
}

/// Engine level counters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Metrics {
    /// The final clock value.
    pub elapsed: u64,
    /// Time units in which no process was on the CPU.
    pub idle: u64,
}

impl Metrics {
    /// Fraction of the elapsed time the CPU was busy, 0 when nothing ran.
    pub fn cpu_utilization(&self) -> f64 {
        if self.elapsed == 0 {
            return 0.0;
        }
        (self.elapsed - self.idle) as f64 / self.elapsed as f64
    }
}

/// The trait that every scheduling policy implements.
///
/// A policy owns a [`Machine`] with the processes, the clock and the
/// completion list, plus its own ready queues.
pub trait Scheduler {
    /// Short name of the policy.
    fn name(&self) -> &'static str;

    /// Validates and admits a process. It joins a ready queue as soon as it arrives.
    fn admit(&mut self, spec: ProcessSpec) -> Result<Pid>;

    /// Makes one scheduling decision and advances the clock accordingly.
    fn step(&mut self) -> Step;

    fn machine(&self) -> &Machine;

    fn machine_mut(&mut self) -> &mut Machine;

    /// Returns the ready processes in the order they would be dispatched.
    fn ready(&self) -> Vec<&Process>;

    /// Returns policy specific details about a process.
    fn extra(&self, _pid: Pid) -> String {
        String::new()
    }

    /// Steps until every admitted process has finished.
    fn run(&mut self) -> Result<()> {
        while self.step().decision != SchedulingDecision::Done {
            if let Err(err) = self.machine().check_budget() {
                warn!("{}: {err}", self.name());
                return Err(err);
            }
        }
        Ok(())
    }

    fn clock(&self) -> u64 {
        self.machine().clock()
    }

    fn running(&self) -> Option<&Process> {
        self.machine().running()
    }

    fn io(&self) -> Vec<&Process> {
        self.machine().io().collect()
    }

    /// Returns every admitted process in PID order.
    fn list(&self) -> Vec<&Process> {
        self.machine().processes().iter().collect()
    }

    /// Returns the finished processes in the order they finished.
    fn completion_order(&self) -> Vec<&Process> {
        self.machine().completed().collect()
    }

    fn metrics(&self) -> Metrics {
        self.machine().metrics()
    }

    fn is_done(&self) -> bool {
        self.machine().is_done()
    }
}
