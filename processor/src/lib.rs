//! A processor simulation library
//!
//! This is used for running the schedulers from the [`scheduler`] crate to
//! completion while keeping a snapshot of the machine after every decision.

use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::Path;

use log::info;
use scheduler::{Pid, Process, ProcessSpec, ProcessState, Result, Scheduler, SchedulingDecision, Step};

mod roster;
mod summary;

pub use roster::{fixture, fixture_foreground, Generator};
pub use summary::{ProcessReport, Summary};

/// Running iteration log
#[derive(Debug, Clone, PartialEq)]
pub struct Log {
    /// The decision taken by the scheduler and the clock it was taken at.
    pub step: Step,

    /// The name of the process that the decision put on the CPU.
    pub on_cpu: Option<String>,

    /// The ready processes after the step, in the order they would be dispatched.
    pub ready: Vec<String>,

    /// The processes consuming an I/O burst after the step.
    pub io: Vec<String>,

    /// The finished processes, in the order they finished.
    pub completed: Vec<String>,

    /// Admitted processes that have not arrived yet, by arrival time.
    pub pending: Vec<String>,

    /// Every admitted process, in PID order.
    pub processes: Vec<ProcessInfo>,
}

fn names(processes: Vec<&Process>) -> Vec<String> {
    processes
        .into_iter()
        .map(|process| process.name().to_string())
        .collect()
}

impl Log {
    fn new<S: Scheduler>(scheduler: &S, step: Step) -> Log {
        let on_cpu = match step.decision {
            SchedulingDecision::Run { pid, .. } => {
                Some(scheduler.machine().process(pid).name().to_string())
            }
            SchedulingDecision::Idle(_) | SchedulingDecision::Done => None,
        };
        Log {
            step,
            on_cpu,
            ready: names(scheduler.ready()),
            io: names(scheduler.io()),
            completed: names(scheduler.completion_order()),
            pending: names(scheduler.machine().pending().collect()),
            processes: scheduler
                .list()
                .into_iter()
                .map(|process| ProcessInfo::new(process, scheduler.extra(process.pid())))
                .collect(),
        }
    }
}

impl Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step.clock, self.step.decision)?;
        if let Some(name) = &self.on_cpu {
            write!(f, " ({name})")?;
        }
        if let Some(reason) = self.step.stop {
            write!(f, " -> {reason}")?;
        }
        writeln!(f)?;
        writeln!(f, "PID\tNAME\tSTATE\t\tPRI\tCPU\tIO\tWAIT\tEXTRA")?;
        for process in &self.processes {
            writeln!(f, "{process}")?;
        }
        writeln!(f, "READY: {}", self.ready.join(" "))?;
        writeln!(f, "IO: {}", self.io.join(" "))?;
        writeln!(f, "DONE: {}", self.completed.join(" "))?;
        writeln!(f, "PENDING: {}", self.pending.join(" "))
    }
}

/// Information about a process state.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessInfo {
    /// The PID of the process.
    pub pid: Pid,

    pub name: String,

    /// The process state.
    pub state: ProcessState,

    /// The process priority
    pub priority: i32,

    /// The process timings (cpu time, io time, waiting time).
    pub timings: (u64, u64, u64),

    /// Extra details about the process
    pub extra: String,
}

impl ProcessInfo {
    fn new(process: &Process, extra: String) -> ProcessInfo {
        ProcessInfo {
            pid: process.pid(),
            name: process.name().to_string(),
            state: process.state(),
            priority: process.priority(),
            timings: (process.cpu_time(), process.io_time(), process.waiting_time()),
            extra,
        }
    }
}

impl Display for ProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t\t{}\t{}\t{}\t{}\t{}",
            self.pid,
            self.name,
            self.state,
            self.priority,
            self.timings.0,
            self.timings.1,
            self.timings.2,
            self.extra
        )
    }
}

/// The processor simulator.
#[derive(Debug)]
pub struct Processor<S: Scheduler> {
    scheduler: S,
    logs: Vec<Log>,
}

impl<S: Scheduler> Processor<S> {
    /// Admits `roster` to `scheduler` and runs it until every process has finished.
    ///
    /// * `scheduler` - the scheduler to use for the simulation.
    /// * `roster` - the processes, admitted in this order. A malformed process
    ///              stops the simulation before anything runs.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use processor::Processor;
    /// use scheduler::ProcessSpec;
    /// use std::num::NonZeroU64;
    ///
    /// let roster = vec![
    ///     ProcessSpec::alternating("A", 0, &[4, 2, 1]),
    ///     ProcessSpec::alternating("B", 0, &[3]),
    /// ];
    /// let processor = Processor::run(scheduler::round_robin(NonZeroU64::new(2).unwrap()), roster).unwrap();
    /// assert_eq!(processor.summary().order, ["B", "A"]);
    /// ```
    pub fn run(mut scheduler: S, roster: impl IntoIterator<Item = ProcessSpec>) -> Result<Processor<S>> {
        for spec in roster {
            scheduler.admit(spec)?;
        }
        info!(
            "{}: running {} processes",
            scheduler.name(),
            scheduler.list().len()
        );

        let mut logs = vec![];
        loop {
            let step = scheduler.step();
            logs.push(Log::new(&scheduler, step));
            if step.decision == SchedulingDecision::Done {
                break;
            }
            scheduler.machine().check_budget()?;
        }

        let metrics = scheduler.metrics();
        info!(
            "{}: done at {} after {} idle units",
            scheduler.name(),
            metrics.elapsed,
            metrics.idle
        );
        Ok(Processor { scheduler, logs })
    }

    /// One log per step, the last one being the `Done` decision.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn summary(&self) -> Summary {
        Summary::new(&self.scheduler)
    }
}

/// Format the [`Processor`]'s logs to a [`String`].
///
/// * `logs` - the logs returned by the [`Processor`].
///
/// ## Example
///
/// ```rust
/// use processor::{format_logs, Processor};
///
/// let processor = Processor::run(scheduler::fcfs(), processor::fixture()).unwrap();
///
/// println!("{}", format_logs(processor.logs()));
/// ```
pub fn format_logs(logs: &[Log]) -> String {
    let mut s = String::new();
    for (iteration, log) in logs.iter().enumerate() {
        s.push_str(&format!(
            "===== Iteration: {} =====\n{}\n",
            iteration + 1,
            log
        ));
    }
    s
}

/// Writes the formatted logs to `path`, creating its parent directories.
pub fn write_logs(path: impl AsRef<Path>, logs: &[Log]) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format_logs(logs))?;
    info!("wrote {} iterations to {}", logs.len(), path.display());
    Ok(())
}
