use std::collections::VecDeque;
use std::fmt::{self, Display};

use log::trace;

use crate::{Error, Pid, ProcessState, Result};

/// The kind of work a burst represents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BurstKind {
    Cpu,
    Io,
}

impl Display for BurstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BurstKind::Cpu => write!(f, "CPU"),
            BurstKind::Io => write!(f, "IO"),
        }
    }
}

/// A contiguous unit of CPU or I/O work.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Burst {
    pub kind: BurstKind,
    /// Time units left before the burst is done.
    pub remaining: u64,
}

impl Burst {
    pub fn cpu(duration: u64) -> Burst {
        Burst {
            kind: BurstKind::Cpu,
            remaining: duration,
        }
    }

    pub fn io(duration: u64) -> Burst {
        Burst {
            kind: BurstKind::Io,
            remaining: duration,
        }
    }
}

impl Display for Burst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.remaining)
    }
}

/// The description of a process, as found in a roster.
///
/// Nothing is validated until the spec is admitted by a scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub name: String,
    pub priority: i32,
    pub arrival_time: u64,
    pub bursts: Vec<Burst>,
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, priority: i32) -> ProcessSpec {
        ProcessSpec {
            name: name.into(),
            priority,
            arrival_time: 0,
            bursts: Vec::new(),
        }
    }

    /// Builds a spec from durations that alternate CPU and I/O, starting with CPU.
    ///
    /// ```rust
    /// use scheduler::{BurstKind, ProcessSpec};
    ///
    /// let spec = ProcessSpec::alternating("P1", 3, &[5, 27, 3]);
    /// assert_eq!(spec.bursts[1].kind, BurstKind::Io);
    /// ```
    pub fn alternating(name: impl Into<String>, priority: i32, durations: &[u64]) -> ProcessSpec {
        let mut spec = ProcessSpec::new(name, priority);
        for (index, duration) in durations.iter().enumerate() {
            spec = if index % 2 == 0 {
                spec.cpu(*duration)
            } else {
                spec.io(*duration)
            };
        }
        spec
    }

    pub fn arriving_at(mut self, arrival_time: u64) -> ProcessSpec {
        self.arrival_time = arrival_time;
        self
    }

    pub fn burst(mut self, kind: BurstKind, duration: u64) -> ProcessSpec {
        self.bursts.push(Burst {
            kind,
            remaining: duration,
        });
        self
    }

    pub fn cpu(self, duration: u64) -> ProcessSpec {
        self.burst(BurstKind::Cpu, duration)
    }

    pub fn io(self, duration: u64) -> ProcessSpec {
        self.burst(BurstKind::Io, duration)
    }

    fn validate(&self) -> Result<()> {
        let name = || self.name.clone();
        let Some(first) = self.bursts.first() else {
            return Err(Error::EmptyBursts { name: name() });
        };
        if first.kind != BurstKind::Cpu {
            return Err(Error::FirstBurstNotCpu { name: name() });
        }
        for (index, burst) in self.bursts.iter().enumerate() {
            if burst.remaining == 0 {
                return Err(Error::ZeroLengthBurst {
                    name: name(),
                    index,
                });
            }
            if index > 0 && self.bursts[index - 1].kind == burst.kind {
                return Err(Error::ConsecutiveBursts {
                    name: name(),
                    index,
                    kind: burst.kind,
                });
            }
        }
        Ok(())
    }
}

/// A simulated process: a fixed sequence of bursts plus its timing counters.
///
/// The process only changes through [`Process::tick`], [`Process::consume`]
/// and the dispatch/preempt calls made by the engine that owns it.
#[derive(Debug, Clone)]
pub struct Process {
    pid: Pid,
    name: String,
    priority: i32,
    arrival_time: u64,
    state: ProcessState,
    bursts: VecDeque<Burst>,
    waiting_time: u64,
    cpu_time: u64,
    io_time: u64,
    total_time: u64,
    first_run_time: Option<u64>,
    finish_time: Option<u64>,
    enter_wait_time: u64,
}

impl Process {
    /// Validates `spec` and creates the process in the [`ProcessState::Waiting`] state.
    pub fn new(pid: Pid, spec: ProcessSpec) -> Result<Process> {
        spec.validate()?;
        Ok(Process {
            pid,
            name: spec.name,
            priority: spec.priority,
            arrival_time: spec.arrival_time,
            state: ProcessState::Waiting,
            bursts: spec.bursts.into(),
            waiting_time: 0,
            cpu_time: 0,
            io_time: 0,
            total_time: 0,
            first_run_time: None,
            finish_time: None,
            enter_wait_time: spec.arrival_time,
        })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn arrival_time(&self) -> u64 {
        self.arrival_time
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ProcessState::Finished
    }

    /// The burst the process is currently working on, if any.
    pub fn peek_burst(&self) -> Option<&Burst> {
        self.bursts.front()
    }

    /// The remaining length of the head burst, when that burst is a CPU burst.
    pub fn next_cpu_burst(&self) -> Option<u64> {
        self.peek_burst()
            .filter(|burst| burst.kind == BurstKind::Cpu)
            .map(|burst| burst.remaining)
    }

    pub fn waiting_time(&self) -> u64 {
        self.waiting_time
    }

    pub fn cpu_time(&self) -> u64 {
        self.cpu_time
    }

    pub fn io_time(&self) -> u64 {
        self.io_time
    }

    pub fn total_time(&self) -> u64 {
        self.total_time
    }

    /// Clock value of the first time unit the process spent on the CPU.
    pub fn first_run_time(&self) -> Option<u64> {
        self.first_run_time
    }

    /// Clock value right after the last burst was consumed.
    pub fn finish_time(&self) -> Option<u64> {
        self.finish_time
    }

    /// Clock value at which the process last entered [`ProcessState::Waiting`].
    pub fn enter_wait_time(&self) -> u64 {
        self.enter_wait_time
    }

    /// How long the process has been waiting since it last became ready.
    pub fn waited_since(&self, clock: u64) -> u64 {
        clock.saturating_sub(self.enter_wait_time)
    }

    /// Only defined once the process has finished.
    pub fn turnaround_time(&self) -> Option<u64> {
        self.is_finished()
            .then_some(self.waiting_time + self.cpu_time + self.io_time)
    }

    /// Only defined once the process has been scheduled at least once.
    pub fn response_time(&self) -> Option<u64> {
        self.first_run_time
            .map(|first| first.saturating_sub(self.arrival_time))
    }

    /// Advances the process by one time unit at clock value `clock`.
    ///
    /// Returns the new state if the process changed state.
    pub fn tick(&mut self, clock: u64) -> Option<ProcessState> {
        self.advance(1, clock).1
    }

    /// Advances the process by up to `duration` time units starting at `clock`.
    ///
    /// Same as `duration` calls to [`Process::tick`], except that it stops at
    /// the end of the head burst. Returns the time actually used.
    pub fn consume(&mut self, duration: u64, clock: u64) -> u64 {
        self.advance(duration, clock).0
    }

    fn advance(&mut self, duration: u64, clock: u64) -> (u64, Option<ProcessState>) {
        let kind = match self.state {
            ProcessState::Finished => panic!("process {} advanced after finishing", self.name),
            ProcessState::Waiting => {
                self.waiting_time += duration;
                self.total_time += duration;
                return (duration, None);
            }
            ProcessState::Running => BurstKind::Cpu,
            ProcessState::Io => BurstKind::Io,
        };

        let burst = self
            .bursts
            .front_mut()
            .unwrap_or_else(|| panic!("process {} is {} without bursts", self.name, kind));
        assert_eq!(
            burst.kind, kind,
            "process {} is consuming a {} burst in the {} state",
            self.name, burst.kind, self.state
        );

        let used = duration.min(burst.remaining);
        burst.remaining -= used;
        self.total_time += used;
        match kind {
            BurstKind::Cpu => {
                self.first_run_time.get_or_insert(clock);
                self.cpu_time += used;
            }
            BurstKind::Io => self.io_time += used,
        }

        if burst.remaining > 0 {
            return (used, None);
        }

        self.bursts.pop_front();
        let now = clock + used;
        self.state = match self.bursts.front() {
            None => {
                self.finish_time = Some(now);
                ProcessState::Finished
            }
            Some(next) if next.kind == BurstKind::Io => ProcessState::Io,
            Some(_) => {
                self.enter_wait_time = now;
                ProcessState::Waiting
            }
        };
        trace!("{now}: {} -> {}", self.name, self.state);
        (used, Some(self.state))
    }

    /// Gives the CPU to the process.
    pub(crate) fn dispatch(&mut self) {
        assert_eq!(
            self.state,
            ProcessState::Waiting,
            "process {} dispatched while {}",
            self.name,
            self.state
        );
        assert!(
            self.next_cpu_burst().is_some(),
            "process {} dispatched without a CPU burst",
            self.name
        );
        self.state = ProcessState::Running;
    }

    /// Takes the CPU away before the current burst is done.
    pub(crate) fn preempt(&mut self, clock: u64) {
        assert_eq!(
            self.state,
            ProcessState::Running,
            "process {} preempted while {}",
            self.name,
            self.state
        );
        self.state = ProcessState::Waiting;
        self.enter_wait_time = clock;
    }
}

impl Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Pri: {}: {{", self.name, self.priority)?;
        for burst in &self.bursts {
            write!(f, "{burst} ")?;
        }
        write!(f, "}}")
    }
}
