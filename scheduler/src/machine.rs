use std::collections::{HashSet, VecDeque};
use std::num::NonZeroU64;

use log::{debug, trace};

use crate::{Error, Metrics, Pid, Process, ProcessSpec, ProcessState, Result, StopReason};

/// How a slice handed to [`Machine::run_for`] ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum SliceEnd {
    /// The CPU burst ended, the process is no longer running.
    Left(StopReason),
    /// The whole slice was used and the process is still running.
    Expired,
    /// The policy asked to take the CPU back. The process is still running.
    Interrupted,
}

/// The part of a simulation shared by every policy.
///
/// Owns the processes, the clock, the idle counter and the completion list.
/// Ready queues belong to the policies: whenever a process becomes ready the
/// machine hands its PID back so the policy can file it.
#[derive(Debug, Default)]
pub struct Machine {
    processes: Vec<Process>,
    names: HashSet<String>,
    /// Admitted processes that have not arrived yet, by (arrival time, PID).
    arrivals: VecDeque<Pid>,
    running: Option<Pid>,
    completed: Vec<Pid>,
    clock: u64,
    idle: u64,
    budget: Option<u64>,
}

impl Machine {
    pub fn new() -> Machine {
        Machine::default()
    }

    /// Makes [`crate::Scheduler::run`] fail once the clock goes past `budget`.
    pub fn set_tick_budget(&mut self, budget: u64) {
        self.budget = Some(budget);
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn idle_time(&self) -> u64 {
        self.idle
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn process(&self, pid: Pid) -> &Process {
        &self.processes[pid.index()]
    }

    pub fn running(&self) -> Option<&Process> {
        self.running.map(|pid| self.process(pid))
    }

    /// Processes currently consuming an I/O burst, in PID order.
    pub fn io(&self) -> impl Iterator<Item = &Process> {
        self.processes
            .iter()
            .filter(|process| process.state() == ProcessState::Io)
    }

    /// Admitted processes that have not arrived yet.
    pub fn pending(&self) -> impl Iterator<Item = &Process> {
        self.arrivals.iter().map(|pid| self.process(*pid))
    }

    pub fn completed(&self) -> impl Iterator<Item = &Process> {
        self.completed.iter().map(|pid| self.process(*pid))
    }

    pub fn is_done(&self) -> bool {
        self.completed.len() == self.processes.len()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            elapsed: self.clock,
            idle: self.idle,
        }
    }

    pub fn check_budget(&self) -> Result<()> {
        match self.budget {
            Some(budget) if self.clock > budget => Err(Error::TickBudgetExceeded {
                budget,
                clock: self.clock,
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn has_arrived(&self, pid: Pid) -> bool {
        self.process(pid).arrival_time() <= self.clock
    }

    /// Validates and stores a process. The caller files it if it has already arrived.
    ///
    /// A process admitted after its arrival time arrives now.
    pub(crate) fn admit(&mut self, mut spec: ProcessSpec) -> Result<Pid> {
        if self.names.contains(&spec.name) {
            return Err(Error::DuplicateName { name: spec.name });
        }
        if spec.arrival_time < self.clock {
            debug!(
                "{}: {} admitted after its arrival time {}",
                self.clock, spec.name, spec.arrival_time
            );
            spec.arrival_time = self.clock;
        }
        let pid = Pid::from_index(self.processes.len());
        let process = Process::new(pid, spec)?;
        self.names.insert(process.name().to_string());

        if process.arrival_time() > self.clock {
            let key = (process.arrival_time(), pid);
            let position = self
                .arrivals
                .iter()
                .position(|other| (self.process(*other).arrival_time(), *other) > key)
                .unwrap_or(self.arrivals.len());
            self.arrivals.insert(position, pid);
        }
        debug!("admitted {process}");
        self.processes.push(process);
        Ok(pid)
    }

    /// Puts `pid` on the CPU and returns the length of its CPU burst.
    pub(crate) fn dispatch(&mut self, pid: Pid) -> NonZeroU64 {
        assert!(
            self.running.is_none(),
            "dispatching {pid} while {:?} is running",
            self.running
        );
        let process = &mut self.processes[pid.index()];
        process.dispatch();
        self.running = Some(pid);
        debug!("{}: dispatch {}", self.clock, process.name());
        process
            .next_cpu_burst()
            .and_then(NonZeroU64::new)
            .expect("dispatched process has a pending CPU burst")
    }

    /// Takes the CPU away from the running process and returns its PID.
    pub(crate) fn preempt(&mut self) -> Pid {
        let pid = self.running.take().expect("preempting an idle CPU");
        let process = &mut self.processes[pid.index()];
        process.preempt(self.clock);
        debug!("{}: preempt {}", self.clock, process.name());
        pid
    }

    /// Advances every arrived, unfinished process by one time unit.
    ///
    /// Returns the processes that became ready, in PID order, followed by the
    /// ones that arrived.
    pub(crate) fn tick(&mut self) -> (Vec<Pid>, Option<StopReason>) {
        if self.running.is_none() {
            self.idle += 1;
        }

        let clock = self.clock;
        let mut ready = Vec::new();
        let mut left = None;
        for index in 0..self.processes.len() {
            let process = &self.processes[index];
            if process.is_finished() || process.arrival_time() > clock {
                continue;
            }
            let pid = process.pid();
            if let Some(state) = self.processes[index].tick(clock) {
                if self.running == Some(pid) {
                    self.running = None;
                    left = Some(match state {
                        ProcessState::Finished => StopReason::Finished,
                        _ => StopReason::Io,
                    });
                }
                self.record(pid, state, &mut ready);
            }
        }

        self.clock += 1;
        self.release(&mut ready);
        (ready, left)
    }

    /// Runs the dispatched process for up to `slice` time units.
    ///
    /// After every time unit `file` receives the processes that became ready
    /// and returns whether the running process has to give up the CPU.
    pub(crate) fn run_for(
        &mut self,
        slice: NonZeroU64,
        mut file: impl FnMut(&Machine, Vec<Pid>) -> bool,
    ) -> SliceEnd {
        for _ in 0..slice.get() {
            let (ready, left) = self.tick();
            let interrupt = file(self, ready);
            if let Some(reason) = left {
                return SliceEnd::Left(reason);
            }
            if interrupt {
                return SliceEnd::Interrupted;
            }
        }
        SliceEnd::Expired
    }

    /// Idles the CPU until the next process can become ready.
    ///
    /// Every arrived process is doing I/O at this point, so the I/O bursts are
    /// consumed in one go up to the shortest one or to the next arrival.
    pub(crate) fn idle(&mut self) -> (NonZeroU64, Vec<Pid>) {
        assert!(self.running.is_none(), "idling while a process is running");
        let clock = self.clock;

        let next_io = self
            .io()
            .filter_map(|process| process.peek_burst())
            .map(|burst| burst.remaining)
            .min();
        let next_arrival = self
            .arrivals
            .front()
            .map(|pid| self.process(*pid).arrival_time() - clock);
        let amount = match (next_io, next_arrival) {
            (Some(io), Some(arrival)) => io.min(arrival),
            (io, arrival) => io.or(arrival).unwrap_or(0),
        };
        let amount = NonZeroU64::new(amount).expect("idle CPU with nothing left to wait for");

        let mut ready = Vec::new();
        for index in 0..self.processes.len() {
            let process = &mut self.processes[index];
            if process.is_finished() || process.arrival_time() > clock {
                continue;
            }
            assert_eq!(
                process.state(),
                ProcessState::Io,
                "process {} is {} while the CPU idles",
                process.name(),
                process.state()
            );
            let pid = process.pid();
            process.consume(amount.get(), clock);
            let state = process.state();
            if state != ProcessState::Io {
                self.record(pid, state, &mut ready);
            }
        }

        self.clock += amount.get();
        self.idle += amount.get();
        trace!("{clock}: idle for {amount}");
        self.release(&mut ready);
        (amount, ready)
    }

    fn record(&mut self, pid: Pid, state: ProcessState, ready: &mut Vec<Pid>) {
        match state {
            ProcessState::Waiting => ready.push(pid),
            ProcessState::Finished => self.completed.push(pid),
            ProcessState::Io | ProcessState::Running => {}
        }
    }

    fn release(&mut self, ready: &mut Vec<Pid>) {
        while let Some(pid) = self.arrivals.front().copied() {
            if self.process(pid).arrival_time() > self.clock {
                break;
            }
            self.arrivals.pop_front();
            trace!("{}: {} arrived", self.clock, self.process(pid).name());
            ready.push(pid);
        }
    }
}
