use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Display};
use std::num::NonZeroU64;

use log::debug;

use crate::machine::SliceEnd;
use crate::{Machine, Pid, Process, ProcessSpec, Result, Scheduler, Step, StopReason};

/// The queue a process belongs to for its whole life.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Band {
    Foreground,
    Background,
}

impl Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Foreground => write!(f, "foreground"),
            Band::Background => write!(f, "background"),
        }
    }
}

/// Two level queue.
///
/// Foreground processes run round robin and always take precedence: a
/// background process, which otherwise runs its whole burst, loses the CPU as
/// soon as a foreground process is ready and goes back to the front of the
/// background queue.
#[derive(Debug)]
pub struct Mlq {
    machine: Machine,
    foreground_names: HashSet<String>,
    /// Band of every admitted process, by PID.
    home: Vec<Band>,
    foreground: VecDeque<Pid>,
    background: VecDeque<Pid>,
    timeslice: NonZeroU64,
}

impl Mlq {
    /// Processes named in `foreground` are foreground, every other one is background.
    pub fn new<I, N>(timeslice: NonZeroU64, foreground: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Mlq {
            machine: Machine::new(),
            foreground_names: foreground.into_iter().map(Into::into).collect(),
            home: Vec::new(),
            foreground: VecDeque::new(),
            background: VecDeque::new(),
            timeslice,
        }
    }

    pub fn band_of(&self, pid: Pid) -> Band {
        self.home[pid.index()]
    }

    fn file(&mut self, pid: Pid) {
        file(&self.home, &mut self.foreground, &mut self.background, pid);
    }
}

fn file(home: &[Band], foreground: &mut VecDeque<Pid>, background: &mut VecDeque<Pid>, pid: Pid) {
    match home[pid.index()] {
        Band::Foreground => foreground.push_back(pid),
        Band::Background => background.push_back(pid),
    }
}

impl Scheduler for Mlq {
    fn name(&self) -> &'static str {
        "MLQ"
    }

    fn admit(&mut self, spec: ProcessSpec) -> Result<Pid> {
        let band = if self.foreground_names.contains(&spec.name) {
            Band::Foreground
        } else {
            Band::Background
        };
        let pid = self.machine.admit(spec)?;
        self.home.push(band);
        if self.machine.has_arrived(pid) {
            self.file(pid);
        }
        Ok(pid)
    }

    fn step(&mut self) -> Step {
        let clock = self.machine.clock();
        if self.machine.is_done() {
            return Step::done(clock);
        }

        if let Some(pid) = self.foreground.pop_front() {
            let timeslice = self.machine.dispatch(pid).min(self.timeslice);
            let end = self.machine.run_for(timeslice, |_, woken| {
                for pid in woken {
                    file(&self.home, &mut self.foreground, &mut self.background, pid);
                }
                false
            });
            return match end {
                SliceEnd::Left(reason) => Step::run(clock, pid, timeslice, reason),
                SliceEnd::Expired | SliceEnd::Interrupted => {
                    let pid = self.machine.preempt();
                    self.foreground.push_back(pid);
                    Step::run(clock, pid, timeslice, StopReason::Expired)
                }
            };
        }

        if let Some(pid) = self.background.pop_front() {
            let burst = self.machine.dispatch(pid);
            let end = self.machine.run_for(burst, |_, woken| {
                for pid in woken {
                    file(&self.home, &mut self.foreground, &mut self.background, pid);
                }
                !self.foreground.is_empty()
            });
            return match end {
                SliceEnd::Left(reason) => Step::run(clock, pid, burst, reason),
                SliceEnd::Interrupted => {
                    let pid = self.machine.preempt();
                    debug!(
                        "{}: {} preempted by the foreground",
                        self.machine.clock(),
                        self.machine.process(pid).name()
                    );
                    self.background.push_front(pid);
                    Step::run(clock, pid, burst, StopReason::Preempted)
                }
                SliceEnd::Expired => {
                    unreachable!("{pid} still running after its whole CPU burst")
                }
            };
        }

        let (amount, woken) = self.machine.idle();
        for pid in woken {
            self.file(pid);
        }
        Step::idle(clock, amount)
    }

    fn machine(&self) -> &Machine {
        &self.machine
    }

    fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    fn ready(&self) -> Vec<&Process> {
        self.foreground
            .iter()
            .chain(self.background.iter())
            .map(|pid| self.machine.process(*pid))
            .collect()
    }

    fn extra(&self, pid: Pid) -> String {
        self.band_of(pid).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulers::testing::{admit_all, order, steps, waiting};
    use crate::SchedulingDecision;
    use pretty_assertions::assert_eq;

    fn mlq(timeslice: u64, foreground: &[&str]) -> Mlq {
        Mlq::new(NonZeroU64::new(timeslice).unwrap(), foreground.iter().copied())
    }

    #[test]
    fn foreground_preempts_the_background() {
        let mut mlq = mlq(4, &["A"]);
        admit_all(
            &mut mlq,
            vec![
                ProcessSpec::new("A", 0).cpu(1).io(2).cpu(1),
                ProcessSpec::new("B", 0).cpu(6),
            ],
        );
        assert_eq!(mlq.extra(Pid::new(1)), "foreground");
        assert_eq!(mlq.extra(Pid::new(2)), "background");

        let (a, b) = (Pid::new(1), Pid::new(2));
        let units = |n| NonZeroU64::new(n).unwrap();
        assert_eq!(
            steps(&mut mlq),
            vec![
                Step::run(0, a, units(1), StopReason::Io),
                Step::run(1, b, units(6), StopReason::Preempted),
                Step::run(3, a, units(1), StopReason::Finished),
                Step::run(4, b, units(4), StopReason::Finished),
            ]
        );
        assert_eq!(order(&mlq), ["A", "B"]);
        assert_eq!(waiting(&mlq), [0, 2]);
        assert_eq!(mlq.metrics().elapsed, 8);
    }

    #[test]
    fn preempted_background_process_keeps_its_place() {
        let mut mlq = mlq(2, &["F"]);
        admit_all(
            &mut mlq,
            vec![
                ProcessSpec::new("B1", 0).cpu(3),
                ProcessSpec::new("B2", 0).cpu(1),
                ProcessSpec::new("F", 0).cpu(1).arriving_at(1),
            ],
        );
        mlq.step();
        let ready: Vec<_> = mlq.ready().into_iter().map(Process::name).collect();
        assert_eq!(ready, ["F", "B1", "B2"]);
        mlq.run().unwrap();
        assert_eq!(order(&mlq), ["F", "B1", "B2"]);
    }

    #[test]
    fn background_never_runs_while_the_foreground_is_ready() {
        let mut mlq = mlq(3, &["A", "B"]);
        admit_all(
            &mut mlq,
            vec![
                ProcessSpec::alternating("A", 0, &[2, 4, 3, 1, 2]),
                ProcessSpec::alternating("B", 0, &[5, 2, 1]),
                ProcessSpec::alternating("C", 0, &[4, 1, 6]),
                ProcessSpec::alternating("D", 0, &[7]),
            ],
        );
        loop {
            let foreground_ready = mlq
                .ready()
                .iter()
                .any(|process| mlq.band_of(process.pid()) == Band::Foreground);
            let step = mlq.step();
            match step.decision {
                SchedulingDecision::Done => break,
                SchedulingDecision::Run { pid, .. } if foreground_ready => {
                    assert_eq!(mlq.band_of(pid), Band::Foreground, "at {}", step.clock)
                }
                _ => {}
            }
        }
        assert_eq!(mlq.completion_order().len(), 4);
    }

    #[test]
    fn processes_come_back_from_io_to_their_own_band() {
        let mut mlq = mlq(2, &["F"]);
        admit_all(
            &mut mlq,
            vec![
                ProcessSpec::new("F", 0).cpu(1).io(1).cpu(1),
                ProcessSpec::new("B", 0).cpu(2).io(1).cpu(1),
            ],
        );
        let (f, b) = (Pid::new(1), Pid::new(2));
        mlq.step();
        mlq.step();
        assert_eq!(mlq.foreground, VecDeque::from([f]));
        assert_eq!(mlq.background, VecDeque::from([b]));

        mlq.step();
        mlq.step();
        assert_eq!(mlq.step().decision, SchedulingDecision::Idle(NonZeroU64::MIN));
        assert_eq!(mlq.foreground, VecDeque::new());
        assert_eq!(mlq.background, VecDeque::from([b]));
    }
}
