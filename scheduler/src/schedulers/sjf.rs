use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::machine::SliceEnd;
use crate::{Machine, Pid, Process, ProcessSpec, Result, Scheduler, Step};

/// How [`Sjf`] orders processes whose next CPU bursts have the same length.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// The process that entered the ready queue first runs first.
    #[default]
    Fifo,
    /// The process that was admitted first runs first.
    Admission,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Candidate {
    burst: u64,
    tie: u64,
    pid: Pid,
}

/// Non-preemptive shortest job first.
///
/// Ready processes are ordered by the length of their next CPU burst. Once
/// selected, a process keeps the CPU for the whole burst.
#[derive(Debug, Default)]
pub struct Sjf {
    machine: Machine,
    ready: BinaryHeap<Reverse<Candidate>>,
    tie_break: TieBreak,
    entries: u64,
}

impl Sjf {
    pub fn new(tie_break: TieBreak) -> Self {
        Sjf {
            tie_break,
            ..Sjf::default()
        }
    }

    fn file(&mut self, pid: Pid) {
        file(&self.machine, &mut self.ready, &mut self.entries, self.tie_break, pid);
    }
}

// The burst of a ready process does not change until it is dispatched, so
// the key computed here stays valid while it sits in the heap.
fn file(
    machine: &Machine,
    ready: &mut BinaryHeap<Reverse<Candidate>>,
    entries: &mut u64,
    tie_break: TieBreak,
    pid: Pid,
) {
    let burst = machine
        .process(pid)
        .next_cpu_burst()
        .expect("ready process starts with a CPU burst");
    let tie = match tie_break {
        TieBreak::Fifo => *entries,
        TieBreak::Admission => pid.index() as u64,
    };
    *entries += 1;
    ready.push(Reverse(Candidate { burst, tie, pid }));
}

impl Scheduler for Sjf {
    fn name(&self) -> &'static str {
        "SJF"
    }

    fn admit(&mut self, spec: ProcessSpec) -> Result<Pid> {
        let pid = self.machine.admit(spec)?;
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

        let Some(Reverse(Candidate { pid, .. })) = self.ready.pop() else {
            let (amount, woken) = self.machine.idle();
            for pid in woken {
                self.file(pid);
            }
            return Step::idle(clock, amount);
        };

        let burst = self.machine.dispatch(pid);
        let end = self.machine.run_for(burst, |machine, woken| {
            for pid in woken {
                file(machine, &mut self.ready, &mut self.entries, self.tie_break, pid);
            }
            false
        });
        match end {
            SliceEnd::Left(reason) => Step::run(clock, pid, burst, reason),
            SliceEnd::Expired | SliceEnd::Interrupted => {
                unreachable!("{pid} still running after its whole CPU burst")
            }
        }
    }

    fn machine(&self) -> &Machine {
        &self.machine
    }

    fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    fn ready(&self) -> Vec<&Process> {
        let mut candidates: Vec<_> = self.ready.iter().map(|Reverse(c)| *c).collect();
        candidates.sort();
        candidates
            .into_iter()
            .map(|candidate| self.machine.process(candidate.pid))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulers::testing::{admit_all, order, waiting};
    use pretty_assertions::assert_eq;

    #[test]
    fn shortest_burst_runs_first() {
        let mut sjf = Sjf::new(TieBreak::Fifo);
        admit_all(
            &mut sjf,
            vec![
                ProcessSpec::new("A", 0).cpu(5),
                ProcessSpec::new("B", 0).cpu(2),
                ProcessSpec::new("C", 0).cpu(1),
            ],
        );
        let ready: Vec<_> = sjf.ready().into_iter().map(Process::name).collect();
        assert_eq!(ready, ["C", "B", "A"]);

        sjf.run().unwrap();
        assert_eq!(order(&sjf), ["C", "B", "A"]);
        assert_eq!(waiting(&sjf), [3, 1, 0]);
    }

    #[test]
    fn ties_follow_the_tie_break() {
        let roster = || {
            vec![
                ProcessSpec::new("A", 0).cpu(1).io(1).cpu(2),
                ProcessSpec::new("B", 0).cpu(2),
                ProcessSpec::new("C", 0).cpu(2),
            ]
        };

        // A is back from I/O at 2 with a burst of 2, after C was queued
        let mut fifo = Sjf::new(TieBreak::Fifo);
        admit_all(&mut fifo, roster());
        fifo.run().unwrap();
        assert_eq!(order(&fifo), ["B", "C", "A"]);

        let mut admission = Sjf::new(TieBreak::Admission);
        admit_all(&mut admission, roster());
        admission.run().unwrap();
        assert_eq!(order(&admission), ["B", "A", "C"]);
    }

    #[test]
    fn a_shorter_arrival_does_not_preempt() {
        let mut sjf = Sjf::default();
        admit_all(
            &mut sjf,
            vec![
                ProcessSpec::new("A", 0).cpu(6),
                ProcessSpec::new("B", 0).cpu(1).arriving_at(1),
            ],
        );
        sjf.run().unwrap();
        assert_eq!(order(&sjf), ["A", "B"]);
        assert_eq!(waiting(&sjf), [0, 5]);
    }
}
