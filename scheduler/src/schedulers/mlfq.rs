use std::collections::VecDeque;
use std::num::NonZeroU64;

use log::debug;

use crate::machine::SliceEnd;
use crate::{Machine, Pid, Process, ProcessSpec, Result, Scheduler, Step, StopReason};

const LEVELS: usize = 3;

/// Three level feedback queue.
///
/// Every process starts at level 0. The head of the lowest non-empty level
/// runs for at most that level's quantum; level 2 has none and runs whole
/// bursts. A process that uses its whole quantum without finishing the burst
/// moves one level down. Levels never go back up, and a process back from
/// I/O rejoins its current level.
#[derive(Debug)]
pub struct Mlfq {
    machine: Machine,
    levels: [VecDeque<Pid>; LEVELS],
    /// Current level of every admitted process, by PID.
    level: Vec<usize>,
    quanta: [NonZeroU64; LEVELS - 1],
}

impl Mlfq {
    pub fn new(first: NonZeroU64, second: NonZeroU64) -> Self {
        Mlfq {
            machine: Machine::new(),
            levels: Default::default(),
            level: Vec::new(),
            quanta: [first, second],
        }
    }

    pub fn level_of(&self, pid: Pid) -> usize {
        self.level[pid.index()]
    }

    fn file(&mut self, pid: Pid) {
        file(&self.level, &mut self.levels, pid);
    }
}

fn file(level: &[usize], levels: &mut [VecDeque<Pid>; LEVELS], pid: Pid) {
    levels[level[pid.index()]].push_back(pid);
}

impl Scheduler for Mlfq {
    fn name(&self) -> &'static str {
        "MLFQ"
    }

    fn admit(&mut self, spec: ProcessSpec) -> Result<Pid> {
        let pid = self.machine.admit(spec)?;
        self.level.push(0);
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

        let next = self
            .levels
            .iter_mut()
            .enumerate()
            .find_map(|(level, queue)| queue.pop_front().map(|pid| (level, pid)));
        let Some((level, pid)) = next else {
            let (amount, woken) = self.machine.idle();
            for pid in woken {
                self.file(pid);
            }
            return Step::idle(clock, amount);
        };

        let burst = self.machine.dispatch(pid);
        let timeslice = match self.quanta.get(level) {
            Some(quantum) => burst.min(*quantum),
            None => burst,
        };
        let end = self.machine.run_for(timeslice, |_, woken| {
            for pid in woken {
                file(&self.level, &mut self.levels, pid);
            }
            false
        });
        match end {
            SliceEnd::Left(reason) => Step::run(clock, pid, timeslice, reason),
            SliceEnd::Expired | SliceEnd::Interrupted => {
                let pid = self.machine.preempt();
                let demoted = (level + 1).min(LEVELS - 1);
                debug!(
                    "{}: {} demoted to level {demoted}",
                    self.machine.clock(),
                    self.machine.process(pid).name()
                );
                self.level[pid.index()] = demoted;
                self.levels[demoted].push_back(pid);
                Step::run(clock, pid, timeslice, StopReason::Expired)
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
        self.levels
            .iter()
            .flatten()
            .map(|pid| self.machine.process(*pid))
            .collect()
    }

    fn extra(&self, pid: Pid) -> String {
        format!("L{}", self.level_of(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulers::testing::{admit_all, order};
    use crate::SchedulingDecision;
    use pretty_assertions::assert_eq;

    fn mlfq(first: u64, second: u64) -> Mlfq {
        Mlfq::new(
            NonZeroU64::new(first).unwrap(),
            NonZeroU64::new(second).unwrap(),
        )
    }

    #[test]
    fn long_burst_sinks_to_the_last_level() {
        let mut mlfq = mlfq(2, 3);
        admit_all(&mut mlfq, vec![ProcessSpec::new("A", 0).cpu(10)]);
        let pid = Pid::new(1);

        let mut slices = Vec::new();
        let mut levels = vec![mlfq.level_of(pid)];
        loop {
            let step = mlfq.step();
            match step.decision {
                SchedulingDecision::Run { timeslice, .. } => slices.push(timeslice.get()),
                _ => break,
            }
            levels.push(mlfq.level_of(pid));
        }
        assert_eq!(slices, [2, 3, 5]);
        assert_eq!(levels, [0, 1, 2, 2]);
        assert_eq!(mlfq.extra(pid), "L2");
        assert_eq!(mlfq.clock(), 10);
    }

    #[test]
    fn io_does_not_promote() {
        let mut mlfq = mlfq(2, 5);
        admit_all(&mut mlfq, vec![ProcessSpec::new("A", 0).cpu(3).io(1).cpu(1)]);
        mlfq.run().unwrap();
        assert_eq!(mlfq.level_of(Pid::new(1)), 1);
    }

    #[test]
    fn lower_levels_wait_for_the_upper_ones() {
        let mut mlfq = mlfq(1, 2);
        admit_all(
            &mut mlfq,
            vec![
                ProcessSpec::new("long", 0).cpu(4),
                ProcessSpec::new("short", 0).cpu(1),
            ],
        );
        mlfq.step();
        let ready: Vec<_> = mlfq.ready().into_iter().map(Process::name).collect();
        assert_eq!(ready, ["short", "long"]);
        mlfq.run().unwrap();
        assert_eq!(order(&mlfq), ["short", "long"]);
    }

    #[test]
    fn levels_only_go_down() {
        let mut mlfq = mlfq(2, 4);
        admit_all(
            &mut mlfq,
            vec![
                ProcessSpec::alternating("A", 0, &[7, 3, 1, 2, 9]),
                ProcessSpec::alternating("B", 0, &[1, 5, 1, 5, 1]),
                ProcessSpec::alternating("C", 0, &[3, 1, 3]),
            ],
        );
        let mut previous = vec![0; 3];
        while mlfq.step().decision != SchedulingDecision::Done {
            let current: Vec<_> = mlfq
                .list()
                .into_iter()
                .map(|process| mlfq.level_of(process.pid()))
                .collect();
            for (before, after) in previous.iter().zip(&current) {
                assert!(before <= after);
            }
            previous = current;
        }
        assert_eq!(previous, [2, 0, 1]);
    }
}
