use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroU64;

use log::debug;

use crate::machine::SliceEnd;
use crate::{Machine, Pid, Process, ProcessSpec, Result, Scheduler, Step, StopReason};

/// Which end of the priority range is served first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PriorityOrder {
    /// Lower values are more important.
    #[default]
    LowerFirst,
    /// Higher values are more important.
    HigherFirst,
}

/// Non-preemptive priority scheduling.
///
/// The most important non-empty level is always served, but a process that
/// holds the CPU is never interrupted for a more important one. Processes that
/// share the most important level take turns in round robin fashion with
/// `timeslice`. A process that is alone at its level keeps the CPU past the
/// quantum until another process joins that level.
#[derive(Debug)]
pub struct Priority {
    machine: Machine,
    levels: BTreeMap<i32, VecDeque<Pid>>,
    timeslice: NonZeroU64,
    order: PriorityOrder,
}

impl Priority {
    pub fn new(timeslice: NonZeroU64, order: PriorityOrder) -> Self {
        Priority {
            machine: Machine::new(),
            levels: BTreeMap::new(),
            timeslice,
            order,
        }
    }

    /// Removes the next process of the most important level, and tells
    /// whether other processes are left at that level.
    fn select(&mut self) -> Option<(Pid, bool)> {
        let mut level = match self.order {
            PriorityOrder::LowerFirst => self.levels.first_entry()?,
            PriorityOrder::HigherFirst => self.levels.last_entry()?,
        };
        let pid = level.get_mut().pop_front()?;
        let tied = !level.get().is_empty();
        if !tied {
            level.remove();
        }
        Some((pid, tied))
    }
}

fn file(machine: &Machine, levels: &mut BTreeMap<i32, VecDeque<Pid>>, pid: Pid) {
    let priority = machine.process(pid).priority();
    levels.entry(priority).or_default().push_back(pid);
}

impl Scheduler for Priority {
    fn name(&self) -> &'static str {
        "Priority"
    }

    fn admit(&mut self, spec: ProcessSpec) -> Result<Pid> {
        let pid = self.machine.admit(spec)?;
        if self.machine.has_arrived(pid) {
            file(&self.machine, &mut self.levels, pid);
        }
        Ok(pid)
    }

    fn step(&mut self) -> Step {
        let clock = self.machine.clock();
        if self.machine.is_done() {
            return Step::done(clock);
        }

        let Some((pid, tied)) = self.select() else {
            let (amount, woken) = self.machine.idle();
            for pid in woken {
                file(&self.machine, &mut self.levels, pid);
            }
            return Step::idle(clock, amount);
        };

        let priority = self.machine.process(pid).priority();
        let burst = self.machine.dispatch(pid);
        let timeslice = if tied {
            burst.min(self.timeslice)
        } else {
            burst
        };
        // A peer joining the level after dispatch takes its turn once the
        // quantum has been used.
        let quantum = self.timeslice.get();
        let mut ran = 0;
        let end = self.machine.run_for(timeslice, |machine, woken| {
            for pid in woken {
                file(machine, &mut self.levels, pid);
            }
            ran += 1;
            ran >= quantum && self.levels.contains_key(&priority)
        });
        match end {
            SliceEnd::Left(reason) => Step::run(clock, pid, timeslice, reason),
            SliceEnd::Expired | SliceEnd::Interrupted => {
                let pid = self.machine.preempt();
                debug!(
                    "{}: {} back to priority {}",
                    self.machine.clock(),
                    self.machine.process(pid).name(),
                    self.machine.process(pid).priority()
                );
                file(&self.machine, &mut self.levels, pid);
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
        let mut levels: Vec<_> = self.levels.values().collect();
        if self.order == PriorityOrder::HigherFirst {
            levels.reverse();
        }
        levels
            .into_iter()
            .flatten()
            .map(|pid| self.machine.process(*pid))
            .collect()
    }

    fn extra(&self, pid: Pid) -> String {
        format!("priority {}", self.machine.process(pid).priority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulers::testing::{admit_all, order, steps, waiting};
    use crate::SchedulingDecision;
    use pretty_assertions::assert_eq;

    fn roster() -> Vec<ProcessSpec> {
        vec![
            ProcessSpec::new("A", 2).cpu(4),
            ProcessSpec::new("B", 1).cpu(3),
            ProcessSpec::new("C", 1).cpu(3),
        ]
    }

    fn priority(order: PriorityOrder) -> Priority {
        Priority::new(NonZeroU64::new(2).unwrap(), order)
    }

    fn slices(steps: &[Step]) -> Vec<(Pid, u64)> {
        steps
            .iter()
            .filter_map(|step| match step.decision {
                SchedulingDecision::Run { pid, timeslice } => Some((pid, timeslice.get())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tied_processes_take_turns() {
        let mut scheduler = priority(PriorityOrder::LowerFirst);
        admit_all(&mut scheduler, roster());
        let ready: Vec<_> = scheduler.ready().into_iter().map(Process::name).collect();
        assert_eq!(ready, ["B", "C", "A"]);

        let steps = steps(&mut scheduler);
        let (a, b, c) = (Pid::new(1), Pid::new(2), Pid::new(3));
        assert_eq!(slices(&steps), [(b, 2), (c, 2), (b, 1), (c, 1), (a, 4)]);
        assert_eq!(order(&scheduler), ["B", "C", "A"]);
    }

    #[test]
    fn higher_first_reverses_the_levels() {
        let mut scheduler = priority(PriorityOrder::HigherFirst);
        admit_all(&mut scheduler, roster());
        let steps = steps(&mut scheduler);
        let (a, b, c) = (Pid::new(1), Pid::new(2), Pid::new(3));
        assert_eq!(slices(&steps), [(a, 4), (b, 2), (c, 2), (b, 1), (c, 1)]);
        assert_eq!(order(&scheduler), ["A", "B", "C"]);
    }

    #[test]
    fn peer_back_from_io_gets_a_turn() {
        let mut scheduler = priority(PriorityOrder::LowerFirst);
        admit_all(
            &mut scheduler,
            vec![
                ProcessSpec::new("B", 1).cpu(1).io(2).cpu(2),
                ProcessSpec::new("A", 1).cpu(10),
            ],
        );
        let (b, a) = (Pid::new(1), Pid::new(2));
        let units = |n| NonZeroU64::new(n).unwrap();
        assert_eq!(
            steps(&mut scheduler),
            vec![
                Step::run(0, b, units(1), StopReason::Io),
                Step::run(1, a, units(10), StopReason::Expired),
                Step::run(3, b, units(2), StopReason::Finished),
                Step::run(5, a, units(8), StopReason::Finished),
            ]
        );
        assert_eq!(order(&scheduler), ["B", "A"]);
        assert_eq!(waiting(&scheduler), [0, 3]);
    }

    #[test]
    fn late_peer_waits_at_most_a_quantum() {
        let mut scheduler = priority(PriorityOrder::LowerFirst);
        admit_all(
            &mut scheduler,
            vec![
                ProcessSpec::new("A", 1).cpu(10),
                ProcessSpec::new("B", 1).cpu(2).arriving_at(1),
            ],
        );
        let steps = steps(&mut scheduler);
        let (a, b) = (Pid::new(1), Pid::new(2));
        assert_eq!(slices(&steps), [(a, 10), (b, 2), (a, 8)]);
        assert_eq!(order(&scheduler), ["B", "A"]);
        assert_eq!(waiting(&scheduler), [2, 1]);
        assert_eq!(scheduler.clock(), 12);
    }

    #[test]
    fn running_process_is_not_preempted_by_a_more_important_one() {
        let mut scheduler = priority(PriorityOrder::LowerFirst);
        admit_all(
            &mut scheduler,
            vec![
                ProcessSpec::new("low", 9).cpu(6),
                ProcessSpec::new("high", 0).cpu(1).arriving_at(1),
            ],
        );
        let first = scheduler.step();
        assert_eq!(first.stop, Some(StopReason::Finished));
        assert_eq!(scheduler.clock(), 6);
        scheduler.run().unwrap();
        assert_eq!(order(&scheduler), ["low", "high"]);
    }
}
