use std::collections::VecDeque;

use crate::machine::SliceEnd;
use crate::{Machine, Pid, Process, ProcessSpec, Result, Scheduler, Step};

/// First come, first served.
///
/// A single FIFO ready queue. The selected process keeps the CPU for its
/// whole CPU burst.
#[derive(Debug, Default)]
pub struct Fcfs {
    machine: Machine,
    ready: VecDeque<Pid>,
}

impl Fcfs {
    pub fn new() -> Self {
        Fcfs::default()
    }
}

impl Scheduler for Fcfs {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn admit(&mut self, spec: ProcessSpec) -> Result<Pid> {
        let pid = self.machine.admit(spec)?;
        if self.machine.has_arrived(pid) {
            self.ready.push_back(pid);
        }
        Ok(pid)
    }

    fn step(&mut self) -> Step {
        let clock = self.machine.clock();
        if self.machine.is_done() {
            return Step::done(clock);
        }

        let Some(pid) = self.ready.pop_front() else {
            let (amount, woken) = self.machine.idle();
            self.ready.extend(woken);
            return Step::idle(clock, amount);
        };

        let burst = self.machine.dispatch(pid);
        let end = self.machine.run_for(burst, |_, woken| {
            self.ready.extend(woken);
            false
        });
        match end {
            SliceEnd::Left(reason) => Step::run(clock, pid, burst, reason),
            // the slice is the whole burst
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
        self.ready
            .iter()
            .map(|pid| self.machine.process(*pid))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulers::testing::{admit_all, order, steps, waiting};
    use crate::{SchedulingDecision, StopReason};
    use pretty_assertions::assert_eq;
    use std::num::NonZeroU64;

    #[test]
    fn runs_in_admission_order() {
        let mut fcfs = Fcfs::new();
        admit_all(
            &mut fcfs,
            vec![ProcessSpec::new("A", 0).cpu(3), ProcessSpec::new("B", 0).cpu(2)],
        );
        fcfs.run().unwrap();

        assert_eq!(order(&fcfs), ["A", "B"]);
        assert_eq!(waiting(&fcfs), [0, 3]);
        let b = fcfs.machine().process(Pid::new(2));
        assert_eq!(b.turnaround_time(), Some(5));
        assert_eq!(b.response_time(), Some(3));
        assert_eq!(fcfs.metrics().idle, 0);
    }

    #[test]
    fn idles_while_the_only_process_does_io() {
        let mut fcfs = Fcfs::new();
        admit_all(&mut fcfs, vec![ProcessSpec::new("A", 0).cpu(2).io(3).cpu(1)]);
        let steps = steps(&mut fcfs);

        let pid = Pid::new(1);
        let units = |n| NonZeroU64::new(n).unwrap();
        assert_eq!(
            steps,
            vec![
                Step::run(0, pid, units(2), StopReason::Io),
                Step::idle(2, units(3)),
                Step::run(5, pid, units(1), StopReason::Finished),
            ]
        );
        let metrics = fcfs.metrics();
        assert_eq!(metrics.elapsed, 6);
        assert_eq!(metrics.idle, 3);
        assert_eq!(metrics.cpu_utilization(), 0.5);
    }

    #[test]
    fn waits_for_late_arrivals() {
        let mut fcfs = Fcfs::new();
        admit_all(
            &mut fcfs,
            vec![
                ProcessSpec::new("A", 0).cpu(2),
                ProcessSpec::new("B", 0).cpu(1).arriving_at(5),
            ],
        );
        let steps = steps(&mut fcfs);
        assert_eq!(
            steps[1].decision,
            SchedulingDecision::Idle(NonZeroU64::new(3).unwrap())
        );

        let b = fcfs.machine().process(Pid::new(2));
        assert_eq!(b.response_time(), Some(0));
        assert_eq!(b.turnaround_time(), Some(1));
        assert_eq!(b.finish_time(), Some(6));
        assert_eq!(fcfs.metrics().idle, 3);
    }

    #[test]
    fn nothing_admitted_is_done_at_once() {
        let mut fcfs = Fcfs::new();
        assert_eq!(fcfs.step(), Step::done(0));
        assert_eq!(fcfs.metrics().cpu_utilization(), 0.0);
    }
}
