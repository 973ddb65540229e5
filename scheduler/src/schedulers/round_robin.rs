use std::collections::VecDeque;
use std::num::NonZeroU64;

use crate::machine::SliceEnd;
use crate::{Machine, Pid, Process, ProcessSpec, Result, Scheduler, Step, StopReason};

/// Round robin with a fixed time quantum.
///
/// A preempted process goes to the tail of the ready queue, behind every
/// process that became ready while it was running.
#[derive(Debug)]
pub struct RoundRobin {
    machine: Machine,
    ready: VecDeque<Pid>,
    timeslice: NonZeroU64,
}

impl RoundRobin {
    pub fn new(timeslice: NonZeroU64) -> Self {
        RoundRobin {
            machine: Machine::new(),
            ready: VecDeque::new(),
            timeslice,
        }
    }
}

impl Scheduler for RoundRobin {
    fn name(&self) -> &'static str {
        "RR"
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

        let timeslice = self.machine.dispatch(pid).min(self.timeslice);
        let end = self.machine.run_for(timeslice, |_, woken| {
            self.ready.extend(woken);
            false
        });
        match end {
            SliceEnd::Left(reason) => Step::run(clock, pid, timeslice, reason),
            SliceEnd::Expired | SliceEnd::Interrupted => {
                let pid = self.machine.preempt();
                self.ready.push_back(pid);
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
        self.ready
            .iter()
            .map(|pid| self.machine.process(*pid))
            .collect()
    }
}
