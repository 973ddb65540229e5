use std::num::NonZeroU64;

use processor::{fixture, fixture_foreground, Processor, Summary};
use scheduler::{PriorityOrder, Scheduler, TieBreak};

mod cli;

fn units(n: u64) -> NonZeroU64 {
    NonZeroU64::new(n).unwrap()
}

/// The six policies with the parameters used for the fixture.
fn policies() -> Vec<Box<dyn Scheduler>> {
    vec![
        Box::new(scheduler::fcfs()),
        Box::new(scheduler::sjf(TieBreak::Fifo)),
        Box::new(scheduler::round_robin(units(5))),
        Box::new(scheduler::priority(units(5), PriorityOrder::LowerFirst)),
        Box::new(scheduler::mlq(units(4), fixture_foreground())),
        Box::new(scheduler::mlfq(units(5), units(10))),
    ]
}

fn admit_fixture(scheduler: &mut dyn Scheduler) {
    for spec in fixture() {
        scheduler.admit(spec).unwrap();
    }
}

fn run_fixture<S: Scheduler>(scheduler: S) -> Summary {
    Processor::run(scheduler, fixture()).unwrap().summary()
}
