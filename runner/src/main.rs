use std::num::NonZeroU64;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use processor::{fixture, fixture_foreground, write_logs, Generator, Processor};
use scheduler::{PriorityOrder, ProcessSpec, Scheduler, TieBreak};

const fn units(n: u64) -> NonZeroU64 {
    match NonZeroU64::new(n) {
        Some(units) => units,
        None => panic!("a quantum is at least one unit"),
    }
}

const FIVE: NonZeroU64 = units(5);
const FOUR: NonZeroU64 = units(4);
const TEN: NonZeroU64 = units(10);

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Policy {
    Fcfs,
    Sjf,
    Rr,
    Priority,
    Mlq,
    Mlfq,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Tie {
    Fifo,
    Admission,
}

impl From<Tie> for TieBreak {
    fn from(tie: Tie) -> TieBreak {
        match tie {
            Tie::Fifo => TieBreak::Fifo,
            Tie::Admission => TieBreak::Admission,
        }
    }
}

/// Simulates a CPU scheduling policy over a roster of processes.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    #[arg(short, long, value_enum, default_value_t = Policy::Fcfs)]
    policy: Policy,

    /// Time quantum for rr, priority (5 by default) and mlq (4 by default)
    #[arg(short, long)]
    quantum: Option<NonZeroU64>,

    /// The two mlfq quanta, for levels 0 and 1 [default: 5,10]
    #[arg(long, value_delimiter = ',')]
    quanta: Vec<NonZeroU64>,

    /// Names of the mlq foreground processes [default: P1,P2,P3,P4]
    #[arg(long, value_delimiter = ',')]
    foreground: Vec<String>,

    /// Higher priority values run first
    #[arg(long)]
    descending: bool,

    #[arg(long, value_enum, default_value_t = Tie::Fifo)]
    tie_break: Tie,

    /// Run a random roster generated from this seed instead of the fixture
    #[arg(long)]
    random: Option<u64>,

    /// Number of processes in the random roster
    #[arg(long, default_value_t = 8)]
    count: usize,

    /// Write a snapshot of every step to this file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Give up once the clock goes past this value
    #[arg(long)]
    max_ticks: Option<u64>,
}

fn simulate<S: Scheduler>(mut scheduler: S, roster: Vec<ProcessSpec>, args: &Args) -> Result<()> {
    if let Some(budget) = args.max_ticks {
        scheduler.machine_mut().set_tick_budget(budget);
    }
    let name = scheduler.name();
    let processor =
        Processor::run(scheduler, roster).with_context(|| format!("{name} simulation failed"))?;

    if let Some(path) = &args.trace {
        write_logs(path, processor.logs())
            .with_context(|| format!("cannot write the trace to {}", path.display()))?;
    }

    let summary = processor.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let roster = match args.random {
        Some(seed) => {
            info!("generating {} processes from seed {seed}", args.count);
            Generator::new(seed).processes(args.count).generate()
        }
        None => fixture(),
    };

    match args.policy {
        Policy::Fcfs => simulate(scheduler::fcfs(), roster, &args),
        Policy::Sjf => simulate(scheduler::sjf(args.tie_break.into()), roster, &args),
        Policy::Rr => {
            let quantum = args.quantum.unwrap_or(FIVE);
            simulate(scheduler::round_robin(quantum), roster, &args)
        }
        Policy::Priority => {
            let quantum = args.quantum.unwrap_or(FIVE);
            let order = if args.descending {
                PriorityOrder::HigherFirst
            } else {
                PriorityOrder::LowerFirst
            };
            simulate(scheduler::priority(quantum, order), roster, &args)
        }
        Policy::Mlq => {
            let quantum = args.quantum.unwrap_or(FOUR);
            let foreground = if args.foreground.is_empty() {
                fixture_foreground().map(String::from).to_vec()
            } else {
                args.foreground.clone()
            };
            simulate(scheduler::mlq(quantum, foreground), roster, &args)
        }
        Policy::Mlfq => {
            let (first, second) = match args.quanta.as_slice() {
                [] => (FIVE, TEN),
                [first, second] => (*first, *second),
                other => bail!("--quanta takes two values, got {}", other.len()),
            };
            simulate(scheduler::mlfq(first, second), roster, &args)
        }
    }
}

#[cfg(test)]
mod tests;
