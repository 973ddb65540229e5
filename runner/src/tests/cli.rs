use clap::Parser;
use pretty_assertions::assert_eq;

use super::units;
use crate::{Args, Policy, Tie, FIVE, FOUR, TEN};

#[test]
fn defaults_run_fcfs_on_the_fixture() {
    let args = Args::try_parse_from(["runner"]).unwrap();
    assert_eq!(args.policy, Policy::Fcfs);
    assert_eq!(args.quantum, None);
    assert!(args.quanta.is_empty());
    assert!(args.foreground.is_empty());
    assert_eq!(args.tie_break, Tie::Fifo);
    assert_eq!(args.random, None);
    assert!(!args.json);
}

#[test]
fn lists_are_comma_separated() {
    let args = Args::try_parse_from([
        "runner",
        "--policy",
        "mlfq",
        "--quanta",
        "3,7",
        "--foreground",
        "P1,P5",
    ])
    .unwrap();
    assert_eq!(args.policy, Policy::Mlfq);
    assert_eq!(args.quanta, [units(3), units(7)]);
    assert_eq!(args.foreground, ["P1", "P5"]);
}

#[test]
fn zero_quantum_is_rejected() {
    assert!(Args::try_parse_from(["runner", "--policy", "rr", "--quantum", "0"]).is_err());
}

#[test]
fn random_roster_size() {
    let args = Args::try_parse_from(["runner", "--random", "9", "--count", "4"]).unwrap();
    assert_eq!((args.random, args.count), (Some(9), 4));
    assert_eq!(Args::try_parse_from(["runner"]).unwrap().count, 8);
}

#[test]
fn default_quanta() {
    assert_eq!((FIVE, FOUR, TEN), (units(5), units(4), units(10)));
}
