use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scheduler::ProcessSpec;

const FIXTURE: [(&str, i32, &[u64]); 8] = [
    ("P1", 3, &[5, 27, 3, 31, 5, 43, 4, 18, 6, 22, 4, 26, 3, 24, 4]),
    ("P2", 6, &[4, 48, 5, 44, 7, 42, 12, 37, 9, 76, 4, 41, 9, 31, 7, 43, 8]),
    ("P3", 5, &[8, 33, 12, 41, 18, 65, 14, 21, 4, 61, 15, 18, 14, 26, 5, 31, 6]),
    ("P4", 4, &[3, 35, 4, 41, 5, 45, 3, 51, 4, 61, 5, 54, 6, 82, 5, 77, 3]),
    ("P5", 1, &[16, 24, 17, 21, 5, 36, 16, 26, 7, 31, 13, 28, 11, 21, 6, 13, 3, 11, 4]),
    ("P6", 2, &[11, 22, 4, 8, 5, 10, 6, 12, 7, 14, 9, 18, 12, 24, 15, 30, 8]),
    ("P7", 8, &[14, 46, 17, 41, 11, 42, 15, 21, 4, 32, 7, 19, 16, 33, 10]),
    ("P8", 7, &[4, 14, 5, 33, 6, 51, 14, 73, 16, 87, 6]),
];

/// The eight process regression roster, all arriving at 0.
pub fn fixture() -> Vec<ProcessSpec> {
    FIXTURE
        .iter()
        .map(|(name, priority, bursts)| ProcessSpec::alternating(*name, *priority, bursts))
        .collect()
}

/// The foreground half of [`fixture`] for the two level queue.
pub fn fixture_foreground() -> [&'static str; 4] {
    ["P1", "P2", "P3", "P4"]
}

/// Builds random rosters that are the same for the same seed.
///
/// Every range must be non-empty, and durations must not include 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub seed: u64,
    pub processes: usize,
    /// Number of bursts of a process, CPU and I/O alternating.
    pub bursts: RangeInclusive<usize>,
    pub cpu: RangeInclusive<u64>,
    pub io: RangeInclusive<u64>,
    pub priorities: RangeInclusive<i32>,
}

impl Generator {
    pub fn new(seed: u64) -> Generator {
        Generator {
            seed,
            processes: 8,
            bursts: 1..=17,
            cpu: 1..=20,
            io: 5..=80,
            priorities: 1..=8,
        }
    }

    pub fn processes(mut self, processes: usize) -> Generator {
        self.processes = processes;
        self
    }

    pub fn generate(&self) -> Vec<ProcessSpec> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (1..=self.processes)
            .map(|index| {
                let count = rng.gen_range(self.bursts.clone());
                let durations: Vec<u64> = (0..count)
                    .map(|burst| {
                        if burst % 2 == 0 {
                            rng.gen_range(self.cpu.clone())
                        } else {
                            rng.gen_range(self.io.clone())
                        }
                    })
                    .collect();
                let priority = rng.gen_range(self.priorities.clone());
                ProcessSpec::alternating(format!("P{index}"), priority, &durations)
            })
            .collect()
    }
}
