use std::fmt::{self, Display};

use scheduler::{Process, Scheduler};
use serde::Serialize;

/// The statistics of one finished process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub name: String,
    pub cpu: u64,
    pub io: u64,
    pub waiting: u64,
    pub turnaround: u64,
    pub response: u64,
}

impl ProcessReport {
    fn new(process: &Process) -> ProcessReport {
        ProcessReport {
            name: process.name().to_string(),
            cpu: process.cpu_time(),
            io: process.io_time(),
            waiting: process.waiting_time(),
            turnaround: process.turnaround_time().unwrap_or_default(),
            response: process.response_time().unwrap_or_default(),
        }
    }
}

/// The results of a simulation, computed from the finished processes once
/// the scheduler is done.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub policy: String,
    /// Process names in the order they finished.
    pub order: Vec<String>,
    /// One report per finished process, in completion order.
    pub reports: Vec<ProcessReport>,
    pub elapsed: u64,
    pub idle: u64,
    pub utilization: f64,
    pub average_waiting: f64,
    pub average_turnaround: f64,
    pub average_response: f64,
}

fn average(reports: &[ProcessReport], field: impl Fn(&ProcessReport) -> u64) -> f64 {
    if reports.is_empty() {
        return 0.0;
    }
    reports.iter().map(field).sum::<u64>() as f64 / reports.len() as f64
}

impl Summary {
    pub fn new<S: Scheduler>(scheduler: &S) -> Summary {
        let finished = scheduler.completion_order();
        let reports: Vec<_> = finished.iter().map(|process| ProcessReport::new(process)).collect();
        let metrics = scheduler.metrics();
        Summary {
            policy: scheduler.name().to_string(),
            order: reports.iter().map(|report| report.name.clone()).collect(),
            elapsed: metrics.elapsed,
            idle: metrics.idle,
            utilization: metrics.cpu_utilization(),
            average_waiting: average(&reports, |report| report.waiting),
            average_turnaround: average(&reports, |report| report.turnaround),
            average_response: average(&reports, |report| report.response),
            reports,
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Policy: {}", self.policy)?;
        writeln!(f, "Order: {}", self.order.join(" "))?;
        writeln!(f, "NAME\tCPU\tIO\tWAIT\tTAT\tRESP")?;
        for report in &self.reports {
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}\t{}",
                report.name,
                report.cpu,
                report.io,
                report.waiting,
                report.turnaround,
                report.response
            )?;
        }
        writeln!(f, "Total time: {}", self.elapsed)?;
        writeln!(f, "Idle time: {}", self.idle)?;
        writeln!(f, "CPU utilization: {:.2}%", self.utilization * 100.0)?;
        writeln!(f, "Average waiting time: {:.2}", self.average_waiting)?;
        writeln!(f, "Average turnaround time: {:.2}", self.average_turnaround)?;
        writeln!(f, "Average response time: {:.2}", self.average_response)
    }
}
