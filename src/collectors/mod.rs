pub mod cpu;
pub mod disk;
pub mod memory;
pub mod os;
pub mod runner;

use crate::exec::{ExecError, Executor};
use crate::ntp::{NtpError, TimeSource};
use crate::status::{CheckResult, StatusTier};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct Probe {
    pub executor: Arc<dyn Executor>,
    pub time_source: Arc<dyn TimeSource>,
}

impl Probe {
    pub fn new(executor: Arc<dyn Executor>, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            executor,
            time_source,
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("Error querying NTP server: {0}")]
    Ntp(#[from] NtpError),
    #[error("{0} line not found")]
    MissingLine(&'static str),
    #[error("Unexpected {0} output format")]
    Format(&'static str),
    #[error("Error parsing {what}: {value:?}")]
    Parse { what: &'static str, value: String },
    #[error("{0}")]
    Invalid(String),
}

impl CheckError {
    fn parse(what: &'static str, value: &str) -> Self {
        CheckError::Parse {
            what,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub status: StatusTier,
    pub info: String,
}

impl Reading {
    pub fn new(status: StatusTier, info: impl Into<String>) -> Self {
        Self {
            status,
            info: info.into(),
        }
    }
}

pub type CheckFn = fn(&Probe) -> Result<Reading, CheckError>;

#[derive(Clone, Copy)]
pub struct CheckSpec {
    pub component: &'static str,
    pub name: &'static str,
    pub func: CheckFn,
}

impl CheckSpec {
    pub const fn new(component: &'static str, name: &'static str, func: CheckFn) -> Self {
        Self {
            component,
            name,
            func,
        }
    }

    pub fn run(&self, probe: &Probe) -> CheckResult {
        let start = Instant::now();
        let result = match (self.func)(probe) {
            Ok(reading) => CheckResult::new(self.component, self.name, reading.status, reading.info),
            Err(err) => CheckResult::error(self.component, self.name, err.to_string()),
        };

        if result.status.is_failure() {
            warn!(
                component = self.component,
                check = self.name,
                info = %result.info,
                "check reported {}",
                result.status
            );
        }
        debug!(
            component = self.component,
            check = self.name,
            status = %result.status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "check finished"
        );
        result
    }
}

impl std::fmt::Debug for CheckSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckSpec")
            .field("component", &self.component)
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Cpu,
    Disk,
    Memory,
    Os,
}

impl Family {
    pub const ALL: [Family; 4] = [Family::Cpu, Family::Disk, Family::Memory, Family::Os];

    pub fn specs(self) -> Vec<CheckSpec> {
        match self {
            Family::Cpu => cpu::checks(),
            Family::Disk => disk::checks(),
            Family::Memory => memory::checks(),
            Family::Os => os::checks(),
        }
    }

    pub async fn get_all(self, probe: Arc<Probe>) -> Vec<CheckResult> {
        runner::run_checks(probe, self.specs()).await
    }
}

// Runs every family concurrently and streams their results. The receiver
// yields `None` only after all families have forwarded all of their rows.
pub fn collect_all(probe: Arc<Probe>, families: &[Family]) -> mpsc::Receiver<CheckResult> {
    let leaf_count: usize = families.iter().map(|f| f.specs().len()).sum();
    let (tx, rx) = mpsc::channel(leaf_count.max(1));

    for family in families.iter().copied() {
        let tx = tx.clone();
        let probe = probe.clone();
        tokio::spawn(async move {
            let results = family.get_all(probe).await;
            debug!(?family, count = results.len(), "family finished");
            for result in results {
                if tx.send(result).await.is_err() {
                    debug!(?family, "result receiver dropped");
                    break;
                }
            }
        });
    }

    rx
}

fn fields(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

fn parse_f64(what: &'static str, value: &str) -> Result<f64, CheckError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| CheckError::parse(what, value))
}

fn percent(used: f64, total: f64) -> f64 {
    (used / total) * 100.0
}


#[cfg(test)]
mod tests {
    use super::testing::{healthy_probe, probe, FakeClock, FakeExecutor};
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    async fn drain(mut rx: mpsc::Receiver<CheckResult>) -> Vec<CheckResult> {
        let mut out = Vec::new();
        while let Some(result) = rx.recv().await {
            out.push(result);
        }
        out
    }

    fn keys(results: &[CheckResult]) -> HashSet<(String, String)> {
        results
            .iter()
            .map(|r| (r.component.clone(), r.name.clone()))
            .collect()
    }

    #[test]
    fn registry_has_eight_leaf_checks() {
        let counts: Vec<usize> = Family::ALL.iter().map(|f| f.specs().len()).collect();
        assert_eq!(counts, vec![1, 2, 4, 1]);
    }

    #[test]
    fn spec_run_turns_errors_into_error_rows() {
        fn broken(_: &Probe) -> Result<Reading, CheckError> {
            Err(CheckError::MissingLine("Mem"))
        }
        let spec = CheckSpec::new("Memory", "RAM Usage", broken);
        let result = spec.run(&healthy_probe());
        assert_eq!(
            result,
            CheckResult::error("Memory", "RAM Usage", "Mem line not found")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn collect_all_yields_every_result_then_closes() {
        let executor = FakeExecutor::healthy()
            .with_delay("uptime", Duration::from_millis(150))
            .with_delay("df -i", Duration::from_millis(20))
            .with_delay("dmesg -T", Duration::from_millis(80));
        let clock = FakeClock {
            delay: Duration::from_millis(40),
            ..FakeClock::offset_ms(0)
        };
        let probe = Arc::new(probe(executor, clock));

        let results = drain(collect_all(probe, &Family::ALL)).await;

        assert_eq!(results.len(), 8);
        let expected: HashSet<(String, String)> = Family::ALL
            .iter()
            .flat_map(|f| f.specs())
            .map(|s| (s.component.to_string(), s.name.to_string()))
            .collect();
        assert_eq!(keys(&results), expected);
        assert!(results.iter().all(|r| r.status == StatusTier::Ok), "{results:?}");
    }

    #[tokio::test]
    async fn collect_all_over_subset_and_empty_set() {
        let probe = Arc::new(healthy_probe());
        let results = drain(collect_all(probe.clone(), &[Family::Disk, Family::Cpu])).await;
        assert_eq!(results.len(), 3);

        let results = drain(collect_all(probe, &[])).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn broken_host_still_reports_every_check() {
        let probe = Arc::new(probe(FakeExecutor::new(), FakeClock::failing()));
        let results = drain(collect_all(probe, &Family::ALL)).await;
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.status == StatusTier::Error));
        let time = results
            .iter()
            .find(|r| r.component == "OS")
            .expect("os row");
        assert!(time.info.starts_with("Error querying NTP server"));
    }

    #[tokio::test]
    async fn each_check_issues_its_own_commands() {
        let executor = Arc::new(FakeExecutor::healthy().without("free"));
        let probe = Arc::new(Probe::new(executor.clone(), Arc::new(FakeClock::offset_ms(0))));

        let results = Family::Memory.get_all(probe).await;
        assert_eq!(results.len(), 4);

        let failed: HashSet<&str> = results
            .iter()
            .filter(|r| r.status == StatusTier::Error)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(failed, HashSet::from(["RAM Usage", "Swap Usage"]));

        let mut calls = executor.calls();
        calls.sort();
        assert_eq!(calls, vec!["dmesg -T", "free", "free"]);
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_results() {
        let run = || async {
            let probe = Arc::new(healthy_probe());
            let mut results = drain(collect_all(probe, &Family::ALL)).await;
            results.sort_by(|a, b| (&a.component, &a.name).cmp(&(&b.component, &b.name)));
            results
        };
        assert_eq!(run().await, run().await);
    }
}
