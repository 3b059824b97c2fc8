use super::{CheckSpec, Probe};
use crate::status::CheckResult;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, error};

pub async fn run_checks(probe: Arc<Probe>, specs: Vec<CheckSpec>) -> Vec<CheckResult> {
    let expected = specs.len();
    let (tx, mut rx) = mpsc::channel(expected.max(1));

    for spec in specs {
        let tx = tx.clone();
        let probe = probe.clone();
        tokio::spawn(async move {
            let result = match task::spawn_blocking(move || spec.run(&probe)).await {
                Ok(result) => result,
                Err(err) => {
                    error!(component = spec.component, check = spec.name, error = %err, "check task failed");
                    CheckResult::error(spec.component, spec.name, format!("check task failed: {err}"))
                }
            };
            if tx.send(result).await.is_err() {
                debug!(component = spec.component, check = spec.name, "result receiver dropped");
            }
        });
    }
    drop(tx);

    let mut results = Vec::with_capacity(expected);
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::healthy_probe;
    use crate::collectors::{CheckError, Reading};
    use crate::status::StatusTier;
    use std::time::{Duration, Instant};

    fn slow(_: &Probe) -> Result<Reading, CheckError> {
        std::thread::sleep(Duration::from_millis(200));
        Ok(Reading::new(StatusTier::Ok, "slow"))
    }

    fn fast(_: &Probe) -> Result<Reading, CheckError> {
        Ok(Reading::new(StatusTier::Warning, "fast"))
    }

    fn failing(_: &Probe) -> Result<Reading, CheckError> {
        Err(CheckError::Format("test"))
    }

    fn panicking(_: &Probe) -> Result<Reading, CheckError> {
        panic!("boom")
    }

    #[tokio::test]
    async fn returns_one_result_per_spec() {
        let specs = vec![
            CheckSpec::new("T", "slow", slow),
            CheckSpec::new("T", "fast", fast),
            CheckSpec::new("T", "failing", failing),
        ];
        let results = run_checks(Arc::new(healthy_probe()), specs).await;
        assert_eq!(results.len(), 3);

        let mut names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["failing", "fast", "slow"]);

        let failed = results.iter().find(|r| r.name == "failing").unwrap();
        assert_eq!(failed.status, StatusTier::Error);
        assert_eq!(failed.info, "Unexpected test output format");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn checks_run_in_parallel() {
        let specs: Vec<CheckSpec> = (0..4).map(|_| CheckSpec::new("T", "slow", slow)).collect();
        let start = Instant::now();
        let results = run_checks(Arc::new(healthy_probe()), specs).await;
        assert_eq!(results.len(), 4);
        assert!(start.elapsed() < Duration::from_millis(700));
    }

    #[tokio::test]
    async fn panicking_check_still_yields_a_row() {
        let specs = vec![
            CheckSpec::new("T", "panics", panicking),
            CheckSpec::new("T", "fast", fast),
        ];
        let results = run_checks(Arc::new(healthy_probe()), specs).await;
        assert_eq!(results.len(), 2);
        let row = results.iter().find(|r| r.name == "panics").unwrap();
        assert_eq!(row.status, StatusTier::Error);
        assert!(row.info.starts_with("check task failed"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn abandoned_run_lets_in_flight_checks_finish() {
        let handle = tokio::spawn(run_checks(
            Arc::new(healthy_probe()),
            vec![CheckSpec::new("T", "slow", slow)],
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        // The orphaned check completes and finds its receiver gone.
        tokio::time::sleep(Duration::from_millis(300)).await;
        let results = run_checks(Arc::new(healthy_probe()), vec![CheckSpec::new("T", "fast", fast)]).await;
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn empty_spec_list_returns_nothing() {
        let results = run_checks(Arc::new(healthy_probe()), Vec::new()).await;
        assert!(results.is_empty());
    }
}
