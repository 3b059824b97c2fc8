use super::{CheckError, CheckSpec, Probe, Reading};
use crate::status::Thresholds;
use std::time::{Duration, SystemTime};

pub const TIME_SKEW: Thresholds = Thresholds::warning_only(2.0);

pub fn checks() -> Vec<CheckSpec> {
    vec![CheckSpec::new("OS", "Time Synchronization", time_synchronization)]
}

fn time_synchronization(probe: &Probe) -> Result<Reading, CheckError> {
    let network = probe.time_source.network_time()?;
    let local = probe.time_source.local_time();

    let (skew, ahead) = match network.duration_since(local) {
        Ok(d) => (d, true),
        Err(e) => (e.duration(), false),
    };

    Ok(Reading::new(
        TIME_SKEW.tier(skew.as_secs_f64()),
        format!(
            "NTP Time: {}, Local Time: {}, Difference: {}",
            rfc3339(network),
            rfc3339(local),
            signed_duration(skew, ahead)
        ),
    ))
}

fn rfc3339(time: SystemTime) -> String {
    humantime::format_rfc3339_seconds(time).to_string()
}

// Positive when the network clock is ahead of the local one.
fn signed_duration(skew: Duration, ahead: bool) -> String {
    // Sub-millisecond precision is noise for a 2s tolerance.
    let rounded = Duration::from_millis(skew.as_millis() as u64);
    let text = if rounded.is_zero() {
        "0s".to_string()
    } else {
        humantime::format_duration(rounded).to_string()
    };
    if ahead || rounded.is_zero() {
        text
    } else {
        format!("-{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::{probe, FakeClock, FakeExecutor};
    use crate::status::StatusTier;

    fn run(clock: FakeClock) -> Result<Reading, CheckError> {
        time_synchronization(&probe(FakeExecutor::new(), clock))
    }

    #[test]
    fn in_sync_clock_is_ok() {
        let reading = run(FakeClock::offset_ms(0)).unwrap();
        assert_eq!(reading.status, StatusTier::Ok);
        assert_eq!(
            reading.info,
            "NTP Time: 2026-09-21T14:13:20Z, Local Time: 2026-09-21T14:13:20Z, Difference: 0s"
        );
    }

    #[test]
    fn skew_boundary_in_both_directions() {
        assert_eq!(run(FakeClock::offset_ms(2_000)).unwrap().status, StatusTier::Ok);
        assert_eq!(run(FakeClock::offset_ms(-2_000)).unwrap().status, StatusTier::Ok);
        assert_eq!(run(FakeClock::offset_ms(2_001)).unwrap().status, StatusTier::Warning);

        let behind = run(FakeClock::offset_ms(-90_500)).unwrap();
        assert_eq!(behind.status, StatusTier::Warning);
        assert!(behind.info.ends_with("Difference: -1m 30s 500ms"), "{}", behind.info);
    }

    #[test]
    fn huge_skew_never_reaches_error() {
        let reading = run(FakeClock::offset_ms(86_400_000)).unwrap();
        assert_eq!(reading.status, StatusTier::Warning);
    }

    #[test]
    fn ntp_failure_is_reported() {
        let err = run(FakeClock::failing()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error querying NTP server: no response within 5s"
        );
    }
}
