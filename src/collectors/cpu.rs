use super::{fields, parse_f64, CheckError, CheckSpec, Probe, Reading};
use crate::status::Thresholds;

pub const USAGE: Thresholds = Thresholds::new(80.0, 95.0);

pub fn checks() -> Vec<CheckSpec> {
    vec![CheckSpec::new("CPU", "Usage", usage)]
}

fn usage(probe: &Probe) -> Result<Reading, CheckError> {
    let uptime = probe.executor.run(&["uptime"])?;
    let load = parse_load_average_15m(&uptime)?;

    let nproc = probe.executor.run(&["nproc"])?;
    let cores = parse_core_count(&nproc)?;

    let usage = (load / f64::from(cores)) * 100.0;
    Ok(Reading::new(
        USAGE.tier(usage),
        format!("15-minute load average: {load:.2}, Usage: {usage:.2}%"),
    ))
}

fn parse_load_average_15m(output: &str) -> Result<f64, CheckError> {
    let last = fields(output)
        .last()
        .copied()
        .ok_or(CheckError::Format("uptime"))?;
    parse_f64("15-minute load average", last.trim_matches(','))
}

fn parse_core_count(output: &str) -> Result<u32, CheckError> {
    let cores: u32 = output
        .trim()
        .parse()
        .map_err(|_| CheckError::parse("core count", output.trim()))?;
    if cores == 0 {
        return Err(CheckError::Invalid("nproc reported 0 cores".to_string()));
    }
    Ok(cores)
}
