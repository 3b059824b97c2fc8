use super::{fields, parse_f64, percent, CheckError, CheckSpec, Probe, Reading};
use crate::status::{classify, Thresholds, ERROR, OK};

pub const RAM_USAGE: Thresholds = Thresholds::new(75.0, 90.0);
pub const SWAP_USAGE: Thresholds = Thresholds::new(75.0, 90.0);
pub const PRESSURE: Thresholds = Thresholds::new(20.0, 40.0);

const PRESSURE_PATH: &str = "/proc/pressure/memory";
const OOM_MARKER: &str = "killed process";

pub fn checks() -> Vec<CheckSpec> {
    vec![
        CheckSpec::new("Memory", "RAM Usage", ram_usage),
        CheckSpec::new("Memory", "Swap Usage", swap_usage),
        CheckSpec::new("Memory", "Pressure", pressure),
        CheckSpec::new("Memory", "OOM Events", oom_events),
    ]
}

fn ram_usage(probe: &Probe) -> Result<Reading, CheckError> {
    let output = probe.executor.run(&["free"])?;
    let usage = parse_ram_usage(&output)?;
    Ok(Reading::new(
        RAM_USAGE.tier(usage),
        format!("Usage: {usage:.2}%"),
    ))
}

fn swap_usage(probe: &Probe) -> Result<Reading, CheckError> {
    let output = probe.executor.run(&["free"])?;
    match parse_swap_usage(&output)? {
        Some(usage) => Ok(Reading::new(
            SWAP_USAGE.tier(usage),
            format!("Usage: {usage:.2}%"),
        )),
        None => Ok(Reading::new(classify(OK), "No swap configured")),
    }
}

fn find_line<'a>(output: &'a str, prefix: &str) -> Option<&'a str> {
    output.lines().find(|line| line.starts_with(prefix))
}

// `Mem:` row: total is column 1, available is column 6.
fn parse_ram_usage(output: &str) -> Result<f64, CheckError> {
    let line = find_line(output, "Mem:").ok_or(CheckError::MissingLine("Mem"))?;
    let cols = fields(line);
    if cols.len() < 7 {
        return Err(CheckError::Format("free"));
    }
    let total = parse_f64("total memory", cols[1])?;
    let available = parse_f64("available memory", cols[6])?;
    if total <= 0.0 {
        return Err(CheckError::Invalid("total memory is zero".to_string()));
    }
    Ok(percent(total - available, total))
}

// `Swap:` row: total is column 1, free is column 3. `None` when the host
// has no swap at all.
fn parse_swap_usage(output: &str) -> Result<Option<f64>, CheckError> {
    let line = find_line(output, "Swap:").ok_or(CheckError::MissingLine("Swap"))?;
    let cols = fields(line);
    if cols.len() < 4 {
        return Err(CheckError::Format("free"));
    }
    let total = parse_f64("total swap", cols[1])?;
    let free = parse_f64("free swap", cols[3])?;
    if total <= 0.0 {
        return Ok(None);
    }
    Ok(Some(percent(total - free, total)))
}

fn pressure(probe: &Probe) -> Result<Reading, CheckError> {
    let content = probe.executor.read_file(PRESSURE_PATH)?;
    let value = parse_pressure(&content)?;
    Ok(Reading::new(
        PRESSURE.tier(value),
        format!("Memory Pressure: {value:.2}%"),
    ))
}

fn parse_pressure(content: &str) -> Result<f64, CheckError> {
    let first = content.lines().next().unwrap_or_default();
    let cols = fields(first);
    if cols.len() < 2 {
        return Err(CheckError::Format("memory pressure"));
    }
    let (_, value) = cols[1]
        .split_once('=')
        .ok_or_else(|| CheckError::parse("memory pressure", cols[1]))?;
    parse_f64("memory pressure", value)
}

fn oom_events(probe: &Probe) -> Result<Reading, CheckError> {
    // Some dmesg builds exit with 1 when there is nothing to show.
    let output = match probe.executor.run(&["dmesg", "-T"]) {
        Ok(output) => output,
        Err(err) if err.exit_code() == Some(1) => String::new(),
        Err(err) => return Err(err.into()),
    };

    let count = count_oom_kills(&output);
    let status = if count > 0 { classify(ERROR) } else { classify(OK) };
    Ok(Reading::new(status, format!("OOM Events: {count}")))
}

fn count_oom_kills(log: &str) -> usize {
    log.lines()
        .filter(|line| line.to_lowercase().contains(OOM_MARKER))
        .count()
}
