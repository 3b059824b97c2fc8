use super::{fields, CheckError, CheckSpec, Probe, Reading};
use crate::status::Thresholds;

pub const ROOT_USAGE: Thresholds = Thresholds::new(75.0, 95.0);
pub const ROOT_INODE_USAGE: Thresholds = Thresholds::new(75.0, 90.0);

pub fn checks() -> Vec<CheckSpec> {
    vec![
        CheckSpec::new("Disk", "Root Usage", root_usage),
        CheckSpec::new("Disk", "Root Inode Usage", root_inode_usage),
    ]
}

fn root_usage(probe: &Probe) -> Result<Reading, CheckError> {
    let output = probe.executor.run(&["df", "--output=pcent", "/"])?;
    let usage = parse_pcent(&output)?;
    Ok(Reading::new(
        ROOT_USAGE.tier(f64::from(usage)),
        format!("Disk Usage: {usage}%"),
    ))
}

// `df --output=pcent /` prints a header and a single ` NN%` line.
fn parse_pcent(output: &str) -> Result<u32, CheckError> {
    let line = output
        .lines()
        .nth(1)
        .ok_or(CheckError::Format("df"))?
        .trim();
    line.trim_end_matches('%')
        .parse()
        .map_err(|_| CheckError::parse("disk usage", line))
}

fn root_inode_usage(probe: &Probe) -> Result<Reading, CheckError> {
    let output = probe.executor.run(&["df", "-i"])?;
    let usage = parse_root_inode_usage(&output)?;
    Ok(Reading::new(
        ROOT_INODE_USAGE.tier(usage),
        format!("Inode Usage: {usage:.2}%"),
    ))
}

// Scans `df -i` for the filesystem mounted at `/`.
// The scan keeps a running maximum but stops at the first `/` row whose
// value exceeds it, so in practice the first non-zero `/` row wins. Rows
// with an unparsable `IUse%` (e.g. `-` on btrfs) are skipped.
fn parse_root_inode_usage(output: &str) -> Result<f64, CheckError> {
    let mut lines = output.lines();
    if lines.next().is_none() {
        return Err(CheckError::Format("df -i"));
    }

    let mut usage = 0.0_f64;
    let mut found = false;
    for line in lines {
        let cols = fields(line);
        if cols.len() < 6 || cols[5] != "/" {
            continue;
        }
        let Ok(value) = cols[4].trim_end_matches('%').parse::<f64>() else {
            continue;
        };
        found = true;
        if value > usage {
            usage = value;
            break;
        }
    }

    if !found {
        return Err(CheckError::MissingLine("Root filesystem inode"));
    }
    Ok(usage)
}
