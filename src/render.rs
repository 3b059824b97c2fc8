use crate::status::{CheckResult, StatusTier};
use colored::{ColoredString, Colorize};
use std::fmt::Write as _;
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthStr;

const HEADER: [&str; 4] = ["Resource", "Check", "Status", "Info"];

#[derive(Debug, Clone, Default)]
pub struct Table {
    rows: Vec<CheckResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub ok: usize,
    pub warning: usize,
    pub error: usize,
    pub unknown: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.ok + self.warning + self.error + self.unknown
    }

    pub fn has_failures(&self) -> bool {
        self.error > 0 || self.unknown > 0
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: CheckResult) {
        self.rows.push(result);
    }

    pub fn rows(&self) -> &[CheckResult] {
        &self.rows
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for row in self.rows() {
            match row.status {
                StatusTier::Ok => summary.ok += 1,
                StatusTier::Warning => summary.warning += 1,
                StatusTier::Error => summary.error += 1,
                StatusTier::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    pub fn render(&self, color: bool) -> String {
        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|r| {
                [r.component.as_str(), r.name.as_str(), r.status.as_str(), r.info.as_str()]
                    .map(single_line)
            })
            .collect();

        let mut widths = HEADER.map(|h| h.width());
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }

        let mut out = String::new();
        out.push_str(&border(&widths, '┌', '┬', '┐'));
        let header: Vec<String> = HEADER
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let padded = pad(cell, width);
                if color {
                    padded.bold().to_string()
                } else {
                    padded
                }
            })
            .collect();
        out.push_str(&line(&header));
        out.push_str(&border(&widths, '├', '┼', '┤'));

        for (row, result) in cells.iter().zip(&self.rows) {
            let rendered: Vec<String> = row
                .iter()
                .zip(widths)
                .enumerate()
                .map(|(i, (cell, width))| {
                    let padded = pad(cell, width);
                    if color && i == 2 {
                        paint(result.status, padded).to_string()
                    } else {
                        padded
                    }
                })
                .collect();
            out.push_str(&line(&rendered));
        }
        out.push_str(&border(&widths, '└', '┴', '┘'));

        let summary = self.summary();
        let _ = write!(
            out,
            "{} checks: {} OK, {} Warning, {} Error",
            summary.total(),
            summary.ok,
            summary.warning,
            summary.error
        );
        if summary.unknown > 0 {
            let _ = write!(out, ", {} Unknown", summary.unknown);
        }
        out.push('\n');
        out
    }
}

pub async fn render_results(mut rx: mpsc::Receiver<CheckResult>) -> Table {
    let mut table = Table::new();
    while let Some(result) = rx.recv().await {
        table.push(result);
    }
    table
}

fn paint(status: StatusTier, text: String) -> ColoredString {
    match status {
        StatusTier::Ok => text.green().bold(),
        StatusTier::Warning => text.yellow().bold(),
        StatusTier::Error => text.red().bold(),
        StatusTier::Unknown => text.bright_red().bold(),
    }
}

// Multi-line stderr and stray control characters would split a row.
fn single_line(cell: &str) -> String {
    cell.split(|c: char| c.is_control())
        .filter(|part| !part.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

fn pad(cell: &str, width: usize) -> String {
    let fill = width.saturating_sub(cell.width());
    format!("{cell}{}", " ".repeat(fill))
}

fn border(widths: &[usize; 4], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}\n", segments.join(&mid.to_string()))
}

fn line(cells: &[String]) -> String {
    format!("│ {} │\n", cells.join(" │ "))
}
