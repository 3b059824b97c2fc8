use std::fs;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty command")]
    EmptyCommand,
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} failed: {}", describe_exit(.code, .stderr))]
    Status {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

impl ExecError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::Status { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    };
    if stderr.is_empty() {
        status
    } else {
        format!("{status} ({stderr})")
    }
}

pub trait Executor: Send + Sync {
    fn run(&self, argv: &[&str]) -> Result<String, ExecError>;

    fn read_file(&self, path: &str) -> Result<String, ExecError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, argv: &[&str]) -> Result<String, ExecError> {
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;
        debug!(command = %argv.join(" "), "running command");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExecError::Status {
                program: program.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn read_file(&self, path: &str) -> Result<String, ExecError> {
        debug!(path, "reading file");
        fs::read_to_string(Path::new(path))
            .map(|text| text.trim().to_string())
            .map_err(|source| ExecError::Read {
                path: path.to_string(),
                source,
            })
    }
}
