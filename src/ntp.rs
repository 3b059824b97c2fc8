use rsntp::{SntpClient, SynchronizationError};
use std::io;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NtpError {
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Sync(SynchronizationError),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub trait TimeSource: Send + Sync {
    fn network_time(&self) -> Result<SystemTime, NtpError>;

    fn local_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[derive(Debug, Clone)]
pub struct NtpClient {
    server: String,
    timeout: Duration,
}

impl NtpClient {
    pub fn new(server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            server: server.into(),
            timeout,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl TimeSource for NtpClient {
    fn network_time(&self) -> Result<SystemTime, NtpError> {
        query(&self.server, self.timeout)
    }
}

// One request, no retry. The server may carry an explicit `host:port`.
pub fn query(server: &str, timeout: Duration) -> Result<SystemTime, NtpError> {
    let mut client = SntpClient::new();
    client.set_timeout(timeout);

    debug!(server, ?timeout, "querying ntp server");
    let result = client
        .synchronize(server)
        .map_err(|err| classify_error(err, timeout))?;

    debug!(
        server,
        stratum = result.stratum(),
        offset_secs = result.clock_offset().as_secs_f64(),
        "ntp reply"
    );
    result
        .datetime()
        .into_system_time()
        .map_err(|err| NtpError::InvalidResponse(err.to_string()))
}

fn classify_error(err: SynchronizationError, timeout: Duration) -> NtpError {
    match err {
        SynchronizationError::IOError(io_err)
            if matches!(
                io_err.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ) =>
        {
            NtpError::Timeout(timeout)
        }
        other => NtpError::Sync(other),
    }
}
