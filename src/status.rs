use std::fmt;

pub const OK: &str = "OK";
pub const WARNING: &str = "Warning";
pub const ERROR: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusTier {
    Ok,
    Warning,
    Error,
    Unknown,
}

impl StatusTier {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusTier::Ok => OK,
            StatusTier::Warning => WARNING,
            StatusTier::Error => ERROR,
            StatusTier::Unknown => "Unknown",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, StatusTier::Error | StatusTier::Unknown)
    }
}

impl fmt::Display for StatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(tier_name: &str) -> StatusTier {
    match tier_name {
        OK => StatusTier::Ok,
        WARNING => StatusTier::Warning,
        ERROR => StatusTier::Error,
        _ => StatusTier::Unknown,
    }
}

// Upper bounds for the OK and Warning tiers. Values strictly above
// `warning` are Warning, strictly above `error` are Error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warning: f64,
    pub error: Option<f64>,
}

impl Thresholds {
    pub const fn new(warning: f64, error: f64) -> Self {
        Self {
            warning,
            error: Some(error),
        }
    }

    pub const fn warning_only(warning: f64) -> Self {
        Self {
            warning,
            error: None,
        }
    }

    pub fn tier(&self, value: f64) -> StatusTier {
        let name = match self.error {
            Some(error) if value > error => ERROR,
            _ if value > self.warning => WARNING,
            _ => OK,
        };
        classify(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub component: String,
    pub name: String,
    pub status: StatusTier,
    pub info: String,
}

impl CheckResult {
    pub fn new(
        component: impl Into<String>,
        name: impl Into<String>,
        status: StatusTier,
        info: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            name: name.into(),
            status,
            info: info.into(),
        }
    }

    pub fn error(
        component: impl Into<String>,
        name: impl Into<String>,
        info: impl Into<String>,
    ) -> Self {
        Self::new(component, name, StatusTier::Error, info)
    }
}
