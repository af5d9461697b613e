use std::fmt;

/// Which of the child's output pipes a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// What the supervisor should do with one line of relay output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    /// Blank line; dropped.
    Ignore,
    /// Log at info.
    Info,
    /// Log at error.
    Error,
    /// Log at error and kill the relay now.
    KillNow,
}

/// Result of a liveness check. Recomputed from the live handle on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// No process handle (never launched, or already released).
    NoProcess,
    /// The process has exited.
    Exited,
    /// The process is alive but failed the liveness probe.
    Unresponsive,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    pub fn reason(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "process is running",
            HealthStatus::NoProcess => "process is null",
            HealthStatus::Exited => "process has exited",
            HealthStatus::Unresponsive => "process is not responding",
        }
    }
}

/// Why the supervision loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    Unhealthy,
}
