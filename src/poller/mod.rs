//! Bounded polling of asynchronous remote jobs
//!
//! A remote job is submitted once and then checked at a fixed cadence until it
//! reaches a terminal state or the attempt budget runs out:
//!
//! ```text
//!   submit(input) ──► handle
//!                       │
//!                       ▼
//!   check #1 ──► Pending ──sleep(interval)──► check #2 ──► ... ──► check #max
//!      │                                         │                    │
//!      ├─ Succeeded(p) ──► Success(p)            │                    └─ Pending ──► TimedOut
//!      └─ Failed(r)    ──► Failure(r)            └─ (same)
//! ```
//!
//! Cancellation is observed before every check, while sleeping, and while a
//! check is in flight (the check is abandoned). A failed
//! status check is a [`TransportError`], never a [`PollOutcome::Failure`].

pub mod job;

use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use job::{run_to_completion, RemoteJob, RunError};

/// Status reported by a single check of a remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus<T> {
    /// Still running, no result yet.
    Pending,
    /// Finished with a result artifact (e.g. a video URL).
    Succeeded(T),
    /// Finished unsuccessfully.
    Failed(String),
}

impl<T> JobStatus<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Terminal result of one polling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Success(T),
    Failure(String),
    /// The attempt budget ran out while the job was still pending.
    TimedOut,
    /// The caller withdrew interest before a terminal state was reached.
    Cancelled,
}

impl<T> PollOutcome<T> {
    /// Short label used in logs and metrics fields.
    pub fn label(&self) -> &'static str {
        match self {
            PollOutcome::Success(_) => "success",
            PollOutcome::Failure(_) => "failure",
            PollOutcome::TimedOut => "timed_out",
            PollOutcome::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    #[error("max attempts must be at least 1")]
    ZeroAttempts,
}

/// Spacing and attempt budget for a polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    max_attempts: u32,
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Result<Self, PollConfigError> {
        if interval.is_zero() {
            return Err(PollConfigError::ZeroInterval);
        }
        if max_attempts == 0 {
            return Err(PollConfigError::ZeroAttempts);
        }
        Ok(Self {
            interval,
            max_attempts,
        })
    }

    pub fn from_millis(interval_ms: u64, max_attempts: u32) -> Result<Self, PollConfigError> {
        Self::new(Duration::from_millis(interval_ms), max_attempts)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Total time spent sleeping when every check comes back pending.
    pub fn worst_case_wait(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts - 1)
    }
}

impl Default for PollConfig {
    /// 5 second spacing, 20 attempts.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 20,
        }
    }
}

/// The status-check capability itself failed (network, decoding, ...).
#[derive(Debug, Error)]
#[error("status check failed: {0}")]
pub struct TransportError<E>(#[source] pub E);

impl<E> TransportError<E> {
    pub fn into_inner(self) -> E {
        self.0
    }
}

/// Drive an already-submitted job to a terminal outcome.
///
/// Performs at most `config.max_attempts()` sequential checks, sleeping
/// `config.interval()` before every check after the first. Returns as soon as
/// a check reports a terminal status, the budget is exhausted, or `cancel`
/// fires, even mid-check. A check that errors is returned immediately as a [`TransportError`].
pub async fn poll_until_done<J>(
    job: &J,
    handle: &J::Handle,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<PollOutcome<J::Output>, TransportError<J::Error>>
where
    J: RemoteJob + ?Sized,
{
    for attempt in 1..=config.max_attempts() {
        if attempt > 1 {
            if cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = tokio::time::sleep(config.interval()) => {}
            }
        }

        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            status = job.check_status(handle) => status.map_err(TransportError)?,
        };

        match status {
            JobStatus::Pending => continue,
            JobStatus::Succeeded(payload) => return Ok(PollOutcome::Success(payload)),
            JobStatus::Failed(reason) => return Ok(PollOutcome::Failure(reason)),
        }
    }

    Ok(PollOutcome::TimedOut)
}
