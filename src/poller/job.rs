use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::{poll_until_done, JobStatus, PollConfig, PollOutcome, TransportError};

/// An asynchronous job hosted by an external service.
///
/// `check_status` must be idempotent and safe to call concurrently from
/// independent sessions. Vendor-specific status codes are mapped to
/// [`JobStatus`] by the implementor.
#[async_trait]
pub trait RemoteJob: Send + Sync {
    type Input: Send + Sync;
    type Handle: Send + Sync;
    type Output: Send;
    type Error: Send;

    async fn submit(&self, input: &Self::Input) -> Result<Self::Handle, Self::Error>;

    async fn check_status(
        &self,
        handle: &Self::Handle,
    ) -> Result<JobStatus<Self::Output>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum RunError<E> {
    #[error("job submission failed: {0}")]
    Submit(#[source] E),

    #[error(transparent)]
    Transport(#[from] TransportError<E>),
}

impl<E> RunError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RunError::Submit(e) => e,
            RunError::Transport(e) => e.into_inner(),
        }
    }
}

/// Submit `input` and poll the resulting job until it settles.
///
/// A cancelled token short-circuits before submission, so nothing is sent to
/// the remote service.
pub async fn run_to_completion<J>(
    job: &J,
    input: &J::Input,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<PollOutcome<J::Output>, RunError<J::Error>>
where
    J: RemoteJob + ?Sized,
{
    if cancel.is_cancelled() {
        return Ok(PollOutcome::Cancelled);
    }

    let handle = job.submit(input).await.map_err(RunError::Submit)?;
    let outcome = poll_until_done(job, &handle, config, cancel).await?;
    Ok(outcome)
}
