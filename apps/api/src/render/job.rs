use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::render::models::{RenderJobHandle, RenderJobRequest, RenderJobStatus, RenderOutcome};
use crate::render::{RenderError, SubmissionError, TalkApi};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Fixed polling cadence. The wait precedes every check, including the first,
/// so total waiting for k polls is exactly `k × interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Upper bound on time spent waiting for one job. Saturates instead of
    /// overflowing.
    pub fn max_wait(&self) -> Duration {
        self.interval
            .checked_mul(self.max_attempts)
            .unwrap_or(Duration::MAX)
    }
}

pub struct RenderJobClient<A> {
    api: A,
    policy: PollPolicy,
}

impl<A: TalkApi> RenderJobClient<A> {
    pub fn new(api: A, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Creates the remote job. Issues exactly one creation call.
    pub async fn submit(&self, request: &RenderJobRequest) -> Result<RenderJobHandle, SubmissionError> {
        let handle = self.api.create(request).await.map_err(|e| {
            warn!("Render job submission failed: {e}");
            e
        })?;
        info!(
            "Submitted render job {} (voice: {}, max wait: {:?})",
            handle.job_id(),
            request.voice().voice_id(),
            self.policy.max_wait()
        );
        Ok(handle)
    }

    /// Polls the job until it reaches a terminal status, the attempt ceiling is
    /// hit, or `cancel` fires during a wait.
    ///
    /// Never returns an error: every failure is folded into a `RenderOutcome`.
    /// "Still processing" keeps polling; a failed poll ends the loop at once.
    pub async fn await_completion(
        &self,
        handle: &RenderJobHandle,
        cancel: &CancellationToken,
    ) -> RenderOutcome {
        let job_id = handle.job_id();

        for attempt in 1..=self.policy.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Render job {job_id} cancelled after {} polls", attempt - 1);
                    return RenderOutcome::Cancelled { attempts: attempt - 1 };
                }
                _ = tokio::time::sleep(self.policy.interval) => {}
            }

            match self.api.status(handle).await {
                Ok(RenderJobStatus::Done { result_url }) => {
                    info!("Render job {job_id} done after {attempt} polls: {result_url}");
                    return RenderOutcome::Succeeded { result_url };
                }
                Ok(RenderJobStatus::Error { message }) => {
                    warn!("Render job {job_id} failed on poll {attempt}: {message}");
                    return RenderOutcome::RenderFailed { message };
                }
                Ok(RenderJobStatus::Pending(status)) => {
                    debug!(
                        "Render job {job_id} poll {attempt}/{}: {status}",
                        self.policy.max_attempts
                    );
                }
                Err(e) => {
                    warn!("Render job {job_id} status check failed on poll {attempt}: {e}");
                    return RenderOutcome::TransportFailed {
                        status: e.status(),
                        message: e.to_string(),
                    };
                }
            }
        }

        warn!(
            "Render job {job_id} timed out after {} polls",
            self.policy.max_attempts
        );
        RenderOutcome::TimedOut {
            attempts: self.policy.max_attempts,
        }
    }

    /// Submit, then wait. Only a `Succeeded` outcome yields `Ok`.
    pub async fn render(
        &self,
        request: &RenderJobRequest,
        cancel: &CancellationToken,
    ) -> Result<String, RenderError> {
        let handle = self.submit(request).await?;
        match self.await_completion(&handle, cancel).await {
            RenderOutcome::Succeeded { result_url } => Ok(result_url),
            other => Err(RenderError::Outcome(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::render::models::Voice;
    use crate::render::PollError;

    /// In-memory render service. Replays scripted poll responses, then reports
    /// "processing" forever.
    struct ScriptedApi {
        create_status: Option<u16>,
        polls: Mutex<VecDeque<Result<RenderJobStatus, PollError>>>,
        create_calls: AtomicU32,
        poll_calls: AtomicU32,
    }

    impl ScriptedApi {
        fn new(polls: Vec<Result<RenderJobStatus, PollError>>) -> Self {
            Self {
                create_status: None,
                polls: Mutex::new(polls.into()),
                create_calls: AtomicU32::new(0),
                poll_calls: AtomicU32::new(0),
            }
        }

        fn rejecting(status: u16) -> Self {
            Self {
                create_status: Some(status),
                ..Self::new(vec![])
            }
        }
    }

    #[async_trait]
    impl TalkApi for ScriptedApi {
        async fn create(&self, _request: &RenderJobRequest) -> Result<RenderJobHandle, SubmissionError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            match self.create_status {
                Some(status) => Err(SubmissionError::Rejected {
                    status,
                    body: "bad request".to_string(),
                }),
                None => Ok(RenderJobHandle::new("abc123", "https://api.test/talks/abc123")),
            }
        }

        async fn status(&self, _handle: &RenderJobHandle) -> Result<RenderJobStatus, PollError> {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(pending("processing")))
        }
    }

    fn pending(status: &str) -> RenderJobStatus {
        RenderJobStatus::Pending(status.to_string())
    }

    fn request() -> RenderJobRequest {
        RenderJobRequest::new("Hello, I'm Jane.", "https://i.ibb.co/x.png", Voice::Female)
    }

    fn client(api: ScriptedApi) -> RenderJobClient<ScriptedApi> {
        RenderJobClient::new(api, PollPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_on_fourth_poll() {
        let client = client(ScriptedApi::new(vec![
            Ok(pending("created")),
            Ok(pending("processing")),
            Ok(pending("processing")),
            Ok(RenderJobStatus::Done {
                result_url: "https://x/v.mp4".to_string(),
            }),
        ]));

        let start = Instant::now();
        let result = client.render(&request(), &CancellationToken::new()).await;

        assert_eq!(result.unwrap(), "https://x/v.mp4");
        assert_eq!(client.api.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.api.poll_calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_rejected_performs_no_polls() {
        let client = client(ScriptedApi::rejecting(400));

        let start = Instant::now();
        let err = client
            .render(&request(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RenderError::Submission(SubmissionError::Rejected { status: 400, .. })
        ));
        assert_eq!(client.api.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.api.poll_calls.load(Ordering::SeqCst), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_max_attempts() {
        let client = client(ScriptedApi::new(vec![]));
        let handle = client.submit(&request()).await.unwrap();

        let start = Instant::now();
        let outcome = client
            .await_completion(&handle, &CancellationToken::new())
            .await;

        assert_eq!(outcome, RenderOutcome::TimedOut { attempts: 20 });
        assert_eq!(client.api.poll_calls.load(Ordering::SeqCst), 20);
        assert_eq!(start.elapsed(), Duration::from_secs(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_error_on_second_poll() {
        let client = client(ScriptedApi::new(vec![
            Ok(pending("started")),
            Ok(RenderJobStatus::Error {
                message: "face not detected".to_string(),
            }),
        ]));
        let handle = client.submit(&request()).await.unwrap();

        let outcome = client
            .await_completion(&handle, &CancellationToken::new())
            .await;

        assert_eq!(
            outcome,
            RenderOutcome::RenderFailed {
                message: "face not detected".to_string()
            }
        );
        assert_eq!(client.api.poll_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_200_poll_fails_fast() {
        let client = client(ScriptedApi::new(vec![
            Ok(pending("created")),
            Ok(pending("started")),
            Err(PollError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
        ]));
        let handle = client.submit(&request()).await.unwrap();

        let start = Instant::now();
        let outcome = client
            .await_completion(&handle, &CancellationToken::new())
            .await;

        assert!(matches!(
            outcome,
            RenderOutcome::TransportFailed {
                status: Some(503),
                ..
            }
        ));
        assert_eq!(client.api.poll_calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrecognized_status_keeps_polling() {
        let client = client(ScriptedApi::new(vec![
            Ok(pending("rejected-ish")),
            Ok(pending("")),
            Ok(RenderJobStatus::Done {
                result_url: "https://x/v.mp4".to_string(),
            }),
        ]));
        let handle = client.submit(&request()).await.unwrap();

        let outcome = client
            .await_completion(&handle, &CancellationToken::new())
            .await;

        assert!(matches!(outcome, RenderOutcome::Succeeded { .. }));
        assert_eq!(client.api.poll_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait_stops_polling() {
        let client = client(ScriptedApi::new(vec![]));
        let handle = client.submit(&request()).await.unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let outcome = client.await_completion(&handle, &cancel).await;

        assert_eq!(outcome, RenderOutcome::Cancelled { attempts: 2 });
        assert_eq!(client.api.poll_calls.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_never_polls() {
        let client = client(ScriptedApi::new(vec![]));
        let handle = client.submit(&request()).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = client.await_completion(&handle, &cancel).await;

        assert_eq!(outcome, RenderOutcome::Cancelled { attempts: 0 });
        assert_eq!(client.api.poll_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_policy_bounds_wait() {
        assert_eq!(PollPolicy::default().max_wait(), Duration::from_secs(200));
    }

    #[test]
    fn test_max_wait_saturates() {
        let policy = PollPolicy {
            interval: Duration::from_secs(u64::MAX),
            max_attempts: 20,
        };
        assert_eq!(policy.max_wait(), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_with_huge_interval_does_not_panic() {
        let client = RenderJobClient::new(
            ScriptedApi::new(vec![]),
            PollPolicy {
                interval: Duration::from_secs(u64::MAX / 2),
                max_attempts: 20,
            },
        );
        let handle = client.submit(&request()).await.unwrap();
        assert_eq!(handle.job_id(), "abc123");
    }
}
