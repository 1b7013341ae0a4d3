//! Run poller
//!
//! Waits for a submitted run to settle by re-querying its status. The default
//! [`PollPolicy`] queries once per second forever and gives up on the first
//! error; backoff, a deadline, transient-error retries and cancellation are
//! opt-in.

use agentrun_core::domain::run::Run;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::service::RunService;

/// How a [`RunPoller`] paces and bounds its status queries
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second query
    pub interval: Duration,
    /// Multiplier applied to the delay after every unsettled poll (1.0 = fixed)
    pub backoff_factor: f64,
    /// Upper bound for the delay when backing off
    pub max_interval: Duration,
    /// Give up once this much time passed without the run settling
    pub max_wait: Option<Duration>,
    /// Consecutive transient errors tolerated before failing the wait
    pub transient_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(30),
            max_wait: None,
            transient_retries: 0,
        }
    }
}

impl PollPolicy {
    /// Fixed interval, no deadline, no retries
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff_factor = factor;
        self.max_interval = max_interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn with_transient_retries(mut self, retries: u32) -> Self {
        self.transient_retries = retries;
        self
    }

    /// Delay to use after `current`
    pub fn next_delay(&self, current: Duration) -> Duration {
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 1.0 {
            return current;
        }

        let cap = self.max_interval.max(self.interval);
        if current >= cap {
            return cap;
        }

        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
            .map_or(cap, |next| next.min(cap))
    }

    /// Rejects policies that would spin, shrink the delay or wait past any
    /// representable deadline
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interval.is_zero() {
            anyhow::bail!("poll interval must be greater than 0");
        }

        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            anyhow::bail!("poll backoff must be a finite number >= 1.0");
        }

        if self.max_interval < self.interval {
            anyhow::bail!("poll max interval must not be shorter than the poll interval");
        }

        if self.max_wait.is_some_and(|max_wait| max_wait > MAX_WAIT_LIMIT) {
            anyhow::bail!("max wait cannot exceed {} days", MAX_WAIT_LIMIT.as_secs() / 86_400);
        }

        Ok(())
    }
}

/// Longest deadline a policy may ask for
pub const MAX_WAIT_LIMIT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Polls a run until it is terminal or requires action
pub struct RunPoller<S: ?Sized> {
    service: Arc<S>,
    policy: PollPolicy,
}

impl<S: RunService + ?Sized> RunPoller<S> {
    pub fn new(service: Arc<S>, policy: PollPolicy) -> Self {
        Self { service, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Waits until the run settles and returns the last observed snapshot
    ///
    /// The returned run's status is always terminal or `RequiresAction`.
    /// With the default policy this never returns for a run that never
    /// settles.
    pub async fn wait(&self, run_id: Uuid) -> Result<Run> {
        self.wait_inner(run_id, None).await
    }

    /// Like [`wait`](Self::wait), but returns `WaitCancelled` as soon as `token` fires
    pub async fn wait_with_cancel(&self, run_id: Uuid, token: &CancellationToken) -> Result<Run> {
        self.wait_inner(run_id, Some(token)).await
    }

    async fn wait_inner(&self, run_id: Uuid, cancel: Option<&CancellationToken>) -> Result<Run> {
        let started = Instant::now();
        // A deadline past what `Instant` can represent is no deadline
        let deadline = self
            .policy
            .max_wait
            .and_then(|max_wait| started.checked_add(max_wait));
        let mut delay = self.policy.interval;
        let mut retries_left = self.policy.transient_retries;
        let mut polls: u32 = 0;

        loop {
            polls += 1;

            match self.query(run_id, cancel).await {
                Ok(run) => {
                    retries_left = self.policy.transient_retries;

                    if run.status.is_settled() {
                        info!(
                            "Run {} settled as {} after {} poll(s)",
                            run_id, run.status, polls
                        );
                        return Ok(run);
                    }

                    debug!("Run {} is {}, next poll in {:?}", run_id, run.status, delay);
                }
                Err(e) if e.is_transient() && retries_left > 0 => {
                    retries_left -= 1;
                    warn!(
                        "Transient error polling run {} ({} retries left): {}",
                        run_id, retries_left, e
                    );
                }
                Err(e) => return Err(e),
            }

            let sleep_for = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(ClientError::WaitTimedOut {
                            run_id,
                            waited: started.elapsed(),
                        });
                    }
                    delay.min(deadline - now)
                }
                None => delay,
            };

            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => return Err(ClientError::WaitCancelled(run_id)),
                        _ = tokio::time::sleep(sleep_for) => {}
                    }
                }
                None => tokio::time::sleep(sleep_for).await,
            }

            delay = self.policy.next_delay(delay);
        }
    }

    async fn query(&self, run_id: Uuid, cancel: Option<&CancellationToken>) -> Result<Run> {
        match cancel {
            Some(token) => {
                if token.is_cancelled() {
                    return Err(ClientError::WaitCancelled(run_id));
                }
                tokio::select! {
                    _ = token.cancelled() => Err(ClientError::WaitCancelled(run_id)),
                    result = self.service.poll(run_id) => result,
                }
            }
            None => self.service.poll(run_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedService, Step};
    use agentrun_core::domain::run::RunStatus;
    use proptest::prelude::*;

    fn instant_policy() -> PollPolicy {
        PollPolicy::fixed(Duration::ZERO)
    }

    fn poller(service: &Arc<ScriptedService>, policy: PollPolicy) -> RunPoller<ScriptedService> {
        RunPoller::new(Arc::clone(service), policy)
    }

    #[test]
    fn test_default_policy_matches_fixed_one_second_loop() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert_eq!(policy.next_delay(policy.interval), Duration::from_secs(1));
        assert_eq!(policy.max_wait, None);
        assert_eq!(policy.transient_retries, 0);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = PollPolicy::fixed(Duration::from_millis(100))
            .with_backoff(2.0, Duration::from_millis(350));

        let mut delay = policy.interval;
        let mut seen = Vec::new();
        for _ in 0..4 {
            delay = policy.next_delay(delay);
            seen.push(delay.as_millis());
        }

        assert_eq!(seen, vec![200, 350, 350, 350]);
    }

    #[test]
    fn test_huge_backoff_factor_falls_back_to_cap() {
        let policy = PollPolicy::fixed(Duration::from_millis(1))
            .with_backoff(1e300, Duration::from_secs(30));

        assert_eq!(policy.next_delay(Duration::from_millis(1)), Duration::from_secs(30));
    }

    #[test]
    fn test_policy_validation() {
        assert!(PollPolicy::default().validate().is_ok());
        assert!(PollPolicy::fixed(Duration::ZERO).validate().is_err());

        let base = PollPolicy::fixed(Duration::from_millis(100));
        assert!(base.clone().with_backoff(0.5, Duration::from_secs(1)).validate().is_err());
        assert!(base.clone().with_backoff(f64::NAN, Duration::from_secs(1)).validate().is_err());
        assert!(base.clone().with_backoff(2.0, Duration::from_millis(10)).validate().is_err());
        assert!(base.clone().with_max_wait(MAX_WAIT_LIMIT).validate().is_ok());
        assert!(base.with_max_wait(Duration::from_secs(u64::MAX)).validate().is_err());
    }

    #[tokio::test]
    async fn test_unrepresentable_deadline_waits_without_one() {
        let service = Arc::new(ScriptedService::from_statuses(&[
            RunStatus::InProgress,
            RunStatus::InProgress,
            RunStatus::Completed,
        ]));

        let policy = PollPolicy::fixed(Duration::from_millis(1))
            .with_backoff(1e300, Duration::from_millis(5))
            .with_max_wait(Duration::from_secs(u64::MAX));

        let run = poller(&service, policy).wait(service.run_id).await.unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(service.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_stops_at_terminal_status() {
        let service = Arc::new(ScriptedService::from_statuses(&[
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::Completed,
            RunStatus::InProgress,
        ]));

        let run = poller(&service, instant_policy())
            .wait(service.run_id)
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(service.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_stops_when_action_required() {
        let service = Arc::new(ScriptedService::new(vec![
            Step::Status(RunStatus::InProgress),
            Step::Action(vec![]),
        ]));

        let run = poller(&service, instant_policy())
            .wait(service.run_id)
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::RequiresAction);
        assert!(run.required_action.is_some());
        assert_eq!(service.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_status_is_a_value_not_an_error() {
        let service = Arc::new(ScriptedService::from_statuses(&[RunStatus::Failed]));

        let run = poller(&service, instant_policy())
            .wait(service.run_id)
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.last_error.is_some());
    }

    #[tokio::test]
    async fn test_error_propagates_on_first_query_by_default() {
        let service = Arc::new(ScriptedService::new(vec![
            Step::Transient,
            Step::Status(RunStatus::Completed),
        ]));

        let err = poller(&service, instant_policy())
            .wait(service.run_id)
            .await
            .unwrap_err();

        assert!(err.is_server_error());
        assert_eq!(service.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_retried_within_budget() {
        let service = Arc::new(ScriptedService::new(vec![
            Step::Transient,
            Step::Transient,
            Step::Status(RunStatus::Completed),
        ]));

        let run = poller(&service, instant_policy().with_transient_retries(2))
            .wait(service.run_id)
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(service.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_is_per_consecutive_run_of_errors() {
        let service = Arc::new(ScriptedService::new(vec![
            Step::Transient,
            Step::Status(RunStatus::InProgress),
            Step::Transient,
            Step::Status(RunStatus::Completed),
        ]));

        let run = poller(&service, instant_policy().with_transient_retries(1))
            .wait(service.run_id)
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let service = Arc::new(ScriptedService::new(vec![
            Step::Transient,
            Step::Transient,
            Step::Status(RunStatus::Completed),
        ]));

        let err = poller(&service, instant_policy().with_transient_retries(1))
            .wait(service.run_id)
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(service.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_terminal_error_never_retried() {
        let service = Arc::new(ScriptedService::new(vec![
            Step::Rejected,
            Step::Status(RunStatus::Completed),
        ]));

        let err = poller(&service, instant_policy().with_transient_retries(5))
            .wait(service.run_id)
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(service.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_unsettled_run_times_out_with_deadline() {
        let service = Arc::new(ScriptedService::new(vec![]));

        let err = poller(
            &service,
            PollPolicy::fixed(Duration::from_millis(5)).with_max_wait(Duration::from_millis(30)),
        )
        .wait(service.run_id)
        .await
        .unwrap_err();

        match err {
            ClientError::WaitTimedOut { run_id, waited } => {
                assert_eq!(run_id, service.run_id);
                assert!(waited >= Duration::from_millis(30));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(service.poll_count() >= 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_poll() {
        let service = Arc::new(ScriptedService::new(vec![]));
        let token = CancellationToken::new();
        token.cancel();

        let err = poller(&service, instant_policy())
            .wait_with_cancel(service.run_id, &token)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::WaitCancelled(_)));
        assert_eq!(service.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_sleep() {
        let service = Arc::new(ScriptedService::new(vec![]));
        let token = CancellationToken::new();

        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = poller(&service, PollPolicy::fixed(Duration::from_secs(60)))
            .wait_with_cancel(service.run_id, &token)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::WaitCancelled(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(service.poll_count(), 1);
    }

    fn unsettled_status() -> impl Strategy<Value = RunStatus> {
        prop_oneof![
            Just(RunStatus::Queued),
            Just(RunStatus::InProgress),
            Just(RunStatus::Cancelling),
        ]
    }

    fn terminal_status() -> impl Strategy<Value = RunStatus> {
        prop_oneof![
            Just(RunStatus::Completed),
            Just(RunStatus::Failed),
            Just(RunStatus::Cancelled),
            Just(RunStatus::Expired),
        ]
    }

    proptest! {
        #[test]
        fn prop_returns_first_terminal_and_stops(
            prefix in prop::collection::vec(unsettled_status(), 0..20),
            terminal in terminal_status(),
            suffix in prop::collection::vec(unsettled_status(), 0..5),
        ) {
            let mut statuses = prefix.clone();
            statuses.push(terminal);
            statuses.extend(suffix);

            let service = Arc::new(ScriptedService::from_statuses(&statuses));
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();

            let run = rt
                .block_on(poller(&service, instant_policy()).wait(service.run_id))
                .unwrap();

            prop_assert_eq!(run.status, terminal);
            prop_assert!(run.status.is_settled());
            prop_assert_eq!(service.poll_count(), prefix.len() + 1);
        }
    }
}
