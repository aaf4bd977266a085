//! Bounded readiness polling for asynchronous results.
//!
//! Asynchronous operations hand back result URLs before the images exist.
//! The poller checks each pending URL once per attempt, sequentially, and
//! sleeps a fixed delay between attempts until every URL is ready or the
//! attempt budget is spent. URLs only ever move from pending to ready.

use async_trait::async_trait;
use std::time::Duration;

/// Checks whether a result URL can be retrieved yet.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// Returns true once the URL serves the result. Transport failures
    /// count as "not ready".
    async fn is_ready(&self, url: &str) -> bool;
}

/// How long to keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Number of check rounds.
    pub max_attempts: u32,
    /// Delay between rounds.
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl PollPolicy {
    /// Creates a policy.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Progress of one polling session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pending: Vec<String>,
    ready: Vec<String>,
    remaining_attempts: u32,
}

impl PollState {
    /// Starts a session for `urls` with the policy's attempt budget.
    /// Duplicate URLs are collapsed.
    pub fn new<I, S>(urls: I, policy: &PollPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pending: Vec<String> = Vec::new();
        for url in urls {
            let url = url.into();
            if !pending.contains(&url) {
                pending.push(url);
            }
        }
        Self {
            pending,
            ready: Vec::new(),
            remaining_attempts: policy.max_attempts,
        }
    }

    /// URLs not yet confirmed ready.
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// URLs confirmed ready, in the order they became ready.
    pub fn ready(&self) -> &[String] {
        &self.ready
    }

    /// Attempts left in the budget.
    pub fn remaining_attempts(&self) -> u32 {
        self.remaining_attempts
    }

    /// True when no URL is pending.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// True when the attempt budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_attempts == 0
    }
}

/// Runs one round of checks over every pending URL.
///
/// Consumes one attempt and returns how many URLs became ready. Does nothing
/// when the session is complete or exhausted.
pub async fn poll_once<P>(checker: &P, state: &mut PollState) -> usize
where
    P: ReadinessCheck + ?Sized,
{
    if state.is_complete() || state.is_exhausted() {
        return 0;
    }
    state.remaining_attempts -= 1;

    let mut still_pending = Vec::with_capacity(state.pending.len());
    let mut newly_ready = 0;
    for url in std::mem::take(&mut state.pending) {
        if checker.is_ready(&url).await {
            state.ready.push(url);
            newly_ready += 1;
        } else {
            still_pending.push(url);
        }
    }
    state.pending = still_pending;
    newly_ready
}

/// Polls until every URL is ready or the attempt budget runs out.
pub async fn poll_until_ready<P>(checker: &P, mut state: PollState, policy: &PollPolicy) -> PollState
where
    P: ReadinessCheck + ?Sized,
{
    while !state.is_complete() && !state.is_exhausted() {
        let newly_ready = poll_once(checker, &mut state).await;
        tracing::debug!(
            newly_ready,
            ready = state.ready.len(),
            pending = state.pending.len(),
            remaining_attempts = state.remaining_attempts,
            "checked pending results"
        );

        if state.is_complete() || state.is_exhausted() {
            break;
        }
        tokio::time::sleep(policy.delay).await;
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Checker that reports a URL ready after a fixed number of checks.
    struct FakeChecker {
        ready_after: HashMap<String, usize>,
        checks: Mutex<Vec<String>>,
    }

    impl FakeChecker {
        fn new(ready_after: &[(&str, usize)]) -> Self {
            Self {
                ready_after: ready_after
                    .iter()
                    .map(|(url, n)| (url.to_string(), *n))
                    .collect(),
                checks: Mutex::new(Vec::new()),
            }
        }

        fn check_count(&self) -> usize {
            self.checks.lock().unwrap().len()
        }

        fn checks_for(&self, url: &str) -> usize {
            self.checks.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    #[async_trait]
    impl ReadinessCheck for FakeChecker {
        async fn is_ready(&self, url: &str) -> bool {
            let mut checks = self.checks.lock().unwrap();
            checks.push(url.to_string());
            let seen = checks.iter().filter(|u| *u == url).count();
            self.ready_after
                .get(url)
                .is_some_and(|threshold| seen >= *threshold)
        }
    }

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[test]
    fn test_new_state_collapses_duplicates() {
        let state = PollState::new(["a", "b", "a"], &fast_policy(3));
        assert_eq!(state.pending(), ["a".to_string(), "b".to_string()]);
        assert!(state.ready().is_empty());
        assert_eq!(state.remaining_attempts(), 3);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_requests() {
        let checker = FakeChecker::new(&[]);
        let policy = fast_policy(3);
        let state = PollState::new(Vec::<String>::new(), &policy);

        let state = poll_until_ready(&checker, state, &policy).await;

        assert!(state.is_complete());
        assert_eq!(checker.check_count(), 0);
        assert_eq!(state.remaining_attempts(), 3);
    }

    #[tokio::test]
    async fn test_fully_ready_state_returns_immediately() {
        let checker = FakeChecker::new(&[("a", 1)]);
        let policy = fast_policy(3);
        let state = poll_until_ready(&checker, PollState::new(["a"], &policy), &policy).await;
        assert!(state.is_complete());
        assert_eq!(checker.check_count(), 1);

        let again = poll_until_ready(&checker, state.clone(), &policy).await;
        assert_eq!(again, state);
        assert_eq!(checker.check_count(), 1);
    }

    #[tokio::test]
    async fn test_early_exit_when_all_ready() {
        let checker = FakeChecker::new(&[("a", 1), ("b", 2)]);
        let policy = fast_policy(5);

        let state = poll_until_ready(&checker, PollState::new(["a", "b"], &policy), &policy).await;

        assert!(state.is_complete());
        assert_eq!(state.ready(), ["a".to_string(), "b".to_string()]);
        assert_eq!(state.remaining_attempts(), 3);
        // "a" is never re-checked once ready.
        assert_eq!(checker.checks_for("a"), 1);
        assert_eq!(checker.checks_for("b"), 2);
    }

    #[tokio::test]
    async fn test_terminates_after_budget() {
        let checker = FakeChecker::new(&[]);
        let policy = fast_policy(3);
        let urls = ["a", "b", "c", "d"];

        let state = poll_until_ready(&checker, PollState::new(urls, &policy), &policy).await;

        assert_eq!(state.pending().len(), 4);
        assert!(state.ready().is_empty());
        assert!(state.is_exhausted());
        assert_eq!(checker.check_count(), 4 * 3);

        let mut state = state;
        assert_eq!(poll_once(&checker, &mut state).await, 0);
        assert_eq!(checker.check_count(), 4 * 3);
    }

    #[tokio::test]
    async fn test_poll_once_consumes_one_attempt() {
        let checker = FakeChecker::new(&[("a", 1)]);
        let mut state = PollState::new(["a", "b"], &fast_policy(2));

        assert_eq!(poll_once(&checker, &mut state).await, 1);
        assert_eq!(state.ready(), ["a".to_string()]);
        assert_eq!(state.pending(), ["b".to_string()]);
        assert_eq!(state.remaining_attempts(), 1);
    }
}
