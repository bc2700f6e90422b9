// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default polling interval of [`exec_when_true`]
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run `func` once `cond` holds, checking every `poll` (default 50ms)
///
/// `cond` is checked immediately, so `func` runs without delay when the
/// condition already holds.
pub async fn exec_when_true<C, F, R>(mut cond: C, func: F, poll: Option<Duration>) -> R
where
    C: FnMut() -> bool,
    F: FnOnce() -> R,
{
    let poll = poll.unwrap_or(DEFAULT_POLL_INTERVAL);
    while !cond() {
        tokio::time::sleep(poll).await;
    }
    func()
}

/// [`exec_when_true`] that gives up after `timeout`
pub async fn exec_when_true_within<C, F, R>(
    cond: C,
    func: F,
    poll: Option<Duration>,
    timeout: Duration,
) -> Result<R>
where
    C: FnMut() -> bool,
    F: FnOnce() -> R,
{
    tokio::time::timeout(timeout, exec_when_true(cond, func, poll))
        .await
        .map_err(|_| Error::timeout("waiting for condition", timeout.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_runs_when_condition_turns_true() {
        let checks = Arc::new(AtomicUsize::new(0));
        let counter = checks.clone();

        let result = exec_when_true(
            move || counter.fetch_add(1, Ordering::SeqCst) >= 3,
            || "loaded",
            Some(Duration::from_millis(1)),
        )
        .await;

        assert_eq!(result, "loaded");
        assert_eq!(checks.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_immediate() {
        // No timer is needed when the condition already holds
        assert_eq!(tokio_test::block_on(exec_when_true(|| true, || 7, None)), 7);
    }

    #[tokio::test]
    async fn test_gives_up() {
        let err = exec_when_true_within(|| false, || (), Some(Duration::from_millis(1)), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
