// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Single-flight coordination of access-token renewal.
//!
//! The first request to see an expired token becomes the leader and runs the
//! renewal. Requests failing while the renewal is in flight subscribe to its
//! outcome instead of starting their own, then replay with the token the
//! leader obtained (or fail with the leader's error).

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

use super::error::ApiError;

type Outcome = Result<String, ApiError>;

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    in_flight: Mutex<Option<broadcast::Sender<Outcome>>>,
}

enum Role {
    Settled(String),
    Leader,
    Waiter(broadcast::Receiver<Outcome>),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<broadcast::Sender<Outcome>>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_refreshing(&self) -> bool {
        self.slot().is_some()
    }

    /// Obtain a token newer than `stale`.
    ///
    /// `current` reports the token the client holds right now; if it already
    /// differs from `stale`, another task has refreshed and no call is made.
    /// `renew` performs the actual refresh and is only invoked by the leader.
    pub async fn refresh<C, F, Fut>(&self, stale: Option<&str>, current: C, renew: F) -> Outcome
    where
        C: Fn() -> Option<String>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        match self.claim(stale, &current) {
            Role::Settled(token) => {
                debug!("Token already renewed by another request");
                Ok(token)
            }
            Role::Waiter(mut rx) => {
                debug!("Refresh in flight, queueing request");
                match rx.recv().await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ApiError::RefreshFailed("refresh abandoned".to_string())),
                }
            }
            Role::Leader => {
                debug!("Starting token refresh");
                let guard = LeaderGuard { coordinator: self };
                let outcome = renew().await;
                guard.finish(outcome.clone());
                outcome
            }
        }
    }

    fn claim<C>(&self, stale: Option<&str>, current: &C) -> Role
    where
        C: Fn() -> Option<String>,
    {
        let mut slot = self.slot();

        if let Some(tx) = slot.as_ref() {
            return Role::Waiter(tx.subscribe());
        }

        if let Some(token) = current() {
            if Some(token.as_str()) != stale {
                return Role::Settled(token);
            }
        }

        let (tx, _) = broadcast::channel(1);
        *slot = Some(tx);
        Role::Leader
    }
}

/// Clears the in-flight slot even if the leader's future is dropped mid-way.
/// Dropping the sender wakes every waiter with a closed-channel error.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
}

impl LeaderGuard<'_> {
    fn finish(self, outcome: Outcome) {
        if let Some(tx) = self.coordinator.slot().take() {
            let waiting = tx.receiver_count();
            if waiting > 0 {
                debug!("Releasing {} queued request(s)", waiting);
            }
            // No receivers is fine: nobody queued
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.slot().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    async fn never_renew() -> Outcome {
        panic!("renewal must not run")
    }

    #[tokio::test]
    async fn test_leader_runs_renewal() {
        let coordinator = RefreshCoordinator::new();
        let token = coordinator
            .refresh(Some("old"), || Some("old".to_string()), || async {
                Ok::<_, ApiError>("new".to_string())
            })
            .await
            .unwrap();
        assert_eq!(token, "new");
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_skips_renewal_when_token_already_changed() {
        let coordinator = RefreshCoordinator::new();
        let token = coordinator
            .refresh(Some("old"), || Some("fresh".to_string()), never_renew)
            .await
            .unwrap();
        assert_eq!(token, "fresh");
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_renewal() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let mut handles = Vec::new();
        for _ in 0..5 {
            let coordinator = coordinator.clone();
            let calls = calls.clone();
            let release = release.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .refresh(Some("old"), || Some("old".to_string()), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        release.notified().await;
                        Ok::<_, ApiError>("new".to_string())
                    })
                    .await
            }));
        }

        // Let every task reach the coordinator before the renewal completes
        while !coordinator.is_refreshing() {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        release.notify_one();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "new");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter() {
        let coordinator = Arc::new(RefreshCoordinator::new());
        let release = Arc::new(Notify::new());

        let leader = {
            let coordinator = coordinator.clone();
            let release = release.clone();
            tokio::spawn(async move {
                coordinator
                    .refresh(Some("old"), || Some("old".to_string()), || async move {
                        release.notified().await;
                        Err::<String, ApiError>(ApiError::RefreshFailed("refresh token revoked".into()))
                    })
                    .await
            })
        };

        while !coordinator.is_refreshing() {
            tokio::task::yield_now().await;
        }

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .refresh(Some("old"), || Some("old".to_string()), never_renew)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        release.notify_one();

        for result in [leader.await.unwrap(), waiter.await.unwrap()] {
            match result {
                Err(ApiError::RefreshFailed(msg)) => assert_eq!(msg, "refresh token revoked"),
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_slot() {
        let coordinator = Arc::new(RefreshCoordinator::new());

        let leader = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .refresh(Some("old"), || Some("old".to_string()), || async {
                        std::future::pending::<Outcome>().await
                    })
                    .await
            })
        };

        while !coordinator.is_refreshing() {
            tokio::task::yield_now().await;
        }

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .refresh(Some("old"), || Some("old".to_string()), || async {
                        Ok::<_, ApiError>("unused".to_string())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        leader.abort();
        let _ = leader.await;

        assert!(matches!(
            waiter.await.unwrap(),
            Err(ApiError::RefreshFailed(_))
        ));
        assert!(!coordinator.is_refreshing());

        // A later refresh can lead again
        let token = coordinator
            .refresh(Some("old"), || Some("old".to_string()), || async {
                Ok::<_, ApiError>("new".to_string())
            })
            .await
            .unwrap();
        assert_eq!(token, "new");
    }
}
