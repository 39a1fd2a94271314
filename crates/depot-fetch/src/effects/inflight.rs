use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

/// Final outcome of a led fetch, as seen by the callers that joined it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settled {
    Ready(PathBuf),
    Absent,
}

type Slot = watch::Receiver<Option<Settled>>;

/// URLs currently being fetched, each with a one-shot result cell.
///
/// Owned by whoever builds the fetchers; share it through an `Arc` to make
/// several fetchers deduplicate against each other.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    entries: Mutex<HashMap<String, Slot>>,
}

/// What a caller became when it asked for a URL.
#[must_use]
pub enum Role<'a> {
    /// Nobody was fetching the URL; this caller does and must publish.
    Leader(LeaderGuard<'a>),
    /// Another caller is fetching it; wait for their outcome.
    Follower(Waiter),
}

impl InFlightRegistry {
    pub fn new() -> Self { Self::default() }

    /// Register as leader for `url`, or join the leader already registered.
    ///
    /// Check and insert happen under one lock, so two callers can never both lead.
    pub fn join_or_lead(&self, url: &str) -> Role<'_> {
        let mut entries = self.lock();
        match entries.entry(url.to_string()) {
            Entry::Occupied(entry) => Role::Follower(Waiter {
                rx: entry.get().clone(),
            }),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx);
                Role::Leader(LeaderGuard {
                    registry: self,
                    url: url.to_string(),
                    tx,
                })
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool { self.lock().contains_key(url) }

    pub fn len(&self) -> usize { self.lock().len() }

    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // The map holds no invariant a panicking holder could break halfway.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Leadership of one URL. Dropping it deregisters the URL.
///
/// Followers see whatever was published before the drop; a leader dropped
/// without publishing (panic, cancelled future) reads as
/// [`WaitError::LeaderGone`].
#[must_use]
pub struct LeaderGuard<'a> {
    registry: &'a InFlightRegistry,
    url:      String,
    tx:       watch::Sender<Option<Settled>>,
}

impl LeaderGuard<'_> {
    pub fn url(&self) -> &str { &self.url }

    pub fn publish(&self, settled: Settled) { self.tx.send_replace(Some(settled)); }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) { self.registry.lock().remove(&self.url); }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error("no result after {0:?}")]
    TimedOut(Duration),
    #[error("leader finished without publishing a result")]
    LeaderGone,
}

/// A follower's handle on a leader's result.
pub struct Waiter {
    rx: Slot,
}

impl Waiter {
    /// Wait up to `timeout` for the leader's outcome.
    ///
    /// Giving up does not affect the leader, which runs to completion.
    pub async fn wait(mut self, timeout: Duration) -> Result<Settled, WaitError> {
        let outcome = tokio::time::timeout(timeout, self.rx.wait_for(Option::is_some)).await;
        match outcome {
            Ok(Ok(settled)) => settled.clone().ok_or(WaitError::LeaderGone),
            Ok(Err(_)) => Err(WaitError::LeaderGone),
            Err(_) => Err(WaitError::TimedOut(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(role: Role<'_>) -> LeaderGuard<'_> {
        match role {
            Role::Leader(guard) => guard,
            Role::Follower(_) => panic!("expected to lead"),
        }
    }

    fn follower(role: Role<'_>) -> Waiter {
        match role {
            Role::Follower(waiter) => waiter,
            Role::Leader(_) => panic!("expected to follow"),
        }
    }

    #[tokio::test]
    async fn test_first_leads_rest_follow() {
        let registry = InFlightRegistry::new();
        let guard = leader(registry.join_or_lead("https://example.com/a"));
        let waiter = follower(registry.join_or_lead("https://example.com/a"));
        let _other = leader(registry.join_or_lead("https://example.com/b"));
        assert_eq!(registry.len(), 2);

        guard.publish(Settled::Ready(PathBuf::from("/cache/a")));
        drop(guard);

        assert_eq!(
            waiter.wait(Duration::from_secs(1)).await,
            Ok(Settled::Ready(PathBuf::from("/cache/a")))
        );
        assert!(!registry.contains("https://example.com/a"));
        assert!(registry.contains("https://example.com/b"));
    }

    #[tokio::test]
    async fn test_entry_removed_on_drop_and_url_can_be_led_again() {
        let registry = InFlightRegistry::new();
        let guard = leader(registry.join_or_lead("u"));
        assert!(registry.contains("u"));
        drop(guard);
        assert!(registry.is_empty());

        let _again = leader(registry.join_or_lead("u"));
    }

    #[tokio::test]
    async fn test_unpublished_leader_reads_as_gone() {
        let registry = InFlightRegistry::new();
        let guard = leader(registry.join_or_lead("u"));
        let waiter = follower(registry.join_or_lead("u"));
        drop(guard);

        assert_eq!(
            waiter.wait(Duration::from_secs(1)).await,
            Err(WaitError::LeaderGone)
        );
    }

    #[tokio::test]
    async fn test_published_absence_is_shared() {
        let registry = InFlightRegistry::new();
        let guard = leader(registry.join_or_lead("u"));
        let waiter = follower(registry.join_or_lead("u"));
        guard.publish(Settled::Absent);
        drop(guard);

        assert_eq!(waiter.wait(Duration::from_secs(1)).await, Ok(Settled::Absent));
    }

    #[tokio::test(start_paused = true)]
    async fn test_follower_times_out_without_disturbing_leader() {
        let registry = InFlightRegistry::new();
        let guard = leader(registry.join_or_lead("u"));
        let waiter = follower(registry.join_or_lead("u"));

        assert_eq!(
            waiter.wait(Duration::from_secs(600)).await,
            Err(WaitError::TimedOut(Duration::from_secs(600)))
        );
        assert!(registry.contains("u"));

        let late = follower(registry.join_or_lead("u"));
        guard.publish(Settled::Ready(PathBuf::from("/cache/u")));
        assert_eq!(
            late.wait(Duration::from_secs(1)).await,
            Ok(Settled::Ready(PathBuf::from("/cache/u")))
        );
    }

    #[tokio::test]
    async fn test_waiters_across_tasks() {
        let registry = std::sync::Arc::new(InFlightRegistry::new());
        let guard = leader(registry.join_or_lead("u"));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let waiter = follower(registry.join_or_lead("u"));
                tokio::spawn(waiter.wait(Duration::from_secs(5)))
            })
            .collect();

        guard.publish(Settled::Ready(PathBuf::from("/cache/u")));
        drop(guard);

        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                Ok(Settled::Ready(PathBuf::from("/cache/u")))
            );
        }
    }
}
