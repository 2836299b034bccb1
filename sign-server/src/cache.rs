//! Caching layer for realtime feeds.
//!
//! All configured feeds are held as one entry and refreshed together. A
//! refresh runs as its own task and is shared by every caller that arrives
//! while it is in flight, so there is at most one upstream fetch per feed
//! per window. Callers going away never cancel it.
//!
//! The freshness window counts from the moment a refresh *started*. A feed
//! that keeps failing is retried at most once per window.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared, join_all};
use moka::Expiry;
use moka::sync::Cache as MokaCache;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::feed::{FeedSnapshot, FeedSource};

/// A refresh in flight, awaitable by any number of callers.
type SharedRefresh = Shared<BoxFuture<'static, Arc<FeedSet>>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Freshness window for the feed set.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15),
        }
    }
}

/// The most recent snapshot of every configured feed.
///
/// Every configured feed name is present; a feed whose fetch failed maps to
/// `None`. Handed out as `Arc<FeedSet>`, so a reader holds one consistent
/// set for as long as it likes.
#[derive(Debug)]
pub struct FeedSet {
    snapshots: BTreeMap<String, Option<Arc<FeedSnapshot>>>,
    started_at: Instant,
    fetched_at: DateTime<Utc>,
}

impl FeedSet {
    /// A set in which every feed is down.
    fn unavailable<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            snapshots: names.into_iter().map(|name| (name.clone(), None)).collect(),
            started_at: Instant::now(),
            fetched_at: Utc::now(),
        }
    }

    /// Snapshot for a feed, if its last fetch succeeded.
    pub fn get(&self, name: &str) -> Option<&FeedSnapshot> {
        self.snapshots.get(name).and_then(|s| s.as_deref())
    }

    /// Feed name → whether the last refresh produced a snapshot.
    pub fn health(&self) -> BTreeMap<String, bool> {
        self.snapshots
            .iter()
            .map(|(name, snapshot)| (name.clone(), snapshot.is_some()))
            .collect()
    }

    /// Feed name → `"OK (<n> entities)"` or `"ERROR"`.
    pub fn status(&self) -> BTreeMap<String, String> {
        self.snapshots
            .iter()
            .map(|(name, snapshot)| {
                let status = match snapshot {
                    Some(s) => format!("OK ({} entities)", s.len()),
                    None => "ERROR".to_string(),
                };
                (name.clone(), status)
            })
            .collect()
    }

    /// Time since the refresh that produced this set started.
    pub fn age(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Wall-clock time the refresh started.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Expires the entry one TTL after its refresh started, not after it landed.
struct RefreshStartExpiry {
    ttl: Duration,
}

impl Expiry<(), Arc<FeedSet>> for RefreshStartExpiry {
    fn expire_after_create(
        &self,
        _key: &(),
        value: &Arc<FeedSet>,
        created_at: Instant,
    ) -> Option<Duration> {
        let spent = created_at.saturating_duration_since(value.started_at);
        Some(self.ttl.saturating_sub(spent))
    }
}

/// The source and what to fetch from it, shared with refresh tasks.
struct Fetcher<S> {
    source: S,
    feeds: BTreeMap<String, String>,
}

impl<S: FeedSource> Fetcher<S> {
    /// Fetch every feed concurrently, isolating failures per feed.
    async fn fetch_all(&self) -> FeedSet {
        let started_at = Instant::now();
        let fetched_at = Utc::now();

        info!(feeds = self.feeds.len(), "Fetching fresh feed data");

        let fetches = self.feeds.iter().map(|(name, url)| async move {
            match self.source.fetch(url).await {
                Ok(snapshot) => (name.clone(), Some(Arc::new(snapshot))),
                Err(e) => {
                    warn!(feed = %name, error = %e, "Error fetching feed");
                    (name.clone(), None)
                }
            }
        });

        let snapshots: BTreeMap<_, _> = join_all(fetches).await.into_iter().collect();

        FeedSet {
            snapshots,
            started_at,
            fetched_at,
        }
    }
}

/// Feed source with a shared, coalesced, time-bounded cache in front.
pub struct FeedCache<S> {
    fetcher: Arc<Fetcher<S>>,
    entry: MokaCache<(), Arc<FeedSet>>,
    in_flight: Arc<Mutex<Option<SharedRefresh>>>,
}

/// Lock, ignoring poisoning: the slot is always left in a valid state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: FeedSource + 'static> FeedCache<S> {
    /// Create a cache over `feeds` (name → URL).
    ///
    /// An empty feed map is a configuration error.
    pub fn new(
        source: S,
        feeds: BTreeMap<String, String>,
        config: &CacheConfig,
    ) -> Result<Self, ConfigError> {
        if feeds.is_empty() {
            return Err(ConfigError::NoFeeds);
        }

        let entry = MokaCache::builder()
            .expire_after(RefreshStartExpiry { ttl: config.ttl })
            .build();

        Ok(Self {
            fetcher: Arc::new(Fetcher { source, feeds }),
            entry,
            in_flight: Arc::new(Mutex::new(None)),
        })
    }

    /// Current snapshots of all feeds, refreshing first if stale.
    ///
    /// Never fails: feeds that could not be fetched are `None` in the set.
    /// Must be called from within a tokio runtime.
    pub async fn snapshots(&self) -> Arc<FeedSet> {
        let refresh = {
            let mut in_flight = lock(&self.in_flight);
            if let Some(set) = self.entry.get(&()) {
                return set;
            }
            in_flight
                .get_or_insert_with(|| self.start_refresh())
                .clone()
        };

        refresh.await
    }

    /// Drop the cached set so the next call refreshes.
    pub fn invalidate(&self) {
        self.entry.invalidate_all();
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.fetcher.source
    }

    /// Spawn a refresh. Called with the in-flight slot locked.
    ///
    /// The task stores its result and then clears the slot, so a caller
    /// that finds the slot empty always finds the entry fresh or missing.
    fn start_refresh(&self) -> SharedRefresh {
        let fetcher = Arc::clone(&self.fetcher);
        let entry = self.entry.clone();
        let slot = Arc::clone(&self.in_flight);

        let task = tokio::spawn(async move {
            let set = Arc::new(fetcher.fetch_all().await);
            entry.insert((), Arc::clone(&set));
            *lock(&slot) = None;
            set
        });

        let fetcher = Arc::clone(&self.fetcher);
        let slot = Arc::clone(&self.in_flight);

        async move {
            match task.await {
                Ok(set) => set,
                Err(e) => {
                    warn!(error = %e, "Feed refresh task failed");
                    *lock(&slot) = None;
                    Arc::new(FeedSet::unavailable(fetcher.feeds.keys()))
                }
            }
        }
        .boxed()
        .shared()
    }
}
