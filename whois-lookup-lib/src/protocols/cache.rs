//! Caching decorator for any [`Transport`].
//!
//! Replies are memoized per `(host, query)` for a fixed time-to-live.
//! Failures are never stored, so a cached transport behaves exactly like the
//! wrapped one apart from skipping repeated network round trips.

use crate::error::WhoisError;
use crate::protocols::whois::Transport;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry {
    stored_at: Instant,
    text: String,
}

impl CacheEntry {
    fn is_stale(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }
}

/// Transport wrapper that memoizes successful replies.
pub struct CachingTransport<T> {
    inner: T,
    ttl: Duration,
    entries: Mutex<HashMap<u64, CacheEntry>>,
}

impl<T: Transport> CachingTransport<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stable key for a `(host, query)` pair.
    pub fn cache_key(host: &str, query: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        (host, query).hash(&mut hasher);
        hasher.finish()
    }

    /// Number of entries currently stored.
    ///
    /// Expired entries are evicted on the next store, so this may include
    /// some that are no longer served.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored reply.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    fn lookup(&self, key: u64) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        let stale = entries.get(&key).map(|entry| entry.is_stale(self.ttl))?;
        if !stale {
            entries.get(&key).map(|entry| entry.text.clone())
        } else {
            entries.remove(&key);
            None
        }
    }

    /// Insert a reply, evicting every expired entry on the way.
    fn store(&self, key: u64, text: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, entry| !entry.is_stale(self.ttl));
            entries.insert(
                key,
                CacheEntry {
                    stored_at: Instant::now(),
                    text: text.to_string(),
                },
            );
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for CachingTransport<T> {
    async fn send(&self, host: &str, query: &str, timeout: Duration) -> Result<String, WhoisError> {
        let key = Self::cache_key(host, query);
        if let Some(text) = self.lookup(key) {
            debug!(host, "cache hit");
            return Ok(text);
        }

        debug!(host, "cache miss");
        let text = self.inner.send(host, query, timeout).await?;
        self.store(key, &text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTransport {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn send(
            &self,
            host: &str,
            query: &str,
            _timeout: Duration,
        ) -> Result<String, WhoisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(WhoisError::connection(host, "refused"));
            }
            Ok(format!("reply from {} for {}", host, query.trim()))
        }
    }

    fn counting(fail: bool) -> (Arc<AtomicUsize>, CountingTransport) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            calls.clone(),
            CountingTransport { calls, fail },
        )
    }

    #[tokio::test]
    async fn test_hit_skips_network() {
        let (calls, inner) = counting(false);
        let cache = CachingTransport::new(inner, Duration::from_secs(60));
        let timeout = Duration::from_secs(1);

        let first = cache.send("whois.test", "a.test", timeout).await.unwrap();
        let second = cache.send("whois.test", "a.test", timeout).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);

        // Different host or query is a different key
        cache.send("whois.other", "a.test", timeout).await.unwrap();
        cache.send("whois.test", "b.test", timeout).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_expired_entries_are_refetched() {
        let (calls, inner) = counting(false);
        let cache = CachingTransport::new(inner, Duration::from_millis(20));
        let timeout = Duration::from_secs(1);

        cache.send("whois.test", "a.test", timeout).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.send("whois.test", "a.test", timeout).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted_on_store() {
        let (calls, inner) = counting(false);
        let cache = CachingTransport::new(inner, Duration::from_millis(10));
        let timeout = Duration::from_secs(1);

        for i in 0..50 {
            let query = format!("domain{}.test", i);
            cache.send("whois.test", &query, timeout).await.unwrap();
        }
        assert_eq!(cache.len(), 50);

        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.send("whois.test", "fresh.test", timeout).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 51);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let (calls, inner) = counting(true);
        let cache = CachingTransport::new(inner, Duration::from_secs(60));
        let timeout = Duration::from_secs(1);

        assert!(cache.send("whois.test", "a.test", timeout).await.is_err());
        assert!(cache.send("whois.test", "a.test", timeout).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_key_is_stable() {
        assert_eq!(
            CachingTransport::<CountingTransport>::cache_key("whois.test", "a.test"),
            CachingTransport::<CountingTransport>::cache_key("whois.test", "a.test")
        );
        assert_ne!(
            CachingTransport::<CountingTransport>::cache_key("whois.test", "a.test"),
            CachingTransport::<CountingTransport>::cache_key("a.test", "whois.test")
        );
    }
}
