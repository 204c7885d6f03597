use std::{collections::HashMap, time::Duration};
use tokio::time::Instant;

/// A cache used to skip unnecessary probes.
///
/// Entries are never evicted in the background. An entry older than the
/// cache's TTL is treated as missing by [`ResolutionCache::lookup()`] and only
/// physically dropped by [`ResolutionCache::purge_expired()`] or when it gets
/// overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResolutionCache {
    /// Create a new, empty [`ResolutionCache`].
    pub fn new(ttl: Duration) -> Self {
        ResolutionCache {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// How long an entry is trusted for after being recorded.
    pub fn ttl(&self) -> Duration { self.ttl }

    /// Lookup the [`CacheEntry`] for a URL, ignoring it if it has expired.
    pub fn lookup(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url).filter(|entry| entry.is_fresh(self.ttl))
    }

    /// Record the outcome of resolving `url`, replacing any previous entry.
    pub fn record(&mut self, url: &str, resolved_url: String, succeeded: bool) {
        let entry = CacheEntry::new(resolved_url, succeeded, Instant::now());
        self.entries.insert(url.to_string(), entry);
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(ttl));

        before - self.entries.len()
    }

    /// The number of entries, including expired ones which haven't been
    /// purged yet.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Is the cache completely empty?
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Iterate over all known [`CacheEntries`][CacheEntry], regardless of
    /// whether they are stale.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry)> + '_ {
        self.entries.iter().map(|(url, entry)| (url.as_str(), entry))
    }
}

/// The last known outcome of resolving a URL.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The URL that should actually be rendered.
    pub resolved_url: String,
    /// Did the original URL load? When `false`, [`CacheEntry::resolved_url`]
    /// is a fallback (or the original URL if no fallback exists).
    pub succeeded: bool,
    /// When the outcome was recorded.
    pub recorded_at: Instant,
}

impl CacheEntry {
    /// Create a new [`CacheEntry`].
    pub const fn new(
        resolved_url: String,
        succeeded: bool,
        recorded_at: Instant,
    ) -> Self {
        CacheEntry {
            resolved_url,
            succeeded,
            recorded_at,
        }
    }

    /// Is this entry younger than `ttl`?
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.recorded_at.elapsed() < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TTL: Duration = Duration::from_secs(5 * 60);

    #[tokio::test(start_paused = true)]
    async fn recorded_entries_can_be_looked_up() {
        let mut cache = ResolutionCache::new(TTL);

        let url = "https://example.com/a.png";

        cache.record(url, url.to_string(), true);

        let entry = cache.lookup(url).unwrap();
        assert_eq!(entry.resolved_url, url);
        assert!(entry.succeeded);
        assert!(cache.lookup("https://example.com/b.png").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_once_they_reach_the_ttl() {
        let mut cache = ResolutionCache::new(TTL);
        cache.record("a", "a".to_string(), true);

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert!(cache.lookup("a").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.lookup("a").is_none());
        // expiry is lazy, the entry is still physically there
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recording_overwrites_and_restamps() {
        let mut cache = ResolutionCache::new(TTL);
        cache.record("a", "fallback".to_string(), false);
        tokio::time::advance(TTL).await;

        cache.record("a", "a".to_string(), true);

        let entry = cache.lookup("a").unwrap();
        assert_eq!(entry.resolved_url, "a");
        assert!(entry.succeeded);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn purging_only_drops_expired_entries() {
        let mut cache = ResolutionCache::new(TTL);
        cache.record("old", "old".to_string(), true);
        tokio::time::advance(TTL).await;
        cache.record("new", "new".to_string(), false);

        let removed = cache.purge_expired();

        assert_eq!(removed, 1);
        let remaining: Vec<_> = cache.iter().map(|(url, _)| url).collect();
        assert_eq!(remaining, vec!["new"]);
    }
}
