use std::time::Duration;

/// Options used to tweak how a [`crate::Resolver`] behaves.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-1",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Options {
    cache_ttl: Duration,
    probe_timeout: Duration,
    concurrency: usize,
}

impl Options {
    /// How long a resolved URL is trusted for by default.
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
    /// How long a probe may take by default before it counts as a failure.
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
    /// The default number of URLs [`crate::Resolver::resolve_all()`] works
    /// on at a time.
    pub const DEFAULT_CONCURRENCY: usize = 64;

    /// Create [`Options`] using the defaults.
    pub fn new() -> Self {
        Options {
            cache_ttl: Options::DEFAULT_CACHE_TTL,
            probe_timeout: Options::DEFAULT_PROBE_TIMEOUT,
            concurrency: Options::DEFAULT_CONCURRENCY,
        }
    }

    /// How long should a resolved URL be considered valid for before we need
    /// to probe it again?
    pub fn cache_ttl(&self) -> Duration { self.cache_ttl }

    /// Set the [`Options::cache_ttl()`].
    pub fn set_cache_ttl(self, cache_ttl: Duration) -> Self {
        Options { cache_ttl, ..self }
    }

    /// How long may a probe take before we give up and use the fallback?
    pub fn probe_timeout(&self) -> Duration { self.probe_timeout }

    /// Set the [`Options::probe_timeout()`].
    pub fn set_probe_timeout(self, probe_timeout: Duration) -> Self {
        Options {
            probe_timeout,
            ..self
        }
    }

    /// How many URLs should be resolved at a time? Never less than 1.
    pub fn concurrency(&self) -> usize { self.concurrency.max(1) }

    /// Set the [`Options::concurrency()`].
    pub fn set_concurrency(self, concurrency: usize) -> Self {
        Options {
            concurrency,
            ..self
        }
    }
}

impl Default for Options {
    fn default() -> Self { Options::new() }
}
