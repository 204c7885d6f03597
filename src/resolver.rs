use crate::{
    cache::CacheEntry,
    coalesce::Coalescer,
    load::{LoadError, Loader, WebLoader},
    Options, ResolveError,
};
use futures::{
    future::BoxFuture,
    stream::{self, StreamExt},
};
use std::sync::Arc;

/// Turns requested image URLs into URLs that are safe to render.
///
/// A [`Resolver`] is cheap to clone and every clone shares the same cache, so
/// construct one per session and hand it to whoever renders images.
///
/// Consumers should call [`Resolver::resolve()`] again whenever the URL they
/// want to render changes. The resolver never retries on its own.
#[derive(Debug)]
pub struct Resolver<L> {
    coalescer: Arc<Coalescer<L>>,
    options: Options,
}

impl Resolver<WebLoader> {
    /// Create a [`Resolver`] which probes URLs on the internet, using the
    /// default [`Options`].
    pub fn web() -> Result<Self, LoadError> {
        Ok(Resolver::new(WebLoader::new()?))
    }
}

impl<L: Loader> Resolver<L> {
    /// Create a new [`Resolver`] using the default [`Options`].
    pub fn new(loader: L) -> Self {
        Resolver::with_options(loader, Options::default())
    }

    /// Create a new [`Resolver`] with custom [`Options`].
    pub fn with_options(loader: L, options: Options) -> Self {
        Resolver {
            coalescer: Arc::new(Coalescer::new(loader, &options)),
            options,
        }
    }

    /// The [`Options`] this [`Resolver`] was created with.
    pub fn options(&self) -> &Options { &self.options }

    /// Find the URL which should be rendered in place of `url`.
    ///
    /// The returned future always resolves to *some* URL. That will be `url`
    /// itself if it loaded, a fallback (see [`crate::fallback_url()`]) if it
    /// didn't, or `url` again when there is no fallback and it's up to the
    /// caller to render a placeholder.
    ///
    /// Outcomes are cached for [`Options::cache_ttl()`] and concurrent
    /// requests for the same URL share a single probe.
    ///
    /// # Errors
    ///
    /// Empty URLs are rejected immediately with [`ResolveError::EmptyUrl`].
    /// Starting a probe needs a tokio runtime, so calling this outside of one
    /// may fail with [`ResolveError::NoRuntime`].
    pub fn resolve(
        &self,
        url: &str,
    ) -> Result<BoxFuture<'static, String>, ResolveError> {
        if url.is_empty() {
            return Err(ResolveError::EmptyUrl);
        }

        self.coalescer.resolve(url)
    }

    /// Resolve a batch of URLs, at most [`Options::concurrency()`] at a time.
    ///
    /// Results are returned in the same order as `urls`.
    pub async fn resolve_all<I>(
        &self,
        urls: I,
    ) -> Vec<Result<String, ResolveError>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        stream::iter(urls)
            .map(|url| {
                let pending = self.resolve(url.as_ref());

                async move {
                    match pending {
                        Ok(pending) => Ok(pending.await),
                        Err(e) => Err(e),
                    }
                }
            })
            .buffered(self.options.concurrency())
            .collect()
            .await
    }

    /// Get the last known outcome for `url`, if it hasn't expired.
    pub fn lookup(&self, url: &str) -> Option<CacheEntry> {
        self.coalescer.lookup(url)
    }

    /// Is a probe currently running for `url`?
    pub fn is_in_flight(&self, url: &str) -> bool {
        self.coalescer.is_in_flight(url)
    }

    /// How many probes are currently running?
    pub fn in_flight_count(&self) -> usize { self.coalescer.in_flight_count() }

    /// How many outcomes are cached, including expired ones which haven't
    /// been purged yet.
    pub fn cached_count(&self) -> usize { self.coalescer.cached_count() }

    /// Forget every expired outcome, returning how many were dropped.
    ///
    /// Expired outcomes are already ignored, so this only matters for
    /// reclaiming memory in long sessions.
    pub fn purge_expired(&self) -> usize { self.coalescer.purge_expired() }
}

impl<L> Clone for Resolver<L> {
    fn clone(&self) -> Self {
        Resolver {
            coalescer: Arc::clone(&self.coalescer),
            options: self.options.clone(),
        }
    }
}
