use crate::{
    cache::{CacheEntry, ResolutionCache},
    fallback::fallback_url,
    load::{Loader, ProbeOutcome},
    Options, ResolveError,
};
use futures::{
    channel::oneshot,
    future::{self, BoxFuture, FutureExt, Shared},
};
use std::{
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{runtime::Handle, task::JoinHandle, time::Instant};

/// The single outstanding probe for a URL, shared by everyone waiting on it.
type Pending = Shared<BoxFuture<'static, String>>;

/// Merges concurrent resolutions of the same URL into a single probe and
/// remembers the outcome.
///
/// Both maps live behind one lock. Guards are never held across an `.await`,
/// so checking the cache, joining a probe and registering a new one happen in
/// one step, as do recording an outcome and retiring its probe. Nobody can
/// observe a URL which is neither cached nor in flight once a probe has
/// started.
pub(crate) struct Coalescer<L> {
    loader: L,
    probe_timeout: Duration,
    state: Mutex<State>,
}

struct State {
    cache: ResolutionCache,
    in_flight: HashMap<String, Pending>,
}

impl<L: Loader> Coalescer<L> {
    pub(crate) fn new(loader: L, options: &Options) -> Self {
        Coalescer {
            loader,
            probe_timeout: options.probe_timeout(),
            state: Mutex::new(State {
                cache: ResolutionCache::new(options.cache_ttl()),
                in_flight: HashMap::new(),
            }),
        }
    }

    /// Get a future for the URL that should be rendered instead of `url`.
    ///
    /// A fresh cache entry is used as-is, otherwise the caller joins the probe
    /// already in flight for `url` or a new one gets started. New probes run
    /// on the current tokio runtime and finish even if every caller loses
    /// interest.
    pub(crate) fn resolve(
        self: &Arc<Self>,
        url: &str,
    ) -> Result<BoxFuture<'static, String>, ResolveError> {
        let mut state = self.lock();

        if let Some(entry) = state.cache.lookup(url) {
            log::debug!("Cache hit for \"{}\"", url);
            let resolved = usable_url(url, entry);
            return Ok(future::ready(resolved).boxed());
        }

        if let Some(pending) = state.in_flight.get(url) {
            log::debug!("Joining the probe already in flight for \"{}\"", url);
            return Ok(pending.clone().boxed());
        }

        let runtime = Handle::try_current()?;
        let deadline = Instant::now() + self.probe_timeout;
        log::debug!("Probing \"{}\"", url);

        // a runtime that's shutting down drops new tasks on the spot, and the
        // task's guard needs the lock, so spawning waits until it's released
        // and joiners get the handle through a channel
        let (handle_tx, handle_rx) = oneshot::channel::<JoinHandle<String>>();
        let original = url.to_string();
        let pending = async move {
            let joined = match handle_rx.await {
                Ok(task) => task.await,
                Err(_) => return original,
            };

            joined.unwrap_or_else(|e| {
                log::warn!("The probe for \"{}\" died: {}", original, e);
                original
            })
        }
        .boxed()
        .shared();
        state.in_flight.insert(url.to_string(), pending.clone());
        drop(state);

        let in_flight = InFlight {
            coalescer: Arc::clone(self),
            url: url.to_string(),
            settled: false,
        };
        let task = runtime.spawn(in_flight.run(deadline));
        let _ = handle_tx.send(task);

        Ok(pending.boxed())
    }

    async fn probe(&self, url: &str, deadline: Instant) -> ProbeOutcome {
        match tokio::time::timeout_at(deadline, self.loader.load(url)).await {
            Ok(result) => ProbeOutcome::from(result),
            Err(_) => ProbeOutcome::TimedOut,
        }
    }

    /// Record the outcome of a probe and retire it.
    fn settle(&self, url: &str, outcome: ProbeOutcome) -> String {
        let succeeded = outcome.is_loaded();

        let resolved = match outcome {
            ProbeOutcome::Loaded => {
                log::debug!("\"{}\" loaded", url);
                url.to_string()
            },
            ProbeOutcome::Failed(e) => {
                log::warn!("Unable to load \"{}\": {}", url, e);
                fallback_or_original(url)
            },
            ProbeOutcome::TimedOut => {
                log::warn!(
                    "Loading \"{}\" took longer than {:?}",
                    url,
                    self.probe_timeout
                );
                fallback_or_original(url)
            },
        };

        let mut state = self.lock();
        state.cache.record(url, resolved.clone(), succeeded);
        state.in_flight.remove(url);

        resolved
    }

    /// Get a copy of the fresh [`CacheEntry`] for `url`, if there is one.
    pub(crate) fn lookup(&self, url: &str) -> Option<CacheEntry> {
        self.lock().cache.lookup(url).cloned()
    }

    pub(crate) fn is_in_flight(&self, url: &str) -> bool {
        self.lock().in_flight.contains_key(url)
    }

    pub(crate) fn in_flight_count(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub(crate) fn cached_count(&self) -> usize { self.lock().cache.len() }

    pub(crate) fn purge_expired(&self) -> usize {
        self.lock().cache.purge_expired()
    }
}

/// A probe registered in the in-flight map.
///
/// If the probe's task panics or is dropped before settling (e.g. because
/// its runtime shut down), the registration is removed so the next caller
/// starts afresh.
struct InFlight<L> {
    coalescer: Arc<Coalescer<L>>,
    url: String,
    settled: bool,
}

impl<L: Loader> InFlight<L> {
    async fn run(mut self, deadline: Instant) -> String {
        let outcome = self.coalescer.probe(&self.url, deadline).await;
        let resolved = self.coalescer.settle(&self.url, outcome);
        self.settled = true;

        resolved
    }
}

impl<L> Drop for InFlight<L> {
    fn drop(&mut self) {
        if !self.settled {
            log::warn!("The probe for \"{}\" stopped before settling", self.url);
            self.coalescer.lock().in_flight.remove(&self.url);
        }
    }
}

impl<L> Coalescer<L> {
    // every critical section leaves both maps consistent, so a panic while
    // holding the lock can't corrupt anything
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: Debug> Debug for Coalescer<L> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.lock();

        f.debug_struct("Coalescer")
            .field("loader", &self.loader)
            .field("probe_timeout", &self.probe_timeout)
            .field("cache", &state.cache)
            .field("in_flight", &state.in_flight.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The fallback is recomputed rather than stored so each entry only needs to
/// keep a single URL.
fn usable_url(url: &str, entry: &CacheEntry) -> String {
    if entry.succeeded {
        entry.resolved_url.clone()
    } else {
        fallback_or_original(url)
    }
}

fn fallback_or_original(url: &str) -> String {
    fallback_url(url).unwrap_or_else(|| url.to_string())
}
