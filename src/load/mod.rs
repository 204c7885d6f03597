//! Loading resources to find out whether they're reachable.

mod web;

pub use web::WebLoader;

use futures::future::BoxFuture;
use http::StatusCode;
use std::sync::Arc;

/// Something which can try to load a resource.
///
/// # Note to Implementors
///
/// The returned future should settle as soon as it knows whether the resource
/// is usable. Timeouts are enforced by the caller, so a loader may wait on a
/// slow host forever.
pub trait Loader: Send + Sync + 'static {
    /// Try to load the resource at `url`.
    fn load(&self, url: &str) -> BoxFuture<'static, Result<(), LoadError>>;
}

impl<L: Loader> Loader for Arc<L> {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<(), LoadError>> {
        (**self).load(url)
    }
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<(), LoadError>> {
        (**self).load(url)
    }
}

/// Why a resource couldn't be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The request itself failed (DNS, connection, TLS, a malformed URL...).
    #[error("The request failed")]
    Request(#[from] reqwest::Error),
    /// The server responded with an unsuccessful status code.
    #[error("The server responded with {0}")]
    Status(StatusCode),
    /// The server responded with something that isn't an image.
    #[error("Expected an image but got \"{0}\"")]
    NotAnImage(String),
}

/// The result of a single probe.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The resource loaded.
    Loaded,
    /// The [`Loader`] reported an error.
    Failed(LoadError),
    /// The [`Loader`] didn't settle in time.
    TimedOut,
}

impl ProbeOutcome {
    /// Did the original resource load?
    pub fn is_loaded(&self) -> bool { matches!(self, ProbeOutcome::Loaded) }
}

impl From<Result<(), LoadError>> for ProbeOutcome {
    fn from(result: Result<(), LoadError>) -> Self {
        match result {
            Ok(()) => ProbeOutcome::Loaded,
            Err(e) => ProbeOutcome::Failed(e),
        }
    }
}
