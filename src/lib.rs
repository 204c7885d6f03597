//! Turn requested image URLs into URLs that are actually safe to render.
//!
//! A [`Resolver`] probes each URL once, falls back to an alternate source
//! (see [`fallback_url()`]) when the original can't be loaded, remembers the
//! outcome for a while, and makes sure concurrent requests for the same URL
//! share a single probe.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = image_resolver::Resolver::web()?;
//!
//! let url = resolver
//!     .resolve("https://lancache.local/api/gameimages/440/header")?
//!     .await;
//!
//! println!("Rendering {}", url);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod cache;
mod coalesce;
mod fallback;
pub mod load;
mod options;
mod resolver;
#[cfg(test)]
mod test_utils;

pub use cache::{CacheEntry, ResolutionCache};
pub use fallback::{fallback_url, FALLBACK_CDN};
pub use load::{LoadError, Loader, ProbeOutcome, WebLoader};
pub use options::Options;
pub use resolver::Resolver;

/// Reasons a URL can't be resolved at all.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// There was nothing to resolve.
    #[error("Unable to resolve an empty URL")]
    EmptyUrl,
    /// A probe was needed but there is no tokio runtime to run it on.
    #[error("Probing a URL requires a tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
