use crate::load::{LoadError, Loader};
use futures::future::{BoxFuture, FutureExt};
use http::StatusCode;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

/// What a [`MockLoader`] does when asked to load a URL.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum Behaviour {
    Load,
    Fail,
    Hang,
    Panic,
}

/// A [`Loader`] which never touches the network and remembers every URL it
/// was asked to load.
#[derive(Debug, Clone)]
pub(crate) struct MockLoader {
    default: Behaviour,
    overrides: HashMap<String, Behaviour>,
    delay: Duration,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockLoader {
    pub(crate) fn new(default: Behaviour) -> Self {
        MockLoader {
            default,
            overrides: HashMap::new(),
            delay: Duration::from_secs(0),
            calls: Arc::default(),
        }
    }

    /// Use a different [`Behaviour`] for one particular URL.
    pub(crate) fn with(mut self, url: &str, behaviour: Behaviour) -> Self {
        self.overrides.insert(url.to_string(), behaviour);
        self
    }

    /// Wait this long before settling.
    pub(crate) fn with_delay(self, delay: Duration) -> Self {
        MockLoader { delay, ..self }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize { self.calls.lock().unwrap().len() }
}

impl Loader for MockLoader {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<(), LoadError>> {
        self.calls.lock().unwrap().push(url.to_string());

        let behaviour = self.overrides.get(url).copied().unwrap_or(self.default);
        let delay = self.delay;

        async move {
            tokio::time::sleep(delay).await;

            match behaviour {
                Behaviour::Load => Ok(()),
                Behaviour::Fail => Err(LoadError::Status(StatusCode::NOT_FOUND)),
                Behaviour::Hang => futures::future::pending().await,
                Behaviour::Panic => panic!("The loader blew up"),
            }
        }
        .boxed()
    }
}
