use crate::load::{LoadError, Loader};
use futures::future::{BoxFuture, FutureExt};
use http::{
    header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE},
    HeaderMap,
};
use reqwest::{Client, Response};

/// A [`Loader`] for images on the internet.
#[derive(Debug, Clone)]
pub struct WebLoader {
    client: Client,
    headers: HeaderMap,
}

impl WebLoader {
    /// The User-Agent used by [`WebLoader::new()`].
    pub const USER_AGENT: &'static str =
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

    /// The `Accept` header sent with every request, letting servers know we
    /// only care about images.
    pub const ACCEPT_IMAGES: &'static str =
        "image/avif,image/webp,image/apng,image/*;q=0.8";

    /// Create a [`WebLoader`] with its own [`Client`].
    pub fn new() -> Result<Self, LoadError> {
        let client =
            Client::builder().user_agent(WebLoader::USER_AGENT).build()?;

        Ok(WebLoader::with_client(client))
    }

    /// Create a [`WebLoader`] with an already initialized [`Client`].
    pub fn with_client(client: Client) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(WebLoader::ACCEPT_IMAGES),
        );

        WebLoader { client, headers }
    }

    /// The [`Client`] used to send requests.
    pub fn client(&self) -> &Client { &self.client }

    /// Headers sent along with every request.
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Get a mutable reference to the headers sent with every request.
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    /// Send an extra header with every request.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl Loader for WebLoader {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<(), LoadError>> {
        log::debug!("Loading \"{}\" from the web", url);

        // invalid URLs are reported by send(), not here
        let request = self.client.get(url).headers(self.headers.clone());

        async move {
            let response = request.send().await?;
            check_response(&response)
        }
        .boxed()
    }
}

fn check_response(response: &Response) -> Result<(), LoadError> {
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status(status));
    }

    // servers which don't say what they sent get the benefit of the doubt
    match response.headers().get(CONTENT_TYPE) {
        Some(content_type) => {
            let content_type = content_type.to_str().unwrap_or_default();

            // media types are case-insensitive
            let media_type = content_type.trim_start().to_ascii_lowercase();

            if media_type.starts_with("image/") {
                Ok(())
            } else {
                Err(LoadError::NotAnImage(content_type.to_string()))
            }
        },
        None => Ok(()),
    }
}
