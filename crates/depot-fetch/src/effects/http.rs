use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status line and streaming body of a GET.
pub struct HttpResponse<E> {
    pub status: u16,
    /// Reason phrase, when the client knows one.
    pub reason: Option<String>,
    pub body:   BoxStream<'static, Result<Bytes, E>>,
}

impl<E> HttpResponse<E> {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects and apply their own timeouts. Errors they
/// return, from the request or from the body stream, are retried only when
/// [`HttpClient::is_transient`] says so.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Scripted implementations for testing
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a GET with the given extra headers.
    ///
    /// Non-2xx statuses are returned as responses, not errors; classifying
    /// them is the caller's job.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse<Self::Error>, Self::Error>> + Send;

    /// Whether `error` is a network I/O failure worth another attempt.
    fn is_transient(error: &Self::Error) -> bool;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use reqwest::redirect::Policy;

    use super::*;
    use crate::data::FetchConfig;
    use crate::error::FetchError;

    const MAX_REDIRECTS: usize = 10;

    /// Production HTTP client implementation using reqwest.
    #[derive(Clone, Debug)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new(config: &FetchConfig) -> crate::Result<Self> {
            let client = reqwest::Client::builder()
                .user_agent(config.user_agent.as_str())
                .connect_timeout(config.connect_timeout)
                .read_timeout(config.read_timeout)
                .redirect(Policy::limited(MAX_REDIRECTS))
                .build()
                .map_err(|e| FetchError::Client(e.to_string()))?;
            Ok(Self { client })
        }

        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<HttpResponse<Self::Error>, Self::Error> {
            let mut request = self.client.get(url);
            for (key, value) in headers {
                request = request.header(key.as_str(), value.as_str());
            }

            let response = request.send().await?;
            let status = response.status();
            Ok(HttpResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().map(str::to_string),
                body:   Box::pin(response.bytes_stream()),
            })
        }

        /// Connection, timeout and mid-transfer failures. Malformed requests
        /// and redirect loops are final.
        fn is_transient(error: &reqwest::Error) -> bool {
            if error.is_builder() || error.is_redirect() {
                return false;
            }
            // No content decoding is enabled, so a decode error is a broken body stream.
            error.is_connect()
                || error.is_timeout()
                || error.is_request()
                || error.is_body()
                || error.is_decode()
        }
    }

}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
