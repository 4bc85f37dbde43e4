//! A chat provider for endpoints that stream plain text over HTTP.
//!
//! The endpoint receives `POST` requests with a JSON body of the form
//! `{"messages": [{"role": "user", "content": "..."}]}` and answers with
//! the reply as a raw text body, written incrementally. There is no
//! framing, the fragments concatenate directly into the reply.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use murmur_model::{ChatProvider, ChatRequest, ErrorKind, ProviderError};
use reqwest::{Client, StatusCode, header};

pub use config::{HttpConfig, HttpConfigBuilder};
use io::{Chunks, TextStream};
pub use response::HttpResponse;

/// Error type for [`HttpProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Provider for plain-text streaming endpoints.
#[derive(Clone, Debug)]
pub struct HttpProvider {
    client: Client,
    config: Arc<HttpConfig>,
}

impl HttpProvider {
    /// Creates a new `HttpProvider` with the given configuration.
    #[inline]
    pub fn new(config: HttpConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ChatProvider for HttpProvider {
    type Error = Error;
    type Response = HttpResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(req);
        let mut builder = self
            .client
            .post(&self.config.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/plain")
            .json(&body);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &self.config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let resp_fut = builder.send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(
                        format!("{err}"),
                        ErrorKind::Transport,
                    ));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                return Err(Error::new(
                    format!("unexpected status: {status}"),
                    ErrorKind::Status,
                ));
            }
            let has_body = !matches!(
                status,
                StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT
            );
            if !has_body {
                return Err(Error::new(
                    format!("no body with status: {status}"),
                    ErrorKind::Body,
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_text = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.type_() == mime::TEXT)
                .unwrap_or(true);
            if !is_text {
                // The body is read as text regardless.
                warn!("unexpected content type: {content_type:?}");
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            Ok(HttpResponse::from_text_stream(TextStream::new(chunks)))
        }
    }
}
