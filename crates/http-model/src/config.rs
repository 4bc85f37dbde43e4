use std::fmt::Debug;

/// Builder for [`HttpConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HttpConfigBuilder {
    endpoint: String,
    bearer_token: Option<String>,
    headers: Vec<(String, String)>,
}

impl HttpConfigBuilder {
    /// Creates a builder for the given endpoint URL.
    ///
    /// The URL is used as is, requests are posted to it directly.
    #[inline]
    pub fn with_endpoint<S: Into<String>>(endpoint: S) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer_token: None,
            headers: vec![],
        }
    }

    /// Sets a bearer token sent in the `Authorization` header.
    #[inline]
    pub fn with_bearer_token<S: Into<String>>(mut self, token: S) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Adds an extra header to every request.
    #[inline]
    pub fn with_header<K: Into<String>, V: Into<String>>(
        mut self,
        name: K,
        value: V,
    ) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpConfig {
        HttpConfig {
            endpoint: self.endpoint,
            bearer_token: self.bearer_token,
            headers: self.headers,
        }
    }
}

impl Debug for HttpConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bearer_token = self.bearer_token.as_ref().map(|_| "<deducted>");
        f.debug_struct("HttpConfigBuilder")
            .field("endpoint", &self.endpoint)
            .field("bearer_token", &bearer_token)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Configuration for the HTTP provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HttpConfig {
    pub(crate) endpoint: String,
    pub(crate) bearer_token: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
}

impl HttpConfig {
    /// Returns the endpoint URL.
    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bearer_token = self.bearer_token.as_ref().map(|_| "<deducted>");
        f.debug_struct("HttpConfig")
            .field("endpoint", &self.endpoint)
            .field("bearer_token", &bearer_token)
            .field("headers", &self.headers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token() {
        let config =
            HttpConfigBuilder::with_endpoint("http://localhost/api/chat")
                .with_bearer_token("secret-token")
                .build();
        let printed = format!("{config:?}");
        assert!(printed.contains("<deducted>"));
        assert!(!printed.contains("secret-token"));
        assert_eq!(config.endpoint(), "http://localhost/api/chat");
    }
}
