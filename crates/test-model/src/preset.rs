use serde::{Deserialize, Serialize};

/// How a preset response goes wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFailure {
    /// The request is refused before any fragment, like a non-2xx status.
    Rejected,
    /// All fragments are delivered, then reading the body fails.
    BrokenBody,
}

/// The preset response for an assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Text fragments in this response, in delivery order.
    pub fragments: Vec<String>,
    /// If set, the response fails in the described way.
    pub failure: Option<PresetFailure>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified fragments.
    #[inline]
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            failure: None,
        }
    }

    /// Creates a `PresetResponse` that is refused by the endpoint.
    #[inline]
    pub fn rejected() -> Self {
        Self {
            fragments: vec![],
            failure: Some(PresetFailure::Rejected),
        }
    }

    /// Makes the response fail after its fragments are delivered.
    #[inline]
    pub fn with_broken_body(mut self) -> Self {
        self.failure = Some(PresetFailure::BrokenBody);
        self
    }
}
