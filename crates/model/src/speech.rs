use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// A callback that the speech engine invokes once audio starts playing.
pub type StartSignal = Box<dyn FnOnce() + Send + 'static>;

/// Why an utterance could not be played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpeechErrorKind {
    /// There is no usable speech engine on this host.
    Unavailable,
    /// The engine started but failed while speaking.
    Failed,
}

/// Error type for [`SpeechEngine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeechError {
    message: String,
    kind: SpeechErrorKind,
}

impl SpeechError {
    /// Creates an error with the given kind and message.
    #[inline]
    pub fn new(kind: SpeechErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> SpeechErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SpeechError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for SpeechError {}

/// A type that turns text into audible speech.
///
/// The engine is treated as an opaque audio sink. Callers only rely on
/// being told when audio starts and when it ends, voice selection, rate
/// or pitch are up to the implementation.
pub trait SpeechEngine: Send + Sync {
    /// Returns whether the engine can produce audio at all.
    ///
    /// Callers skip speaking entirely when this returns `false`.
    fn is_available(&self) -> bool {
        true
    }

    /// Speaks `text` and resolves when playback finishes.
    ///
    /// Implementations must call `on_start` when audio actually begins,
    /// at most once. The returned future must be independent of `self`.
    ///
    /// # Cancellation
    ///
    /// Dropping the future cancels the utterance, and implementations
    /// should silence any audio they produced as soon as possible.
    fn utter(
        &self,
        text: &str,
        on_start: StartSignal,
    ) -> impl Future<Output = Result<(), SpeechError>> + Send + 'static;
}
