use std::pin::Pin;
use std::task::{self, Poll};

use crate::provider::ProviderError;

/// A streamed reply from the chat provider.
pub trait ChatResponse: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ProviderError;

    /// Attempts to pull out the next text fragment from the response.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct response state:
    ///
    /// - `Poll::Pending` means that this response is still waiting for
    ///   the next fragment. Implementations will ensure that the current
    ///   task will be notified when the next fragment may be ready.
    /// - `Poll::Ready(Ok(Some(fragment)))` means the response has a
    ///   fragment to deliver, and may produce further fragments on
    ///   subsequent `poll_next_fragment` calls.
    /// - `Poll::Ready(Ok(None))` means the response has completed.
    /// - `Poll::Ready(Err(error))` means an error occurred while reading
    ///   the response.
    ///
    /// Fragments are delivered in the order the endpoint produced them.
    /// They carry no framing, concatenating all of them yields the reply.
    /// Calling this method after completion should always return `None`.
    fn poll_next_fragment(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>>;
}
