use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use murmur_model::{ChatProvider, ChatRequest, ChatResponse, ProviderError};
use tracing::Instrument;

pub(crate) type ConsumeResult = Result<String, Box<dyn ProviderError>>;
type BoxedConsumeFuture = Pin<Box<dyn Future<Output = ConsumeResult> + Send>>;
type FragmentFn = Box<dyn Fn(&str) + Send + 'static>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ChatRequest, FragmentFn) -> BoxedConsumeFuture + Send + Sync
>;

/// A wrapper around a chat provider that reads a whole streamed reply
/// and provides a type-erased interface for the other modules.
///
/// The consumer is deliberately not `Clone`. Whoever holds it is the only
/// one able to issue a request.
pub(crate) struct StreamConsumer {
    handler_fn: HandlerFn,
}

impl StreamConsumer {
    #[inline]
    pub fn new<P: ChatProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `StreamConsumer` doesn't
        // have a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(
            move |req: ChatRequest, on_fragment| -> BoxedConsumeFuture {
                let fut = provider.send_request(&req);
                Box::pin(
                    async move {
                        trace!("sending {} messages", req.messages.len());
                        let resp_or_err = fut.await;
                        read_stream::<P>(resp_or_err, on_fragment).await
                    }
                    .instrument(debug_span!("stream")),
                )
            },
        );
        Self { handler_fn }
    }

    /// Sends a request and reads the reply to the end.
    ///
    /// `on_fragment` sees every fragment as it arrives, which is only
    /// meant for previewing. The result carries the concatenation of all
    /// fragments, or the error if anything went wrong. A failed reply
    /// never yields partial text.
    #[inline]
    pub async fn consume(
        &self,
        req: ChatRequest,
        on_fragment: impl Fn(&str) + Send + 'static,
    ) -> ConsumeResult {
        (self.handler_fn)(req, Box::new(on_fragment)).await
    }
}

async fn read_stream<P: ChatProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_fragment: FragmentFn,
) -> ConsumeResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("request failed: {err}");
            return Err(Box::new(err));
        }
    };

    let mut buffer = String::new();
    let mut fragments = 0usize;

    let mut pinned_resp = pin!(resp);
    loop {
        let fragment_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_fragment(cx)).await;
        let fragment = match fragment_or_err {
            Ok(Some(fragment)) => fragment,
            Ok(None) => break,
            Err(err) => {
                error!("reply broke after {fragments} fragments: {err}");
                return Err(Box::new(err));
            }
        };
        trace!("got a fragment: {fragment:?}");

        fragments += 1;
        buffer.push_str(&fragment);
        on_fragment(&fragment);
    }

    debug!("reply finished, {fragments} fragments, {} bytes", buffer.len());
    Ok(buffer)
}
