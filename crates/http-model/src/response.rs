use std::fmt::{self, Debug};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use murmur_model::{ChatResponse, ErrorKind};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::TextStream;

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextFragment = Result<(Option<String>, TextStream), Error>;

pin_project! {
    pub struct HttpResponse {
        next_fragment_fut: Option<PinnedFuture<NextFragment>>,
        received_bytes: usize,
    }
}

impl HttpResponse {
    #[inline]
    pub fn from_text_stream(text: TextStream) -> Self {
        Self {
            next_fragment_fut: Some(Box::pin(next_fragment(text))),
            received_bytes: 0,
        }
    }
}

impl Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("received_bytes", &self.received_bytes)
            .field("finished", &self.next_fragment_fut.is_none())
            .finish_non_exhaustive()
    }
}

impl ChatResponse for HttpResponse {
    type Error = crate::Error;

    fn poll_next_fragment(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>> {
        let this = self.project();
        let Some(next_fragment_fut) = this.next_fragment_fut else {
            return Poll::Ready(Ok(None));
        };
        let (fragment, text) =
            match ready!(next_fragment_fut.as_mut().poll(cx)) {
                Ok((Some(fragment), text)) => (fragment, text),
                Ok((None, _)) => {
                    debug!("body finished after {} bytes", this.received_bytes);
                    *this.next_fragment_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_fragment_fut = None;
                    return Poll::Ready(Err(err));
                }
            };
        *this.received_bytes += fragment.len();

        // The body may still have more data to pull, create a new future
        // for the next fragment.
        *this.next_fragment_fut = Some(Box::pin(next_fragment(text)));

        Poll::Ready(Ok(Some(fragment)))
    }
}

async fn next_fragment(mut text: TextStream) -> NextFragment {
    match text.next_fragment().await {
        Ok(fragment) => {
            trace!("got fragment: {fragment:?}");
            Ok((fragment, text))
        }
        Err(err) => Err(Error::new(
            format!("failed to read body: {}", err.0),
            ErrorKind::Body,
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;
    use murmur_model::ProviderError;

    use super::*;
    use crate::io::Chunks;

    async fn collect(
        resp: HttpResponse,
    ) -> (Vec<String>, Result<(), crate::Error>) {
        let mut resp = pin!(resp);
        let mut fragments = vec![];
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_fragment(cx)).await {
                Ok(Some(fragment)) => fragments.push(fragment),
                Ok(None) => return (fragments, Ok(())),
                Err(err) => return (fragments, Err(err)),
            }
        }
    }

    #[tokio::test]
    async fn test_fragments() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"Hel"),
                Bytes::from_static(b"lo, "),
                Bytes::from_static(b"world"),
            ]
            .into(),
        );
        let resp = HttpResponse::from_text_stream(TextStream::new(chunks));
        let (fragments, result) = collect(resp).await;
        assert!(result.is_ok());
        assert_eq!(fragments.concat(), "Hello, world");
    }

    #[tokio::test]
    async fn test_body_error() {
        let chunks = Chunks::failing_after(
            vec![Bytes::from_static(b"- point one\n")].into(),
        );
        let resp = HttpResponse::from_text_stream(TextStream::new(chunks));
        let (fragments, result) = collect(resp).await;
        assert_eq!(fragments, vec!["- point one\n".to_owned()]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Body);
    }

    #[tokio::test]
    async fn test_debug() {
        let chunks =
            Chunks::from_vec_deque(vec![Bytes::from_static(b"Hi")].into());
        let mut resp =
            pin!(HttpResponse::from_text_stream(TextStream::new(chunks)));
        assert_eq!(
            format!("{:?}", resp),
            "HttpResponse { received_bytes: 0, finished: false, .. }"
        );

        poll_fn(|cx| resp.as_mut().poll_next_fragment(cx))
            .await
            .unwrap();
        poll_fn(|cx| resp.as_mut().poll_next_fragment(cx))
            .await
            .unwrap();
        assert_eq!(
            format!("{:?}", resp),
            "HttpResponse { received_bytes: 2, finished: true, .. }"
        );
    }

    #[tokio::test]
    async fn test_empty_body() {
        let chunks = Chunks::from_vec_deque(Default::default());
        let resp = HttpResponse::from_text_stream(TextStream::new(chunks));
        let (fragments, result) = collect(resp).await;
        assert!(result.is_ok());
        assert!(fragments.is_empty());
    }
}
