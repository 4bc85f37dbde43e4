use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::{poll_fn, ready};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{self, Poll, ready};
use std::time::Duration;

use murmur_model::{
    ChatMessage, ChatProvider, ChatRequest, ChatResponse, ErrorKind,
    ProviderError, Role, SpeechEngine, SpeechError, StartSignal,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeProviderError(ErrorKind);

impl Display for FakeProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeProviderError {}

impl ProviderError for FakeProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
struct FakeResponse {
    fake_items: VecDeque<String>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeResponse {
    fn new(input: &str) -> Self {
        let fake_items = format!("You said {}", input)
            .split(" ")
            .map(ToString::to_string)
            .collect();
        Self {
            fake_items,
            sleep: None,
        }
    }
}

impl ChatResponse for FakeResponse {
    type Error = FakeProviderError;

    fn poll_next_fragment(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>> {
        let this = self.get_mut();
        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            if let Some(mut this_item) = this.fake_items.pop_front() {
                if !this.fake_items.is_empty() {
                    this_item.push(' ');
                }
                return Poll::Ready(Ok(Some(this_item)));
            }

            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_fragment(cx)
    }
}

struct FakeProvider;

impl ChatProvider for FakeProvider {
    type Error = FakeProviderError;
    type Response = FakeResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = match req.messages.last() {
            Some(ChatMessage {
                role: Role::User,
                content,
            }) => Ok(FakeResponse::new(content)),
            _ => Err(FakeProviderError(ErrorKind::Status)),
        };
        ready(result)
    }
}

struct FakeSpeechEngine;

impl SpeechEngine for FakeSpeechEngine {
    fn utter(
        &self,
        text: &str,
        on_start: StartSignal,
    ) -> impl Future<Output = Result<(), SpeechError>> + Send + 'static {
        let words = text.split_whitespace().count();
        async move {
            on_start();
            sleep(Duration::from_millis(words as u64)).await;
            Ok(())
        }
    }
}

#[tokio::test]
async fn test_completion() {
    let provider = FakeProvider;
    let req = ChatRequest {
        messages: vec![
            ChatMessage::user("Hi"),
            ChatMessage::assistant("Hello!"),
            ChatMessage::user("Good morning"),
        ],
    };
    let mut resp = provider.send_request(&req).await.unwrap();

    let mut reply = String::new();
    let mut fragments = 0;
    while let Some(fragment) =
        poll_fn(|cx| Pin::new(&mut resp).poll_next_fragment(cx))
            .await
            .unwrap()
    {
        fragments += 1;
        reply.push_str(&fragment);
    }

    assert_eq!(fragments, 4);
    assert_eq!(reply, "You said Good morning");

    // Exhausted responses keep reporting completion.
    let again = poll_fn(|cx| Pin::new(&mut resp).poll_next_fragment(cx))
        .await
        .unwrap();
    assert_eq!(again, None);
}

#[tokio::test]
async fn test_error() {
    let provider = FakeProvider;
    let req = ChatRequest::default();
    let err = provider.send_request(&req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Status);
}

#[tokio::test]
async fn test_speech_engine_signals_start() {
    let engine = FakeSpeechEngine;
    assert!(engine.is_available());

    let started = Arc::new(AtomicBool::new(false));
    let fut = engine.utter("one two three", {
        let started = Arc::clone(&started);
        Box::new(move || started.store(true, Ordering::Relaxed))
    });
    assert!(!started.load(Ordering::Relaxed));
    fut.await.unwrap();
    assert!(started.load(Ordering::Relaxed));
}
