//! Local fakes of the chat collaborators for testing purpose.

mod preset;
mod speech;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use murmur_model::{
    ChatProvider, ChatRequest, ChatResponse, ErrorKind, ProviderError,
};
use tokio::sync::Semaphore;
use tokio::time::{Sleep, sleep};

pub use preset::*;
pub use speech::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

type GateFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

pub struct TestChatResponse {
    fragments: VecDeque<String>,
    broken_body: bool,
    finished: bool,
    gate: Option<GateFuture>,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ChatResponse for TestChatResponse {
    type Error = crate::Error;

    fn poll_next_fragment(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(Ok(None));
        }

        // Held responses don't deliver anything until released.
        if let Some(gate) = &mut this.gate {
            ready!(gate.as_mut().poll(cx));
            this.gate = None;
        }

        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(this.delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        if let Some(fragment) = this.fragments.pop_front() {
            return Poll::Ready(Ok(Some(fragment)));
        }
        this.finished = true;
        if this.broken_body {
            return Poll::Ready(Err(Error {
                message: "body is broken",
                kind: ErrorKind::Body,
            }));
        }
        Poll::Ready(Ok(None))
    }
}

#[derive(Clone, Debug)]
enum ConversationStep {
    UserInput,
    AssistantResponse(PresetResponse),
}

/// Releases held responses of a [`TestChatProvider`].
#[derive(Clone, Debug)]
pub struct ResponseGate(Arc<Semaphore>);

impl ResponseGate {
    /// Lets one held response start delivering its fragments.
    #[inline]
    pub fn release(&self) {
        self.0.add_permits(1);
    }
}

/// A local fake endpoint for testing purpose.
///
/// Before sending requests, you need to setup the conversation script,
/// which is how the endpoint should respond to a request. The steps are
/// selected according to the history messages in your request. If there
/// are no enough steps in the script, the request is refused.
///
/// Every request is recorded and can be inspected with
/// [`TestChatProvider::requests`].
#[derive(Clone, Default)]
pub struct TestChatProvider {
    conversation_script: Vec<ConversationStep>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl TestChatProvider {
    #[inline]
    pub fn add_assistant_turn(&mut self, preset: PresetResponse) {
        self.conversation_script
            .push(ConversationStep::AssistantResponse(preset));
    }

    #[inline]
    pub fn add_user_turn(&mut self) {
        self.conversation_script.push(ConversationStep::UserInput);
    }

    /// Adds a user turn followed by the given response.
    #[inline]
    pub fn add_exchange(&mut self, preset: PresetResponse) {
        self.add_user_turn();
        self.add_assistant_turn(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Holds every response until the returned gate releases it.
    pub fn hold_responses(&mut self) -> ResponseGate {
        let semaphore = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&semaphore));
        ResponseGate(semaphore)
    }

    /// Returns all requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn make_response(
        &self,
        req: &ChatRequest,
    ) -> Result<TestChatResponse, Error> {
        let step = self.conversation_script.get(req.messages.len());
        let preset = match step {
            Some(ConversationStep::AssistantResponse(preset)) => preset,
            Some(ConversationStep::UserInput) => {
                return Err(Error {
                    message: "not an assistant response step",
                    kind: ErrorKind::Other,
                });
            }
            None => {
                return Err(Error {
                    message: "no enough steps",
                    kind: ErrorKind::Status,
                });
            }
        };
        if preset.failure == Some(PresetFailure::Rejected) {
            return Err(Error {
                message: "request is rejected",
                kind: ErrorKind::Status,
            });
        }

        let gate = self.gate.clone().map(|semaphore| {
            let fut: GateFuture = Box::pin(async move {
                if let Ok(permit) = semaphore.acquire().await {
                    permit.forget();
                }
            });
            fut
        });
        Ok(TestChatResponse {
            fragments: preset.fragments.iter().cloned().collect(),
            broken_body: preset.failure == Some(PresetFailure::BrokenBody),
            finished: false,
            gate,
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            sleep: None,
        })
    }
}

impl Debug for TestChatProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestChatProvider")
            .field("steps", &self.conversation_script.len())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl ChatProvider for TestChatProvider {
    type Error = crate::Error;
    type Response = TestChatResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }
        ready(self.make_response(req))
    }
}
