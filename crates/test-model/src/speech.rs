use std::sync::Arc;

use murmur_model::{SpeechEngine, SpeechError, SpeechErrorKind, StartSignal};
use tokio::sync::{Notify, watch};

/// Something that happened to an utterance of a [`TestSpeechEngine`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SpeechEvent {
    /// Audio for the text started.
    Started(String),
    /// The text was spoken to the end.
    Finished(String),
    /// The utterance was dropped before it finished.
    Cancelled(String),
}

struct Inner {
    available: bool,
    failing: bool,
    finish: Notify,
    events: watch::Sender<Vec<SpeechEvent>>,
}

/// A fake speech engine whose utterances only end when told to.
///
/// Every utterance starts immediately and then waits for
/// [`TestSpeechEngine::finish_current`]. Dropping the utterance records a
/// [`SpeechEvent::Cancelled`].
#[derive(Clone)]
pub struct TestSpeechEngine {
    inner: Arc<Inner>,
}

impl TestSpeechEngine {
    #[inline]
    pub fn new() -> Self {
        Self::with_flags(true, false)
    }

    /// Creates an engine that reports itself as unavailable.
    #[inline]
    pub fn unavailable() -> Self {
        Self::with_flags(false, false)
    }

    /// Creates an engine whose utterances fail right after starting.
    #[inline]
    pub fn failing() -> Self {
        Self::with_flags(true, true)
    }

    fn with_flags(available: bool, failing: bool) -> Self {
        let (events, _) = watch::channel(vec![]);
        Self {
            inner: Arc::new(Inner {
                available,
                failing,
                finish: Notify::new(),
                events,
            }),
        }
    }

    /// Lets the utterance that is currently playing finish naturally.
    #[inline]
    pub fn finish_current(&self) {
        self.inner.finish.notify_one();
    }

    /// Returns everything recorded so far.
    #[inline]
    pub fn events(&self) -> Vec<SpeechEvent> {
        self.inner.events.borrow().clone()
    }

    /// Waits until the recorded events satisfy `predicate`.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Vec<SpeechEvent>
    where
        F: FnMut(&[SpeechEvent]) -> bool,
    {
        let mut rx = self.inner.events.subscribe();
        match rx.wait_for(|events| predicate(events)).await {
            Ok(events) => events.clone(),
            Err(_) => self.events(),
        }
    }
}

impl Default for TestSpeechEngine {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

struct Playing {
    inner: Arc<Inner>,
    text: String,
    done: bool,
}

impl Playing {
    fn record(&self, event: SpeechEvent) {
        self.inner.events.send_modify(|events| events.push(event));
    }
}

impl Drop for Playing {
    fn drop(&mut self) {
        if !self.done {
            self.record(SpeechEvent::Cancelled(self.text.clone()));
        }
    }
}

impl SpeechEngine for TestSpeechEngine {
    fn is_available(&self) -> bool {
        self.inner.available
    }

    fn utter(
        &self,
        text: &str,
        on_start: StartSignal,
    ) -> impl Future<Output = Result<(), SpeechError>> + Send + 'static {
        let inner = Arc::clone(&self.inner);
        let text = text.to_owned();
        async move {
            let mut playing = Playing {
                inner,
                text,
                done: false,
            };
            on_start();
            playing.record(SpeechEvent::Started(playing.text.clone()));

            if playing.inner.failing {
                playing.done = true;
                return Err(SpeechError::new(
                    SpeechErrorKind::Failed,
                    "audio device went away",
                ));
            }

            playing.inner.finish.notified().await;
            playing.done = true;
            playing.record(SpeechEvent::Finished(playing.text.clone()));
            Ok(())
        }
    }
}
