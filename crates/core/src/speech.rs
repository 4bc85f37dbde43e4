use std::fmt::{self, Debug};
use std::pin::Pin;
use std::sync::Arc;

use murmur_model::{SpeechEngine, SpeechError, StartSignal};
use tokio::task::JoinHandle;
use tracing::Instrument;

type UtterFuture =
    Pin<Box<dyn Future<Output = Result<(), SpeechError>> + Send>>;
type UtterFn = Arc<dyn Fn(String, StartSignal) -> UtterFuture + Send + Sync>;
type AvailableFn = Arc<dyn Fn() -> bool + Send + Sync>;
type Callback = Box<dyn FnOnce() + Send + 'static>;
type NotifyFn = Arc<dyn Fn(SpeechSignal) + Send + Sync>;

/// A type-erased speech engine.
#[derive(Clone)]
pub(crate) struct Voice {
    utter_fn: UtterFn,
    available_fn: AvailableFn,
}

impl Voice {
    pub fn new<E: SpeechEngine + 'static>(engine: E) -> Self {
        let engine = Arc::new(engine);
        let utter_fn: UtterFn = {
            let engine = Arc::clone(&engine);
            Arc::new(move |text: String, on_start| -> UtterFuture {
                Box::pin(engine.utter(&text, on_start))
            })
        };
        let available_fn: AvailableFn =
            Arc::new(move || engine.is_available());
        Self {
            utter_fn,
            available_fn,
        }
    }

    /// A voice that never speaks.
    pub fn silent() -> Self {
        Self {
            utter_fn: Arc::new(|_, _| -> UtterFuture {
                Box::pin(async { Ok(()) })
            }),
            available_fn: Arc::new(|| false),
        }
    }
}

/// Lifecycle events of an utterance, reported back to the controller.
#[derive(Debug)]
pub(crate) enum SpeechSignal {
    Started(u64),
    Ended(u64, Result<(), SpeechError>),
}

struct ActiveUtterance {
    id: u64,
    task: JoinHandle<()>,
    on_start: Option<Callback>,
    on_end: Callback,
}

/// Plays at most one utterance at a time.
///
/// The controller never touches its own state from the utterance tasks.
/// They report through `notify` instead, and the owner feeds those
/// signals back with [`SpeechController::handle_signal`]. Signals of
/// utterances that are no longer active are ignored, so a stopped
/// utterance can't end or start the one that replaced it.
///
/// `on_end` of an utterance runs exactly once, whether it finished,
/// failed, was stopped or was replaced.
pub(crate) struct SpeechController {
    voice: Voice,
    notify: NotifyFn,
    active: Option<ActiveUtterance>,
    next_id: u64,
}

impl SpeechController {
    pub fn new(
        voice: Voice,
        notify: impl Fn(SpeechSignal) + Send + Sync + 'static,
    ) -> Self {
        Self {
            voice,
            notify: Arc::new(notify),
            active: None,
            next_id: 1,
        }
    }

    /// Returns whether an utterance is active, started or not.
    #[cfg(test)]
    #[inline]
    pub fn is_speaking(&self) -> bool {
        self.active.is_some()
    }

    /// Returns whether the active utterance has started playing audio.
    #[inline]
    pub fn is_audible(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.on_start.is_none())
    }

    /// Stops whatever is playing and starts speaking `text`.
    ///
    /// Does nothing beyond stopping when the engine is unavailable.
    pub fn speak(
        &mut self,
        text: String,
        on_start: impl FnOnce() + Send + 'static,
        on_end: impl FnOnce() + Send + 'static,
    ) {
        self.stop();
        if !(self.voice.available_fn)() {
            debug!("speech engine unavailable, not speaking");
            return;
        }

        let id = self.next_id;
        self.next_id += 1;
        debug!("speaking utterance {id} ({} bytes)", text.len());

        let start_signal: StartSignal = {
            let notify = Arc::clone(&self.notify);
            Box::new(move || notify(SpeechSignal::Started(id)))
        };
        let fut = (self.voice.utter_fn)(text, start_signal);
        let notify = Arc::clone(&self.notify);
        let task = tokio::spawn(
            async move {
                let result = fut.await;
                notify(SpeechSignal::Ended(id, result));
            }
            .instrument(debug_span!("utterance", id)),
        );

        self.active = Some(ActiveUtterance {
            id,
            task,
            on_start: Some(Box::new(on_start)),
            on_end: Box::new(on_end),
        });
    }

    /// Cancels the active utterance, if any.
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        debug!("stopping utterance {}", active.id);
        // Aborting drops the engine future, which silences it.
        active.task.abort();
        (active.on_end)();
    }

    pub fn handle_signal(&mut self, signal: SpeechSignal) {
        match signal {
            SpeechSignal::Started(id) => {
                let Some(active) = self.active.as_mut().filter(|a| a.id == id)
                else {
                    trace!("ignoring start of stale utterance {id}");
                    return;
                };
                if let Some(on_start) = active.on_start.take() {
                    on_start();
                }
            }
            SpeechSignal::Ended(id, result) => {
                if self.active.as_ref().map(|a| a.id) != Some(id) {
                    trace!("ignoring end of stale utterance {id}");
                    return;
                }
                let Some(active) = self.active.take() else {
                    return;
                };
                match result {
                    Ok(()) => debug!("utterance {id} finished"),
                    Err(err) => warn!("utterance {id} failed: {err}"),
                }
                (active.on_end)();
            }
        }
    }
}

impl Drop for SpeechController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Debug for SpeechController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechController")
            .field("active", &self.active.as_ref().map(|a| a.id))
            .finish_non_exhaustive()
    }
}
