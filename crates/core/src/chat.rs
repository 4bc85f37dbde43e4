mod builder;
mod mailbox;
mod observers;
mod state;

use tokio::sync::oneshot;
use tracing::Instrument;

use crate::ChatClosedError;
use crate::conversation::Message;
use crate::speech::SpeechController;
pub use builder::ChatBuilder;
use mailbox::{Mailbox, run_chat};
use state::{
    ChatState, Inspect, ReplayLast, SetTtsEnabled, SpeechSignalReceived,
    StopSpeaking, Submit,
};

/// The assistant message recorded when a reply can't be obtained.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Sorry, I couldn't generate a response.";

/// A point-in-time view of a chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatSnapshot {
    /// All messages, oldest first.
    pub messages: Vec<Message>,
    /// Whether a reply is being awaited.
    pub pending: bool,
    /// Whether replies are spoken automatically.
    pub tts_enabled: bool,
    /// Whether audio is playing, that is, the active utterance has started
    /// and not ended yet. Agrees with the `on_speaking` observer.
    pub speaking: bool,
}

/// A handle to a running chat.
///
/// Every method only enqueues a command, which the chat task processes in
/// order. The task stops once every handle is dropped, silencing whatever
/// is being spoken.
///
/// Input that arrives while a reply is pending is ignored, not queued.
#[derive(Clone)]
pub struct Chat {
    mailbox: Mailbox,
}

impl Chat {
    /// Submits user input.
    ///
    /// The input is trimmed first. Blank input and input submitted while
    /// another reply is pending are ignored.
    #[inline]
    pub fn submit<S: Into<String>>(
        &self,
        text: S,
    ) -> Result<(), ChatClosedError> {
        self.mailbox.send(Submit(text.into()))
    }

    /// Speaks the most recent assistant message again, regardless of
    /// whether automatic speech is enabled.
    #[inline]
    pub fn replay_last(&self) -> Result<(), ChatClosedError> {
        self.mailbox.send(ReplayLast)
    }

    /// Turns automatic speech on or off. Turning it off also stops the
    /// active utterance.
    #[inline]
    pub fn set_tts_enabled(
        &self,
        enabled: bool,
    ) -> Result<(), ChatClosedError> {
        self.mailbox.send(SetTtsEnabled(enabled))
    }

    /// Stops the active utterance, if any.
    #[inline]
    pub fn stop_speaking(&self) -> Result<(), ChatClosedError> {
        self.mailbox.send(StopSpeaking)
    }

    /// Returns the current state once every command sent before has been
    /// processed.
    pub async fn snapshot(&self) -> Result<ChatSnapshot, ChatClosedError> {
        let (tx, rx) = oneshot::channel();
        self.mailbox.send(Inspect(tx))?;
        rx.await.map_err(|_| ChatClosedError)
    }
}

impl Chat {
    fn spawn_from_builder(builder: ChatBuilder) -> Self {
        let ChatBuilder {
            consumer,
            voice,
            tts_enabled,
            fallback_reply,
            observers,
        } = builder;

        let (mailbox, command_rx) = Mailbox::new();
        let weak_mailbox = mailbox.downgrade();

        let speech = SpeechController::new(voice, {
            let weak_mailbox = weak_mailbox.clone();
            move |signal| {
                if let Some(mailbox) = weak_mailbox.upgrade() {
                    mailbox.send(SpeechSignalReceived(signal)).ok();
                }
            }
        });
        let state = ChatState::new(
            consumer,
            speech,
            tts_enabled,
            fallback_reply,
            observers,
        );

        tokio::spawn(
            run_chat(weak_mailbox, state, command_rx)
                .instrument(debug_span!("chat")),
        );
        Self { mailbox }
    }
}
