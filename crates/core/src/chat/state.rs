use std::fmt::{self, Debug};
use std::mem;

use murmur_model::Role;
use tokio::sync::oneshot;
use tracing::Instrument;

use super::ChatSnapshot;
use super::mailbox::{Command, Mailbox};
use super::observers::Observers;
use crate::conversation::Conversation;
use crate::speech::{SpeechController, SpeechSignal};
use crate::stream_consumer::{ConsumeResult, StreamConsumer};

/// Whether a request is outstanding.
///
/// Only an idle chat holds the stream consumer, so issuing a request
/// means moving it out, and a second request can't be issued before the
/// first one hands the consumer back.
pub(crate) enum Stage {
    Idle(StreamConsumer),
    Pending,
}

pub(crate) struct ChatState {
    conversation: Conversation,
    stage: Stage,
    tts_enabled: bool,
    speech: SpeechController,
    observers: Observers,
    fallback_reply: String,
}

impl ChatState {
    #[inline]
    pub fn new(
        consumer: StreamConsumer,
        speech: SpeechController,
        tts_enabled: bool,
        fallback_reply: String,
        observers: Observers,
    ) -> Self {
        Self {
            conversation: Conversation::default(),
            stage: Stage::Idle(consumer),
            tts_enabled,
            speech,
            observers,
            fallback_reply,
        }
    }

    #[inline]
    fn is_pending(&self) -> bool {
        matches!(self.stage, Stage::Pending)
    }

    fn submit(&mut self, text: &str, mailbox: &Mailbox) {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring empty input");
            return;
        }
        let consumer = match mem::replace(&mut self.stage, Stage::Pending) {
            Stage::Idle(consumer) => consumer,
            Stage::Pending => {
                debug!("a reply is still pending, ignoring input");
                return;
            }
        };

        // A new turn silences the previous reply.
        self.speech.stop();

        let msg = self.conversation.push(Role::User, text);
        self.observers.message(msg);
        self.observers.pending(true);

        let request = self.conversation.to_request();
        let turn = request.messages.len();
        let on_fragment = self.observers.on_fragment.clone();
        let mailbox = mailbox.clone();
        tokio::spawn(
            async move {
                let result = consumer
                    .consume(request, move |fragment| {
                        if let Some(on_fragment) = &on_fragment {
                            on_fragment(fragment);
                        }
                    })
                    .await;
                mailbox.send(StreamFinished { consumer, result }).ok();
            }
            .instrument(debug_span!("turn", turn)),
        );
    }

    fn finish_stream(
        &mut self,
        consumer: StreamConsumer,
        result: ConsumeResult,
    ) {
        self.stage = Stage::Idle(consumer);
        match result {
            Ok(full_text) => self.on_stream_complete(&full_text),
            Err(err) => {
                warn!("replying with fallback message: {err}");
                self.on_stream_error();
            }
        }
    }

    fn on_stream_complete(&mut self, full_text: &str) {
        let content = full_text.trim();
        let msg = self.conversation.push(Role::Assistant, content);
        self.observers.message(msg);
        self.observers.pending(false);

        if self.tts_enabled && !content.is_empty() {
            self.speak(content.to_owned());
        }
    }

    fn on_stream_error(&mut self) {
        let msg = self
            .conversation
            .push(Role::Assistant, self.fallback_reply.as_str());
        self.observers.message(msg);
        self.observers.pending(false);
    }

    fn replay_last(&mut self) {
        let Some(content) = self
            .conversation
            .last_assistant()
            .map(|msg| msg.content().to_owned())
        else {
            debug!("nothing to replay");
            return;
        };
        self.speak(content);
    }

    fn set_tts_enabled(&mut self, enabled: bool) {
        self.tts_enabled = enabled;
        if !enabled {
            self.speech.stop();
        }
    }

    fn speak(&mut self, text: String) {
        let on_start = {
            let on_speaking = self.observers.on_speaking.clone();
            move || {
                if let Some(on_speaking) = on_speaking {
                    on_speaking(true);
                }
            }
        };
        let on_end = {
            let on_speaking = self.observers.on_speaking.clone();
            move || {
                if let Some(on_speaking) = on_speaking {
                    on_speaking(false);
                }
            }
        };
        self.speech.speak(text, on_start, on_end);
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.conversation.messages().to_vec(),
            pending: self.is_pending(),
            tts_enabled: self.tts_enabled,
            speaking: self.speech.is_audible(),
        }
    }
}

#[derive(Debug)]
pub struct Submit(pub String);

impl Command for Submit {
    fn apply(self: Box<Self>, state: &mut ChatState, mailbox: &Mailbox) {
        state.submit(&self.0, mailbox);
    }
}

#[derive(Debug)]
pub struct ReplayLast;

impl Command for ReplayLast {
    #[inline]
    fn apply(self: Box<Self>, state: &mut ChatState, _mailbox: &Mailbox) {
        state.replay_last();
    }
}

#[derive(Debug)]
pub struct SetTtsEnabled(pub bool);

impl Command for SetTtsEnabled {
    #[inline]
    fn apply(self: Box<Self>, state: &mut ChatState, _mailbox: &Mailbox) {
        state.set_tts_enabled(self.0);
    }
}

#[derive(Debug)]
pub struct StopSpeaking;

impl Command for StopSpeaking {
    #[inline]
    fn apply(self: Box<Self>, state: &mut ChatState, _mailbox: &Mailbox) {
        state.speech.stop();
    }
}

#[derive(Debug)]
pub struct Inspect(pub oneshot::Sender<ChatSnapshot>);

impl Command for Inspect {
    fn apply(self: Box<Self>, state: &mut ChatState, _mailbox: &Mailbox) {
        self.0.send(state.snapshot()).ok();
    }
}

#[derive(Debug)]
pub struct SpeechSignalReceived(pub SpeechSignal);

impl Command for SpeechSignalReceived {
    #[inline]
    fn apply(self: Box<Self>, state: &mut ChatState, _mailbox: &Mailbox) {
        state.speech.handle_signal(self.0);
    }
}

struct StreamFinished {
    consumer: StreamConsumer,
    result: ConsumeResult,
}

impl Debug for StreamFinished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamFinished")
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl Command for StreamFinished {
    fn apply(self: Box<Self>, state: &mut ChatState, _mailbox: &Mailbox) {
        let StreamFinished { consumer, result } = *self;
        state.finish_stream(consumer, result);
    }
}
