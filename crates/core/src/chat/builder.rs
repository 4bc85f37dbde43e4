use std::sync::Arc;

use murmur_model::{ChatProvider, SpeechEngine};

use super::observers::Observers;
use super::{Chat, DEFAULT_FALLBACK_REPLY};
use crate::conversation::Message;
use crate::speech::Voice;
use crate::stream_consumer::StreamConsumer;

/// [`Chat`] builder.
pub struct ChatBuilder {
    pub(crate) consumer: StreamConsumer,
    pub(crate) voice: Voice,
    pub(crate) tts_enabled: bool,
    pub(crate) fallback_reply: String,
    pub(crate) observers: Observers,
}

impl ChatBuilder {
    /// Creates a new builder with the specified chat provider.
    ///
    /// Without a speech engine the chat never speaks.
    #[inline]
    pub fn with_provider<P: ChatProvider + 'static>(provider: P) -> Self {
        Self {
            consumer: StreamConsumer::new(provider),
            voice: Voice::silent(),
            tts_enabled: true,
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_owned(),
            observers: Observers::default(),
        }
    }

    /// Sets the engine that speaks assistant replies.
    #[inline]
    pub fn with_speech_engine<E: SpeechEngine + 'static>(
        mut self,
        engine: E,
    ) -> Self {
        self.voice = Voice::new(engine);
        self
    }

    /// Sets whether replies are spoken automatically. Defaults to `true`.
    #[inline]
    pub fn with_tts_enabled(mut self, enabled: bool) -> Self {
        self.tts_enabled = enabled;
        self
    }

    /// Replaces the message recorded when a reply fails.
    #[inline]
    pub fn with_fallback_reply<S: Into<String>>(mut self, reply: S) -> Self {
        self.fallback_reply = reply.into();
        self
    }

    /// Attaches a callback to be invoked for every message appended to the
    /// conversation.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_message = Some(Arc::new(on_message));
        self
    }

    /// Attaches a callback to be invoked for every fragment of a reply
    /// while it streams in.
    ///
    /// The fragments are a preview only, the final message is reported
    /// through [`ChatBuilder::on_message`].
    #[inline]
    pub fn on_fragment(
        mut self,
        on_fragment: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_fragment = Some(Arc::new(on_fragment));
        self
    }

    /// Attaches a callback to be invoked when a reply starts or stops
    /// being awaited.
    #[inline]
    pub fn on_pending(
        mut self,
        on_pending: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_pending = Some(Arc::new(on_pending));
        self
    }

    /// Attaches a callback to be invoked when audio starts or stops.
    #[inline]
    pub fn on_speaking(
        mut self,
        on_speaking: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.observers.on_speaking = Some(Arc::new(on_speaking));
        self
    }

    /// Builds the chat and spawns its task on the current runtime.
    #[inline]
    pub fn build(self) -> Chat {
        Chat::spawn_from_builder(self)
    }
}
