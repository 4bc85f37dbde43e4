use murmur_core::conversation::Message;
use murmur_core::{Chat, ChatBuilder, ChatClosedError, ChatSnapshot};
use murmur_model::{ChatProvider, SpeechEngine};

use crate::CommandSpeechEngine;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    chat_builder: ChatBuilder,
    has_speech_engine: bool,
}

impl SessionBuilder {
    /// Creates a session builder with a specified chat provider.
    pub fn with_provider<P: ChatProvider + 'static>(provider: P) -> Self {
        let chat_builder = ChatBuilder::with_provider(provider);
        Self {
            chat_builder,
            has_speech_engine: false,
        }
    }

    /// Sets the speech engine. The host's speech program is used if none
    /// is set.
    #[inline]
    pub fn with_speech_engine<E: SpeechEngine + 'static>(
        mut self,
        engine: E,
    ) -> Self {
        self.chat_builder = self.chat_builder.with_speech_engine(engine);
        self.has_speech_engine = true;
        self
    }

    /// Sets whether replies are spoken automatically.
    #[inline]
    pub fn with_voice(mut self, enabled: bool) -> Self {
        self.chat_builder = self.chat_builder.with_tts_enabled(enabled);
        self
    }

    /// Attaches a callback to be invoked when a message is added.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.chat_builder = self.chat_builder.on_message(on_message);
        self
    }

    /// Attaches a callback to be invoked for every streamed fragment of a
    /// reply.
    #[inline]
    pub fn on_fragment(
        mut self,
        on_fragment: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.chat_builder = self.chat_builder.on_fragment(on_fragment);
        self
    }

    /// Attaches a callback to be invoked when waiting for a reply starts or
    /// ends.
    #[inline]
    pub fn on_pending(
        mut self,
        on_pending: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.chat_builder = self.chat_builder.on_pending(on_pending);
        self
    }

    /// Attaches a callback to be invoked when speaking starts or ends.
    #[inline]
    pub fn on_speaking(
        mut self,
        on_speaking: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        self.chat_builder = self.chat_builder.on_speaking(on_speaking);
        self
    }

    /// Builds a new session. Must be called within a Tokio runtime.
    pub fn build(self) -> Session {
        let mut chat_builder = self.chat_builder;
        if !self.has_speech_engine {
            chat_builder =
                chat_builder.with_speech_engine(CommandSpeechEngine::detect());
        }
        Session {
            chat: chat_builder.build(),
        }
    }
}

/// A chat session, like a window that displays messages and has a input
/// box with a voice toggle and a replay button.
///
/// It is basically a wrapper around [`Chat`].
#[derive(Clone)]
pub struct Session {
    chat: Chat,
}

impl Session {
    /// Sends a message to the session.
    #[inline]
    pub fn send_message(&self, message: &str) -> Result<(), ChatClosedError> {
        self.chat.submit(message)
    }

    /// Speaks the latest reply again.
    #[inline]
    pub fn replay_last(&self) -> Result<(), ChatClosedError> {
        self.chat.replay_last()
    }

    /// Turns automatic speech on or off.
    #[inline]
    pub fn set_voice(&self, enabled: bool) -> Result<(), ChatClosedError> {
        self.chat.set_tts_enabled(enabled)
    }

    /// Silences the current reply.
    #[inline]
    pub fn stop_speaking(&self) -> Result<(), ChatClosedError> {
        self.chat.stop_speaking()
    }

    /// Returns what the session currently looks like.
    #[inline]
    pub async fn snapshot(&self) -> Result<ChatSnapshot, ChatClosedError> {
        self.chat.snapshot().await
    }
}
