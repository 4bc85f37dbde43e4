use std::sync::Arc;

use crate::conversation::Message;

pub(crate) type MessageFn = Arc<dyn Fn(&Message) + Send + Sync>;
pub(crate) type FragmentFn = Arc<dyn Fn(&str) + Send + Sync>;
pub(crate) type FlagFn = Arc<dyn Fn(bool) + Send + Sync>;

/// Callbacks registered by whoever renders the chat.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    pub on_message: Option<MessageFn>,
    pub on_fragment: Option<FragmentFn>,
    pub on_pending: Option<FlagFn>,
    pub on_speaking: Option<FlagFn>,
}

impl Observers {
    #[inline]
    pub fn message(&self, msg: &Message) {
        if let Some(on_message) = &self.on_message {
            on_message(msg);
        }
    }

    #[inline]
    pub fn pending(&self, pending: bool) {
        if let Some(on_pending) = &self.on_pending {
            on_pending(pending);
        }
    }
}
