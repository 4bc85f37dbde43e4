//! Conversation orchestration for a streaming, speaking chat client.
//!
//! A [`Chat`] owns the message history, the one outstanding request to
//! the generation endpoint, and the one utterance being spoken. All of
//! them are mutated on a single task, commands from the handle and
//! completions of the request or the utterance are processed there in
//! arrival order.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod chat;
pub mod conversation;
mod error;
mod speech;
mod stream_consumer;

pub use chat::{Chat, ChatBuilder, ChatSnapshot, DEFAULT_FALLBACK_REPLY};
pub use error::ChatClosedError;
