//! An out-of-the-box voice chat client that speaks the replies of a
//! streaming text endpoint.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring the chat into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod session;
mod speech;

pub use session::{Session, SessionBuilder};
pub use speech::CommandSpeechEngine;

/// Re-exports of [`murmur_core`] crate.
pub mod core {
    pub use murmur_core::*;
}
