//! Protocols shared with the external collaborators of a chat client.
//!
//! A chat client talks to two things it doesn't own: a text-generation
//! endpoint that streams a reply, and a speech engine that reads a reply
//! aloud. This crate describes both of them as traits, together with the
//! plain data that crosses those boundaries.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;
mod speech;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
pub use speech::*;
