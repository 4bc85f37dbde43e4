mod chunks;
mod decoder;
mod text;

pub use chunks::{Chunks, Error as ChunksError};
pub use decoder::Utf8Decoder;
pub use text::TextStream;
