use std::borrow::Cow;
use std::char::REPLACEMENT_CHARACTER;
use std::mem;

/// An incremental UTF-8 decoder.
///
/// Chunks from the network have no alignment with character boundaries,
/// a multi-byte sequence can be split across any number of chunks. The
/// decoder holds back an incomplete trailing sequence until the bytes
/// completing it arrive. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `bytes` (prefixed by held back bytes) as can be
    /// decoded now.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let buf: Cow<'_, [u8]> = if self.pending.is_empty() {
            Cow::Borrowed(bytes)
        } else {
            let mut buf = mem::take(&mut self.pending);
            buf.extend_from_slice(bytes);
            Cow::Owned(buf)
        };

        let mut out = String::with_capacity(buf.len());
        let mut rest = &buf[..];
        loop {
            match str::from_utf8(rest) {
                Ok(s) => {
                    out.push_str(s);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete sequence at the end, wait for more.
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flushes the decoder at end of input.
    ///
    /// Returns U+FFFD if a truncated sequence was still held back.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        trace!("dropping {} truncated bytes", self.pending.len());
        self.pending.clear();
        Some(REPLACEMENT_CHARACTER.to_string())
    }
}
