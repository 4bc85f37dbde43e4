use super::{Chunks, ChunksError, Utf8Decoder};

/// A type for reading text fragments from a chunk stream.
pub struct TextStream {
    chunks: Chunks,
    decoder: Utf8Decoder,
    finished: bool,
}

impl TextStream {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            chunks,
            decoder: Utf8Decoder::new(),
            finished: false,
        }
    }

    /// Reads the next non-empty text fragment.
    pub async fn next_fragment(
        &mut self,
    ) -> Result<Option<String>, ChunksError> {
        while !self.finished {
            let Some(bytes) = self.chunks.next_chunk().await? else {
                self.finished = true;
                return Ok(self.decoder.finish());
            };
            let fragment = self.decoder.decode(&bytes);
            // A chunk holding only part of a character yields nothing yet.
            if !fragment.is_empty() {
                return Ok(Some(fragment));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[tokio::test]
    async fn test_fragments_in_order() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"- point one\n"),
                Bytes::from_static(b"- point two"),
            ]
            .into(),
        );
        let mut text = TextStream::new(chunks);
        assert_eq!(
            text.next_fragment().await.unwrap().unwrap(),
            "- point one\n"
        );
        assert_eq!(text.next_fragment().await.unwrap().unwrap(), "- point two");
        assert_eq!(text.next_fragment().await.unwrap(), None);
        assert_eq!(text.next_fragment().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_partial_character_is_held_back() {
        let euro = "€".as_bytes();
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"5 "),
                Bytes::copy_from_slice(&euro[..1]),
                Bytes::copy_from_slice(&euro[1..]),
            ]
            .into(),
        );
        let mut text = TextStream::new(chunks);
        assert_eq!(text.next_fragment().await.unwrap().unwrap(), "5 ");
        assert_eq!(text.next_fragment().await.unwrap().unwrap(), "€");
        assert_eq!(text.next_fragment().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_failure() {
        let chunks = Chunks::failing_after(
            vec![Bytes::from_static(b"partial")].into(),
        );
        let mut text = TextStream::new(chunks);
        assert_eq!(text.next_fragment().await.unwrap().unwrap(), "partial");
        assert!(text.next_fragment().await.is_err());
    }
}
