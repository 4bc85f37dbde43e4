#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

#[derive(Debug, PartialEq, Eq)]
pub struct Error(pub String);

/// An adapter for streaming byte chunks.
pub enum Chunks {
    Response(Response),
    #[cfg(test)]
    Scripted(VecDeque<Result<Bytes, Error>>),
}

impl Chunks {
    pub fn from_response(response: Response) -> Self {
        Chunks::Response(response)
    }

    #[cfg(test)]
    pub fn from_vec_deque(vec: VecDeque<Bytes>) -> Self {
        Chunks::Scripted(vec.into_iter().map(Ok).collect())
    }

    /// Yields `vec` and then fails, like a connection dropped mid-body.
    #[cfg(test)]
    pub fn failing_after(vec: VecDeque<Bytes>) -> Self {
        let mut script: VecDeque<_> = vec.into_iter().map(Ok).collect();
        script.push_back(Err(Error("connection reset".to_owned())));
        Chunks::Scripted(script)
    }

    #[inline]
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Chunks::Response(response) => {
                response.chunk().await.map_err(|err| Error(format!("{err}")))
            }
            #[cfg(test)]
            Chunks::Scripted(script) => script.pop_front().transpose(),
        }
    }
}
