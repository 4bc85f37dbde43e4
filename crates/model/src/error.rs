/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The endpoint answered with a non-success status.
    Status,
    /// The request could not be delivered, or the connection broke.
    Transport,
    /// The response body is absent or cannot be read.
    Body,
    /// Any other errors.
    Other,
}
