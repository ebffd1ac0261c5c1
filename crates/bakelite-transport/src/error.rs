/// Errors that can occur on an endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream (read returned end-of-file).
    #[error("transport closed by peer")]
    Closed,

    /// The stream accepted zero bytes of a non-empty write.
    #[error("transport wrote zero bytes ({remaining} bytes pending)")]
    WriteZero { remaining: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
