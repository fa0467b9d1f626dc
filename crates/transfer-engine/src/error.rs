//! Error types for the read and write sides of the transfer engine.
//!
//! Errors never unwind through a callback: they are delivered by invoking the
//! registered `error` callback exactly once, then tearing the handle down
//! synchronously.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("channel error: {source}")]
    Channel {
        #[from]
        source: io::Error,
    },

    /// The peer closed the connection.
    #[error("peer closed the connection")]
    PeerClosed,

    /// Chunk framing could not be decoded (hex-length overflow). A
    /// non-hex leading byte is not routed here, see `codec::chunked`'s
    /// documented tolerance.
    #[error("invalid chunk framing: {reason}")]
    InvalidChunkFraming { reason: String },
}

impl ReadError {
    pub fn invalid_chunk_framing<S: ToString>(reason: S) -> Self {
        Self::InvalidChunkFraming { reason: reason.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("channel error: {source}")]
    Channel {
        #[from]
        source: io::Error,
    },

    #[error("peer closed the connection")]
    PeerClosed,
}
