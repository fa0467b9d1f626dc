//! Data-model types shared by the reader and writer state machines.

/// How the body's length is determined from the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// Exactly `n` body bytes follow the headers.
    ContentLength(u64),
    /// A series of hex-length-prefixed chunks terminated by a zero-length chunk.
    Chunked,
    /// The body extends until the channel hangs up (HTTP/1.0 style).
    Unknown,
}

impl TransferEncoding {
    pub fn is_chunked(&self) -> bool {
        matches!(self, TransferEncoding::Chunked)
    }

    pub fn is_content_length(&self) -> bool {
        matches!(self, TransferEncoding::ContentLength(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TransferEncoding::Unknown)
    }
}

/// The verdict a body callback returns after seeing a chunk of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDecision {
    /// More data is expected (read side) or will be produced (write side).
    Continue,
    /// Stop the transfer cleanly; no further callbacks fire for this handle.
    End,
}

impl TransferDecision {
    pub fn is_end(&self) -> bool {
        matches!(self, TransferDecision::End)
    }
}

/// The verdict the headers-done callback returns: either it chose an
/// encoding and the transfer proceeds into the body, or it asked to end the
/// transfer before any body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadersDecision {
    UseEncoding(TransferEncoding),
    End,
}

/// How the writer frames outbound body bytes. Narrower than
/// [`TransferEncoding`]: a writer never needs a declared length (the
/// embedder supplies exactly as many bytes as it means to send) and never
/// writes a close-delimited body (the channel's own close ends the
/// connection, not the transfer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEncoding {
    /// Body bytes are appended to the staging buffer unframed.
    Raw,
    /// Each body chunk is wrapped in hex-length framing; the producer's
    /// `End` appends the terminating zero-length chunk.
    Chunked,
}
