//! The non-blocking HTTP/1.x message transfer engine.
//!
//! This crate drives one request-or-response message across one byte-stream
//! endpoint: it parses the header/body boundary, decodes the body under
//! whichever framing the peer declared, and delivers decoded payload to the
//! embedder through a small callback contract, symmetrically for writes,
//! including on-demand chunk framing.
//!
//! - [`channel`]: the abstract non-blocking duplex byte stream the engine
//!   is driven over.
//! - [`buffer`]: the growable, in-place-compacting receive buffer.
//! - [`codec`]: the chunked transfer-coding codec, decode and encode sides.
//! - [`reader`]: the inbound state machine and its callback trait.
//! - [`writer`]: the outbound state machine and its callback trait.
//! - [`engine`]: an opaque-handle registry for embedders hosting many
//!   concurrent transfers behind one event loop.
//! - [`message`]: shared data-model types (`TransferEncoding`,
//!   `TransferDecision`, ...).
//! - [`error`]: `ReadError`/`WriteError`.
//! - [`testing`]: an in-memory `ByteChannel` for tests and embedders.

pub mod buffer;
pub mod channel;
pub mod codec;
pub mod engine;
pub mod error;
pub mod message;
pub mod reader;
pub mod testing;
pub mod writer;

pub use channel::ByteChannel;
pub use engine::{ReadEngine, ReaderHandle, WriteEngine, WriterHandle};
pub use error::{ReadError, WriteError};
pub use message::{HeadersDecision, TransferDecision, TransferEncoding, WriteEncoding};
pub use reader::{ReadCallbacks, Reader};
pub use writer::{Produce, WriteCallbacks, Writer};
