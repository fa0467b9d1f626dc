//! Chunked transfer-coding primitives shared by the reader and writer.
//!
//! - [`chunked`] decodes inbound chunk framing in batched passes over the
//!   receive buffer.
//! - [`chunk_encoder`] frames outbound chunk bodies for the writer.

pub mod chunk_encoder;
pub mod chunked;

pub use chunk_encoder::{frame_terminator, ChunkEncoder};
pub use chunked::{decode_chunk, ChunkProgress, ChunkState};
