//! The chunked transfer-coding decoder.
//!
//! Ground truth: `decode_chunk`/`decode_hex` in
//! `examples/original_source/libsoup/soup-transfer.c`. Unlike a
//! byte-at-a-time [`tokio_util::codec::Decoder`] state machine (the shape
//! `foldright-micro-http`'s `ChunkedDecoder` uses), this decoder batches
//! every complete chunk currently sitting in the buffer into one pass and
//! reports the total newly-available span, because the reader needs to hand
//! a single contiguous `[0, idx)` view to its `chunk` callback rather than
//! one callback per chunk.

use crate::buffer::ByteBuf;
use crate::error::ReadError;

/// Decode progress carried across `read()` calls. `idx` is the offset in the
/// buffer where the current (possibly still-incomplete) chunk's body
/// begins; `len` is how many bytes of that chunk remain to be received, or,
/// once fully received, its decoded length awaiting compaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkState {
    pub idx: usize,
    pub len: u64,
}

/// The result of one `decode_chunk` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    /// Bytes newly available at the head of the buffer this pass.
    pub datalen: usize,
    /// Whether the terminating zero-length chunk was consumed.
    pub done: bool,
}

/// Runs the decode loop described in spec §4.3 until a partial chunk header
/// blocks further progress. Restartable: all progress lives in `state` plus
/// `buf`, so a short read just means this returns early and is called again
/// once more bytes arrive.
pub fn decode_chunk(buf: &mut ByteBuf, state: &mut ChunkState) -> Result<ChunkProgress, ReadError> {
    let mut datalen = 0usize;
    let mut done = false;

    loop {
        // Smallest possible next chunk header is "0\r\n\r\n", five bytes.
        if state.idx as u64 + state.len + 5 > buf.len() as u64 {
            break;
        }

        // A previously-completed chunk body's own trailing CRLF sits right
        // at `idx + len`; the header line we're looking for starts past it.
        let anchor = if state.len > 0 { state.idx + state.len as usize + 2 } else { state.idx };

        let Some(rel) = find_crlf(&buf.as_slice()[anchor..]) else {
            break;
        };

        if state.len > 0 {
            buf.remove_block(state.idx + state.len as usize, 2);
        }

        let header_start = state.idx + state.len as usize;
        let line_len = rel;

        let new_len = decode_hex(&buf.as_slice()[header_start..header_start + line_len])?;

        state.idx += state.len as usize;
        datalen += state.len as usize;
        state.len = new_len;

        let mut region_len = line_len + 2;
        if state.len == 0 {
            // Terminal chunk: its header line is immediately followed by the
            // message's final CRLF, both get compacted out here.
            region_len += 2;
            done = true;
        }

        buf.remove_block(state.idx, region_len);
    }

    Ok(ChunkProgress { datalen, done })
}

/// Position of the first `\r\n` in `haystack`, or `None` if not (yet) present.
fn find_crlf(haystack: &[u8]) -> Option<usize> {
    haystack.windows(2).position(|w| w == b"\r\n")
}

/// Parses leading hex digits (case-insensitive) into a chunk length,
/// tolerating non-hex extension bytes after them (the caller has already
/// located where the whole header line ends). A line with no leading hex
/// digit at all decodes as length zero, the documented permissive-hex
/// limitation from spec §9: a malformed leading byte silently reads as a
/// zero-length (i.e. terminal) chunk rather than raising an error.
fn decode_hex(line: &[u8]) -> Result<u64, ReadError> {
    let mut value: u64 = 0;
    for &b in line {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => break,
        };
        value = value
            .checked_mul(16)
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or_else(|| ReadError::invalid_chunk_framing("chunk size overflow"))?;
    }
    Ok(value)
}
