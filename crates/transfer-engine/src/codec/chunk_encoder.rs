//! Write-side chunk framing.
//!
//! Grounded on `codec/body/chunked_encoder.rs` in the teacher almost
//! verbatim: writes `"{:x}\r\n"` followed by the chunk body and a
//! terminating CRLF. Per the writer terminator-sequencing decision in
//! `DESIGN.md` (spec §9 Open Question #2), every chunk, first or not,
//! gets the same `<hex>\r\n<body>\r\n` framing, and the end-of-transfer
//! terminator is always the plain `0\r\n\r\n` sequence regardless of how
//! many chunks preceded it.

use bytes::{Buf, Bytes, BytesMut};
use std::io::Write;
use tokio_util::codec::Encoder;

/// A `tokio_util::codec::Encoder` that frames one chunk body per `encode` call.
#[derive(Debug, Default)]
pub struct ChunkEncoder;

impl ChunkEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Bytes> for ChunkEncoder {
    type Error = std::io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write!(helper::Writer(dst), "{:x}\r\n", item.remaining())?;
        dst.reserve(item.remaining() + 2);
        dst.extend_from_slice(item.chunk());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

/// Appends the terminator a chunked writer emits once its producer signals
/// `End`.
pub fn frame_terminator(dst: &mut BytesMut) {
    dst.extend_from_slice(b"0\r\n\r\n");
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_one_chunk_with_hex_length() {
        let mut encoder = ChunkEncoder::new();
        let mut dst = BytesMut::new();
        encoder.encode(Bytes::from_static(b"hi"), &mut dst).unwrap();
        assert_eq!(&dst[..], b"2\r\nhi\r\n");
    }

    #[test]
    fn frames_two_chunks_then_terminator() {
        let mut encoder = ChunkEncoder::new();
        let mut dst = BytesMut::new();
        encoder.encode(Bytes::from_static(b"hello"), &mut dst).unwrap();
        encoder.encode(Bytes::from_static(b" world"), &mut dst).unwrap();
        frame_terminator(&mut dst);
        assert_eq!(&dst[..], b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n");
    }
}
