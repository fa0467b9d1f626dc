//! The writer state machine: drains one outbound HTTP/1.x message to a
//! [`ByteChannel`], requesting body chunks from [`WriteCallbacks`] as the
//! staging buffer empties and framing them when chunked encoding is active.
//!
//! Grounded on `write_chunk`/`write_chunk_sep`/`soup_transfer_write_cb` in
//! `examples/original_source/libsoup/soup-transfer.c`, with the staging
//! buffer reshaped around `bytes::BytesMut` the way
//! `connection::message_writer::MessageWriter` holds its buffer (teacher's
//! crate), rather than the original's `GByteArray` compaction: `BytesMut`'s
//! `Buf::advance` already drops a written prefix without an explicit memmove.
//! The chunk terminator sequencing follows the simplified scheme recorded in
//! `DESIGN.md` (every chunk self-terminates with its own trailing CRLF; the
//! end-of-transfer terminator is always the plain `0\r\n\r\n`), not the
//! original's alternating leading-CRLF framing.

use crate::channel::{ByteChannel, WatchId};
use crate::codec::chunk_encoder::{frame_terminator, ChunkEncoder};
use crate::error::WriteError;
use crate::message::{TransferDecision, WriteEncoding};
use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tokio_util::codec::Encoder;
use tracing::{debug, trace};

/// What a body producer hands back on each `produce` call: optional data to
/// frame and append, plus the usual `Continue`/`End` verdict. A `Some`
/// carrying an empty `Bytes` is treated the same as `None`.
pub struct Produce {
    pub data: Option<Bytes>,
    pub decision: TransferDecision,
}

impl Produce {
    pub fn data(bytes: Bytes) -> Self {
        Self { data: Some(bytes), decision: TransferDecision::Continue }
    }

    pub fn end() -> Self {
        Self { data: None, decision: TransferDecision::End }
    }

    pub fn wait() -> Self {
        Self { data: None, decision: TransferDecision::Continue }
    }
}

/// Callbacks the embedder supplies to a [`Writer`]. See spec §6's callback
/// contract table.
pub trait WriteCallbacks {
    /// Fires exactly once, the first time cumulative drained bytes reach or
    /// cross the header length supplied at construction.
    fn headers_sent(&mut self);

    /// Called whenever the staging buffer has emptied and more body data is
    /// wanted.
    fn produce(&mut self) -> Produce;

    /// Fires once, after the final byte (and, for chunked encoding, the
    /// terminator) has been handed to the channel.
    fn done(&mut self);

    /// Fires once on a channel error or unexpected close. `headers_sent`
    /// tells the caller whether the peer is known to have seen any header
    /// bytes yet.
    fn error(&mut self, headers_sent: bool);
}

/// Drives one outbound message.
pub struct Writer {
    channel: Box<dyn ByteChannel>,
    writable_watch: WatchId,
    error_watch: WatchId,
    staging: BytesMut,
    header_len: u64,
    bytes_drained: u64,
    headers_sent: bool,
    encoding: WriteEncoding,
    chunk_encoder: ChunkEncoder,
    producer_done: bool,
    processing: bool,
    finished: bool,
    callbacks: Box<dyn WriteCallbacks>,
}

impl Writer {
    /// `header` is prepended to the staging buffer verbatim; `initial_body`,
    /// if present, is framed (when `encoding` is `Chunked`) and appended
    /// right after it, exactly as `soup_transfer_write`'s `src` parameter is
    /// folded in before the writable watch is armed.
    pub fn new(
        mut channel: Box<dyn ByteChannel>,
        header: Bytes,
        initial_body: Option<Bytes>,
        encoding: WriteEncoding,
        callbacks: Box<dyn WriteCallbacks>,
    ) -> Self {
        let writable_watch = channel.watch_writable();
        let error_watch = channel.watch_error();

        let header_len = header.len() as u64;
        let mut staging = BytesMut::with_capacity(header.len() + initial_body.as_ref().map_or(0, Bytes::len));
        staging.extend_from_slice(&header);

        let mut writer = Self {
            channel,
            writable_watch,
            error_watch,
            staging,
            header_len,
            bytes_drained: 0,
            headers_sent: false,
            encoding,
            chunk_encoder: ChunkEncoder::new(),
            producer_done: false,
            processing: false,
            finished: false,
            callbacks,
        };

        if let Some(body) = initial_body {
            if !body.is_empty() {
                writer.frame_and_append(body);
            }
        }

        writer
    }

    pub fn set_callbacks(&mut self, callbacks: Box<dyn WriteCallbacks>) {
        self.callbacks = callbacks;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Tears the writer down. A no-op while a callback on this handle is
    /// executing, or once the writer has already finished.
    pub fn cancel(&mut self) {
        if self.processing {
            return;
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.finished {
            return;
        }
        self.channel.unwatch(self.writable_watch);
        self.channel.unwatch(self.error_watch);
        self.finished = true;
    }

    fn frame_and_append(&mut self, body: Bytes) {
        match self.encoding {
            WriteEncoding::Raw => self.staging.extend_from_slice(&body),
            WriteEncoding::Chunked => {
                self.chunk_encoder
                    .encode(body, &mut self.staging)
                    .expect("ChunkEncoder::encode is infallible for in-memory buffers");
            }
        }
    }

    /// Call when the embedder's event loop reports the writable watch fired.
    pub fn on_writable(&mut self) {
        if self.finished {
            return;
        }
        self.drive();
    }

    /// Call when the embedder's event loop reports the error watch fired.
    pub fn on_error_event(&mut self) {
        if self.finished {
            return;
        }
        debug!(error = %WriteError::PeerClosed, "channel hangup/error event");
        let headers_sent = self.headers_sent;
        self.fail(headers_sent);
    }

    /// Alternates draining the staging buffer and asking the producer for
    /// more until the channel would block, the producer has nothing more to
    /// give yet, or the transfer completes. Written as a single loop (the
    /// `WRITE_AGAIN` goto in the original) rather than mutual recursion
    /// between "drain" and "request more" so an embedder whose producer
    /// yields thousands of small chunks in one event doesn't grow the stack.
    fn drive(&mut self) {
        loop {
            loop {
                if self.staging.is_empty() {
                    break;
                }

                match self.channel.write(&self.staging) {
                    Ok(0) => return,
                    Ok(n) => {
                        self.staging.advance(n);
                        self.bytes_drained += n as u64;
                        self.maybe_fire_headers_sent();
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                    Err(e) => {
                        debug!(error = %WriteError::from(e), "channel write error");
                        let headers_sent = self.headers_sent;
                        self.fail(headers_sent);
                        return;
                    }
                }
            }

            if self.producer_done {
                self.finish();
                return;
            }

            self.processing = true;
            let produced = self.callbacks.produce();
            self.processing = false;

            let had_data = match produced.data {
                Some(body) if !body.is_empty() => {
                    self.frame_and_append(body);
                    true
                }
                _ => false,
            };

            if produced.decision.is_end() {
                self.producer_done = true;
                if self.encoding == WriteEncoding::Chunked {
                    frame_terminator(&mut self.staging);
                }
                trace!("write producer signaled end");
            }

            if !had_data && !produced.decision.is_end() {
                // Empty buffer, Continue: nothing more to do this tick. The
                // writer waits to be driven again.
                return;
            }
        }
    }

    fn maybe_fire_headers_sent(&mut self) {
        if !self.headers_sent && self.bytes_drained >= self.header_len {
            self.headers_sent = true;
            self.processing = true;
            self.callbacks.headers_sent();
            self.processing = false;
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        debug!("write finished");
        self.processing = true;
        self.callbacks.done();
        self.processing = false;
        self.teardown();
    }

    fn fail(&mut self, headers_sent: bool) {
        if self.finished {
            return;
        }
        self.processing = true;
        self.callbacks.error(headers_sent);
        self.processing = false;
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChannel;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Recorded {
        headers_sent: bool,
        done: bool,
        error: Option<bool>,
    }

    struct ScriptedCallbacks {
        recorded: Rc<RefCell<Recorded>>,
        script: Vec<Produce>,
    }

    impl WriteCallbacks for ScriptedCallbacks {
        fn headers_sent(&mut self) {
            self.recorded.borrow_mut().headers_sent = true;
        }

        fn produce(&mut self) -> Produce {
            if self.script.is_empty() {
                return Produce::end();
            }
            self.script.remove(0)
        }

        fn done(&mut self) {
            self.recorded.borrow_mut().done = true;
        }

        fn error(&mut self, headers_sent: bool) {
            self.recorded.borrow_mut().error = Some(headers_sent);
        }
    }

    fn writer_with(
        channel: MockChannel,
        header: &[u8],
        initial_body: Option<&[u8]>,
        encoding: WriteEncoding,
        script: Vec<Produce>,
    ) -> (Writer, Rc<RefCell<Recorded>>) {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let callbacks = Box::new(ScriptedCallbacks { recorded: recorded.clone(), script });
        let writer = Writer::new(
            Box::new(channel),
            Bytes::copy_from_slice(header),
            initial_body.map(Bytes::copy_from_slice),
            encoding,
            callbacks,
        );
        (writer, recorded)
    }

    #[test]
    fn raw_header_and_body_written_then_done() {
        let channel = MockChannel::new();
        let (mut writer, recorded) =
            writer_with(channel, b"HEAD\r\n\r\n", Some(b"body"), WriteEncoding::Raw, vec![]);
        writer.on_writable();

        assert!(recorded.borrow().headers_sent);
        assert!(recorded.borrow().done);
        assert!(writer.is_finished());
    }

    #[test]
    fn chunked_producer_emits_two_chunks_then_terminator() {
        let channel = MockChannel::new();
        let script = vec![
            Produce::data(Bytes::from_static(b"hello")),
            Produce::data(Bytes::from_static(b" world")),
            Produce::end(),
        ];
        let (mut writer, recorded) = writer_with(channel, b"", None, WriteEncoding::Chunked, script);
        writer.on_writable();

        assert!(recorded.borrow().done);
        assert!(writer.is_finished());
    }

    #[test]
    fn producer_wait_leaves_writer_armed_without_done() {
        let channel = MockChannel::new();
        let script = vec![Produce::wait()];
        let (mut writer, recorded) = writer_with(channel, b"", None, WriteEncoding::Raw, script);
        writer.on_writable();

        assert!(!recorded.borrow().done);
        assert!(!writer.is_finished());
    }

    #[test]
    fn header_sent_fires_once_cumulative_bytes_cross_header_len_despite_partial_writes() {
        let mut channel = MockChannel::new();
        channel.set_write_limit(Some(2));
        let (mut writer, recorded) = writer_with(channel, b"HEAD", None, WriteEncoding::Raw, vec![]);
        // Capping writes at 2 bytes forces `drain` to cross `header_len`
        // across two internal `write` calls before the buffer empties; the
        // callback must still fire exactly once, not once per write.
        writer.on_writable();
        assert!(recorded.borrow().headers_sent);
        assert!(writer.is_finished());
    }

    #[test]
    fn write_error_reports_headers_sent_flag() {
        let mut channel = MockChannel::new();
        channel.fail_next_write(io::ErrorKind::ConnectionReset);
        let (mut writer, recorded) = writer_with(channel, b"HEAD", None, WriteEncoding::Raw, vec![]);
        writer.on_writable();

        assert_eq!(recorded.borrow().error, Some(false));
        assert!(writer.is_finished());
    }

    #[test]
    fn cancel_is_idempotent() {
        let channel = MockChannel::new();
        let (mut writer, _recorded) = writer_with(channel, b"", None, WriteEncoding::Raw, vec![Produce::end()]);
        writer.cancel();
        writer.cancel();
        assert!(writer.is_finished());
    }
}
