//! The reader state machine: drives one inbound HTTP/1.x message across a
//! [`ByteChannel`], delivering header and body data through [`ReadCallbacks`].
//!
//! Grounded on `soup_transfer_read_cb`/`read_chunk`/`read_content_length`/
//! `read_unknown`/`soup_transfer_read_error_cb` in
//! `examples/original_source/libsoup/soup-transfer.c`: one header scan per
//! readable event, one body step per event, the `IGNORE_CANCEL`/
//! `UNIGNORE_CANCEL` reentrancy bracket translated to `processing` toggled
//! only around each callback invocation (§5).

use crate::buffer::ByteBuf;
use crate::channel::{ByteChannel, WatchId};
use crate::codec::chunked::{decode_chunk, ChunkState};
use crate::error::ReadError;
use crate::message::{HeadersDecision, TransferDecision, TransferEncoding};
use bytes::Bytes;
use std::io;
use tracing::{debug, trace};

/// Size of the scratch buffer used to pull bytes off the channel before
/// appending them to the receive buffer, mirroring the fixed
/// `read_buf[RESPONSE_BLOCK_SIZE]` stack buffer in the original.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Callbacks the embedder supplies to a [`Reader`]. See spec §6's callback
/// contract table.
pub trait ReadCallbacks {
    /// Fires exactly once, when the `\r\n\r\n` boundary is located. `headers`
    /// includes the terminating blank line.
    fn headers_done(&mut self, headers: &[u8]) -> HeadersDecision;

    /// Fires once per newly-available span of body bytes.
    fn chunk(&mut self, data: &[u8]) -> TransferDecision;

    /// Fires once, at the natural end of a transfer that wasn't cut short by
    /// `End`: carries the accumulated body (or an empty buffer, in streaming
    /// mode).
    fn done(&mut self, body: Bytes);

    /// Fires once on a channel error or an unexpected close. `body_started`
    /// tells the caller whether any body bytes had already arrived.
    fn error(&mut self, body_started: bool);
}

/// Tracks the outcome of one `try_scan_headers` attempt.
enum HeaderScan {
    NeedMore,
    Found,
    /// The headers-done callback requested `End`; the reader already tore
    /// itself down.
    Ended,
}

/// Drives one inbound message. Owns its channel, its receive buffer, and its
/// callback set exclusively; destroyed by [`Reader::cancel`] or at natural
/// end-of-transfer.
pub struct Reader {
    channel: Box<dyn ByteChannel>,
    readable_watch: WatchId,
    error_watch: WatchId,
    recv_buf: ByteBuf,
    header_len: usize,
    encoding: TransferEncoding,
    content_length: u64,
    chunk_state: ChunkState,
    overwrite_chunks: bool,
    callback_issued: bool,
    processing: bool,
    /// Bytes of the current body already handed to `chunk` in non-overwrite
    /// mode, so the next tail can be computed without re-deriving it from
    /// per-read byte counts (spec §3's added-field note).
    delivered_len: u64,
    /// Set once any body byte has been handed to `chunk`, independent of
    /// buffer bookkeeping: drives the `body_started` flag an `error`
    /// callback receives when the channel ends mid-body.
    body_seen: bool,
    finished: bool,
    callbacks: Box<dyn ReadCallbacks>,
    read_chunk_size: usize,
}

impl Reader {
    pub fn new(mut channel: Box<dyn ByteChannel>, overwrite_chunks: bool, callbacks: Box<dyn ReadCallbacks>) -> Self {
        let readable_watch = channel.watch_readable();
        let error_watch = channel.watch_error();
        Self {
            channel,
            readable_watch,
            error_watch,
            recv_buf: ByteBuf::new(),
            header_len: 0,
            encoding: TransferEncoding::Unknown,
            content_length: 0,
            chunk_state: ChunkState::default(),
            overwrite_chunks,
            callback_issued: false,
            processing: false,
            delivered_len: 0,
            body_seen: false,
            finished: false,
            callbacks,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    /// Replaces the callback set. Must not be called from inside one of this
    /// reader's own callbacks.
    pub fn set_callbacks(&mut self, callbacks: Box<dyn ReadCallbacks>) {
        self.callbacks = callbacks;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Tears the reader down: unwatches the channel and frees the receive
    /// buffer. A no-op if a callback on this handle is currently executing
    /// (the callback must return `End` instead, see spec §5) or if the
    /// reader has already finished.
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
        self.channel.unwatch(self.readable_watch);
        self.channel.unwatch(self.error_watch);
        self.finished = true;
    }

    /// Call when the embedder's event loop reports the readable watch fired.
    ///
    /// Drains the channel into the receive buffer, processes whatever
    /// arrived, and only then acts on an EOF or error observed partway
    /// through the drain: data that arrived before the channel closed still
    /// gets parsed and delivered first.
    pub fn on_readable(&mut self) {
        if self.finished {
            return;
        }

        let mut scratch = vec![0u8; self.read_chunk_size];
        let mut total_read = 0usize;
        let mut ended = false;

        loop {
            match self.channel.read(&mut scratch) {
                Ok(0) => {
                    trace!(error = %ReadError::PeerClosed, "read returned eof");
                    ended = true;
                    break;
                }
                Ok(n) => {
                    self.recv_buf.append(&scratch[..n]);
                    total_read += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    debug!(error = %ReadError::from(e), "channel read error");
                    ended = true;
                    break;
                }
            }
        }

        if total_read > 0 {
            self.drive();
        }

        if ended && !self.finished {
            self.handle_channel_end();
        }
    }

    /// Call when the embedder's event loop reports the error watch fired
    /// (hangup / error / invalid).
    pub fn on_error_event(&mut self) {
        if self.finished {
            return;
        }
        self.handle_channel_end();
    }

    fn drive(&mut self) {
        if self.header_len == 0 {
            match self.try_scan_headers() {
                HeaderScan::NeedMore | HeaderScan::Ended => return,
                HeaderScan::Found => {}
            }
        }
        self.step_body();
    }

    fn try_scan_headers(&mut self) -> HeaderScan {
        let Some(pos) = find_subsequence(self.recv_buf.as_slice(), b"\r\n\r\n") else {
            return HeaderScan::NeedMore;
        };
        let header_len = pos + 4;

        self.processing = true;
        let decision = self.callbacks.headers_done(&self.recv_buf.as_slice()[..header_len]);
        self.processing = false;
        debug!(header_len, "headers located");

        match decision {
            HeadersDecision::End => {
                self.teardown();
                HeaderScan::Ended
            }
            HeadersDecision::UseEncoding(encoding) => {
                if let TransferEncoding::ContentLength(n) = encoding {
                    self.content_length = n;
                }
                self.encoding = encoding;
                self.recv_buf.remove_block(0, header_len);
                self.header_len = header_len;
                HeaderScan::Found
            }
        }
    }

    fn step_body(&mut self) {
        match self.encoding {
            TransferEncoding::Chunked => self.step_chunked(),
            TransferEncoding::ContentLength(_) => self.step_bounded(),
            TransferEncoding::Unknown => self.step_unbounded(),
        }
    }

    fn step_chunked(&mut self) {
        let progress = match decode_chunk(&mut self.recv_buf, &mut self.chunk_state) {
            Ok(progress) => progress,
            Err(e) => {
                debug!(error = %e, "invalid chunk framing");
                let body_started = self.body_seen;
                self.fail(body_started);
                return;
            }
        };

        if progress.datalen > 0 {
            self.body_seen = true;
            let data_end = self.chunk_state.idx;
            trace!(len = data_end, "read chunked bytes");

            self.processing = true;
            let decision = self.callbacks.chunk(&self.recv_buf.as_slice()[..data_end]);
            self.callback_issued = true;
            self.processing = false;

            if decision.is_end() {
                self.teardown();
                return;
            }

            if self.overwrite_chunks {
                self.recv_buf.remove_block(0, data_end);
                self.chunk_state.idx = 0;
            }
        }

        if progress.done {
            self.finish();
        }
    }

    /// `ContentLength` body delivery. Named `step_bounded` rather than
    /// `step_content_length` because the uniform-tail bookkeeping below is
    /// identical to what a future bounded framing would need.
    fn step_bounded(&mut self) {
        let new_tail = self.current_tail();
        if new_tail.is_empty() {
            if self.content_length == 0 {
                self.finish();
            }
            return;
        }

        let delivered_now = new_tail.len() as u64;
        self.body_seen = true;
        self.processing = true;
        let decision = self.callbacks.chunk(new_tail);
        self.callback_issued = true;
        self.processing = false;

        if decision.is_end() {
            self.teardown();
            return;
        }

        self.content_length = self.content_length.saturating_sub(delivered_now);
        self.advance_tail(delivered_now);

        if self.content_length == 0 {
            self.finish();
        }
    }

    fn step_unbounded(&mut self) {
        let new_tail = self.current_tail();
        if new_tail.is_empty() {
            return;
        }

        let delivered_now = new_tail.len() as u64;
        self.body_seen = true;
        self.processing = true;
        let decision = self.callbacks.chunk(new_tail);
        self.callback_issued = true;
        self.processing = false;

        if decision.is_end() {
            self.teardown();
            return;
        }

        self.advance_tail(delivered_now);
        // Completion for Unknown only happens on channel close (handle_channel_end).
    }

    fn current_tail(&self) -> &[u8] {
        if self.overwrite_chunks {
            self.recv_buf.as_slice()
        } else {
            &self.recv_buf.as_slice()[self.delivered_len as usize..]
        }
    }

    fn advance_tail(&mut self, delivered_now: u64) {
        if self.overwrite_chunks {
            self.recv_buf.clear();
            self.delivered_len = 0;
        } else {
            self.delivered_len += delivered_now;
        }
    }

    /// Any close/EOF/error on the channel. For `Unknown` encoding this is
    /// always a normal completion (HTTP/1.0 close-delimited bodies end this
    /// way by design); for `ContentLength`/`Chunked` it is surfaced via the
    /// `error` callback, with `body_started` reflecting whether any body
    /// byte had already reached `chunk` before the channel ended.
    fn handle_channel_end(&mut self) {
        if self.finished {
            return;
        }
        if self.encoding.is_unknown() {
            self.finish();
        } else {
            let body_started = self.body_seen;
            self.fail(body_started);
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        let body = Bytes::from(self.recv_buf.take());
        debug!(len = body.len(), "transfer finished");
        self.processing = true;
        self.callback_issued = true;
        self.callbacks.done(body);
        self.processing = false;
        self.teardown();
    }

    fn fail(&mut self, body_started: bool) {
        if self.finished {
            return;
        }
        self.processing = true;
        self.callbacks.error(body_started);
        self.processing = false;
        self.teardown();
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
