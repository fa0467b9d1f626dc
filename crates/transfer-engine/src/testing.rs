//! An in-memory [`ByteChannel`] for tests and embedders bootstrapping against
//! the engine before they have a real socket wired up.
//!
//! Grounded on the `MockIO` `AsyncRead`/`AsyncWrite` fixture in
//! `crates/http/benches/http_bench.rs`, adapted from the async poll contract
//! to this crate's synchronous `io::Result<usize>` contract: reads drain a
//! queued byte sequence and return `WouldBlock` once it's empty (unless the
//! channel has been [`MockChannel::close`]d, in which case an empty queue
//! reads as orderly EOF); writes land in an inspectable buffer, optionally
//! capped per call to exercise partial-write handling.

use crate::channel::{ByteChannel, WatchId};
use std::collections::VecDeque;
use std::io;

#[derive(Debug, Default)]
pub struct MockChannel {
    read_queue: VecDeque<u8>,
    closed: bool,
    pending_read_error: Option<io::ErrorKind>,
    pending_write_error: Option<io::ErrorKind>,
    write_limit: Option<usize>,
    read_limit: Option<usize>,
    written: Vec<u8>,
    next_watch: u64,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: &[u8]) -> Self {
        let mut channel = Self::new();
        channel.push_readable(data);
        channel
    }

    /// Queues more bytes to be handed out by subsequent `read()` calls,
    /// simulating another readable event's worth of arrived data.
    pub fn push_readable(&mut self, data: &[u8]) {
        self.read_queue.extend(data.iter().copied());
    }

    /// Marks the channel as orderly-closed: once the read queue drains, reads
    /// return `Ok(0)` instead of `WouldBlock`.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn fail_next_read(&mut self, kind: io::ErrorKind) {
        self.pending_read_error = Some(kind);
    }

    pub fn fail_next_write(&mut self, kind: io::ErrorKind) {
        self.pending_write_error = Some(kind);
    }

    /// Caps how many bytes a single `write()` call accepts, simulating a
    /// partially-writable socket.
    pub fn set_write_limit(&mut self, limit: Option<usize>) {
        self.write_limit = limit;
    }

    /// Caps how many bytes a single `read()` call hands back, simulating a
    /// peer that trickles data in (e.g. one byte per readable event).
    pub fn set_read_limit(&mut self, limit: Option<usize>) {
        self.read_limit = limit;
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    fn next_watch_id(&mut self) -> WatchId {
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        id
    }
}

impl ByteChannel for MockChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(kind) = self.pending_read_error.take() {
            return Err(io::Error::from(kind));
        }

        if self.read_queue.is_empty() {
            return if self.closed { Ok(0) } else { Err(io::Error::from(io::ErrorKind::WouldBlock)) };
        }

        let cap = self.read_limit.unwrap_or(usize::MAX);
        let n = buf.len().min(self.read_queue.len()).min(cap);
        for slot in &mut buf[..n] {
            *slot = self.read_queue.pop_front().expect("checked non-empty above");
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.pending_write_error.take() {
            return Err(io::Error::from(kind));
        }

        let n = match self.write_limit {
            Some(limit) => limit.min(buf.len()),
            None => buf.len(),
        };
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn watch_readable(&mut self) -> WatchId {
        self.next_watch_id()
    }

    fn watch_writable(&mut self) -> WatchId {
        self.next_watch_id()
    }

    fn watch_error(&mut self) -> WatchId {
        self.next_watch_id()
    }

    fn unwatch(&mut self, _id: WatchId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_queued_bytes_then_would_block() {
        let mut channel = MockChannel::with_data(b"abc");
        let mut buf = [0u8; 8];
        assert_eq!(channel.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        let err = channel.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn close_turns_drained_queue_into_eof() {
        let mut channel = MockChannel::with_data(b"x");
        let mut buf = [0u8; 8];
        assert_eq!(channel.read(&mut buf).unwrap(), 1);
        channel.close();
        assert_eq!(channel.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn write_limit_caps_accepted_bytes() {
        let mut channel = MockChannel::new();
        channel.set_write_limit(Some(2));
        assert_eq!(channel.write(b"hello").unwrap(), 2);
        assert_eq!(channel.written(), b"he");
    }
}
