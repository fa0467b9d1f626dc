//! Opaque-handle registries hosting many concurrent [`Reader`]/[`Writer`]
//! instances behind one table.
//!
//! `Reader`/`Writer` are usable standalone (an embedder driving exactly one
//! transfer at a time can just own one directly), but most event loops want
//! to host many concurrent transfers and hand callers back a lightweight,
//! type-safe token rather than the state machine itself, directly
//! implementing the REDESIGN FLAGS request (spec §9) for distinct
//! reader/writer handle types instead of an integer aliased to a pointer.
//! Grounded on `fluke-io-uring-async`'s `slab::Slab`-backed op registry
//! (`examples/bearcove-fluke`): an opaque token mapping to in-flight I/O
//! state, indexed by a generational `slab::Slab` rather than a raw `Vec`.

use crate::channel::ByteChannel;
use crate::message::WriteEncoding;
use crate::reader::{ReadCallbacks, Reader};
use crate::writer::{WriteCallbacks, Writer};
use bytes::Bytes;
use slab::Slab;
use tracing::trace;

/// Opaque handle to one in-flight inbound transfer. Carries no lifetime and
/// no access to the underlying `Reader`; the only operations available on it
/// are the ones [`ReadEngine`] exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReaderHandle(usize);

/// Opaque handle to one in-flight outbound transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriterHandle(usize);

/// Hosts many [`Reader`]s behind one table. An embedder's event loop holds
/// one `ReadEngine`, dispatches readiness events to it by handle, and never
/// touches a bare `Reader`.
#[derive(Debug, Default)]
pub struct ReadEngine {
    readers: Slab<Reader>,
}

impl ReadEngine {
    pub fn new() -> Self {
        Self { readers: Slab::new() }
    }

    /// Creates a reader, arms its readable and error watches, and returns an
    /// opaque handle. Mirrors spec §4.7's `start_read` entry point.
    pub fn start_read(
        &mut self,
        channel: Box<dyn ByteChannel>,
        overwrite_chunks: bool,
        callbacks: Box<dyn ReadCallbacks>,
    ) -> ReaderHandle {
        let reader = Reader::new(channel, overwrite_chunks, callbacks);
        let key = self.readers.insert(reader);
        trace!(handle = key, "reader started");
        ReaderHandle(key)
    }

    /// Replaces the callback set on an existing reader. Must not be called
    /// from inside one of that reader's own callbacks.
    pub fn set_read_callbacks(&mut self, handle: ReaderHandle, callbacks: Box<dyn ReadCallbacks>) {
        if let Some(reader) = self.readers.get_mut(handle.0) {
            reader.set_callbacks(callbacks);
        }
    }

    /// Dispatches a readable-watch firing to the named reader.
    pub fn on_readable(&mut self, handle: ReaderHandle) {
        self.drive(handle, Reader::on_readable);
    }

    /// Dispatches an error-watch firing (hangup/error/invalid) to the named reader.
    pub fn on_error_event(&mut self, handle: ReaderHandle) {
        self.drive(handle, Reader::on_error_event);
    }

    fn drive(&mut self, handle: ReaderHandle, step: impl FnOnce(&mut Reader)) {
        let Some(reader) = self.readers.get_mut(handle.0) else { return };
        step(reader);
        if reader.is_finished() {
            self.readers.remove(handle.0);
        }
    }

    /// Tears a reader down. A no-op if the handle is already gone (natural
    /// completion already removed it) or if a callback on it is currently
    /// executing (the callback must return `End` instead; see spec §5).
    pub fn cancel_read(&mut self, handle: ReaderHandle) {
        let Some(reader) = self.readers.get_mut(handle.0) else { return };
        reader.cancel();
        if reader.is_finished() {
            self.readers.remove(handle.0);
        }
    }

    pub fn is_active(&self, handle: ReaderHandle) -> bool {
        self.readers.contains(handle.0)
    }
}

/// Hosts many [`Writer`]s behind one table, symmetric to [`ReadEngine`].
#[derive(Debug, Default)]
pub struct WriteEngine {
    writers: Slab<Writer>,
}

impl WriteEngine {
    pub fn new() -> Self {
        Self { writers: Slab::new() }
    }

    /// Creates a writer, arms its writable and error watches, and returns an
    /// opaque handle. Mirrors spec §4.7's `start_write` entry point.
    pub fn start_write(
        &mut self,
        channel: Box<dyn ByteChannel>,
        header: Bytes,
        initial_body: Option<Bytes>,
        encoding: WriteEncoding,
        callbacks: Box<dyn WriteCallbacks>,
    ) -> WriterHandle {
        let writer = Writer::new(channel, header, initial_body, encoding, callbacks);
        let key = self.writers.insert(writer);
        trace!(handle = key, "writer started");
        WriterHandle(key)
    }

    pub fn set_write_callbacks(&mut self, handle: WriterHandle, callbacks: Box<dyn WriteCallbacks>) {
        if let Some(writer) = self.writers.get_mut(handle.0) {
            writer.set_callbacks(callbacks);
        }
    }

    pub fn on_writable(&mut self, handle: WriterHandle) {
        self.drive(handle, Writer::on_writable);
    }

    pub fn on_error_event(&mut self, handle: WriterHandle) {
        self.drive(handle, Writer::on_error_event);
    }

    fn drive(&mut self, handle: WriterHandle, step: impl FnOnce(&mut Writer)) {
        let Some(writer) = self.writers.get_mut(handle.0) else { return };
        step(writer);
        if writer.is_finished() {
            self.writers.remove(handle.0);
        }
    }

    pub fn cancel_write(&mut self, handle: WriterHandle) {
        let Some(writer) = self.writers.get_mut(handle.0) else { return };
        writer.cancel();
        if writer.is_finished() {
            self.writers.remove(handle.0);
        }
    }

    pub fn is_active(&self, handle: WriterHandle) -> bool {
        self.writers.contains(handle.0)
    }
}
