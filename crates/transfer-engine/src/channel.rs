//! The abstract non-blocking duplex byte channel the engine is driven over.
//!
//! The engine makes no assumption about the underlying transport; TLS over a
//! socket is just a different [`ByteChannel`] implementation. `read`/`write`
//! reuse `std::io::Result`'s existing tri-state instead of a bespoke enum:
//! `Ok(0)` on read is orderly EOF, `Err(ErrorKind::WouldBlock)` is the
//! would-block outcome, and any other `Err` is a real channel error.

use std::io;

/// One registered interest in a channel's readiness. Opaque to the engine;
/// only meaningful to the `ByteChannel` implementation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// A non-blocking duplex byte stream with readiness registration.
///
/// Implementors typically wrap a raw socket or TLS session. `read`/`write`
/// must never block; `WouldBlock` is the normal "try again once readiness
/// fires" outcome, not an error condition.
pub trait ByteChannel {
    /// Non-blocking read. `Ok(0)` means orderly EOF.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Non-blocking write.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Arms a one-shot(-per-event-loop-tick) readable watch, returning its id.
    fn watch_readable(&mut self) -> WatchId;

    /// Arms a one-shot(-per-event-loop-tick) writable watch, returning its id.
    fn watch_writable(&mut self) -> WatchId;

    /// Arms a watch for hangup/error/invalid conditions, returning its id.
    fn watch_error(&mut self) -> WatchId;

    /// Disarms a previously-returned watch. Implementations must tolerate
    /// being called with a `WatchId` that has already fired or was never
    /// armed (teardown calls this unconditionally).
    fn unwatch(&mut self, id: WatchId);
}
