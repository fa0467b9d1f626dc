//! Growable receive buffer with in-place block-removal compaction.
//!
//! The reader state machine never reallocates its buffer downward: it grows
//! with `Vec::extend_from_slice` and shrinks only by sliding later bytes over
//! earlier ones (`copy_within`) and truncating the tail. This is the safe-Rust
//! equivalent of `g_memmove`-based compaction in `remove_block_at_index`.

#[derive(Debug, Default)]
pub struct ByteBuf {
    data: Vec<u8>,
}

impl ByteBuf {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Removes `length` bytes starting at `offset`, sliding the tail left.
    ///
    /// # Panics
    /// Panics if `offset + length > self.len()`.
    pub fn remove_block(&mut self, offset: usize, length: usize) {
        if length == 0 {
            return;
        }
        let total = self.data.len();
        assert!(offset + length <= total, "remove_block out of range");
        let tail_start = offset + length;
        self.data.copy_within(tail_start..total, offset);
        self.data.truncate(total - length);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Takes ownership of the full contents, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_remove_front_block() {
        let mut buf = ByteBuf::new();
        buf.append(b"hello world");
        buf.remove_block(0, 6);
        assert_eq!(buf.as_slice(), b"world");
    }

    #[test]
    fn remove_block_in_middle_compacts_tail() {
        let mut buf = ByteBuf::new();
        buf.append(b"abcXXdef");
        buf.remove_block(3, 2);
        assert_eq!(buf.as_slice(), b"abcdef");
    }

    #[test]
    fn remove_entire_buffer() {
        let mut buf = ByteBuf::new();
        buf.append(b"abc");
        buf.remove_block(0, 3);
        assert!(buf.is_empty());
    }

    #[test]
    #[should_panic]
    fn remove_block_out_of_range_panics() {
        let mut buf = ByteBuf::new();
        buf.append(b"abc");
        buf.remove_block(1, 10);
    }
}
