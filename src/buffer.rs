//! Transactional instruction buffer.
//!
//! The protocol handler is the only writer and the dispatcher the only reader.
//! Both sides work in transactions: staged writes stay invisible to the reader
//! until `write_commit`, and reads only free space once `read_commit` is called,
//! so an uncommitted read can be replayed from the same position.

use crate::error::BufferError;

/// Word queue with atomic commit on both sides.
pub trait TransactionalBuffer {
    /// Stage one word behind the last committed write.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Overflow`] when no space is free.
    fn write(&mut self, word: u32) -> Result<(), BufferError>;

    /// Publish every word staged since the previous commit.
    fn write_commit(&mut self);

    /// Drop every word staged since the previous commit.
    fn write_rollback(&mut self);

    /// Read the next committed word, or `None` if every committed word has been read.
    fn read(&mut self) -> Option<u32>;

    /// Release every word read since the previous read commit.
    fn read_commit(&mut self);

    /// Rewind the read cursor to the last read commit.
    fn read_rollback(&mut self);

    /// Words that can still be staged.
    fn free_space(&self) -> usize;

    /// No committed word is waiting to be read.
    fn is_empty(&self) -> bool;

    /// Storage depth in words.
    fn depth(&self) -> usize;

    /// Discard all contents and open transactions.
    fn clear(&mut self);
}

/// Ring-buffer [`TransactionalBuffer`] of `DEPTH` words.
///
/// One slot always stays empty, so at most `DEPTH - 1` words are held.
pub struct TransactionalFifo<const DEPTH: usize> {
    buffer: [u32; DEPTH],
    /// Next slot to stage into.
    write_ptr: usize,
    /// End of published data.
    write_committed: usize,
    /// Next slot to read from.
    read_ptr: usize,
    /// Start of unreleased data.
    read_committed: usize,
}

impl<const DEPTH: usize> TransactionalFifo<DEPTH> {
    /// Creates an empty buffer.
    ///
    /// This is declared const, allowing it to be used in `static` contexts.
    pub const fn new() -> Self {
        TransactionalFifo {
            buffer: [0u32; DEPTH],
            write_ptr: 0,
            write_committed: 0,
            read_ptr: 0,
            read_committed: 0,
        }
    }

    #[inline]
    fn next(index: usize) -> usize {
        if index + 1 == DEPTH {
            0
        } else {
            index + 1
        }
    }

    #[inline]
    fn distance(from: usize, to: usize) -> usize {
        if to >= from {
            to - from
        } else {
            DEPTH - from + to
        }
    }

    /// Words held, staged ones included.
    pub fn occupied(&self) -> usize {
        Self::distance(self.read_committed, self.write_ptr)
    }

    /// Words staged but not yet committed.
    pub fn staged(&self) -> usize {
        Self::distance(self.write_committed, self.write_ptr)
    }

    /// Committed words not yet read.
    pub fn readable(&self) -> usize {
        Self::distance(self.read_ptr, self.write_committed)
    }
}

impl<const DEPTH: usize> Default for TransactionalFifo<DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DEPTH: usize> TransactionalBuffer for TransactionalFifo<DEPTH> {
    fn write(&mut self, word: u32) -> Result<(), BufferError> {
        if self.free_space() == 0 {
            return Err(BufferError::Overflow);
        }
        self.buffer[self.write_ptr] = word;
        self.write_ptr = Self::next(self.write_ptr);
        Ok(())
    }

    fn write_commit(&mut self) {
        self.write_committed = self.write_ptr;
    }

    fn write_rollback(&mut self) {
        self.write_ptr = self.write_committed;
    }

    fn read(&mut self) -> Option<u32> {
        if self.read_ptr == self.write_committed {
            return None;
        }
        let word = self.buffer[self.read_ptr];
        self.read_ptr = Self::next(self.read_ptr);
        Some(word)
    }

    fn read_commit(&mut self) {
        self.read_committed = self.read_ptr;
    }

    fn read_rollback(&mut self) {
        self.read_ptr = self.read_committed;
    }

    fn free_space(&self) -> usize {
        DEPTH.saturating_sub(1) - self.occupied()
    }

    fn is_empty(&self) -> bool {
        self.read_committed == self.write_committed
    }

    fn depth(&self) -> usize {
        DEPTH
    }

    fn clear(&mut self) {
        self.write_ptr = 0;
        self.write_committed = 0;
        self.read_ptr = 0;
        self.read_committed = 0;
    }
}
