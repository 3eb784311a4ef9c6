use bytes::Bytes;

use crate::finder::BoundaryFinder;
use crate::source::ByteSource;

/// A fixed-capacity ring of bytes pulled from a [`ByteSource`].
///
/// The valid bytes live at `[head, head + len) mod capacity`. Nothing is ever
/// moved inside the ring; refills write into the free region behind the valid
/// bytes and consuming only advances `head`.
#[derive(Debug)]
pub(crate) struct StreamBuffer<S> {
    pub(crate) eof: bool,
    buf: Box<[u8]>,
    head: usize,
    len: usize,
    total_read: u64,
    whole_stream_size_limit: u64,
    source: S,
}

impl<S: ByteSource> StreamBuffer<S> {
    pub fn new(source: S, capacity: usize, whole_stream_size_limit: u64) -> crate::Result<Self> {
        if capacity == 0 {
            return Err(crate::Error::ZeroBufferSize);
        }

        Ok(StreamBuffer {
            eof: false,
            buf: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            total_read: 0,
            whole_stream_size_limit,
            source,
        })
    }

    /// Pulls as many bytes as fit into the free region.
    ///
    /// A short fill from the source marks the buffer as `eof`. Returns the
    /// number of bytes added, or an error once more bytes than the whole stream
    /// limit have been pulled.
    pub fn refill(&mut self) -> crate::Result<usize> {
        let capacity = self.capacity();
        let tail = (self.head + self.len) % capacity;
        let free = capacity - self.len;
        let right_len = free.min(capacity - tail);
        let left_len = free - right_len;

        let mut bytes_read = self.fill_from_source(tail, right_len)?;
        if bytes_read == right_len && left_len > 0 {
            bytes_read += self.fill_from_source(0, left_len)?;
        }

        self.len += bytes_read;
        self.total_read += bytes_read as u64;

        if self.total_read > self.whole_stream_size_limit {
            return Err(crate::Error::StreamSizeExceeded {
                limit: self.whole_stream_size_limit,
            });
        }

        Ok(bytes_read)
    }

    fn fill_from_source(&mut self, offset: usize, len: usize) -> crate::Result<usize> {
        if len == 0 {
            return Ok(0);
        }

        let n = self
            .source
            .fill(&mut self.buf[offset..offset + len])
            .map_err(crate::Error::StreamReadFailed)?;

        if n < len {
            self.eof = true;
        }

        Ok(n)
    }
}

impl<S> StreamBuffer<S> {
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Total number of bytes pulled from the source so far.
    #[cfg(test)]
    pub fn total_read(&self) -> u64 {
        self.total_read
    }

    fn at(&self, i: usize) -> u8 {
        self.buf[(self.head + i) % self.buf.len()]
    }

    /// The valid region as its unwrapped right segment and the wrapped left one.
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        let right_len = self.len.min(self.capacity() - self.head);
        let left_len = self.len - right_len;

        (&self.buf[self.head..self.head + right_len], &self.buf[..left_len])
    }

    /// Offset of the first occurrence of the finder's needle among the first
    /// `max_len` valid bytes.
    pub fn find_within(&self, finder: &BoundaryFinder, max_len: usize) -> Option<usize> {
        finder.find_by(max_len.min(self.len), |i| self.at(i))
    }

    pub fn find(&self, finder: &BoundaryFinder) -> Option<usize> {
        self.find_within(finder, self.len)
    }

    /// Returns `false` when fewer than `pattern.len()` bytes are buffered.
    pub fn starts_with(&self, pattern: &[u8]) -> bool {
        pattern.len() <= self.len && pattern.iter().enumerate().all(|(i, &b)| self.at(i) == b)
    }

    fn ensure_len(&self, requested: usize) -> crate::Result<()> {
        if requested > self.len {
            return Err(crate::Error::BufferUnderflow {
                requested,
                available: self.len,
            });
        }

        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> crate::Result<()> {
        self.ensure_len(n)?;
        self.advance(n);
        Ok(())
    }

    /// Copies `dst.len()` bytes out of the buffer and drops them.
    pub fn consume(&mut self, dst: &mut [u8]) -> crate::Result<()> {
        self.ensure_len(dst.len())?;

        let (right, left) = self.as_slices();
        let right_len = dst.len().min(right.len());
        dst[..right_len].copy_from_slice(&right[..right_len]);
        let left_len = dst.len() - right_len;
        dst[right_len..].copy_from_slice(&left[..left_len]);

        self.advance(dst.len());
        Ok(())
    }

    pub fn consume_bytes(&mut self, n: usize) -> crate::Result<Bytes> {
        let mut bytes = vec![0; n];
        self.consume(&mut bytes)?;
        Ok(Bytes::from(bytes))
    }

    fn advance(&mut self, n: usize) {
        self.head = (self.head + n) % self.capacity();
        self.len -= n;
    }
}
