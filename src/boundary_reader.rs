use std::fmt::{self, Debug, Formatter};
use std::io::{self, Read};

use bytes::Bytes;

use crate::buffer::StreamBuffer;
use crate::constants;
use crate::finder::BoundaryFinder;
use crate::source::ByteSource;

/// A reader that yields the bytes of its source up to, but excluding, the next
/// occurrence of a boundary.
///
/// Reading stops in front of the boundary: every later read reports the end
/// until the boundary is changed or cleared with
/// [`set_boundary`](BoundaryReader::set_boundary) or
/// [`clear_boundary`](BoundaryReader::clear_boundary). Without a boundary the
/// source is passed through unchanged.
///
/// The source is buffered in a fixed-size circular buffer (16 KiB unless set
/// with [`BoundaryReaderBuilder::buffer_size`]). While the source may still
/// deliver data, up to `boundary.len() - 1` bytes at the end of the buffer are
/// held back because they could be the start of a boundary.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use streaming_multipart::BoundaryReader;
///
/// # fn run() -> std::io::Result<()> {
/// let mut reader = BoundaryReader::builder(&b"first--sepsecond"[..])
///     .boundary(&b"--sep"[..])
///     .build()?;
///
/// let mut first = String::new();
/// reader.read_to_string(&mut first)?;
/// assert_eq!(first, "first");
///
/// reader.clear_boundary();
/// let mut rest = String::new();
/// reader.read_to_string(&mut rest)?;
/// assert_eq!(rest, "--sepsecond");
/// # Ok(())
/// # }
/// # run().unwrap();
/// ```
pub struct BoundaryReader<S> {
    buffer: StreamBuffer<S>,
    finder: Option<BoundaryFinder>,
}

/// Configures a [`BoundaryReader`].
pub struct BoundaryReaderBuilder<S> {
    source: S,
    buffer_size: usize,
    boundary: Option<Bytes>,
}

impl<S: ByteSource> BoundaryReaderBuilder<S> {
    /// Sets the capacity of the circular buffer.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn boundary<B: Into<Bytes>>(mut self, boundary: B) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    pub fn build(self) -> crate::Result<BoundaryReader<S>> {
        let mut reader = BoundaryReader {
            buffer: StreamBuffer::new(self.source, self.buffer_size, u64::MAX)?,
            finder: None,
        };

        if let Some(boundary) = self.boundary {
            reader.set_boundary(boundary)?;
        }

        Ok(reader)
    }
}

impl<S: ByteSource> BoundaryReader<S> {
    pub fn builder(source: S) -> BoundaryReaderBuilder<S> {
        BoundaryReaderBuilder {
            source,
            buffer_size: constants::DEFAULT_BOUNDARY_READER_BUFFER_SIZE,
            boundary: None,
        }
    }

    /// Creates a reader without a boundary and with the default buffer size.
    pub fn new(source: S) -> crate::Result<BoundaryReader<S>> {
        BoundaryReader::builder(source).build()
    }

    /// Makes reads stop in front of the next occurrence of `boundary`.
    ///
    /// The boundary must not be empty and must fit into the buffer.
    pub fn set_boundary<B: Into<Bytes>>(&mut self, boundary: B) -> crate::Result<()> {
        let boundary = boundary.into();

        if boundary.len() > self.buffer.capacity() {
            return Err(crate::Error::InvalidBoundary("boundary is too large for buffer"));
        }

        self.finder = Some(BoundaryFinder::new(boundary)?);
        Ok(())
    }

    /// Removes the boundary; reads pass through the rest of the source.
    pub fn clear_boundary(&mut self) {
        self.finder = None;
    }

    pub fn boundary(&self) -> Option<&[u8]> {
        self.finder.as_ref().map(BoundaryFinder::needle)
    }

    /// Reads bytes in front of the boundary into `buf`.
    ///
    /// Returns `Ok(None)` when the boundary is next in line or the source is
    /// exhausted.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> crate::Result<Option<usize>> {
        if buf.is_empty() {
            return Ok(Some(0));
        }

        self.buffer.refill()?;

        let len = self.readable_len(buf.len());
        if len == 0 {
            return Ok(None);
        }

        self.buffer.consume(&mut buf[..len])?;
        Ok(Some(len))
    }

    /// Reads one byte through [`read_chunk`](BoundaryReader::read_chunk).
    pub fn read_byte(&mut self) -> crate::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        Ok(self.read_chunk(&mut byte)?.map(|_| byte[0]))
    }

    fn readable_len(&self, requested: usize) -> usize {
        match self.finder {
            None => requested.min(self.buffer.len()),
            Some(ref finder) => {
                // A boundary starting inside the requested range ends inside the window.
                let window = (requested + finder.len() - 1).min(self.buffer.len());
                requested.min(self.boundary_free_len(finder, window))
            }
        }
    }

    fn boundary_free_len(&self, finder: &BoundaryFinder, window: usize) -> usize {
        if let Some(idx) = self.buffer.find_within(finder, window) {
            return idx;
        }

        if !self.buffer.is_full() {
            // The source is exhausted and everything left has been searched.
            return window;
        }

        window - finder.len() + 1
    }
}

impl<S: ByteSource> Read for BoundaryReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_chunk(buf)?.unwrap_or(0))
    }
}

impl<S> Debug for BoundaryReader<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryReader")
            .field("boundary", &self.finder.as_ref().map(|finder| String::from_utf8_lossy(finder.needle())))
            .field("buffered", &self.buffer.len())
            .field("eof", &self.buffer.eof)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn read_all<S: ByteSource>(reader: &mut BoundaryReader<S>, chunk_size: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0; chunk_size];

        while let Some(n) = reader.read_chunk(&mut buf).unwrap() {
            out.extend_from_slice(&buf[..n]);
        }

        out
    }

    #[test]
    fn test_without_boundary() {
        let mut reader = BoundaryReader::builder(&b"hello world"[..]).buffer_size(4).build().unwrap();
        assert_eq!(reader.boundary(), None);
        assert_eq!(read_all(&mut reader, 3), b"hello world");
    }

    #[test]
    fn test_stops_at_boundary() {
        let mut reader = BoundaryReader::builder(&b"hello--Bworld"[..])
            .boundary(&b"--B"[..])
            .build()
            .unwrap();

        assert_eq!(read_all(&mut reader, 100), b"hello");
        assert_eq!(reader.read_chunk(&mut [0; 8]).unwrap(), None);
        assert_eq!(reader.read_byte().unwrap(), None);

        reader.clear_boundary();
        assert_eq!(read_all(&mut reader, 100), b"--Bworld");
    }

    #[test]
    fn test_boundary_split_across_refills() {
        let mut reader = BoundaryReader::builder(&b"abcdeXYZfg"[..])
            .buffer_size(4)
            .boundary(&b"XYZ"[..])
            .build()
            .unwrap();

        let mut buf = [0u8; 100];
        assert_eq!(reader.read_chunk(&mut buf).unwrap(), Some(2));
        assert_eq!(&buf[..2], b"ab");
        assert_eq!(reader.read_chunk(&mut buf).unwrap(), Some(2));
        assert_eq!(&buf[..2], b"cd");
        assert_eq!(reader.read_chunk(&mut buf).unwrap(), Some(1));
        assert_eq!(&buf[..1], b"e");
        assert_eq!(reader.read_chunk(&mut buf).unwrap(), None);

        reader.set_boundary(&b"g"[..]).unwrap();
        assert_eq!(read_all(&mut reader, 1), b"XYZf");
    }

    #[test]
    fn test_byte_reads_match_bulk_reads() {
        let data = b"aaXaaXXaXXXb";

        let mut reader = BoundaryReader::builder(&data[..]).buffer_size(5).boundary(&b"XXX"[..]).build().unwrap();
        let mut bytes = Vec::new();
        while let Some(b) = reader.read_byte().unwrap() {
            bytes.push(b);
        }

        assert_eq!(bytes, b"aaXaaXXa");
    }

    #[test]
    fn test_io_read() {
        let mut reader = BoundaryReader::builder(&b"line\r\n--end"[..])
            .boundary(&b"\r\n--end"[..])
            .build()
            .unwrap();

        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "line");
    }

    #[test]
    fn test_invalid_boundary() {
        let err = BoundaryReader::builder(&b""[..]).boundary(Bytes::new()).build().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);

        let err = BoundaryReader::builder(&b""[..])
            .buffer_size(2)
            .boundary(&b"abc"[..])
            .build()
            .unwrap_err();
        assert_eq!(err, crate::Error::InvalidBoundary("boundary is too large for buffer"));
    }

    proptest! {
        #[test]
        fn prop_yields_prefix_before_boundary(
            data in proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'X')], 0..64),
            boundary in proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'X')], 1..4),
            buffer_size in 4usize..24,
            chunk_size in 1usize..10,
        ) {
            let expected = match memchr::memmem::find(&data, &boundary) {
                Some(idx) => &data[..idx],
                None => &data[..],
            };

            let mut reader = BoundaryReader::builder(&data[..])
                .buffer_size(buffer_size)
                .boundary(boundary.clone())
                .build()
                .unwrap();

            prop_assert_eq!(read_all(&mut reader, chunk_size), expected);
        }
    }
}
