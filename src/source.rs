use std::io::{self, Read};

/// A blocking provider of input bytes.
///
/// `fill` writes as many bytes as it can into `buf` and returns how many it
/// wrote. Returning fewer than `buf.len()` bytes tells the parser that the
/// source is exhausted; it won't expect more data afterwards.
///
/// Every [`Read`] is a `ByteSource`: reads are repeated until the slice is full
/// or the reader reports end of input.
pub trait ByteSource {
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: Read> ByteSource for R {
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        Ok(filled)
    }
}
