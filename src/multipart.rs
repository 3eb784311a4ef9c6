use std::fmt::{self, Debug, Formatter};

use bytes::BytesMut;

use crate::buffer::StreamBuffer;
use crate::constants;
use crate::constraints::Constraints;
use crate::finder::BoundaryFinder;
use crate::headers::Headers;
use crate::source::ByteSource;
use crate::state::{MultipartState, StreamingStage};
use crate::Field;

/// Represents the implementation of `multipart/form-data` formatted data.
///
/// This will parse the source into [`Field`] instances one at a time. The boundary is
/// taken from the first line of the input, which has to be `--boundary\r\n`.
///
/// All parsing happens inside a fixed-size circular buffer (see
/// [`Constraints::buffer_size`]), so memory use doesn't depend on the size of the
/// fields.
///
/// A [`Field`] borrows the `Multipart` and must be read until its end before the next
/// field can be requested. Dropping a field earlier leaves the parser stuck: every
/// later call to [`has_next`](Multipart::has_next) or [`next_field`](Multipart::next_field)
/// fails with [`Error::FieldNotConsumed`](crate::Error::FieldNotConsumed).
///
/// # Examples
///
/// ```
/// use streaming_multipart::Multipart;
///
/// # fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let mut multipart = Multipart::new(data.as_bytes()).unwrap();
///
/// while let Some(field) = multipart.next_field().unwrap() {
///     println!("Field: {:?}", field.text())
/// }
/// # }
/// # run();
/// ```
pub struct Multipart<S> {
    state: MultipartState<S>,
    constraints: Constraints,
}

impl<S: ByteSource> Multipart<S> {
    /// Construct a new `Multipart` instance reading from the given source with default
    /// constraints.
    pub fn new(source: S) -> crate::Result<Multipart<S>> {
        Multipart::with_constraints(source, Constraints::default())
    }

    /// Construct a new `Multipart` instance reading from the given source.
    ///
    /// Performs the first read from the source to find the boundary line.
    pub fn with_constraints(source: S, constraints: Constraints) -> crate::Result<Multipart<S>> {
        let mut buffer = StreamBuffer::new(
            source,
            constraints.buffer_size,
            constraints.size_limit.whole_stream,
        )?;
        buffer.refill()?;

        let (first, _) = buffer.as_slices();
        let line_len = memchr::memmem::find(first, constants::CRLF).ok_or(crate::Error::MissingOpeningBoundary)?;
        let line = &first[..line_len];

        if !line.starts_with(constants::BOUNDARY_EXT) || line_len == constants::BOUNDARY_EXT.len() {
            return Err(crate::Error::MissingOpeningBoundary);
        }

        if buffer.capacity() < 3 * line_len {
            return Err(crate::Error::BufferTooSmall {
                capacity: buffer.capacity(),
                boundary_len: line_len,
            });
        }

        let mut delimiter = BytesMut::with_capacity(constants::CRLF.len() + line_len);
        delimiter.extend_from_slice(constants::CRLF);
        delimiter.extend_from_slice(line);
        let delimiter = delimiter.freeze();

        // The line's own CRLF stays in the buffer and reads like the end of a delimiter.
        buffer.skip(line_len)?;

        trace!(
            "found multipart boundary: {:?}",
            String::from_utf8_lossy(&delimiter[constants::CRLF.len() + constants::BOUNDARY_EXT.len()..])
        );

        let state = MultipartState {
            buffer,
            boundary: delimiter.slice(constants::CRLF.len() + constants::BOUNDARY_EXT.len()..),
            delimiter: BoundaryFinder::new(delimiter)?,
            header_end: BoundaryFinder::new(constants::CRLF_CRLF)?,
            stage: StreamingStage::ReadingHeadersOrEnd,
            next_field_idx: 0,
        };

        Ok(Multipart { state, constraints })
    }

    /// The boundary token taken from the first line, without the leading `--`.
    pub fn boundary(&self) -> &[u8] {
        &self.state.boundary
    }

    /// Checks whether another field follows.
    ///
    /// May be called any number of times between fields; it doesn't consume input. Fails
    /// with [`Error::FieldNotConsumed`](crate::Error::FieldNotConsumed) while the body of
    /// the previous field is unread.
    pub fn has_next(&mut self) -> crate::Result<bool> {
        match self.state.stage {
            StreamingStage::ReadingFieldData => return Err(crate::Error::FieldNotConsumed),
            StreamingStage::Eof => return Ok(false),
            StreamingStage::ReadingHeadersOrEnd => {}
        }

        let buffer = &mut self.state.buffer;
        buffer.refill()?;

        if buffer.starts_with(constants::CRLF) {
            return Ok(true);
        }

        if buffer.starts_with(constants::BOUNDARY_EXT) {
            trace!("multipart stream finished after {} fields", self.state.next_field_idx);
            self.state.stage = StreamingStage::Eof;
            return Ok(false);
        }

        Err(crate::Error::IncompleteStream)
    }

    /// Yields the next [`Field`] if available.
    ///
    /// For more info, go to [`Field`](crate::Field#warning-about-leaks).
    pub fn next_field(&mut self) -> crate::Result<Option<Field<'_, S>>> {
        if !self.has_next()? {
            return Ok(None);
        }

        let state = &mut self.state;

        let header_end = state
            .buffer
            .find(&state.header_end)
            .ok_or(crate::Error::IncompleteHeaders)?;
        let block = state.buffer.consume_bytes(header_end)?;
        state.buffer.skip(constants::CRLF_CRLF.len())?;

        // Unless the block is empty it still carries the delimiter's CRLF.
        let headers = Headers::from_bytes(block.get(constants::CRLF.len()..).unwrap_or(&[]))?;

        // A malformed disposition only fails here when the name decides admission.
        let field_name = match self.constraints.allowed_fields {
            Some(_) => headers.name()?,
            None => headers.name().ok().flatten(),
        };
        if !self.constraints.is_it_allowed(field_name.as_deref()) {
            return Err(crate::Error::UnknownField { field_name });
        }

        let size_limit = self
            .constraints
            .size_limit
            .extract_size_limit_for(field_name.as_deref());

        let idx = state.next_field_idx;
        state.next_field_idx += 1;
        state.stage = StreamingStage::ReadingFieldData;

        trace!("reading field {} ({:?}) with {} headers", idx, field_name, headers.len());

        Ok(Some(Field::new(state, headers, idx, field_name, size_limit)))
    }

    /// Yields the next [`Field`] with their positioning index as a tuple `(usize, Field)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use streaming_multipart::Multipart;
    ///
    /// # fn run() {
    /// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
    /// let mut multipart = Multipart::new(data.as_bytes()).unwrap();
    ///
    /// while let Some((idx, field)) = multipart.next_field_with_idx().unwrap() {
    ///     println!("Index: {:?}, Content: {:?}", idx, field.text())
    /// }
    /// # }
    /// # run();
    /// ```
    pub fn next_field_with_idx(&mut self) -> crate::Result<Option<(usize, Field<'_, S>)>> {
        self.next_field().map(|f| f.map(|field| (field.index(), field)))
    }
}

impl<S> Debug for Multipart<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multipart")
            .field("boundary", &String::from_utf8_lossy(&self.state.boundary))
            .field("stage", &self.state.stage)
            .field("next_field_idx", &self.state.next_field_idx)
            .finish()
    }
}
