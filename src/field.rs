use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::io::{self, Read};

use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
use http::header;
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;

use crate::headers::Headers;
use crate::source::ByteSource;
use crate::state::{MultipartState, StreamingStage};

/// A single field in a multipart stream.
///
/// Its content can be accessed via [`read_chunk`](Field::read_chunk), the
/// [`Read`] implementation or the methods defined in this type. The content
/// can be read only once.
///
/// # Warning About Leaks
///
/// A field mutably borrows its [`Multipart`](crate::Multipart). Dropping it before
/// its content has been read to the end leaves the parser in the middle of the
/// field, and every later [`next_field`](crate::Multipart::next_field) call fails
/// with [`Error::FieldNotConsumed`](crate::Error::FieldNotConsumed).
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
/// while let Some(mut field) = multipart.next_field().unwrap() {
///     while let Some(chunk) = field.chunk().unwrap() {
///         println!("Chunk: {:?}", chunk);
///     }
/// }
/// # }
/// # run();
/// ```
pub struct Field<'a, S> {
    state: &'a mut MultipartState<S>,
    headers: Headers,
    done: bool,
    part_len: usize,
    end_in_sight: bool,
    size_limit: u64,
    size_counter: u64,
    meta: FieldMeta,
}

struct FieldMeta {
    name: Option<String>,
    content_type: Option<mime::Mime>,
    idx: usize,
}

impl<'a, S: ByteSource> Field<'a, S> {
    pub(crate) fn new(
        state: &'a mut MultipartState<S>,
        headers: Headers,
        idx: usize,
        name: Option<String>,
        size_limit: u64,
    ) -> Self {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|val| val.parse::<mime::Mime>().ok());

        Field {
            state,
            headers,
            done: false,
            part_len: 0,
            end_in_sight: false,
            size_limit,
            size_counter: 0,
            meta: FieldMeta {
                name,
                content_type,
                idx,
            },
        }
    }

    /// The field name found in the
    /// [`Content-Disposition`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Content-Disposition)
    /// header.
    ///
    /// The header is parsed on every call; a malformed value is reported here.
    pub fn name(&self) -> crate::Result<Option<String>> {
        self.headers.name()
    }

    /// The file name found in the
    /// [`Content-Disposition`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Content-Disposition)
    /// header, preferring the RFC 5987 `filename*` parameter.
    pub fn file_name(&self) -> crate::Result<Option<String>> {
        self.headers.filename()
    }

    /// Get the content type of the field.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.meta.content_type.as_ref()
    }

    /// Get a map of headers as [`Headers`].
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the index of this field in order they appeared in the stream.
    pub fn index(&self) -> usize {
        self.meta.idx
    }

    /// Reads the next piece of the field content into `buf`.
    ///
    /// Returns `Ok(None)` once the closing boundary of the field is reached; after
    /// that every call fails with [`Error::FieldExhausted`](crate::Error::FieldExhausted).
    /// Never returns `Ok(Some(0))` for a non-empty `buf`.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> crate::Result<Option<usize>> {
        if self.done {
            return Err(crate::Error::FieldExhausted);
        }

        if buf.is_empty() {
            return Ok(Some(0));
        }

        while self.part_len == 0 {
            if self.end_in_sight {
                self.state.buffer.skip(self.state.delimiter.len())?;
                self.state.stage = StreamingStage::ReadingHeadersOrEnd;
                self.done = true;

                trace!("field {} done after {} bytes", self.meta.idx, self.size_counter);

                return Ok(None);
            }

            self.refill()?;
        }

        let n = buf.len().min(self.part_len);
        self.state.buffer.consume(&mut buf[..n])?;
        self.part_len -= n;

        self.size_counter += n as u64;
        if self.size_counter > self.size_limit {
            return Err(crate::Error::FieldSizeExceeded {
                limit: self.size_limit,
                field_name: self.meta.name.clone(),
            });
        }

        Ok(Some(n))
    }

    /// Reads one byte through [`read_chunk`](Field::read_chunk).
    pub fn read_byte(&mut self) -> crate::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        Ok(self.read_chunk(&mut byte)?.map(|_| byte[0]))
    }

    /// Stream a chunk of the field data.
    ///
    /// When the field data has been exhausted, this will return [`None`]. A chunk is at
    /// most as large as the parser's buffer.
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
    /// while let Some(mut field) = multipart.next_field().unwrap() {
    ///     while let Some(chunk) = field.chunk().unwrap() {
    ///         println!("Chunk: {:?}", chunk);
    ///     }
    /// }
    /// # }
    /// # run();
    /// ```
    pub fn chunk(&mut self) -> crate::Result<Option<Bytes>> {
        let mut buf = vec![0; self.state.buffer.capacity()];

        Ok(self.read_chunk(&mut buf)?.map(|n| {
            buf.truncate(n);
            Bytes::from(buf)
        }))
    }

    /// Get the full data of the field as [`Bytes`].
    pub fn bytes(mut self) -> crate::Result<Bytes> {
        let mut buf = BytesMut::new();

        while let Some(bytes) = self.chunk()? {
            buf.extend_from_slice(&bytes);
        }

        Ok(buf.freeze())
    }

    /// Try to deserialize the field data as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub fn json<T: DeserializeOwned>(self) -> crate::Result<T> {
        let bytes = self.bytes()?;
        serde_json::from_slice(&bytes).map_err(crate::Error::DecodeJson)
    }

    /// Get the full field data as text.
    ///
    /// This method decodes the field data with `BOM sniffing` and with malformed sequences replaced with the
    /// `REPLACEMENT CHARACTER`. The encoding is taken from the `charset` parameter of the field's
    /// `Content-Type`, falling back to `utf-8`.
    pub fn text(self) -> crate::Result<String> {
        self.text_with_charset("utf-8")
    }

    /// Get the full field data as text given a specific encoding.
    ///
    /// The `default_encoding` is used when the field's `Content-Type` carries no `charset`.
    pub fn text_with_charset(self, default_encoding: &str) -> crate::Result<String> {
        let encoding_name = self
            .content_type()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str())
            .unwrap_or(default_encoding)
            .to_owned();

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

        let bytes = self.bytes()?;

        let (text, _, _) = encoding.decode(&bytes);

        match text {
            Cow::Owned(s) => Ok(s),
            Cow::Borrowed(s) => Ok(String::from(s)),
        }
    }

    fn refill(&mut self) -> crate::Result<()> {
        let state = &mut *self.state;
        state.buffer.refill()?;

        match state.buffer.find(&state.delimiter) {
            Some(idx) => {
                self.part_len = idx;
                self.end_in_sight = true;
            }
            None if state.buffer.eof => {
                trace!("premature end of data in field {}", self.meta.idx);

                return Err(crate::Error::IncompleteFieldData {
                    field_name: self.meta.name.clone(),
                });
            }
            None => {
                // Part of the delimiter may sit at the very end of the buffer.
                self.part_len = state.buffer.len().saturating_sub(state.delimiter.len());
            }
        }

        Ok(())
    }
}

impl<S: ByteSource> Read for Field<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_chunk(buf)?.unwrap_or(0))
    }
}

impl<S> Debug for Field<'_, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("headers", &self.headers)
            .field("index", &self.meta.idx)
            .field("done", &self.done)
            .finish()
    }
}

impl<S> Drop for Field<'_, S> {
    fn drop(&mut self) {
        if !self.done {
            warn!(
                "field {} dropped before its data was read to the end, the multipart stream can't advance",
                self.meta.idx
            );
        }
    }
}
