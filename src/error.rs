use std::fmt::{self, Debug, Display, Formatter};
use std::io;

use derive_more::Display;

/// A set of errors that can occur during parsing multipart stream and in other
/// operations.
#[derive(Display)]
#[non_exhaustive]
pub enum Error {
    /// A buffer was configured with a capacity of zero.
    #[display(fmt = "buffer size must be greater than zero")]
    ZeroBufferSize,

    /// The buffer cannot hold the boundary with the lookahead it needs.
    #[display(
        fmt = "buffer size {} is too small for a boundary of {} bytes",
        capacity,
        boundary_len
    )]
    BufferTooSmall { capacity: usize, boundary_len: usize },

    /// A boundary given to a [`BoundaryReader`](crate::BoundaryReader) is empty or does not
    /// fit into its buffer.
    #[display(fmt = "invalid boundary: {}", _0)]
    InvalidBoundary(&'static str),

    /// The stream doesn't start with a `--boundary` line.
    #[display(fmt = "no boundary could be found at the start of the stream")]
    MissingOpeningBoundary,

    /// Couldn't find the blank line which terminates the field headers.
    #[display(fmt = "failed to read field complete headers")]
    IncompleteHeaders,

    /// The input ended before the field's closing boundary appeared.
    #[display(
        fmt = "field '{}' received with incomplete data",
        "field_name.as_deref().unwrap_or(\"<unknown>\")"
    )]
    IncompleteFieldData { field_name: Option<String> },

    /// A boundary was neither followed by `\r\n` nor by the closing `--`.
    #[display(fmt = "incomplete multipart stream")]
    IncompleteStream,

    /// The field header block is not valid UTF-8.
    #[display(fmt = "failed to decode field headers: {}", _0)]
    DecodeHeaders(std::str::Utf8Error),

    /// A header line without a `:` separator.
    #[display(fmt = "malformed header line: {:?}", _0)]
    MalformedHeader(String),

    /// A `Content-Disposition` value without a parameter section.
    #[display(fmt = "malformed content-disposition header value: {:?}", _0)]
    MalformedContentDisposition(String),

    /// A `Content-Disposition` parameter without `=`.
    #[display(fmt = "malformed parameter in content-disposition header: {:?}", _0)]
    MalformedDispositionParameter(String),

    /// An RFC 5987 extended parameter value that doesn't decode to UTF-8.
    #[display(fmt = "failed to decode extended parameter value: {:?}", _0)]
    DecodeExtValue(String),

    /// An unknown field is detected when multipart
    /// [`constraints`](crate::Constraints::allowed_fields) are added.
    #[display(fmt = "unknown field received: {}", "field_name.as_deref().unwrap_or(\"<unknown>\")")]
    UnknownField { field_name: Option<String> },

    /// The incoming field size exceeded the maximum limit.
    #[display(
        fmt = "field '{}' exceeded the maximum size limit: {} bytes",
        "field_name.as_deref().unwrap_or(\"<unknown>\")",
        limit
    )]
    FieldSizeExceeded { limit: u64, field_name: Option<String> },

    /// The incoming stream size exceeded the maximum limit.
    #[display(fmt = "stream size exceeded the maximum limit: {} bytes", limit)]
    StreamSizeExceeded { limit: u64 },

    /// `has_next` or `next_field` was called while a field body was still unread.
    #[display(fmt = "must exhaust previous field before dealing with next field")]
    FieldNotConsumed,

    /// A field body was read after it signalled its end.
    #[display(fmt = "cannot read from field any more")]
    FieldExhausted,

    /// More bytes were consumed from the buffer than it holds.
    #[display(fmt = "unexpected end of buffer: requested {} bytes, {} available", requested, available)]
    BufferUnderflow { requested: usize, available: usize },

    /// Stream read failed.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(io::Error),

    /// The `Content-Type` header is not `multipart/form-data`.
    #[display(fmt = "Content-Type is not multipart/form-data")]
    NoMultipart,

    /// Failed to convert the `Content-Type` to [`mime::Mime`] type.
    #[display(fmt = "Failed to convert Content-Type to `mime::Mime` type: {}", _0)]
    DecodeContentType(mime::FromStrError),

    /// No boundary found in `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// Failed to decode the field data as `JSON` in
    /// [`field.json()`](crate::Field::json) method.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    #[display(fmt = "failed to decode field data as JSON: {}", _0)]
    DecodeJson(serde_json::Error),
}

/// The broad class an [`Error`] belongs to.
///
/// `Usage` errors mean the API was called out of order; every other kind
/// originates from the input, the source or the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Framing,
    Header,
    Limit,
    Usage,
    Source,
    Content,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ZeroBufferSize | Error::BufferTooSmall { .. } | Error::InvalidBoundary(_) => {
                ErrorKind::Configuration
            }
            Error::MissingOpeningBoundary
            | Error::IncompleteHeaders
            | Error::IncompleteFieldData { .. }
            | Error::IncompleteStream => ErrorKind::Framing,
            Error::DecodeHeaders(_)
            | Error::MalformedHeader(_)
            | Error::MalformedContentDisposition(_)
            | Error::MalformedDispositionParameter(_)
            | Error::DecodeExtValue(_)
            | Error::NoMultipart
            | Error::DecodeContentType(_)
            | Error::NoBoundary => ErrorKind::Header,
            Error::UnknownField { .. } | Error::FieldSizeExceeded { .. } | Error::StreamSizeExceeded { .. } => {
                ErrorKind::Limit
            }
            Error::FieldNotConsumed | Error::FieldExhausted | Error::BufferUnderflow { .. } => ErrorKind::Usage,
            Error::StreamReadFailed(_) => ErrorKind::Source,
            #[cfg(feature = "json")]
            Error::DecodeJson(_) => ErrorKind::Content,
        }
    }

    /// Returns `true` if the error comes from calling the API out of turn
    /// rather than from bad input.
    pub fn is_usage(&self) -> bool {
        self.kind() == ErrorKind::Usage
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::StreamReadFailed(err) => Some(err),
            Error::DecodeHeaders(err) => Some(err),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::StreamReadFailed(inner) => inner,
            err => {
                let kind = match err {
                    Error::IncompleteFieldData { .. } | Error::IncompleteStream => io::ErrorKind::UnexpectedEof,
                    _ if err.is_usage() => io::ErrorKind::Other,
                    _ => io::ErrorKind::InvalidData,
                };

                io::Error::new(kind, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::MissingOpeningBoundary.kind(), ErrorKind::Framing);
        assert_eq!(Error::InvalidBoundary("empty").kind(), ErrorKind::Configuration);
        assert!(Error::FieldExhausted.is_usage());
        assert!(Error::FieldNotConsumed.is_usage());
        assert!(!Error::IncompleteFieldData { field_name: None }.is_usage());
    }

    #[test]
    fn test_display() {
        let err = Error::IncompleteFieldData {
            field_name: Some("foo".to_owned()),
        };
        assert_eq!(err.to_string(), "field 'foo' received with incomplete data");

        let err = Error::FieldSizeExceeded {
            limit: 10,
            field_name: None,
        };
        assert_eq!(
            err.to_string(),
            "field '<unknown>' exceeded the maximum size limit: 10 bytes"
        );
    }

    #[test]
    fn test_into_io_error() {
        let err: io::Error = Error::StreamReadFailed(io::Error::new(io::ErrorKind::BrokenPipe, "gone")).into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let err: io::Error = Error::IncompleteFieldData { field_name: None }.into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err: io::Error = Error::FieldExhausted.into();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
