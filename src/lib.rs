#![cfg_attr(nightly, feature(doc_cfg))]

//! A blocking, bounded-memory parser for `multipart/form-data` content.
//!
//! The input is decoded incrementally inside a fixed-size circular buffer: a
//! field's headers are parsed as soon as they are complete and its content is
//! handed out piece by piece as it arrives, so file uploads of any size can be
//! processed without holding a whole field in memory.
//!
//! The boundary is taken from the first line of the input. Fields are read one
//! at a time with [`Multipart::next_field`]; each [`Field`] has to be read to
//! its end before the next one can be requested.
//!
//! # Examples
//!
//! ```
//! use streaming_multipart::Multipart;
//!
//! # fn run() -> streaming_multipart::Result<()> {
//! let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
//! let mut multipart = Multipart::new(data.as_bytes())?;
//!
//! while let Some(field) = multipart.next_field()? {
//!     let name = field.name()?;
//!     let file_name = field.file_name()?;
//!
//!     println!("Name: {:?}, File Name: {:?}", name, file_name);
//!     println!("Text: {}", field.text()?);
//! }
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! ## Optional Features
//!
//! * `json`: enables [`Field::json`].
//! * `log`: emits diagnostics through the [`log`](https://docs.rs/log) crate.

#[cfg(feature = "log")]
macro_rules! trace {
    ($($t:tt)*) => (::log::trace!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($t:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! warn {
    ($($t:tt)*) => (::log::warn!($($t)*));
}

#[cfg(not(feature = "log"))]
macro_rules! warn {
    ($($t:tt)*) => {};
}

pub use boundary_reader::{BoundaryReader, BoundaryReaderBuilder};
pub use constraints::Constraints;
pub use content_disposition::ContentDisposition;
pub use error::{Error, ErrorKind};
pub use field::Field;
pub use headers::{Header, Headers};
pub use multipart::Multipart;
pub use size_limit::SizeLimit;
pub use source::ByteSource;

mod boundary_reader;
mod buffer;
mod constants;
mod constraints;
mod content_disposition;
mod error;
mod field;
mod finder;
mod headers;
mod multipart;
mod size_limit;
mod source;
mod state;

/// A Result type often returned from methods that can have `streaming_multipart` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// # Examples
///
/// ```
/// # fn run() {
/// let content_type = "multipart/form-data; boundary=ABCDEFG";
///
/// assert_eq!(streaming_multipart::parse_boundary(content_type), Ok("ABCDEFG".to_owned()));
/// # }
/// # run();
/// ```
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(Error::DecodeContentType)?;

    if !(m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA) {
        return Err(Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(Error::NoBoundary)
}
