use std::slice;

use http::header;

use crate::content_disposition::ContentDisposition;

/// A single `name: value` line of a part's header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    value: String,
}

impl Header {
    fn parse_line(line: &str) -> crate::Result<Header> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| crate::Error::MalformedHeader(line.to_owned()))?;

        Ok(Header {
            name: name.trim_end().to_owned(),
            value: value.trim_start().to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// The headers of a part, in the order they were received.
///
/// Duplicates are kept, but lookups by name only ever see the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<Header>,
}

impl Headers {
    /// Parses a raw header block: `\r\n`-separated `name: value` lines without
    /// the terminating blank line.
    pub fn from_bytes(block: &[u8]) -> crate::Result<Headers> {
        if block.is_empty() {
            return Ok(Headers::default());
        }

        let text = std::str::from_utf8(block).map_err(crate::Error::DecodeHeaders)?;
        let headers = text
            .split("\r\n")
            .map(Header::parse_line)
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(Headers { headers })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Header> {
        self.headers.iter()
    }

    /// The value of the first header called `name`, ignoring ASCII case.
    pub fn get<K: AsRef<str>>(&self, name: K) -> Option<&str> {
        self.get_all(name).next()
    }

    /// All values of headers called `name`, in order.
    pub fn get_all<K: AsRef<str>>(&self, name: K) -> impl Iterator<Item = &str> {
        let name = name.as_ref().to_owned();

        self.headers
            .iter()
            .filter(move |header| header.name.eq_ignore_ascii_case(&name))
            .map(Header::value)
    }

    /// Parses the `Content-Disposition` header, if there is one.
    pub fn content_disposition(&self) -> crate::Result<Option<ContentDisposition>> {
        self.get(header::CONTENT_DISPOSITION)
            .map(ContentDisposition::parse)
            .transpose()
    }

    /// The `name` parameter of the `Content-Disposition` header.
    pub fn name(&self) -> crate::Result<Option<String>> {
        Ok(self
            .content_disposition()?
            .and_then(|cd| cd.name().map(str::to_owned)))
    }

    /// The `filename*` or else `filename` parameter of the `Content-Disposition` header.
    pub fn filename(&self) -> crate::Result<Option<String>> {
        Ok(self
            .content_disposition()?
            .and_then(|cd| cd.filename().map(str::to_owned)))
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(Headers::from_bytes(b"").unwrap().is_empty());
    }

    #[test]
    fn test_basic() {
        let headers = Headers::from_bytes(b"key: value\r\nKEY2: value2").unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("KEY"), Some("value"));
        assert_eq!(headers.get("key2"), Some("value2"));
        assert_eq!(headers.get("non-existent"), None);
        assert_eq!(headers.iter().map(Header::name).collect::<Vec<_>>(), vec!["key", "KEY2"]);
    }

    #[test]
    fn test_duplicate_header() {
        let headers = Headers::from_bytes(b"key: value\r\nkey: value2").unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("key"), Some("value"));
        assert_eq!(headers.get_all("KEY").collect::<Vec<_>>(), vec!["value", "value2"]);
    }

    #[test]
    fn test_colon_split_on_first_colon_only() {
        let headers = Headers::from_bytes(b"key:value\r\nkey2:value:2").unwrap();
        assert_eq!(headers.get("key"), Some("value"));
        assert_eq!(headers.get("key2"), Some("value:2"));

        let headers = Headers::from_bytes(b"key \t:  value ").unwrap();
        assert_eq!(headers.get("key"), Some("value "));
    }

    #[test]
    fn test_lookup_with_header_name() {
        let headers = Headers::from_bytes(b"content-type: text/plain").unwrap();
        assert_eq!(headers.get(header::CONTENT_TYPE), Some("text/plain"));
    }

    #[test]
    fn test_name_and_filename() {
        let headers = Headers::from_bytes(b"Content-Disposition: form-data;name=token").unwrap();
        assert_eq!(headers.name(), Ok(Some("token".to_owned())));
        assert_eq!(headers.filename(), Ok(None));

        let headers = Headers::from_bytes(
            b"Content-Disposition: form-data; filename=data.bin; filename*=utf-8''%e2%82%ac-data.bin",
        )
        .unwrap();
        assert_eq!(headers.filename(), Ok(Some("€-data.bin".to_owned())));

        let headers = Headers::from_bytes(b"Content-Type: text/plain").unwrap();
        assert_eq!(headers.name(), Ok(None));
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            Headers::from_bytes(b"key=value"),
            Err(crate::Error::MalformedHeader("key=value".to_owned()))
        );
        assert!(Headers::from_bytes(b"a: b\r\n\r\nc: d").is_err());
        assert!(Headers::from_bytes(b"a: \xff").is_err());
    }

    #[test]
    fn test_malformed_content_disposition_is_lazy() {
        let headers = Headers::from_bytes(b"Content-Disposition: asdf").unwrap();
        assert!(headers.filename().is_err());

        let headers = Headers::from_bytes(b"Content-Disposition: asdf; asdf").unwrap();
        assert!(headers.name().is_err());
    }
}
