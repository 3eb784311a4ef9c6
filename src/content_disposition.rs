use std::collections::HashMap;

use crate::constants;

/// The parameters of a `Content-Disposition` value as described by RFC 6266.
///
/// The disposition type itself (`form-data`, `attachment`, ...) is not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    parameters: HashMap<String, String>,
}

impl ContentDisposition {
    /// Parses `type; name=value; ...`.
    ///
    /// Parameter names are lowercased, quoted values lose their quotes and
    /// `utf-8''` extended values are percent-decoded as RFC 5987 defines it:
    /// `+` stays a plus sign and an invalid `%` escape is kept verbatim. A value
    /// without any parameter or a parameter without `=` is an error.
    pub fn parse(value: &str) -> crate::Result<ContentDisposition> {
        let params = match value.split_once(';') {
            Some((_, params)) => params,
            None => return Err(crate::Error::MalformedContentDisposition(value.to_owned())),
        };

        let mut parameters = HashMap::new();

        for param in params.split(';').map(str::trim) {
            let (name, value) = param
                .split_once('=')
                .ok_or_else(|| crate::Error::MalformedDispositionParameter(param.to_owned()))?;

            parameters.insert(name.trim_end().to_lowercase(), decode_parameter_value(value.trim_start())?);
        }

        Ok(ContentDisposition { parameters })
    }

    /// Looks up a parameter by its lowercase name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.parameter("name")
    }

    /// The `filename*` parameter if present, otherwise `filename`.
    pub fn filename(&self) -> Option<&str> {
        self.parameter("filename*").or_else(|| self.parameter("filename"))
    }
}

fn decode_parameter_value(value: &str) -> crate::Result<String> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return Ok(value[1..value.len() - 1].to_owned());
    }

    let prefix_len = constants::UTF8_EXT_VALUE_PREFIX.len();
    match value.get(..prefix_len) {
        Some(prefix) if prefix.eq_ignore_ascii_case(constants::UTF8_EXT_VALUE_PREFIX) => {
            urlencoding::decode(&value[prefix_len..])
                .map(|decoded| decoded.into_owned())
                .map_err(|_| crate::Error::DecodeExtValue(value.to_owned()))
        }
        _ => Ok(value.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        let cd = ContentDisposition::parse("form-data;name=token").unwrap();
        assert_eq!(cd.name(), Some("token"));

        let cd = ContentDisposition::parse("form-data;name=\"token value\"").unwrap();
        assert_eq!(cd.name(), Some("token value"));

        let cd = ContentDisposition::parse("form-data; NAME = \"你好\"").unwrap();
        assert_eq!(cd.name(), Some("你好"));
    }

    #[test]
    fn test_filename() {
        let cd = ContentDisposition::parse("form-data; filename=data.bin").unwrap();
        assert_eq!(cd.filename(), Some("data.bin"));

        let cd = ContentDisposition::parse("form-data; filename=data.bin; filename*=utf-8''%e2%82%ac-data.bin").unwrap();
        assert_eq!(cd.filename(), Some("€-data.bin"));
        assert_eq!(cd.parameter("filename"), Some("data.bin"));

        let cd = ContentDisposition::parse("attachment; filename*=UTF-8''a%20b.txt").unwrap();
        assert_eq!(cd.filename(), Some("a b.txt"));
        assert_eq!(cd.name(), None);
    }

    #[test]
    fn test_ext_value_decoding() {
        let cd = ContentDisposition::parse("form-data; filename*=utf-8''a+b.txt").unwrap();
        assert_eq!(cd.filename(), Some("a+b.txt"));

        let cd = ContentDisposition::parse("form-data; filename*=utf-8''100%zz.txt").unwrap();
        assert_eq!(cd.filename(), Some("100%zz.txt"));

        let cd = ContentDisposition::parse("form-data; filename*=iso-8859-1''a%20b.txt").unwrap();
        assert_eq!(cd.filename(), Some("iso-8859-1''a%20b.txt"));
    }

    #[test]
    fn test_quotes_are_not_unescaped() {
        let cd = ContentDisposition::parse(r#"form-data; name="a\"b""#).unwrap();
        assert_eq!(cd.name(), Some(r#"a\"b"#));

        let cd = ContentDisposition::parse(r#"form-data; name=""#).unwrap();
        assert_eq!(cd.name(), Some("\""));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(
            ContentDisposition::parse("asdf"),
            Err(crate::Error::MalformedContentDisposition("asdf".to_owned()))
        );
        assert_eq!(
            ContentDisposition::parse("asdf; asdf"),
            Err(crate::Error::MalformedDispositionParameter("asdf".to_owned()))
        );
        assert!(ContentDisposition::parse("form-data; name=a;").is_err());
        assert!(ContentDisposition::parse("form-data; filename*=utf-8''%ff").is_err());
    }
}
