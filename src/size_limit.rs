use std::collections::HashMap;

use crate::constants;

/// Caps on how many bytes a [`Multipart`](crate::Multipart) takes in.
///
/// The parser's memory is bounded by its circular buffer regardless of these limits; they
/// bound how much input is accepted. Please refer [`Constraints`](crate::Constraints) for more info.
#[derive(Debug, Clone)]
pub struct SizeLimit {
    pub(crate) whole_stream: u64,
    pub(crate) per_field: u64,
    pub(crate) field_map: HashMap<String, u64>,
}

impl SizeLimit {
    /// No limits: [`u64::MAX`] for the whole stream and for each field.
    pub fn new() -> SizeLimit {
        SizeLimit::default()
    }

    /// Sets the limit on bytes pulled from the source, boundaries and headers included.
    ///
    /// The source is read a buffer at a time, so the check may trip on a refill that
    /// reaches past the limit before the parser gets to those bytes.
    pub fn whole_stream(mut self, limit: u64) -> SizeLimit {
        self.whole_stream = limit;
        self
    }

    /// Sets the limit on body bytes handed out for each field, checked as they are read.
    pub fn per_field(mut self, limit: u64) -> SizeLimit {
        self.per_field = limit;
        self
    }

    /// Overrides the `per_field` limit for the field with this name.
    ///
    /// Useful for text fields that are collected into memory with
    /// [`Field::text`](crate::Field::text) or [`Field::bytes`](crate::Field::bytes).
    pub fn for_field<N: Into<String>>(mut self, field_name: N, limit: u64) -> SizeLimit {
        self.field_map.insert(field_name.into(), limit);
        self
    }

    /// Fields without a name fall back to `per_field`.
    pub(crate) fn extract_size_limit_for(&self, field: Option<&str>) -> u64 {
        field
            .and_then(|field| self.field_map.get(field))
            .copied()
            .unwrap_or(self.per_field)
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        SizeLimit {
            whole_stream: constants::DEFAULT_WHOLE_STREAM_SIZE_LIMIT,
            per_field: constants::DEFAULT_PER_FIELD_SIZE_LIMIT,
            field_map: HashMap::default(),
        }
    }
}
