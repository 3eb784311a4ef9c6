use bytes::Bytes;

use crate::buffer::StreamBuffer;
use crate::finder::BoundaryFinder;

pub(crate) struct MultipartState<S> {
    pub(crate) buffer: StreamBuffer<S>,
    pub(crate) boundary: Bytes,
    pub(crate) delimiter: BoundaryFinder,
    pub(crate) header_end: BoundaryFinder,
    pub(crate) stage: StreamingStage,
    pub(crate) next_field_idx: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamingStage {
    ReadingHeadersOrEnd,
    ReadingFieldData,
    Eof,
}
