#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("Not enough bytes; need {minimum}, have {actual}")]
    NotEnoughData { actual: usize, minimum: usize },

    /// A schema field carries a tag that is not one of the known primitives
    /// or a well formed `A<n>`.
    #[error("Invalid type tag {tag:?} for field {field:?}")]
    InvalidTypeTag { field: String, tag: String },

    #[error("Duplicate field name {0:?}")]
    DuplicateField(String),

    #[error("Unknown field {0:?}")]
    UnknownField(String),

    /// A count read from a record implies more bytes than remain in the buffer.
    #[error("{what}: count {count} needs {needed} bytes, {available} available")]
    LengthConsistency {
        what: String,
        count: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid marker at {offset}; expected {expected:#x}, got {actual:#x}")]
    InvalidMarker {
        expected: u32,
        actual: u32,
        offset: usize,
    },

    #[error("Invalid header: {0}")]
    Header(String),

    #[error("Invalid hex digit at line {line}, column {column}")]
    InvalidHex { line: usize, column: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
