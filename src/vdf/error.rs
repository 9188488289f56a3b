use thiserror::Error;

/// Error raised while decoding an `appinfo.vdf` buffer.
///
/// Offsets are byte positions relative to the start of the buffer given to the decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The decoder needed more bytes than the buffer holds
    #[error("Unexpected end of input at byte offset {offset}")]
    Truncated { offset: usize },

    /// The header magic is not one of the recognised format versions
    #[error("Unsupported appinfo format version: {0:#010x}")]
    UnsupportedVersion(u32),

    /// A KeyValues type tag outside of the known set
    #[error("Unknown KeyValues type tag {tag:#04x} at byte offset {offset}")]
    UnknownTypeTag { tag: u8, offset: usize },

    /// A record decoded cleanly but did not consume exactly its declared size
    #[error("Record for app {app_id} declared {declared} bytes but {consumed} were decoded")]
    RecordSizeMismatch {
        app_id: u32,
        declared: u32,
        consumed: usize,
    },

    /// Containers nested deeper than the configured limit
    #[error("KeyValues nesting deeper than {max_depth} levels at byte offset {offset}")]
    NestingTooDeep { max_depth: usize, offset: usize },

    /// A key refers to an entry past the end of the string table
    #[error("String table index {index} out of range at byte offset {offset}")]
    InvalidStringIndex { index: u32, offset: usize },

    /// The header points the string table into the header itself
    #[error("Invalid string table offset: {0}")]
    InvalidStringTableOffset(i64),
}

impl DecodeError {
    /// Whether the error only concerns a single record, meaning decoding can carry on at the next
    /// record boundary
    pub fn is_record_local(&self) -> bool {
        matches!(
            self,
            Self::UnknownTypeTag { .. }
                | Self::NestingTooDeep { .. }
                | Self::InvalidStringIndex { .. }
                | Self::RecordSizeMismatch { .. }
        )
    }
}
