//! Error types for map partition decoding and encoding

use std::io;

use crate::topology::TopologyKind;

/// Errors that can occur when reading or writing map partitions
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A read would run past the end of the buffer
    #[error("out of data at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    OutOfData {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A null-terminated string had no terminator before the end of the buffer
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    /// A null-terminated string was not valid UTF-8
    #[error("invalid UTF-8 in string at offset {0}")]
    InvalidUtf8(usize),

    /// Seek target lies outside the buffer
    #[error("seek to {target} outside buffer of {len} bytes")]
    SeekOutOfBounds { target: usize, len: usize },

    /// Bit width outside 1..=32
    #[error("invalid bit width {0} (must be 1-32)")]
    InvalidBitWidth(u32),

    /// Caller asked to write a value into fewer bits than it needs
    #[error("value {value} needs {required} bits, only {bits} supplied")]
    InsufficientBitWidth { value: i64, bits: u32, required: u32 },

    /// String with an embedded NUL cannot be written null-terminated
    #[error("string contains an interior NUL byte")]
    InteriorNul,

    /// A value does not fit the wire field it is encoded into
    #[error("{field} value {value} out of range")]
    ValueOutOfRange { field: &'static str, value: i64 },

    /// Encoder could not resolve a table index for a value it just tabulated
    #[error("unresolved {0} table index")]
    UnresolvedIndex(&'static str),

    /// Unknown topology type tag
    #[error("unknown topology kind tag {0}")]
    UnknownTopologyKind(u8),

    /// Cell table shorter than its declared size
    #[error("truncated {kind:?} cell table: expected {expected} bytes, {available} available")]
    TruncatedCellTable {
        kind: TopologyKind,
        expected: usize,
        available: usize,
    },

    /// A side table does not match the size its cell table implies
    #[error("{kind:?} {table} table has {actual} entries, expected {expected}")]
    TableLengthMismatch {
        kind: TopologyKind,
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Sparse cell words are not sorted by (y, x)
    #[error("{kind:?} cell words not sorted at entry {index}")]
    UnsortedCells { kind: TopologyKind, index: usize },

    /// Sparse cell word addresses a cell outside the partition
    #[error("{kind:?} cell ({x}, {y}) outside partition footprint")]
    CellOutOfRange { kind: TopologyKind, x: u32, y: u32 },

    /// IO error while compressing or decompressing
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Codec configuration could not be parsed
    #[error("invalid codec config: {0}")]
    Config(#[from] toml::de::Error),
}

impl MapError {
    pub(crate) fn out_of_range(field: &'static str, value: impl Into<i64>) -> Self {
        Self::ValueOutOfRange {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
