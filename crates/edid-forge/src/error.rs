use thiserror::Error;

pub type Result<T> = std::result::Result<T, EdidError>;

/// Unified error type for EDID generation.
///
/// [`EdidError::TimingOverflow`] is an expected, per-variant failure: the
/// requested mode does not fit the field widths of the EDID encoding and that
/// refresh-rate variant is skipped. [`EdidError::InvalidEdid`] is raised by the
/// post-build self-check and always indicates a builder defect, never bad user
/// input. [`EdidError::Profile`] rejects a malformed static profile before any
/// timing work begins.
#[derive(Debug, Error)]
pub enum EdidError {
    #[error("timing overflow: {field}={value} exceeds {max}")]
    TimingOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("invalid EDID: {0}")]
    InvalidEdid(InvalidReason),

    #[error("invalid profile: {0}")]
    Profile(&'static str),
}

/// The specific structural invariant a finished artifact violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("length {0} is not a positive multiple of 128")]
    BadLength(usize),

    #[error("header magic mismatch")]
    BadHeader,

    #[error("block {block} sums to {sum}, expected 0 mod 256")]
    BadChecksum { block: usize, sum: u8 },

    #[error("extension count byte is {declared} but {actual} extension block(s) follow")]
    ExtensionCountMismatch { declared: u8, actual: usize },

    #[error("descriptor slot {slot} has unrecognized tag {tag:#04x}")]
    UnknownDescriptorTag { slot: usize, tag: u8 },

    #[error("expected exactly one detailed timing descriptor, found {0}")]
    PreferredTimingCount(usize),

    #[error("preferred detailed timing is not in the first descriptor slot")]
    PreferredNotFirst,

    #[error("extension block {block} has unsupported tag {tag:#04x}")]
    UnknownExtensionTag { block: usize, tag: u8 },
}
