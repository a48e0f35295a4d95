//! The `error` module defines the errors that can occur while turning an Intel HEX file
//! into a raw binary window.
//!
//! Errors come in two flavours:
//! 1. [`LineError`] (carrying a [`RecordErrorKind`]): a single line could not be parsed.
//!    These are recoverable. The line is reported and skipped, and processing goes on.
//! 2. [`ExtractError`]: the whole extraction cannot produce a result, e.g., the window is
//!    invalid, the input cannot be read or none of the parsed data falls into the window.

use crate::record::RecordType;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordErrorKind {
    /// Record contains non-hexadecimal characters
    ContainsInvalidCharacters,
    /// Record is shorter than the fixed `:LLAAAATT` header
    RecordTooShort,
    /// Record payload would not fit into a single record
    RecordTooLong(usize),
    /// Fewer payload bytes present than the byte count declares (declared, present)
    RecordInvalidPayloadLength(usize, usize),
    /// Record's payload length is too small for the record type (type, expected, actual)
    RecordLengthInvalidForType(RecordType, usize, usize),
    /// Trailing checksum byte is absent
    MissingChecksum,
    /// Record checksum mismatch (expected, found)
    RecordChecksumMismatch(u8, u8),
}

impl fmt::Display for RecordErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainsInvalidCharacters => {
                write!(f, "Record contains invalid character(s)")
            }
            Self::RecordTooShort => {
                write!(f, "Record too short")
            }
            Self::RecordTooLong(length) => {
                write!(f, "Record payload of {length} bytes exceeds 255 bytes")
            }
            Self::RecordInvalidPayloadLength(declared, present) => {
                write!(
                    f,
                    "Byte count declares {declared} payload bytes, found {present}"
                )
            }
            Self::RecordLengthInvalidForType(rtype, expected, actual) => {
                write!(
                    f,
                    "For record type {rtype:?} expected data length is at least {expected} bytes, found {actual}"
                )
            }
            Self::MissingChecksum => {
                write!(f, "Missing record checksum")
            }
            Self::RecordChecksumMismatch(expected, actual) => {
                write!(
                    f,
                    "Invalid record checksum - expected: 0x{expected:02X}, found: 0x{actual:02X}"
                )
            }
        }
    }
}

impl Error for RecordErrorKind {}

/// A line of the hex input that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// What went wrong
    pub kind: RecordErrorKind,
    /// 1-based line number in the input
    pub line: usize,
    /// The offending line, without its line terminator
    pub text: String,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not parse line #{} '{}'. Reason: {}",
            self.line, self.text, self.kind
        )
    }
}

impl Error for LineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.kind)
    }
}

#[derive(Debug)]
pub enum ExtractError {
    /// Requested window has a size of zero
    ZeroSizedWindow,
    /// `start + size` does not fit into the 32-bit address space
    AddressOverflow { start: u32, size: u32 },
    /// None of the parsed data falls inside the window
    NoDataInWindow { start: u32, size: u32 },
    /// Reading the hex input failed
    Io(io::Error),
    /// The hex input file could not be opened or read
    ReadInput { path: PathBuf, source: io::Error },
    /// The binary output file could not be written
    WriteOutput { path: PathBuf, source: io::Error },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSizedWindow => {
                write!(f, "Window size must be greater than zero")
            }
            Self::AddressOverflow { start, size } => {
                write!(
                    f,
                    "Window 0x{start:08X} + 0x{size:X} exceeds the 32-bit address space"
                )
            }
            Self::NoDataInWindow { start, size } => {
                write!(
                    f,
                    "No data found within the specified address range 0x{start:08X} + 0x{size:X}"
                )
            }
            Self::Io(source) => {
                write!(f, "Could not read hex input: {source}")
            }
            Self::ReadInput { path, source } => {
                write!(f, "Could not open input file {}: {source}", path.display())
            }
            Self::WriteOutput { path, source } => {
                write!(f, "Could not create output file {}: {source}", path.display())
            }
        }
    }
}

impl Error for ExtractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(source)
            | Self::ReadInput { source, .. }
            | Self::WriteOutput { source, .. } => Some(source),
            _ => None,
        }
    }
}
