//! The `record` module defines the [`Record`] and [`RecordType`] which are used for parsing
//! (and rendering) single Intel HEX lines.
//!
//! Parsing is lenient in the same places real-world tooling is: lines that do not start
//! with `:` are skipped rather than rejected, characters after the trailing checksum are
//! ignored, and the checksum itself is only validated on request (see [`ParseOptions`]).

use crate::error::{LineError, RecordErrorKind};
use std::fmt;

mod ranges {
    use std::ops::Range;
    pub const RECORD_LEN_RANGE: Range<usize> = 1..3;
    pub const RECORD_ADDR_RANGE: Range<usize> = 3..7;
    pub const RECORD_TYPE_RANGE: Range<usize> = 7..9;
}
mod sizes {
    pub const BYTE_CHAR_LEN: usize = 2;
    pub const HEADER_LEN: usize = 9; // ':' + len + addr + rtype
}

/// Every record line begins with this character.
pub const START_CODE: u8 = b':';

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordType {
    Data,
    EndOfFile,
    ExtendedLinearAddress,
    /// Syntactically valid, but not interpreted (e.g. start address records)
    Other(u8),
}

impl RecordType {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Data,
            0x01 => Self::EndOfFile,
            0x04 => Self::ExtendedLinearAddress,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Data => 0x00,
            Self::EndOfFile => 0x01,
            Self::ExtendedLinearAddress => 0x04,
            Self::Other(code) => code,
        }
    }
}

/// Options controlling how strictly record lines are parsed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject records whose trailing checksum is missing or does not match.
    pub verify_checksums: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Declared payload length
    pub length: u8,
    /// 16-bit address offset
    pub address: u16,
    pub rtype: RecordType,
    pub data: Vec<u8>,
    /// Trailing checksum byte, if present on the line
    pub checksum: Option<u8>,
}

/// Outcome of parsing one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Empty line or a line not starting with [`START_CODE`]
    Skipped,
    Record(Record),
    Malformed(LineError),
}

/// Parse one line of hex input. `line_no` is only used for error reporting.
///
/// Trailing whitespace (including the `\r` of CRLF files) is ignored.
#[must_use]
pub fn parse_line(line_no: usize, line: &[u8], options: ParseOptions) -> ParsedLine {
    let line = line.trim_ascii_end();

    if line.first() != Some(&START_CODE) {
        return ParsedLine::Skipped;
    }

    match Record::parse(line, options) {
        Ok(record) => ParsedLine::Record(record),
        Err(kind) => ParsedLine::Malformed(LineError {
            kind,
            line: line_no,
            text: String::from_utf8_lossy(line).into_owned(),
        }),
    }
}

const fn hex_digit(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

fn hex_byte(pair: &[u8]) -> Result<u8, RecordErrorKind> {
    match pair {
        [hi, lo] => match (hex_digit(*hi), hex_digit(*lo)) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(RecordErrorKind::ContainsInvalidCharacters),
        },
        _ => Err(RecordErrorKind::RecordTooShort),
    }
}

impl Record {
    /// Create a data record. Fails if the payload exceeds 255 bytes.
    ///
    /// # Errors
    /// Returns [`RecordErrorKind::RecordTooLong`] for oversized payloads.
    pub fn data(address: u16, payload: &[u8]) -> Result<Self, RecordErrorKind> {
        let length =
            u8::try_from(payload.len()).map_err(|_| RecordErrorKind::RecordTooLong(payload.len()))?;
        Ok(Self::with_checksum(
            length,
            address,
            RecordType::Data,
            payload.to_vec(),
        ))
    }

    /// Create an extended linear address record setting the upper 16 address bits.
    #[must_use]
    pub fn extended_linear_address(upper: u16) -> Self {
        Self::with_checksum(
            2,
            0,
            RecordType::ExtendedLinearAddress,
            upper.to_be_bytes().to_vec(),
        )
    }

    #[must_use]
    pub fn end_of_file() -> Self {
        Self::with_checksum(0, 0, RecordType::EndOfFile, Vec::new())
    }

    fn with_checksum(length: u8, address: u16, rtype: RecordType, data: Vec<u8>) -> Self {
        let mut record = Self {
            length,
            address,
            rtype,
            data,
            checksum: None,
        };
        record.checksum = Some(record.calculate_checksum());
        record
    }

    /// Calculate the checksum of the record's fields: the two's complement of the
    /// 8-bit sum of length, address bytes, type and payload.
    #[must_use]
    pub fn calculate_checksum(&self) -> u8 {
        let [addr_high, addr_low] = self.address.to_be_bytes();
        let sum = self
            .data
            .iter()
            .fold(
                self.length
                    .wrapping_add(addr_high)
                    .wrapping_add(addr_low)
                    .wrapping_add(self.rtype.code()),
                |acc, b| acc.wrapping_add(*b),
            );
        (!sum).wrapping_add(1) // two's complement
    }

    /// Upper 16 address bits carried by an extended linear address record.
    #[must_use]
    pub fn upper_address(&self) -> Option<u16> {
        match (self.rtype, self.data.as_slice()) {
            (RecordType::ExtendedLinearAddress, [msb, lsb, ..]) => {
                Some(u16::from_be_bytes([*msb, *lsb]))
            }
            _ => None,
        }
    }

    /// Parse a record line (starting with `:`) into a [`Record`].
    ///
    /// # Errors
    /// Returns the [`RecordErrorKind`] describing why the line is not a valid record.
    pub fn parse(line: &[u8], options: ParseOptions) -> Result<Self, RecordErrorKind> {
        if line.len() < sizes::HEADER_LEN {
            return Err(RecordErrorKind::RecordTooShort);
        }

        let length = hex_byte(&line[ranges::RECORD_LEN_RANGE])?;
        let addr_high = hex_byte(&line[ranges::RECORD_ADDR_RANGE][..sizes::BYTE_CHAR_LEN])?;
        let addr_low = hex_byte(&line[ranges::RECORD_ADDR_RANGE][sizes::BYTE_CHAR_LEN..])?;
        let rtype = RecordType::from_code(hex_byte(&line[ranges::RECORD_TYPE_RANGE])?);

        // Check the line holds as many payload bytes as it claims
        let data_end = sizes::HEADER_LEN + sizes::BYTE_CHAR_LEN * length as usize;
        if line.len() < data_end {
            return Err(RecordErrorKind::RecordInvalidPayloadLength(
                length as usize,
                (line.len() - sizes::HEADER_LEN) / sizes::BYTE_CHAR_LEN,
            ));
        }

        let data = line[sizes::HEADER_LEN..data_end]
            .chunks_exact(sizes::BYTE_CHAR_LEN)
            .map(hex_byte)
            .collect::<Result<Vec<u8>, _>>()?;

        if rtype == RecordType::ExtendedLinearAddress && data.len() < 2 {
            return Err(RecordErrorKind::RecordLengthInvalidForType(
                rtype,
                2,
                data.len(),
            ));
        }

        let checksum_field = line.get(data_end..data_end + sizes::BYTE_CHAR_LEN);

        let record = Self {
            length,
            address: u16::from_be_bytes([addr_high, addr_low]),
            rtype,
            data,
            checksum: checksum_field.and_then(|pair| hex_byte(pair).ok()),
        };

        if options.verify_checksums {
            let found = match checksum_field {
                Some(pair) => hex_byte(pair)?,
                None => return Err(RecordErrorKind::MissingChecksum),
            };
            let expected = record.calculate_checksum();
            if expected != found {
                return Err(RecordErrorKind::RecordChecksumMismatch(expected, found));
            }
        }

        Ok(record)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ":{:02X}{:04X}{:02X}",
            self.length,
            self.address,
            self.rtype.code()
        )?;
        for byte in &self.data {
            write!(f, "{byte:02X}")?;
        }
        write!(f, "{:02X}", self.calculate_checksum())
    }
}
