//! # `hexbinlib`
//!
//! `hexbinlib` turns an Intel HEX firmware image into the raw bytes of one flash bank.
//!
//! The library provides:
//! - Line parser for Intel HEX records (via [`Record`] and [`parse_line`]).
//! - Sparse memory assembly with extended linear addressing (via [`MemoryAssembler`]).
//! - Extraction of a fixed address window, padded with [`ERASE_VALUE`] (via [`AddressWindow`]).
//! - CRC-32/ISO-HDLC of the extracted bytes (via [`crc32`]).
//! - The whole pipeline in one call, including the binary output file (via [`FlashImage`]).
//!
//! ## Example
//!
//! ```
//! use hexbinlib::{AddressWindow, FlashImage, ParseOptions};
//!
//! let window = AddressWindow::new(0x0800_0000, 0x10).unwrap();
//! let image = FlashImage::from_hex("tests/fixtures/app.hex", window, ParseOptions::default())
//!     .unwrap();
//!
//! println!("Size: {} bytes", image.len());
//! println!("Generated Hash: 0x{:08X}", image.checksum());
//! ```

mod assembler;
mod checksum;
mod error;
mod image;
mod record;
mod window;

// Public APIs
pub use assembler::{Fold, MemoryAssembler, MemoryMap};
pub use checksum::{Crc32, POLYNOMIAL, crc32};
pub use error::{ExtractError, LineError, RecordErrorKind};
pub use image::{FlashImage, ParseReport};
pub use record::{ParseOptions, ParsedLine, Record, RecordType, START_CODE, parse_line};
pub use window::{AddressWindow, ERASE_VALUE};
