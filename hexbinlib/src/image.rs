//! The `image` module provides [`FlashImage`], the end-to-end pipeline from Intel HEX text
//! to a fixed-size binary window and its CRC-32.
//!
//! Lines are parsed and folded one at a time; malformed lines are logged, collected into
//! the [`ParseReport`] and skipped. Only a window that ends up without any input data, or
//! an I/O failure, aborts the run.

use crate::assembler::{Fold, MemoryAssembler};
use crate::checksum::crc32;
use crate::error::{ExtractError, LineError};
use crate::record::{ParseOptions, ParsedLine, parse_line};
use crate::window::AddressWindow;
use std::ffi::OsString;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Statistics gathered while parsing the hex input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Lines read, up to and including the end-of-file record
    pub lines: usize,
    /// Records successfully parsed and folded
    pub records: usize,
    /// Lines that looked like records but failed to parse
    pub malformed: Vec<LineError>,
    /// Whether an end-of-file record stopped processing
    pub terminated: bool,
    /// Window bytes supplied by the input; the rest is erase-value padding
    pub populated: usize,
}

#[derive(Debug, Clone)]
pub struct FlashImage {
    window: AddressWindow,
    data: Vec<u8>,
    checksum: u32,
    report: ParseReport,
}

impl FlashImage {
    /// Extracts `window` from the hex file at `filepath`.
    ///
    /// # Errors
    /// - [`ExtractError::ReadInput`] if the file cannot be opened or read
    /// - [`ExtractError::NoDataInWindow`] if no parsed byte falls inside the window
    pub fn from_hex<P: AsRef<Path>>(
        filepath: P,
        window: AddressWindow,
        options: ParseOptions,
    ) -> Result<Self, ExtractError> {
        let filepath = filepath.as_ref();
        let read_error = |source| ExtractError::ReadInput {
            path: filepath.to_path_buf(),
            source,
        };

        let file = std::fs::File::open(filepath).map_err(read_error)?;
        let image = Self::from_reader(std::io::BufReader::new(file), window, options).map_err(
            |err| match err {
                ExtractError::Io(source) => read_error(source),
                other => other,
            },
        )?;

        log::info!("Successfully parsed HEX file: {}", filepath.display());
        Ok(image)
    }

    /// Extracts `window` from in-memory hex text.
    ///
    /// # Errors
    /// Returns [`ExtractError::NoDataInWindow`] if no parsed byte falls inside the window.
    ///
    /// # Example
    /// ```
    /// use hexbinlib::{AddressWindow, FlashImage, ParseOptions};
    ///
    /// let hex = ":020000040800F2\n:04000000DEADBEEFC4\n:00000001FF\n";
    /// let window = AddressWindow::new(0x0800_0000, 4).unwrap();
    ///
    /// let image = FlashImage::parse(hex.as_bytes(), window, ParseOptions::default()).unwrap();
    /// assert_eq!(image.data(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    /// assert_eq!(image.checksum(), 0x7C9C_A35A);
    /// ```
    pub fn parse(
        raw_bytes: &[u8],
        window: AddressWindow,
        options: ParseOptions,
    ) -> Result<Self, ExtractError> {
        Self::from_reader(raw_bytes, window, options)
    }

    /// Extracts `window` from any buffered reader of hex text.
    ///
    /// # Errors
    /// - [`ExtractError::Io`] if reading fails
    /// - [`ExtractError::NoDataInWindow`] if no parsed byte falls inside the window
    pub fn from_reader<R: BufRead>(
        mut reader: R,
        window: AddressWindow,
        options: ParseOptions,
    ) -> Result<Self, ExtractError> {
        let mut assembler = MemoryAssembler::new(window);
        let mut report = ParseReport::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader
                .read_until(b'\n', &mut line)
                .map_err(ExtractError::Io)?
                == 0
            {
                break;
            }
            report.lines += 1;

            match parse_line(report.lines, &line, options) {
                ParsedLine::Skipped => {}
                ParsedLine::Malformed(err) => {
                    log::warn!("{err}");
                    report.malformed.push(err);
                }
                ParsedLine::Record(record) => {
                    report.records += 1;
                    if assembler.fold(&record) == Fold::Stop {
                        report.terminated = true;
                        break;
                    }
                }
            }
        }

        let memory = assembler.into_memory();
        report.populated = memory.len();

        let data = window.extract(&memory)?;
        let checksum = crc32(&data);

        log::debug!(
            "Window 0x{:08X}..0x{:08X}: {} of {} bytes from input, {} malformed line(s)",
            window.start(),
            window.end(),
            report.populated,
            data.len(),
            report.malformed.len()
        );

        Ok(Self {
            window,
            data,
            checksum,
            report,
        })
    }

    /// Writes the window as a flat binary file.
    ///
    /// The bytes go to a temporary sibling file first, which is then renamed over
    /// `filepath`, so a failed write leaves no partial output behind.
    ///
    /// # Errors
    /// Returns [`ExtractError::WriteOutput`] if the file cannot be written.
    pub fn write_bin<P: AsRef<Path>>(&self, filepath: P) -> Result<(), ExtractError> {
        let filepath = filepath.as_ref();
        let write_error = |source| ExtractError::WriteOutput {
            path: filepath.to_path_buf(),
            source,
        };

        // Ensure the parent directory exists
        if let Some(parent) = filepath.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let tmp_path = temporary_sibling(filepath);
        if let Err(err) = std::fs::write(&tmp_path, &self.data)
            .and_then(|()| std::fs::rename(&tmp_path, filepath))
        {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(write_error(err));
        }

        log::info!(
            "Successfully created binary file: {}",
            filepath.display()
        );
        Ok(())
    }

    #[must_use]
    pub const fn window(&self) -> AddressWindow {
        self.window
    }

    /// Window contents; byte `i` belongs to address `window().start() + i`.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: a window holds at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// CRC-32/ISO-HDLC of [`Self::data`].
    #[must_use]
    pub const fn checksum(&self) -> u32 {
        self.checksum
    }

    #[must_use]
    pub const fn report(&self) -> &ParseReport {
        &self.report
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn temporary_sibling(filepath: &Path) -> PathBuf {
    let mut name = filepath
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    filepath.with_file_name(name)
}
