//! The `assembler` module folds parsed [`Record`]s into a sparse memory map.
//!
//! Data records only carry 16-bit offsets; the upper half of each address comes from the
//! most recent extended linear address record. Only bytes that land inside the target
//! [`AddressWindow`] are kept, so memory use is bounded by the window size rather than by
//! the address span of the whole file.

use crate::record::{Record, RecordType};
use crate::window::AddressWindow;
use std::collections::BTreeMap;

/// Absolute address -> byte value. Later writes to an address replace earlier ones.
pub type MemoryMap = BTreeMap<u32, u8>;

/// Whether the record stream should keep being fed to the assembler.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fold {
    Continue,
    /// An end-of-file record was seen
    Stop,
}

#[derive(Debug, Clone)]
pub struct MemoryAssembler {
    window: AddressWindow,
    /// Upper 16 address bits, already shifted into place
    high_address_base: u32,
    memory: MemoryMap,
    terminated: bool,
}

impl MemoryAssembler {
    #[must_use]
    pub const fn new(window: AddressWindow) -> Self {
        Self {
            window,
            high_address_base: 0,
            memory: BTreeMap::new(),
            terminated: false,
        }
    }

    #[must_use]
    pub const fn window(&self) -> AddressWindow {
        self.window
    }

    #[must_use]
    pub const fn high_address_base(&self) -> u32 {
        self.high_address_base
    }

    /// True once an end-of-file record has been folded in.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Applies one record to the assembler state.
    ///
    /// After an end-of-file record every further record is ignored and [`Fold::Stop`] is
    /// returned.
    ///
    /// # Example
    /// ```
    /// use hexbinlib::{AddressWindow, Fold, MemoryAssembler, Record};
    ///
    /// let window = AddressWindow::new(0x0800_0000, 0x100).unwrap();
    /// let mut asm = MemoryAssembler::new(window);
    ///
    /// asm.fold(&Record::extended_linear_address(0x0800));
    /// asm.fold(&Record::data(0x0010, &[0xAB]).unwrap());
    /// assert_eq!(asm.fold(&Record::end_of_file()), Fold::Stop);
    ///
    /// assert_eq!(asm.memory().get(&0x0800_0010), Some(&0xAB));
    /// ```
    pub fn fold(&mut self, record: &Record) -> Fold {
        if self.terminated {
            return Fold::Stop;
        }

        match record.rtype {
            RecordType::Data => {
                let base = u64::from(self.high_address_base) + u64::from(record.address);
                // Filter per byte: a record may straddle either window boundary
                for (address, byte) in (base..).zip(&record.data) {
                    if let Ok(address) = u32::try_from(address)
                        && self.window.contains(address)
                    {
                        self.memory.insert(address, *byte);
                    }
                }
            }
            RecordType::ExtendedLinearAddress => {
                if let Some(upper) = record.upper_address() {
                    self.high_address_base = u32::from(upper) << 16;
                    log::debug!("High address base set to 0x{:08X}", self.high_address_base);
                }
            }
            RecordType::EndOfFile => {
                log::debug!("End of file record, stopping");
                self.terminated = true;
                return Fold::Stop;
            }
            RecordType::Other(code) => {
                log::debug!("Ignoring record of type 0x{code:02X}");
            }
        }

        Fold::Continue
    }

    #[must_use]
    pub const fn memory(&self) -> &MemoryMap {
        &self.memory
    }

    #[must_use]
    pub fn into_memory(self) -> MemoryMap {
        self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    fn window(start: u32, size: u32) -> AddressWindow {
        AddressWindow::new(start, size).unwrap_or_else(|e| panic!("{e}"))
    }

    fn data(address: u16, payload: &[u8]) -> Record {
        Record::data(address, payload).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_extended_address_sets_base() {
        // Arrange
        let mut asm = MemoryAssembler::new(window(0x0800_0000, 0x100));

        // Act
        asm.fold(&Record::extended_linear_address(0x0800));
        asm.fold(&data(0x0010, &[0x5A]));

        // Assert
        assert_eq!(asm.high_address_base(), 0x0800_0000);
        assert_eq!(asm.memory(), &MemoryMap::from([(0x0800_0010, 0x5A)]));
    }

    #[test]
    fn test_extended_address_replaces_base() {
        // Arrange
        let mut asm = MemoryAssembler::new(window(0, u32::MAX));

        // Act
        asm.fold(&Record::extended_linear_address(0x0001));
        asm.fold(&data(0x0000, &[0x01]));
        asm.fold(&Record::extended_linear_address(0x0800));
        asm.fold(&data(0x0000, &[0x02]));
        asm.fold(&Record::extended_linear_address(0x0000));
        asm.fold(&data(0x0000, &[0x03]));

        // Assert
        assert_eq!(
            asm.into_memory(),
            MemoryMap::from([(0x0000_0000, 0x03), (0x0001_0000, 0x01), (0x0800_0000, 0x02)])
        );
    }

    #[test]
    fn test_bytes_outside_window_are_dropped() {
        // Arrange - record covers 0x0E..0x16, window is 0x10..0x14
        let mut asm = MemoryAssembler::new(window(0x10, 4));

        // Act
        asm.fold(&data(0x000E, &[0, 1, 2, 3, 4, 5, 6, 7]));

        // Assert
        assert_eq!(
            asm.memory(),
            &MemoryMap::from([(0x10, 2), (0x11, 3), (0x12, 4), (0x13, 5)])
        );
    }

    #[test]
    fn test_last_write_wins() {
        // Arrange
        let mut asm = MemoryAssembler::new(window(0, 0x10));

        // Act
        asm.fold(&data(0x0000, &[0xAA, 0xBB]));
        asm.fold(&data(0x0001, &[0xCC]));

        // Assert
        assert_eq!(asm.memory(), &MemoryMap::from([(0, 0xAA), (1, 0xCC)]));
    }

    #[test]
    fn test_end_of_file_stops_folding() {
        // Arrange
        let mut asm = MemoryAssembler::new(window(0, 0x10));

        // Act
        let first = asm.fold(&data(0x0000, &[0x01]));
        let eof = asm.fold(&Record::end_of_file());
        let after = asm.fold(&data(0x0001, &[0x02]));

        // Assert
        assert_eq!(first, Fold::Continue);
        assert_eq!(eof, Fold::Stop);
        assert_eq!(after, Fold::Stop);
        assert!(asm.is_terminated());
        assert_eq!(asm.memory(), &MemoryMap::from([(0, 0x01)]));
    }

    #[test]
    fn test_other_records_are_ignored() {
        // Arrange
        let mut asm = MemoryAssembler::new(window(0, 0x10));
        let start_linear = Record {
            length: 4,
            address: 0,
            rtype: RecordType::Other(0x05),
            data: vec![0x00, 0x00, 0x00, 0x01],
            checksum: None,
        };

        // Act
        let res = asm.fold(&start_linear);

        // Assert
        assert_eq!(res, Fold::Continue);
        assert_eq!(asm.high_address_base(), 0);
        assert!(asm.memory().is_empty());
    }

    #[test]
    fn test_record_at_top_of_address_space_does_not_wrap() {
        // Arrange - 0xFFFF_FFFE.. would wrap to 0x0 in 32-bit arithmetic
        let mut asm = MemoryAssembler::new(window(0, 0x10));

        // Act
        asm.fold(&Record::extended_linear_address(0xFFFF));
        asm.fold(&data(0xFFFE, &[0x01, 0x02, 0x03, 0x04]));

        // Assert
        assert!(asm.memory().is_empty());
    }

    #[test]
    fn test_disjoint_records_independent_of_order() {
        // Arrange
        let mut records: Vec<Record> = (0u16..32)
            .map(|i| data(i * 4, &[i as u8; 4]))
            .collect();
        let expected: MemoryMap = (0u32..128).map(|a| (a, (a / 4) as u8)).collect();

        for _ in 0..5 {
            records.shuffle(&mut rand::rng());
            let mut asm = MemoryAssembler::new(window(0, 128));

            // Act
            for record in &records {
                asm.fold(record);
            }

            // Assert
            assert_eq!(asm.memory(), &expected);
        }
    }
}
