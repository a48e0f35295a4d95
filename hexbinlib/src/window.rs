//! The `window` module provides [`AddressWindow`], the half-open address range
//! `[start, start + size)` carved out of the parsed hex data, and the extraction of that
//! range into a flat byte buffer.

use crate::assembler::MemoryMap;
use crate::error::ExtractError;

/// Byte value of erased flash. Fills every window address not covered by the input.
pub const ERASE_VALUE: u8 = 0xFF;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AddressWindow {
    start: u32,
    size: u32,
}

impl AddressWindow {
    /// Creates a window of `size` bytes starting at `start`.
    ///
    /// The window may end exactly at the top of the 32-bit address space, but not beyond it.
    ///
    /// # Errors
    /// - [`ExtractError::ZeroSizedWindow`] if `size` is zero
    /// - [`ExtractError::AddressOverflow`] if `start + size` exceeds `2^32`
    ///
    /// # Example
    /// ```
    /// use hexbinlib::AddressWindow;
    ///
    /// let window = AddressWindow::new(0x0800_0000, 0x1000).unwrap();
    /// assert_eq!(window.end(), 0x0800_1000);
    ///
    /// assert!(AddressWindow::new(0xFFFF_FFFF, 2).is_err());
    /// ```
    pub fn new(start: u32, size: u32) -> Result<Self, ExtractError> {
        if size == 0 {
            return Err(ExtractError::ZeroSizedWindow);
        }
        if u64::from(start) + u64::from(size) > 1 << 32 {
            return Err(ExtractError::AddressOverflow { start, size });
        }
        Ok(Self { start, size })
    }

    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Exclusive end address. Can be `2^32`, hence the wider type.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.start as u64 + self.size as u64
    }

    #[must_use]
    pub const fn contains(&self, address: u32) -> bool {
        address >= self.start && (address as u64) < self.end()
    }

    /// Materializes the window from `memory`: `size` bytes pre-filled with
    /// [`ERASE_VALUE`], overwritten by every in-range entry of the map.
    ///
    /// # Errors
    /// Returns [`ExtractError::NoDataInWindow`] if no entry of `memory` falls into the window.
    ///
    /// # Example
    /// ```
    /// use std::collections::BTreeMap;
    /// use hexbinlib::AddressWindow;
    ///
    /// let window = AddressWindow::new(0x100, 4).unwrap();
    /// let memory = BTreeMap::from([(0x101, 0xAB), (0x200, 0xCD)]);
    ///
    /// assert_eq!(window.extract(&memory).unwrap(), vec![0xFF, 0xAB, 0xFF, 0xFF]);
    /// ```
    pub fn extract(&self, memory: &MemoryMap) -> Result<Vec<u8>, ExtractError> {
        let mut buffer = vec![ERASE_VALUE; self.size as usize];
        let mut populated = 0usize;

        for (&address, &byte) in memory
            .range(self.start..)
            .take_while(|(address, _)| self.contains(**address))
        {
            buffer[(address - self.start) as usize] = byte;
            populated += 1;
        }

        if populated == 0 {
            return Err(ExtractError::NoDataInWindow {
                start: self.start,
                size: self.size,
            });
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        // Act
        let window = AddressWindow::new(0x0800_0000, 0x10);

        // Assert
        assert!(window.is_ok());
        if let Ok(window) = window {
            assert_eq!(window.start(), 0x0800_0000);
            assert_eq!(window.size(), 0x10);
            assert_eq!(window.end(), 0x0800_0010);
        }
    }

    #[test]
    fn test_new_rejects_zero_size() {
        assert!(matches!(
            AddressWindow::new(0x1000, 0),
            Err(ExtractError::ZeroSizedWindow)
        ));
    }

    #[test]
    fn test_new_rejects_overflow() {
        assert!(matches!(
            AddressWindow::new(0xFFFF_FF00, 0x101),
            Err(ExtractError::AddressOverflow {
                start: 0xFFFF_FF00,
                size: 0x101
            })
        ));
        assert!(matches!(
            AddressWindow::new(u32::MAX, u32::MAX),
            Err(ExtractError::AddressOverflow { .. })
        ));
    }

    #[test]
    fn test_window_reaching_top_of_address_space() {
        // Act
        let window = AddressWindow::new(0xFFFF_FF00, 0x100);

        // Assert
        assert!(window.is_ok());
        if let Ok(window) = window {
            assert_eq!(window.end(), 1 << 32);
            assert!(window.contains(u32::MAX));
            assert!(!window.contains(0xFFFF_FEFF));
        }
    }

    #[test]
    fn test_contains_is_half_open() {
        // Arrange
        let window = AddressWindow::new(0x100, 0x10).unwrap_or_else(|e| panic!("{e}"));

        // Assert
        assert!(!window.contains(0xFF));
        assert!(window.contains(0x100));
        assert!(window.contains(0x10F));
        assert!(!window.contains(0x110));
    }

    #[test]
    fn test_extract_fills_gaps_with_erase_value() {
        // Arrange
        let window = AddressWindow::new(0x0800_0000, 8).unwrap_or_else(|e| panic!("{e}"));
        let memory = MemoryMap::from([
            (0x07FF_FFFF, 0x11), // below
            (0x0800_0001, 0x22),
            (0x0800_0007, 0x33),
            (0x0800_0008, 0x44), // above
        ]);

        // Act
        let res = window.extract(&memory);

        // Assert
        assert_eq!(
            res.ok(),
            Some(vec![0xFF, 0x22, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x33])
        );
    }

    #[test]
    fn test_extract_keeps_erase_valued_data() {
        // Arrange - data that happens to equal the erase value still counts as data
        let window = AddressWindow::new(0, 2).unwrap_or_else(|e| panic!("{e}"));
        let memory = MemoryMap::from([(1, ERASE_VALUE)]);

        // Act
        let res = window.extract(&memory);

        // Assert
        assert_eq!(res.ok(), Some(vec![0xFF, 0xFF]));
    }

    #[test]
    fn test_extract_without_data_in_range() {
        // Arrange
        let window = AddressWindow::new(0x0800_0000, 0x10).unwrap_or_else(|e| panic!("{e}"));
        let memory = MemoryMap::from([(0x0800_0020, 0xAA), (0x0000_0000, 0xBB)]);

        // Act
        let res = window.extract(&memory);

        // Assert
        assert!(matches!(
            res,
            Err(ExtractError::NoDataInWindow {
                start: 0x0800_0000,
                size: 0x10
            })
        ));
    }

    #[test]
    fn test_extract_empty_map() {
        let window = AddressWindow::new(0, 1).unwrap_or_else(|e| panic!("{e}"));
        assert!(window.extract(&MemoryMap::new()).is_err());
    }
}
