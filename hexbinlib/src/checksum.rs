//! CRC-32/ISO-HDLC (the zlib / Ethernet CRC), computed bit by bit.
//!
//! The firmware verifies a flash operation by recomputing this exact variant over the
//! written bank, so it is reproduced here without lookup tables.

/// Reflected form of the CRC-32 polynomial `0x04C11DB7`.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

const INITIAL: u32 = 0xFFFF_FFFF;
const FINAL_XOR: u32 = 0xFFFF_FFFF;

/// Incremental CRC-32 state.
///
/// # Example
/// ```
/// use hexbinlib::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"1234");
/// crc.update(b"56789");
/// assert_eq!(crc.finalize(), 0xCBF4_3926);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Crc32 {
    register: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    #[must_use]
    pub const fn new() -> Self {
        Self { register: INITIAL }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.register ^= u32::from(byte);
            for _ in 0..8 {
                if self.register & 1 == 1 {
                    self.register = (self.register >> 1) ^ POLYNOMIAL;
                } else {
                    self.register >>= 1;
                }
            }
        }
    }

    #[must_use]
    pub const fn finalize(self) -> u32 {
        self.register ^ FINAL_XOR
    }
}

/// CRC-32 of `data` in one call.
///
/// # Example
/// ```
/// use hexbinlib::crc32;
///
/// assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
/// ```
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(data);
    crc.finalize()
}
