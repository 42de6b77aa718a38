use crc::{Crc, CRC_16_MODBUS};

/// CRC-16/MODBUS checksum with its lookup table built once at construction.
///
/// Running the checksum over a payload followed by its own little-endian
/// checksum yields zero, which is how received frames are verified.
pub struct Crc16 {
    crc: Crc<u16>,
}

impl Crc16 {
    /// Build the CRC-16/MODBUS table.
    pub const fn new() -> Self {
        Self {
            crc: Crc::<u16>::new(&CRC_16_MODBUS),
        }
    }

    /// Checksum of `bytes`.
    pub fn checksum(&self, bytes: &[u8]) -> u16 {
        self.crc.checksum(bytes)
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc16 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc16")
            .field("algorithm", &"CRC-16/MODBUS")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_check_value() {
        assert_eq!(Crc16::new().checksum(b"123456789"), 0x4B37);
    }

    #[test]
    fn known_short_payloads() {
        let crc = Crc16::new();
        assert_eq!(crc.checksum(&[0x01, 0x02]), 0xE181);
        assert_eq!(crc.checksum(&[0xC0]), 0x10BF);
    }

    #[test]
    fn empty_input_is_initial_value() {
        assert_eq!(Crc16::new().checksum(&[]), 0xFFFF);
    }

    #[test]
    fn self_check_residue_is_zero() {
        let crc = Crc16::new();
        let mut data = b"ping".to_vec();
        let sum = crc.checksum(&data);
        data.extend_from_slice(&sum.to_le_bytes());
        assert_eq!(crc.checksum(&data), 0);
    }
}
