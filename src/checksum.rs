//! CRC8 folding used by PlainBuffer cell and row checksums.
//!
//! The service uses the plain MSB-first CRC-8 with polynomial `0x07`, zero
//! init, no reflection and no final xor (the SMBus parameters). Checksums are
//! folded: every step takes the previous checksum as its seed.

use crc::{Crc, CRC_8_SMBUS};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Folds a single byte into `seed`.
#[must_use]
pub fn fold_byte(seed: u8, byte: u8) -> u8 {
    fold_bytes(seed, &[byte])
}

/// Folds `bytes` into `seed`, left to right.
#[must_use]
pub fn fold_bytes(seed: u8, bytes: &[u8]) -> u8 {
    let mut digest = CRC8.digest_with_initial(seed);
    digest.update(bytes);
    digest.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_table() -> [u8; 256] {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let mut x = i as u8;
            for _ in 0..8 {
                x = (x << 1) ^ if x & 0x80 != 0 { 0x07 } else { 0 };
            }
            *slot = x;
        }
        table
    }

    #[test]
    fn matches_table_definition() {
        let table = reference_table();
        for seed in 0..=255u8 {
            for byte in [0u8, 1, 0x07, 0x75, 0x80, 0xFF] {
                assert_eq!(fold_byte(seed, byte), table[(seed ^ byte) as usize]);
            }
        }
    }

    #[test]
    fn fold_bytes_is_left_fold() {
        let bytes = b"uid\x00\x01\xfe";
        let expected = bytes.iter().fold(0x5A, |crc, b| fold_byte(crc, *b));
        assert_eq!(fold_bytes(0x5A, bytes), expected);
        assert_eq!(fold_bytes(0x33, &[]), 0x33);
    }

    #[test]
    fn standard_check_value() {
        assert_eq!(fold_bytes(0, b"123456789"), 0xF4);
    }
}
