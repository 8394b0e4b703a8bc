//! 16-bit fold-and-complement checksum.
//!
//! The data is summed as little-endian 16-bit words (an odd trailing byte is
//! padded with zero), carries out of the low 16 bits are folded back in until
//! none remain, and the result is complemented. A buffer that already carries
//! its checksum as a trailing word sums to `0xFFFF`, so its checksum is zero.

/// Checksum of `data`
pub fn checksum16(data: &[u8]) -> u16 {
    let mut sum: u64 = data
        .chunks(2)
        .map(|w| u16::from_le_bytes([w[0], w.get(1).copied().unwrap_or(0)]) as u64)
        .sum();

    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

/// Whether `data`, ending in its little-endian checksum word, is intact
pub fn verify_checksum16(data: &[u8]) -> bool {
    data.len() >= 2 && data.len() % 2 == 0 && checksum16(data) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(checksum16(&[0x45, 0x00, 0x00, 0x73]), 0x8CBA);
        assert_eq!(checksum16(&[]), 0xFFFF);
        assert_eq!(checksum16(&[1, 2, 3]), 0xFDFB);
    }

    #[test]
    fn test_carry_fold() {
        // 0xFFFF + 0x0001 carries once
        assert_eq!(checksum16(&[0xFF, 0xFF, 0x01, 0x00]), 0xFFFE);
    }

    #[test]
    fn test_verify() {
        let mut data = vec![0x45, 0x00, 0x00, 0x73];
        let sum = checksum16(&data);
        data.extend_from_slice(&sum.to_le_bytes());
        assert!(verify_checksum16(&data));

        data[1] ^= 0x10;
        assert!(!verify_checksum16(&data));
        assert!(!verify_checksum16(&[0xFF]));
    }

    #[test]
    fn test_single_bit_flips_detected() {
        let data: Vec<u8> = (0..37u8).map(|i| i.wrapping_mul(73).wrapping_add(11)).collect();
        let reference = checksum16(&data);
        assert_eq!(checksum16(&data), reference);

        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data.clone();
                flipped[byte] ^= 1 << bit;
                assert_ne!(checksum16(&flipped), reference, "byte {} bit {}", byte, bit);
            }
        }
    }
}
