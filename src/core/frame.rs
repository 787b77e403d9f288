//! Wire frame construction and verification
//!
//! The controller understands exactly two frame shapes:
//!
//! - Read:  `[0x3C, addr_hi, addr_lo, checksum]`, replied with
//!   `[echo, value, checksum]`
//! - Write: `[0x3D, addr_hi, addr_lo, value, checksum]`, replied with a
//!   single ack byte (`0x06` on success)
//!
//! The checksum is the unsigned sum of all preceding frame bytes mod 256 and
//! is computed *before* XOR keying. Replies arrive unkeyed, so they are
//! verified as received. Pure transformations only; no I/O happens here.

use super::error::ProtocolError;

/// Command byte opening a register read frame
pub const READ_FRAME: u8 = 0x3C;

/// Command byte opening a register write frame
pub const WRITE_FRAME: u8 = 0x3D;

/// Ack byte the device returns for a successful register write
pub const WRITE_ACK: u8 = 0x06;

/// Length of a register read reply (echo, value, checksum)
pub const READ_REPLY_LEN: usize = 3;

/// Sum of all bytes mod 256
pub fn sum8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Build a register read frame for `address`
pub fn encode_read(address: u16) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4);
    frame.push(READ_FRAME);
    frame.extend_from_slice(&address.to_be_bytes());
    frame.push(sum8(&frame));
    frame
}

/// Build a register write frame placing `value` at `address`
///
/// Fails with [`ProtocolError::InvalidValue`] if `value` does not fit a
/// single register byte.
pub fn encode_write(address: u16, value: u16) -> Result<Vec<u8>, ProtocolError> {
    if value > 0xFF {
        return Err(ProtocolError::InvalidValue { value });
    }

    let mut frame = Vec::with_capacity(5);
    frame.push(WRITE_FRAME);
    frame.extend_from_slice(&address.to_be_bytes());
    frame.push(value as u8);
    frame.push(sum8(&frame));
    Ok(frame)
}

/// XOR every byte with `key`, identity when no key is set
///
/// XOR is an involution, so applying the same key twice restores the frame.
pub fn apply_key(frame: &mut [u8], key: Option<u8>) {
    if let Some(key) = key {
        for byte in frame.iter_mut() {
            *byte ^= key;
        }
    }
}

/// Check that the last byte equals the sum mod 256 of all preceding bytes
pub fn verify_checksum(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((&checksum, body)) => sum8(body) == checksum,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_frame_checksum_formula() {
        for address in 0u16..=0xFFFF {
            let frame = encode_read(address);
            assert_eq!(frame.len(), 4);
            let [hi, lo] = address.to_be_bytes();
            let expected = (READ_FRAME as u16 + hi as u16 + lo as u16) % 256;
            assert_eq!(frame[3] as u16, expected, "address {address:#06X}");
        }
    }

    #[test]
    fn test_write_frame_checksum_formula() {
        for address in [0x0000u16, 0x400F, 0x4070, 0x8009, 0xFFFF] {
            for value in [0u16, 0x01, 0x7F, 0xFF] {
                let frame = encode_write(address, value).unwrap();
                assert_eq!(frame.len(), 5);
                let [hi, lo] = address.to_be_bytes();
                let expected = (WRITE_FRAME as u16 + hi as u16 + lo as u16 + value) % 256;
                assert_eq!(frame[4] as u16, expected);
            }
        }
    }

    #[test]
    fn test_write_value_out_of_range() {
        assert!(matches!(
            encode_write(0x4070, 0x100),
            Err(ProtocolError::InvalidValue { value: 0x100 })
        ));
        assert!(matches!(
            encode_write(0x4070, u16::MAX),
            Err(ProtocolError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_apply_key_identity_without_key() {
        let mut frame = encode_read(0x407B);
        let original = frame.clone();
        apply_key(&mut frame, None);
        assert_eq!(frame, original);
    }

    #[test]
    fn test_apply_key_involution() {
        for key in 0u8..=255 {
            let mut frame = encode_write(0x4213, 0x42).unwrap();
            let original = frame.clone();
            apply_key(&mut frame, Some(key));
            apply_key(&mut frame, Some(key));
            assert_eq!(frame, original, "key {key:#04X}");
        }
    }

    #[test]
    fn test_verify_checksum_accepts_valid_frames() {
        assert!(verify_checksum(&encode_read(0x0000)));
        assert!(verify_checksum(&encode_read(0xFFFF)));
        assert!(verify_checksum(&encode_write(0x4064, 0xFF).unwrap()));
        // A valid read reply
        assert!(verify_checksum(&[0x22, 0x42, 0x64]));
    }

    #[test]
    fn test_verify_checksum_rejects_empty() {
        assert!(!verify_checksum(&[]));
    }

    #[test]
    fn test_single_byte_tamper_always_detected() {
        let frame = encode_write(0x41F4, 0x02).unwrap();
        for position in 0..frame.len() {
            for flip in 1u8..=255 {
                let mut tampered = frame.clone();
                tampered[position] ^= flip;
                assert!(
                    !verify_checksum(&tampered),
                    "tamper at {position} with {flip:#04X} went undetected"
                );
            }
        }
    }
}
