use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::Crc16;
use crate::error::{FrameError, Result};

/// Start-of-frame delimiter.
pub const START: u8 = 0xC0;

/// End-of-frame delimiter.
pub const END: u8 = 0xC1;

/// Escape marker. The escaped byte follows, XORed with this value.
pub const ESC: u8 = 0x7D;

/// Trailing checksum size in bytes.
pub const CHECKSUM_LEN: usize = 2;

/// True for the byte values that must never appear bare inside a frame body.
pub fn is_reserved(byte: u8) -> bool {
    matches!(byte, START | END | ESC)
}

/// Append the CRC-16/MODBUS checksum of `payload`, low byte first.
pub fn append_checksum(crc: &Crc16, payload: &[u8]) -> Result<BytesMut> {
    if payload.is_empty() {
        return Err(FrameError::EmptyInput);
    }
    let mut out = BytesMut::with_capacity(payload.len() + CHECKSUM_LEN);
    out.put_slice(payload);
    out.put_u16_le(crc.checksum(payload));
    Ok(out)
}

/// Escape a checksummed payload and wrap it in delimiters.
///
/// Wire format:
/// ```text
/// ┌───────┬──────────────────────────────────────┬───────┐
/// │ 0xC0  │ escaped(payload ‖ crc16_le(payload)) │ 0xC1  │
/// └───────┴──────────────────────────────────────┴───────┘
/// escaped: 0xC0 → 7D BD, 0xC1 → 7D BC, 0x7D → 7D 00
/// ```
pub fn encode_frame(checksummed: &[u8], dst: &mut BytesMut) -> Result<()> {
    if checksummed.is_empty() {
        return Err(FrameError::EmptyInput);
    }

    let escapes = checksummed.iter().filter(|&&b| is_reserved(b)).count();
    dst.reserve(checksummed.len() + escapes + 2);

    dst.put_u8(START);
    for &byte in checksummed {
        if is_reserved(byte) {
            dst.put_u8(ESC);
            dst.put_u8(byte ^ ESC);
        } else {
            dst.put_u8(byte);
        }
    }
    dst.put_u8(END);
    Ok(())
}

/// Strip the structural delimiters from a complete frame.
pub fn strip_delimiters(frame: &[u8]) -> Result<&[u8]> {
    match frame {
        [START, body @ .., END] => Ok(body),
        _ => Err(FrameError::MissingDelimiter),
    }
}

/// Undo the byte stuffing of a frame body (delimiters already stripped).
pub fn decode_frame(body: &[u8]) -> Result<BytesMut> {
    if body.is_empty() {
        return Err(FrameError::EmptyInput);
    }

    let mut out = BytesMut::with_capacity(body.len());
    let mut bytes = body.iter();
    while let Some(&byte) = bytes.next() {
        if byte == ESC {
            let escaped = bytes.next().ok_or(FrameError::TruncatedEscape)?;
            out.put_u8(escaped ^ ESC);
        } else {
            out.put_u8(byte);
        }
    }
    Ok(out)
}

/// Check the trailing checksum and return the payload in front of it.
///
/// The checksum is recomputed over the whole buffer, checksum included;
/// anything other than a zero residue means the data was corrupted.
pub fn verify_checksum(crc: &Crc16, mut checksummed: BytesMut) -> Result<Bytes> {
    let residue = crc.checksum(&checksummed);
    if checksummed.len() < CHECKSUM_LEN {
        return Err(FrameError::ChecksumMismatch {
            residue,
            payload: Bytes::new(),
        });
    }

    let payload = checksummed
        .split_to(checksummed.len() - CHECKSUM_LEN)
        .freeze();
    if residue != 0 {
        return Err(FrameError::ChecksumMismatch { residue, payload });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(payload: &[u8]) -> BytesMut {
        let crc = Crc16::new();
        let checksummed = append_checksum(&crc, payload).unwrap();
        let mut frame = BytesMut::new();
        encode_frame(&checksummed, &mut frame).unwrap();
        frame
    }

    fn decode(frame: &[u8]) -> Result<Bytes> {
        let body = strip_delimiters(frame)?;
        verify_checksum(&Crc16::new(), decode_frame(body)?)
    }

    /// Deterministic pseudo-random payloads, biased towards reserved bytes.
    fn sample_payloads() -> Vec<Vec<u8>> {
        let mut seed = 0x2545_F491u32;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed
        };

        let mut payloads: Vec<Vec<u8>> = (0..=255u8).map(|b| vec![b]).collect();
        payloads.push(vec![START, END, ESC]);
        payloads.push(vec![ESC; 16]);
        for len in 1..64usize {
            let payload = (0..len)
                .map(|_| match next() % 8 {
                    0 => START,
                    1 => END,
                    2 => ESC,
                    _ => next() as u8,
                })
                .collect();
            payloads.push(payload);
        }
        payloads
    }

    #[test]
    fn test_append_checksum_little_endian() {
        let out = append_checksum(&Crc16::new(), &[0x01, 0x02]).unwrap();
        assert_eq!(out.as_ref(), &[0x01, 0x02, 0x81, 0xE1]);
    }

    #[test]
    fn test_append_checksum_rejects_empty() {
        let err = append_checksum(&Crc16::new(), &[]).unwrap_err();
        assert!(matches!(err, FrameError::EmptyInput));
    }

    #[test]
    fn test_encode_rejects_empty() {
        let mut dst = BytesMut::new();
        assert!(matches!(
            encode_frame(&[], &mut dst),
            Err(FrameError::EmptyInput)
        ));
        assert!(dst.is_empty());
    }

    #[test]
    fn test_encode_plain_payload() {
        assert_eq!(
            encode(&[0x01, 0x02]).as_ref(),
            &[0xC0, 0x01, 0x02, 0x81, 0xE1, 0xC1]
        );
    }

    #[test]
    fn test_encode_escapes_start_byte() {
        // crc16([0xC0]) = 0x10BF
        assert_eq!(
            encode(&[0xC0]).as_ref(),
            &[0xC0, 0x7D, 0xBD, 0xBF, 0x10, 0xC1]
        );
    }

    #[test]
    fn test_encode_escapes_checksum_bytes() {
        // crc16([0x53]) = 0x7DFF, so the high checksum byte needs escaping.
        assert_eq!(
            encode(&[0x53]).as_ref(),
            &[0xC0, 0x53, 0xFF, 0x7D, 0x00, 0xC1]
        );
    }

    #[test]
    fn test_encode_escapes_every_reserved_byte() {
        let mut dst = BytesMut::new();
        encode_frame(&[START, END, ESC], &mut dst).unwrap();
        assert_eq!(
            dst.as_ref(),
            &[START, ESC, 0xBD, ESC, 0xBC, ESC, 0x00, END]
        );
    }

    #[test]
    fn test_encode_appends_to_existing_buffer() {
        let mut dst = BytesMut::from(&[0xAA][..]);
        encode_frame(&[0x01], &mut dst).unwrap();
        assert_eq!(dst.as_ref(), &[0xAA, START, 0x01, END]);
    }

    #[test]
    fn test_unreserved_payload_has_no_overhead() {
        let checksummed: Vec<u8> = (0u8..=255).filter(|b| !is_reserved(*b)).collect();
        let mut dst = BytesMut::new();
        encode_frame(&checksummed, &mut dst).unwrap();

        assert_eq!(dst.len(), checksummed.len() + 2);
        assert_eq!(dst[0], START);
        assert_eq!(&dst[1..dst.len() - 1], checksummed.as_slice());
        assert_eq!(dst[dst.len() - 1], END);
    }

    #[test]
    fn test_encoded_frames_have_no_bare_reserved_bytes() {
        for payload in sample_payloads() {
            let frame = encode(&payload);
            let body = strip_delimiters(&frame).unwrap();

            assert!(!body.contains(&START), "bare START in {payload:02x?}");
            assert!(!body.contains(&END), "bare END in {payload:02x?}");

            let mut iter = body.iter();
            while let Some(&b) = iter.next() {
                if b == ESC {
                    let next = iter.next().expect("escape must be followed by a byte");
                    assert!(is_reserved(next ^ ESC));
                }
            }
        }
    }

    #[test]
    fn test_roundtrip_sample_payloads() {
        for payload in sample_payloads() {
            let frame = encode(&payload);
            let decoded = decode(&frame).unwrap();
            assert_eq!(decoded.as_ref(), payload.as_slice());
        }
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert!(matches!(decode_frame(&[]), Err(FrameError::EmptyInput)));
    }

    #[test]
    fn test_decode_trailing_escape() {
        let err = decode_frame(&[0x01, ESC]).unwrap_err();
        assert!(matches!(err, FrameError::TruncatedEscape));
    }

    #[test]
    fn test_decode_unescapes_pairs() {
        let out = decode_frame(&[0x01, ESC, 0xBD, ESC, 0x00, 0x02]).unwrap();
        assert_eq!(out.as_ref(), &[0x01, START, ESC, 0x02]);
    }

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters(&[START, 0x01, END]).unwrap(), &[0x01]);
        assert_eq!(strip_delimiters(&[START, END]).unwrap(), &[] as &[u8]);
        assert!(matches!(
            strip_delimiters(&[0x01, 0x02, END]),
            Err(FrameError::MissingDelimiter)
        ));
        assert!(matches!(
            strip_delimiters(&[START, 0x01]),
            Err(FrameError::MissingDelimiter)
        ));
        assert!(matches!(
            strip_delimiters(&[START]),
            Err(FrameError::MissingDelimiter)
        ));
    }

    #[test]
    fn test_verify_strips_checksum() {
        let crc = Crc16::new();
        let payload = verify_checksum(&crc, BytesMut::from(&[0x01, 0x02, 0x81, 0xE1][..])).unwrap();
        assert_eq!(payload.as_ref(), &[0x01, 0x02]);
    }

    #[test]
    fn test_verify_reports_payload_on_mismatch() {
        let crc = Crc16::new();
        let err = verify_checksum(&crc, BytesMut::from(&[0x01, 0x02, 0x81, 0xE2][..])).unwrap_err();
        match err {
            FrameError::ChecksumMismatch { residue, payload } => {
                assert_ne!(residue, 0);
                assert_eq!(payload.as_ref(), &[0x01, 0x02]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_verify_rejects_short_input() {
        let crc = Crc16::new();
        assert!(matches!(
            verify_checksum(&crc, BytesMut::from(&[0x01][..])),
            Err(FrameError::ChecksumMismatch { .. })
        ));
        assert!(matches!(
            verify_checksum(&crc, BytesMut::new()),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_single_bit_flip_is_detected() {
        let crc = Crc16::new();
        let valid = append_checksum(&crc, b"stdbus frame").unwrap();

        for index in 0..valid.len() {
            for bit in 0..8 {
                let mut corrupted = valid.clone();
                corrupted[index] ^= 1 << bit;
                assert!(
                    matches!(
                        verify_checksum(&crc, corrupted),
                        Err(FrameError::ChecksumMismatch { .. })
                    ),
                    "flip of bit {bit} in byte {index} went unnoticed"
                );
            }
        }
    }
}
