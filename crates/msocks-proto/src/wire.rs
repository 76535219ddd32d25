//! Primitive wire codecs
//!
//! Big-endian integers and length-prefixed strings. A length-prefixed string
//! is a `u16` byte count followed by that many raw bytes; the bytes are not
//! required to be valid UTF-8.

use bytes::{Buf, BufMut, Bytes};
use crate::error::{ProtocolError, Result};

/// Longest string a 16-bit length prefix can describe
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Size of a string's length prefix
pub const STRING_PREFIX_LEN: usize = 2;

fn ensure_remaining<B: Buf>(src: &B, needed: usize) -> Result<()> {
    let available = src.remaining();
    if available < needed {
        return Err(ProtocolError::TruncatedInput { needed, available });
    }
    Ok(())
}

/// Read one byte
pub fn read_u8<B: Buf>(src: &mut B) -> Result<u8> {
    ensure_remaining(src, 1)?;
    Ok(src.get_u8())
}

/// Read a big-endian `u16`
pub fn read_u16<B: Buf>(src: &mut B) -> Result<u16> {
    ensure_remaining(src, 2)?;
    Ok(src.get_u16())
}

/// Read a big-endian `u32`
pub fn read_u32<B: Buf>(src: &mut B) -> Result<u32> {
    ensure_remaining(src, 4)?;
    Ok(src.get_u32())
}

/// Take exactly `len` bytes from the source
pub fn take_bytes<B: Buf>(src: &mut B, len: usize) -> Result<Bytes> {
    ensure_remaining(src, len)?;
    Ok(src.copy_to_bytes(len))
}

/// Check that a field fits behind a 16-bit length prefix
pub fn check_len(field: &'static str, size: usize) -> Result<u16> {
    u16::try_from(size).map_err(|_| ProtocolError::OversizedField {
        field,
        size,
        max: MAX_STRING_LEN,
    })
}

/// Read a length-prefixed string.
///
/// Fails with [`ProtocolError::TruncatedInput`] if the source holds fewer
/// bytes than the prefix declares; a short string is never returned.
pub fn read_string<B: Buf>(src: &mut B) -> Result<Bytes> {
    let len = read_u16(src)? as usize;
    take_bytes(src, len)
}

/// Write a length-prefixed string.
///
/// The length is validated before anything is written, so an oversized
/// string leaves `dst` untouched.
pub fn write_string<B: BufMut>(dst: &mut B, s: &[u8]) -> Result<()> {
    let len = check_len("string", s.len())?;
    dst.put_u16(len);
    dst.put_slice(s);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use proptest::prelude::*;

    #[test]
    fn test_write_string_layout() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, b"abc").unwrap();
        assert_eq!(&buf[..], &[0x00, 0x03, b'a', b'b', b'c']);
    }

    #[test]
    fn test_empty_string() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, b"").unwrap();
        assert_eq!(&buf[..], &[0x00, 0x00]);

        let mut src = buf.freeze();
        assert!(read_string(&mut src).unwrap().is_empty());
        assert!(!src.has_remaining());
    }

    #[test]
    fn test_non_utf8_string() {
        let raw = [0xff, 0xfe, 0x00, 0x80];
        let mut buf = BytesMut::new();
        write_string(&mut buf, &raw).unwrap();

        let mut src = buf.freeze();
        assert_eq!(&read_string(&mut src).unwrap()[..], &raw);
    }

    #[test]
    fn test_oversized_string_writes_nothing() {
        let big = vec![b'x'; MAX_STRING_LEN + 1];
        let mut buf = BytesMut::new();

        let result = write_string(&mut buf, &big);
        assert!(matches!(
            result,
            Err(ProtocolError::OversizedField { size, max: MAX_STRING_LEN, .. }) if size == MAX_STRING_LEN + 1
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_max_length_string_fits() {
        let big = vec![b'x'; MAX_STRING_LEN];
        let mut buf = BytesMut::new();
        write_string(&mut buf, &big).unwrap();
        assert_eq!(buf.len(), MAX_STRING_LEN + STRING_PREFIX_LEN);
    }

    #[test]
    fn test_truncated_string_body() {
        let mut src = Bytes::from_static(&[0x00, 0x05, b'a', b'b']);
        let result = read_string(&mut src);
        assert!(matches!(
            result,
            Err(ProtocolError::TruncatedInput { needed: 5, available: 2 })
        ));
    }

    #[test]
    fn test_truncated_string_prefix() {
        let mut src = Bytes::from_static(&[0x00]);
        let result = read_string(&mut src);
        assert!(matches!(
            result,
            Err(ProtocolError::TruncatedInput { needed: 2, available: 1 })
        ));
    }

    #[test]
    fn test_integers_big_endian() {
        let mut src = Bytes::from_static(&[0x07, 0x01, 0x02, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(read_u8(&mut src).unwrap(), 7);
        assert_eq!(read_u16(&mut src).unwrap(), 0x0102);
        assert_eq!(read_u32(&mut src).unwrap(), 65536);
        assert!(read_u8(&mut src).unwrap_err().is_truncated());
    }

    proptest! {
        #[test]
        fn test_string_roundtrip_properties(s in prop::collection::vec(any::<u8>(), 0..2048)) {
            let mut buf = BytesMut::new();
            write_string(&mut buf, &s).unwrap();
            prop_assert_eq!(buf.len(), s.len() + STRING_PREFIX_LEN);

            let mut src = buf.freeze();
            let decoded = read_string(&mut src).unwrap();
            prop_assert_eq!(&decoded[..], &s[..]);
        }

        #[test]
        fn test_short_string_never_returned(
            s in prop::collection::vec(any::<u8>(), 1..512),
            cut in 1usize..512
        ) {
            let mut buf = BytesMut::new();
            write_string(&mut buf, &s).unwrap();
            let keep = buf.len().saturating_sub(cut.min(s.len()));

            let mut src = buf.freeze().slice(..keep);
            prop_assert!(read_string(&mut src).unwrap_err().is_truncated());
        }
    }
}
