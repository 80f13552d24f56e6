//! Small serialization helpers shared across the packet codec.

use crate::error::{CodecError, HdbResult};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Values of 245 or less are encoded as a single byte.
pub(crate) const MAX_1_BYTE_LENGTH: u8 = 245;
const LENGTH_INDICATOR_2BYTE: u8 = 0xF6;
const LENGTH_INDICATOR_4BYTE: u8 = 0xF7;
const LENGTH_INDICATOR_NULL: u8 = 0xFF;

/// Emits the variable-width length prefix used by `AuthField` values.
///
/// `0..=245` is a single byte; longer values are prefixed with `0xF6`
/// followed by a little-endian `u16`, or `0xF7` followed by a little-endian
/// `u32` for anything larger still.
pub(crate) fn emit_length(len: usize, w: &mut dyn Write) -> HdbResult<()> {
    match len {
        l if l <= MAX_1_BYTE_LENGTH as usize => w.write_u8(l as u8)?,
        l if l <= 0xFFFF => {
            w.write_u8(LENGTH_INDICATOR_2BYTE)?;
            w.write_u16::<LittleEndian>(l as u16)?;
        }
        l => {
            w.write_u8(LENGTH_INDICATOR_4BYTE)?;
            w.write_u32::<LittleEndian>(l as u32)?;
        }
    }
    Ok(())
}

/// Parses a length prefix whose first byte has already been read.
pub(crate) fn parse_length(lead: u8, r: &mut dyn Read) -> HdbResult<usize> {
    match lead {
        0..=MAX_1_BYTE_LENGTH => Ok(lead as usize),
        LENGTH_INDICATOR_2BYTE => Ok(r.read_u16::<LittleEndian>()? as usize),
        LENGTH_INDICATOR_4BYTE => Ok(r.read_u32::<LittleEndian>()? as usize),
        LENGTH_INDICATOR_NULL => Ok(r.read_u16::<BigEndian>()? as usize),
        other => Err(CodecError::InvalidEnum {
            what: "AuthField length indicator",
            value: i64::from(other),
        }
        .into()),
    }
}

/// Reads exactly `len` bytes, failing with [`CodecError::TruncatedInput`] on
/// short reads rather than silently returning a partial buffer.
pub(crate) fn read_exact(len: usize, r: &mut dyn Read) -> HdbResult<Vec<u8>> {
    let mut buf = vec![0_u8; len];
    r.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            CodecError::TruncatedInput {
                needed: len,
                available: 0,
            }
            .into()
        } else {
            crate::error::HdbError::Io { source: e }
        }
    })?;
    Ok(buf)
}

pub(crate) fn skip(len: usize, r: &mut dyn Read) -> HdbResult<()> {
    let mut buf = vec![0_u8; len];
    r.read_exact(&mut buf)?;
    Ok(())
}

/// Number of filler bytes needed so a part body ends on an 8-byte boundary.
pub(crate) fn padsize(size: usize) -> usize {
    match size {
        0 => 0,
        _ => 7 - (size - 1) % 8,
    }
}

pub(crate) fn write_padding(size: usize, w: &mut dyn Write) -> HdbResult<()> {
    for _ in 0..padsize(size) {
        w.write_u8(0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn one_byte_length_roundtrips() {
        for len in [0usize, 1, 245] {
            let mut buf = Vec::new();
            emit_length(len, &mut buf).unwrap();
            assert_eq!(buf.len(), 1);
            let mut c = Cursor::new(&buf[1..]);
            assert_eq!(parse_length(buf[0], &mut c).unwrap(), len);
        }
    }

    #[test]
    fn boundary_crosses_into_two_byte_form() {
        let mut buf = Vec::new();
        emit_length(246, &mut buf).unwrap();
        assert_eq!(buf[0], 0xF6);
        assert_eq!(buf.len(), 3);
        let mut c = Cursor::new(&buf[1..]);
        assert_eq!(parse_length(buf[0], &mut c).unwrap(), 246);
    }

    #[test]
    fn two_byte_form_up_to_65535() {
        let mut buf = Vec::new();
        emit_length(65535, &mut buf).unwrap();
        assert_eq!(buf[0], 0xF6);
        let mut c = Cursor::new(&buf[1..]);
        assert_eq!(parse_length(buf[0], &mut c).unwrap(), 65535);
    }

    #[test]
    fn four_byte_form_beyond_65535() {
        let mut buf = Vec::new();
        emit_length(65536, &mut buf).unwrap();
        assert_eq!(buf[0], 0xF7);
        assert_eq!(buf.len(), 5);
        let mut c = Cursor::new(&buf[1..]);
        assert_eq!(parse_length(buf[0], &mut c).unwrap(), 65536);
    }

    #[test]
    fn padsize_rounds_up_to_multiple_of_eight() {
        assert_eq!(padsize(0), 0);
        assert_eq!(padsize(1), 7);
        assert_eq!(padsize(8), 0);
        assert_eq!(padsize(9), 7);
        assert_eq!(padsize(16), 0);
    }
}
