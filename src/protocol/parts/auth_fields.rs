//! `AuthFields`: an ordered list of opaque byte strings, each prefixed with
//! its own variable-width length, that make up the body of every
//! `Authentication` part.

use crate::error::HdbResult;
use crate::protocol::util;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct AuthFields(Vec<Vec<u8>>);

impl AuthFields {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, field: Vec<u8>) {
        self.0.push(field);
    }

    pub(crate) fn push_str(&mut self, field: &str) {
        self.0.push(field.as_bytes().to_vec());
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&[u8]> {
        self.0.get(index).map(Vec::as_slice)
    }

    pub(crate) fn into_vec(self) -> Vec<Vec<u8>> {
        self.0
    }

    pub(crate) fn size(&self) -> usize {
        2 + self.0.iter().map(|f| field_size(f)).sum::<usize>()
    }

    pub(crate) fn emit(&self, w: &mut dyn Write) -> HdbResult<()> {
        w.write_i16::<LittleEndian>(self.0.len() as i16)?;
        for field in &self.0 {
            util::emit_length(field.len(), w)?;
            w.write_all(field)?;
        }
        Ok(())
    }

    pub(crate) fn parse(rdr: &mut dyn Read) -> HdbResult<Self> {
        let count = rdr.read_u16::<LittleEndian>()? as usize;
        let mut fields = Vec::with_capacity(count);
        for _ in 0..count {
            let lead = rdr.read_u8()?;
            let len = util::parse_length(lead, rdr)?;
            fields.push(util::read_exact(len, rdr)?);
        }
        Ok(Self(fields))
    }
}

fn field_size(field: &[u8]) -> usize {
    let len = field.len();
    let prefix = if len <= util::MAX_1_BYTE_LENGTH as usize {
        1
    } else if len <= 0xFFFF {
        3
    } else {
        5
    };
    prefix + len
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn roundtrips_a_handful_of_fields() {
        let mut fields = AuthFields::new();
        fields.push_str("SCRAMSHA256");
        fields.push(vec![1, 2, 3, 4, 5]);
        fields.push(Vec::new());

        let mut buf = Vec::new();
        fields.emit(&mut buf).unwrap();
        assert_eq!(buf.len(), fields.size());

        let mut c = Cursor::new(buf);
        let parsed = AuthFields::parse(&mut c).unwrap();
        assert_eq!(parsed, fields);
    }

    #[test]
    fn encodes_a_long_field_with_the_two_byte_prefix() {
        let mut fields = AuthFields::new();
        fields.push(vec![0_u8; 300]);
        let mut buf = Vec::new();
        fields.emit(&mut buf).unwrap();
        assert_eq!(buf[2], 0xF6);

        let mut c = Cursor::new(buf);
        let parsed = AuthFields::parse(&mut c).unwrap();
        assert_eq!(parsed.get(0).unwrap().len(), 300);
    }
}
