//! A single part: a 16-byte header followed by a kind-specific body, padded
//! to an 8-byte boundary.

use crate::error::{CodecError, HdbResult};
use crate::protocol::parts::{AuthFields, ServerError};
use crate::protocol::part_attributes::PartAttributes;
use crate::protocol::part_kind::PartKind;
use crate::protocol::util;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

const PART_HEADER_SIZE: usize = 16;

/// The decoded body of a part. Kinds this client doesn't interpret are kept
/// as the raw, still-padded-out body so a caller can at least see they
/// arrived.
#[derive(Debug, Clone)]
pub(crate) enum PartPayload {
    Auth(AuthFields),
    ClientId(String),
    Error(Vec<ServerError>),
    Raw(Vec<u8>),
}

#[derive(Debug, Clone)]
pub(crate) struct Part {
    pub(crate) payload: PartPayload,
}

impl Part {
    pub(crate) fn auth(fields: AuthFields) -> Self {
        Self {
            payload: PartPayload::Auth(fields),
        }
    }

    pub(crate) fn client_id(id: String) -> Self {
        Self {
            payload: PartPayload::ClientId(id),
        }
    }

    pub(crate) fn kind(&self) -> PartKind {
        match &self.payload {
            PartPayload::Auth(_) => PartKind::Authentication,
            PartPayload::ClientId(_) => PartKind::ClientId,
            PartPayload::Error(_) => PartKind::Error,
            PartPayload::Raw(_) => PartKind::Other(0),
        }
    }

    fn argument_count(&self) -> usize {
        match &self.payload {
            PartPayload::Auth(fields) => fields.len(),
            PartPayload::ClientId(_) => 1,
            PartPayload::Error(errors) => errors.len(),
            PartPayload::Raw(_) => 1,
        }
    }

    fn body_size(&self) -> usize {
        match &self.payload {
            PartPayload::Auth(fields) => fields.size(),
            PartPayload::ClientId(id) => id.len(),
            PartPayload::Raw(bytes) => bytes.len(),
            PartPayload::Error(_) => unreachable!("this client never emits an Error part"),
        }
    }

    /// Total on-wire size, header plus padded body.
    pub(crate) fn size(&self) -> usize {
        let body = self.body_size();
        PART_HEADER_SIZE + body + util::padsize(body)
    }

    pub(crate) fn emit(&self, w: &mut Cursor<Vec<u8>>) -> HdbResult<()> {
        let kind = self.kind();
        let body_size = self.body_size();

        w.write_i8(kind.to_i8())?;
        w.write_u8(0)?; // attributes, unused when emitting
        w.write_i16::<LittleEndian>(self.argument_count() as i16)?;
        w.write_i32::<LittleEndian>(0)?;
        w.write_i32::<LittleEndian>(body_size as i32)?;
        w.write_i32::<LittleEndian>(0)?; // remaining buffer size, filled in by the segment

        match &self.payload {
            PartPayload::Auth(fields) => fields.emit(w)?,
            PartPayload::ClientId(id) => w.write_all(id.as_bytes())?,
            PartPayload::Raw(bytes) => w.write_all(bytes)?,
            PartPayload::Error(_) => unreachable!("this client never emits an Error part"),
        }
        util::write_padding(body_size, w)?;
        Ok(())
    }

    pub(crate) fn parse(rdr: &mut dyn std::io::Read) -> HdbResult<Self> {
        let kind = PartKind::from_i8(rdr.read_i8()?);
        let _attributes = PartAttributes::new(rdr.read_u8()?);
        let argument_count_i16 = rdr.read_i16::<LittleEndian>()?;
        let argument_count_i32 = rdr.read_i32::<LittleEndian>()?;
        let arg_size = rdr.read_i32::<LittleEndian>()?;
        rdr.read_i32::<LittleEndian>()?; // remaining buffer size, unused on decode

        let argument_count = std::cmp::max(i32::from(argument_count_i16), argument_count_i32) as usize;
        if arg_size < 0 {
            return Err(CodecError::LengthMismatch {
                declared: 0,
                available: 0,
            }
            .into());
        }
        let arg_size = arg_size as usize;

        let payload = match kind {
            PartKind::Authentication => PartPayload::Auth(AuthFields::parse(rdr)?),
            PartKind::Error => PartPayload::Error(ServerError::parse(argument_count, rdr)?),
            PartKind::ClientId => {
                let bytes = util::read_exact(arg_size, rdr)?;
                PartPayload::ClientId(String::from_utf8_lossy(&bytes).into_owned())
            }
            PartKind::ConnectOptions | PartKind::TopologyInformation | PartKind::DbConnectInfo | PartKind::Other(_) => {
                PartPayload::Raw(util::read_exact(arg_size, rdr)?)
            }
        };

        // The Error part already consumes its own per-message padding; every
        // other kind is padded to the next 8-byte boundary at the part level.
        if !matches!(kind, PartKind::Error) {
            util::skip(util::padsize(arg_size), rdr)?;
        }

        Ok(Self { payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_part_roundtrips() {
        let part = Part::client_id("4711@myhost".to_string());
        let mut cursor = Cursor::new(Vec::new());
        part.emit(&mut cursor).unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), part.size());

        let mut reader = Cursor::new(bytes);
        let parsed = Part::parse(&mut reader).unwrap();
        match parsed.payload {
            PartPayload::ClientId(id) => assert_eq!(id, "4711@myhost"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn auth_part_roundtrips() {
        let mut fields = AuthFields::new();
        fields.push_str("SCRAMSHA256");
        fields.push_str("jsmith");
        let part = Part::auth(fields.clone());

        let mut cursor = Cursor::new(Vec::new());
        part.emit(&mut cursor).unwrap();
        let bytes = cursor.into_inner();

        let mut reader = Cursor::new(bytes);
        let parsed = Part::parse(&mut reader).unwrap();
        match parsed.payload {
            PartPayload::Auth(parsed_fields) => assert_eq!(parsed_fields, fields),
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
