//! The very first bytes exchanged on a fresh socket, before any message
//! header exists: a fixed 14-byte handshake request and an 8-byte reply
//! that announces the product and protocol version the server will speak.

use crate::error::HdbResult;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read, Write};

/// The fixed 14-byte handshake magic, emitted verbatim: `FF FF FF FF` filler,
/// then product version 4.20, protocol version 4.1, one reserved byte, one
/// option (swap-kind = little-endian).
const INITIAL_REQUEST: [u8; 14] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0x04, 0x20, 0x00, 0x04, 0x01, 0x00, 0x00, 0x01, 0x01, 0x01,
];

fn build() -> [u8; 14] {
    INITIAL_REQUEST
}

/// The product/protocol version the server announced in its 8-byte initial
/// reply.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InitReply {
    pub(crate) major_product_version: i8,
    pub(crate) minor_product_version: i16,
    pub(crate) major_protocol_version: i8,
    pub(crate) minor_protocol_version: i16,
}

/// Writes the fixed 14-byte initialization magic.
pub(crate) fn emit_request(w: &mut dyn Write) -> HdbResult<()> {
    w.write_all(&build())?;
    w.flush()?;
    Ok(())
}

/// Parses the 8-byte initialization reply, already fully read off the wire.
pub(crate) fn parse_reply(bytes: &[u8]) -> HdbResult<InitReply> {
    let mut r = Cursor::new(bytes);
    let major_product_version = r.read_i8()?;
    let minor_product_version = r.read_i16::<BigEndian>()?;
    let major_protocol_version = r.read_i8()?;
    let minor_protocol_version = r.read_i16::<BigEndian>()?;
    let mut reserved = [0_u8; 2];
    r.read_exact(&mut reserved)?;

    Ok(InitReply {
        major_product_version,
        minor_product_version,
        major_protocol_version,
        minor_protocol_version,
    })
}

#[cfg(test)]
pub(crate) fn send_and_receive(w: &mut dyn Write, r: &mut dyn Read) -> HdbResult<InitReply> {
    emit_request(w)?;
    let mut bytes = [0_u8; 8];
    r.read_exact(&mut bytes)?;
    parse_reply(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    #[test]
    fn request_is_exactly_fourteen_bytes() {
        assert_eq!(build().len(), 14);
    }

    #[test]
    fn request_matches_the_literal_handshake_magic() {
        assert_eq!(
            build(),
            [0xFF, 0xFF, 0xFF, 0xFF, 0x04, 0x20, 0x00, 0x04, 0x01, 0x00, 0x00, 0x01, 0x01, 0x01]
        );
    }

    #[test]
    fn roundtrips_through_an_in_memory_pipe() {
        let mut reply_bytes = Vec::new();
        reply_bytes.write_i8(4).unwrap();
        reply_bytes.write_i16::<BigEndian>(20).unwrap();
        reply_bytes.write_i8(4).unwrap();
        reply_bytes.write_i16::<BigEndian>(1).unwrap();
        reply_bytes.extend_from_slice(&[0, 0]);

        let mut sent = Vec::new();
        let mut cursor = Cursor::new(reply_bytes);
        let reply = send_and_receive(&mut sent, &mut cursor).unwrap();
        assert_eq!(sent.len(), 14);
        assert_eq!(reply.major_product_version, 4);
        assert_eq!(reply.minor_protocol_version, 1);
    }
}
