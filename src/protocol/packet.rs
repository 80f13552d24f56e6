//! Message header + single segment header + parts, modeled together since
//! this client never has a reason to send or receive more than one segment
//! per message.

use crate::error::{CodecError, HdbError, HdbResult};
use crate::protocol::function_code::FunctionCode;
use crate::protocol::message_type::MessageType;
use crate::protocol::part::Part;
use crate::protocol::segment_kind::SegmentKind;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

const MESSAGE_HEADER_SIZE: u32 = 32;
const SEGMENT_HEADER_SIZE: usize = 24;

/// An outgoing request: one message, one segment, one or more parts.
#[derive(Debug)]
pub(crate) struct Request {
    pub(crate) message_type: MessageType,
    pub(crate) parts: Vec<Part>,
}

impl Request {
    pub(crate) fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            parts: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    fn segment_size(&self) -> usize {
        SEGMENT_HEADER_SIZE + self.parts.iter().map(Part::size).sum::<usize>()
    }

    /// Serializes the request and writes it to `w`.
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_possible_wrap)]
    pub(crate) fn emit(&self, session_id: i64, seq_number: i32, w: &mut dyn Write) -> HdbResult<()> {
        let seg_size = self.segment_size();
        let varpart_size = seg_size as u32;
        let mut remaining_bufsize = varpart_size;

        // MESSAGE HEADER (32 bytes)
        w.write_i64::<LittleEndian>(session_id)?;
        w.write_i32::<LittleEndian>(seq_number)?;
        w.write_u32::<LittleEndian>(varpart_size)?;
        w.write_u32::<LittleEndian>(remaining_bufsize)?;
        w.write_i16::<LittleEndian>(1)?; // number of segments
        for _ in 0..10 {
            w.write_u8(0)?;
        }

        // SEGMENT HEADER (24 bytes)
        w.write_i32::<LittleEndian>(seg_size as i32)?;
        w.write_i32::<LittleEndian>(0)?; // offset within the message
        w.write_i16::<LittleEndian>(self.parts.len() as i16)?;
        w.write_i16::<LittleEndian>(1)?; // segment number, always 1
        w.write_i8(SegmentKind::Request.to_i8())?;
        w.write_i8(self.message_type.to_i8())?;
        w.write_i8(1)?; // auto_commit: always on, this client runs no transactions
        w.write_u8(0)?; // command_options: unused by connect/authenticate/disconnect
        for _ in 0..8 {
            w.write_u8(0)?;
        }
        remaining_bufsize -= SEGMENT_HEADER_SIZE as u32;

        for part in &self.parts {
            let mut cursor = Cursor::new(Vec::with_capacity(part.size()));
            part.emit(&mut cursor)?;
            let bytes = cursor.into_inner();
            w.write_all(&bytes)?;
            remaining_bufsize -= bytes.len() as u32;
        }
        let _ = remaining_bufsize;
        w.flush()?;
        Ok(())
    }

    pub(crate) fn size(&self) -> u32 {
        MESSAGE_HEADER_SIZE + self.segment_size() as u32
    }
}

/// An incoming reply: message + segment header, then its parts.
///
/// Reply and Error segments share this shape; `is_error` distinguishes a
/// segment the server marked as carrying an `Error` part.
#[derive(Debug)]
pub(crate) struct Reply {
    pub(crate) session_id: i64,
    pub(crate) is_error: bool,
    pub(crate) function_code: Option<FunctionCode>,
    pub(crate) parts: Vec<Part>,
}

impl Reply {
    pub(crate) fn parse(rdr: &mut dyn Read) -> HdbResult<Self> {
        // MESSAGE HEADER (32 bytes)
        let session_id = rdr.read_i64::<LittleEndian>()?;
        let _seq_number = rdr.read_i32::<LittleEndian>()?;
        let _varpart_size = rdr.read_u32::<LittleEndian>()?;
        let _remaining_bufsize = rdr.read_u32::<LittleEndian>()?;
        let no_of_segs = rdr.read_i16::<LittleEndian>()?;
        let mut filler = [0_u8; 10];
        rdr.read_exact(&mut filler)?;

        if no_of_segs != 1 {
            return Err(HdbError::Connection(format!(
                "expected exactly one segment in a reply, server sent {no_of_segs}"
            )));
        }

        // SEGMENT HEADER (24 bytes)
        let _seg_size = rdr.read_i32::<LittleEndian>()?;
        let _seg_offset = rdr.read_i32::<LittleEndian>()?;
        let no_of_parts = rdr.read_i16::<LittleEndian>()?;
        let _seg_number = rdr.read_i16::<LittleEndian>()?;
        let seg_kind = SegmentKind::from_i8(rdr.read_i8()?);

        let is_error = match seg_kind {
            SegmentKind::Reply => false,
            SegmentKind::Error => true,
            SegmentKind::Request => {
                return Err(HdbError::Connection(
                    "server sent a request segment kind in a reply".to_string(),
                ));
            }
            SegmentKind::Other(raw) => {
                return Err(CodecError::InvalidEnum {
                    what: "segment kind",
                    value: i64::from(raw),
                }
                .into());
            }
        };

        // Reply-segment tail: reserved(I1), functioncode(I2), reserved(B8).
        // Error segments carry the same 11 reserved bytes with no function
        // code of their own; the detail lives in an Error part instead.
        let mut tail = [0_u8; 11];
        rdr.read_exact(&mut tail)?;
        let function_code = if is_error {
            None
        } else {
            Some(FunctionCode::from_i16(i16::from_le_bytes([tail[1], tail[2]])))
        };

        let mut parts = Vec::with_capacity(no_of_parts.max(0) as usize);
        for _ in 0..no_of_parts {
            parts.push(Part::parse(rdr)?);
        }

        Ok(Self {
            session_id,
            is_error,
            function_code,
            parts,
        })
    }
}
