//! The `Error` part the server sends instead of (or in front of) a normal
//! reply body whenever a request failed.

use crate::error::HdbResult;
use crate::protocol::util;
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

/// Severity of a single server-reported message.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Severity {
    Warning,
    Error,
    Fatal,
    Other(i8),
}

impl Severity {
    fn from_i8(raw: i8) -> Self {
        match raw {
            0 => Self::Warning,
            1 => Self::Error,
            2 => Self::Fatal,
            other => Self::Other(other),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal error"),
            Self::Other(raw) => write!(f, "message of unknown severity ({raw})"),
        }
    }
}

/// One error (or warning) reported by the server, as carried in an `Error`
/// part.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ServerError {
    code: i32,
    position: i32,
    severity: Severity,
    sqlstate: Vec<u8>,
    text: String,
}

const BASE_SIZE: i32 = 4 + 4 + 4 + 1 + 5;

impl ServerError {
    pub(crate) fn code(&self) -> i32 {
        self.code
    }

    pub(crate) fn severity(&self) -> Severity {
        self.severity
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn parse(no_of_args: usize, rdr: &mut dyn Read) -> HdbResult<Vec<Self>> {
        let mut errors = Vec::with_capacity(no_of_args);
        for _ in 0..no_of_args {
            let code = rdr.read_i32::<LittleEndian>()?;
            let position = rdr.read_i32::<LittleEndian>()?;
            let text_length = rdr.read_i32::<LittleEndian>()?;
            let severity = Severity::from_i8(rdr.read_i8()?);
            let sqlstate = util::read_exact(5, rdr)?;
            let bytes = util::read_exact(text_length as usize, rdr)?;
            let text = String::from(
                cesu8::from_cesu8(&bytes).unwrap_or_else(|_| String::from_utf8_lossy(&bytes)),
            );
            let pad = 8 - (BASE_SIZE + text_length).rem_euclid(8);
            util::skip(pad as usize, rdr)?;

            errors.push(Self {
                code,
                position,
                severity,
                sqlstate,
                text,
            });
        }
        Ok(errors)
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            r#"{} [code: {}, sqlstate: {}] at position {}: "{}""#,
            self.severity,
            self.code,
            String::from_utf8_lossy(&self.sqlstate),
            self.position,
            self.text
        )
    }
}

impl std::error::Error for ServerError {}
