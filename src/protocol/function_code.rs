//! The `functioncode` tag carried in a Reply segment's tail, naming which
//! request this reply answers. Error segments carry no function code; the
//! detail lives in an `Error` part instead.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum FunctionCode {
    Connect,
    Disconnect,
    /// A function code this client doesn't name, preserved as the raw tag
    /// for version-skew tolerance.
    Other(i16),
}

impl FunctionCode {
    pub(crate) fn from_i16(raw: i16) -> Self {
        match raw {
            14 => Self::Connect,
            18 => Self::Disconnect,
            other => Self::Other(other),
        }
    }
}
