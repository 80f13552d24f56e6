//! The `messagetype` tag carried in every segment header.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum MessageType {
    Authenticate,
    Connect,
    Disconnect,
    /// A message type this client neither sends nor expects to receive,
    /// preserved for version-skew tolerance.
    Other(i8),
}

impl MessageType {
    pub(crate) fn to_i8(self) -> i8 {
        match self {
            Self::Authenticate => 65,
            Self::Connect => 66,
            Self::Disconnect => 77,
            Self::Other(raw) => raw,
        }
    }

    pub(crate) fn from_i8(raw: i8) -> Self {
        match raw {
            65 => Self::Authenticate,
            66 => Self::Connect,
            77 => Self::Disconnect,
            other => Self::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_known_message_types() {
        for mt in [MessageType::Authenticate, MessageType::Connect, MessageType::Disconnect] {
            assert_eq!(MessageType::from_i8(mt.to_i8()), mt);
        }
    }
}
