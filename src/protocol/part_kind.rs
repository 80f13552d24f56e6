//! The `PartKind` tag that prefixes every part header.
//!
//! Only the kinds this client actually emits or parses during connect,
//! authenticate and disconnect carry a named variant. Everything else comes
//! back as [`PartKind::Other`] so a protocol version that adds new part
//! kinds around the ones we use doesn't break decoding of the ones we do.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PartKind {
    Authentication,
    ClientId,
    ConnectOptions,
    DbConnectInfo,
    Error,
    TopologyInformation,
    /// A kind this client doesn't interpret, carrying the raw tag.
    Other(i8),
}

impl PartKind {
    pub(crate) fn to_i8(self) -> i8 {
        match self {
            Self::Authentication => 33,
            Self::ClientId => 35,
            Self::TopologyInformation => 15,
            Self::Error => 6,
            Self::ConnectOptions => 42,
            Self::DbConnectInfo => 67,
            Self::Other(raw) => raw,
        }
    }

    pub(crate) fn from_i8(raw: i8) -> Self {
        match raw {
            33 => Self::Authentication,
            35 => Self::ClientId,
            15 => Self::TopologyInformation,
            6 => Self::Error,
            42 => Self::ConnectOptions,
            67 => Self::DbConnectInfo,
            other => Self::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_kinds_roundtrip_through_their_raw_tag() {
        for kind in [
            PartKind::Authentication,
            PartKind::ClientId,
            PartKind::ConnectOptions,
            PartKind::DbConnectInfo,
            PartKind::Error,
            PartKind::TopologyInformation,
        ] {
            assert_eq!(PartKind::from_i8(kind.to_i8()), kind);
        }
    }

    #[test]
    fn unknown_tag_preserves_raw_value() {
        assert_eq!(PartKind::from_i8(120), PartKind::Other(120));
        assert_eq!(PartKind::Other(120).to_i8(), 120);
    }
}
