//! The `segmentkind` tag in byte 16 of the segment header; selects which
//! tail fields follow it.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    Request,
    Reply,
    Error,
    Other(i8),
}

impl SegmentKind {
    pub(crate) fn to_i8(self) -> i8 {
        match self {
            Self::Request => 1,
            Self::Reply => 2,
            Self::Error => 5,
            Self::Other(raw) => raw,
        }
    }

    pub(crate) fn from_i8(raw: i8) -> Self {
        match raw {
            1 => Self::Request,
            2 => Self::Reply,
            5 => Self::Error,
            other => Self::Other(other),
        }
    }
}
