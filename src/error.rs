//! Error taxonomy for the HDB core.
//!
//! Three categories, never mixed: codec errors (wire-level), authentication
//! errors (handshake-level) and connection errors (transport-level). See
//! `hdbconnect_impl::base::hdb_error::HdbError` in the teacher driver for the
//! shape this is modeled on.

use thiserror::Error;

/// Errors raised while decoding or encoding the byte-level packet structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes were available than a field requires.
    #[error("truncated input: needed {needed} bytes, had {available}")]
    TruncatedInput {
        /// Bytes required to decode the field.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// A declared length claims more bytes than the buffer holds.
    #[error("length mismatch: declared {declared} bytes, only {available} available")]
    LengthMismatch {
        /// Length declared by the wire field.
        declared: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// An enum tag carried an integer this driver doesn't recognize.
    ///
    /// The raw value is preserved on the decoded type itself; this variant is
    /// only raised by operations (e.g. SCRAM dispatch) that require a known
    /// variant to proceed.
    #[error("unrecognized {what} value: {value}")]
    InvalidEnum {
        /// Name of the field/enum that carried the unrecognized tag.
        what: &'static str,
        /// The raw tag value.
        value: i64,
    },
}

/// A list specifying categories of [`HdbError`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HdbError {
    /// Wire-level decode/encode failure.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Handshake-level failure: method mismatch, malformed challenge, or a
    /// server-returned Error segment during CONNECT.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Human-readable description.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<HdbError>>,
    },

    /// Transport-level failure: socket error, peer close, or unexpected
    /// disconnect reply.
    #[error("connection error: {0}")]
    Connection(String),

    /// The peer closed the socket mid-frame.
    #[error("peer closed the connection")]
    PeerClosed,

    /// Underlying I/O failure.
    #[error(transparent)]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// TLS client configuration could not be built.
    #[error("TLS initialization failed: {0}")]
    TlsInit(String),

    /// TLS handshake or record-layer failure.
    #[error(transparent)]
    TlsProtocol {
        #[from]
        source: rustls::Error,
    },

    /// The configured server hostname is not a valid DNS name for SNI.
    #[error(transparent)]
    TlsInvalidDnsName {
        #[from]
        source: rustls::client::InvalidDnsNameError,
    },

    /// Implementation error: a documented invariant was violated.
    #[error("implementation error: {0}")]
    Impl(&'static str),

    /// An HMAC key had a length the underlying primitive rejects.
    #[error(transparent)]
    InvalidKeyLength {
        #[from]
        source: crypto_common::InvalidLength,
    },

    /// `ConnectParamsBuilder::build` was asked to fall back to the OS user
    /// (no `dbuser` was given) and the OS reported none.
    #[error("no dbuser was given and the OS-reported username is unavailable")]
    UsernameUnavailable,
}

impl HdbError {
    pub(crate) fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn authentication_with_source(message: impl Into<String>, source: HdbError) -> Self {
        Self::Authentication {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn method_not_supported(echoed: &str, expected: &str) -> Self {
        Self::authentication(format!(
            "server echoed authentication method '{echoed}', expected '{expected}'"
        ))
    }

    pub(crate) fn malformed_challenge(reason: impl Into<String>) -> Self {
        Self::authentication(format!("malformed authentication challenge: {}", reason.into()))
    }
}

/// Result alias used throughout this crate.
pub type HdbResult<T> = Result<T, HdbError>;
