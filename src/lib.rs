//! Client-side codec, handshake state machine and authentication family for
//! SAP HANA's SQL Command Network Protocol (HDB).
//!
//! This crate implements the wire format far enough to open a socket
//! (optionally through an SAP Router tunnel, optionally over TLS), announce
//! protocol versions, authenticate (SCRAM-SHA256, SCRAM-PBKDF2-SHA256,
//! session-cookie, JWT or SAML) and disconnect cleanly. It stops at a
//! successfully authenticated session: no SQL execution, result-set
//! decoding, LOB streaming, transaction management, connection pooling or
//! retry policy — those are a higher layer's problem. See
//! [`conn::Connection`] for the handshake entry point.

mod auth;
mod conn;
mod crypto;
mod error;
mod protocol;

pub use auth::AuthMethod;
pub use conn::{ConnectParams, ConnectParamsBuilder, Connection, RouteDialer, ServerCerts, ServerVersion, Tls};
pub use error::{CodecError, HdbError, HdbResult};
