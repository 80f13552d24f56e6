//! SCRAM proof derivation, shared by the SCRAM-SHA256 and
//! SCRAM-PBKDF2-SHA256 authentication methods.

mod scram;

pub(crate) use scram::{scram_pbkdf2_sha256, scram_sha256};
