//! The `Authenticator` trait every authentication method implements, plus
//! the client-id fingerprint shared by all of them.

use crate::error::HdbResult;
use crate::protocol::AuthFields;
use secstr::SecUtf8;

/// Builds `"<pid>@<hostname>"`, falling back to the literal `pysap` for the
/// pid and the OS-reported hostname when neither is supplied by the caller.
pub(crate) fn client_id(pid: Option<&str>, hostname: Option<&str>) -> String {
    let pid = pid.map(str::to_string).unwrap_or_else(|| "pysap".to_string());
    let hostname = hostname.map(str::to_string).unwrap_or_else(default_hostname);
    format!("{pid}@{hostname}")
}

fn default_hostname() -> String {
    gethostname::gethostname()
        .into_string()
        .unwrap_or_else(|_| "localhost".to_string())
}

/// A pluggable challenge/response authentication method.
///
/// Every method is tried the same way: send `initial_value()` in an
/// AUTHENTICATE request, receive the server's echo of the method name plus
/// an opaque challenge blob, turn that into the value that goes in the
/// CONNECT request's AUTHENTICATION part, and optionally verify the
/// server's own proof once CONNECT succeeds.
pub(crate) trait Authenticator: Send {
    /// The wire name of this method, e.g. `"SCRAMSHA256"`.
    fn method_name(&self) -> &'static str;

    /// The value sent in the first (AUTHENTICATE) request.
    fn initial_value(&self) -> Vec<u8>;

    /// Whether this method derives a new value from the server's challenge
    /// (SCRAM variants) or simply resends `initial_value()` unchanged
    /// (session-cookie, JWT, SAML).
    fn needs_challenge(&self) -> bool;

    /// Derives the value to send in the CONNECT request's AUTHENTICATION
    /// part from the server's challenge blob. Only called when
    /// [`Authenticator::needs_challenge`] returns `true`.
    fn compute_proof(&mut self, challenge: &AuthFields, password: &SecUtf8) -> HdbResult<Vec<u8>>;

    /// Verifies the server's own proof, once available. SCRAM variants
    /// check it against the proof they computed for themselves during
    /// [`Authenticator::compute_proof`]; methods with no mutual proof
    /// (session-cookie, JWT, SAML) accept unconditionally.
    fn verify_server(&self, _server_proof: &[u8]) -> HdbResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_defaults_pid_to_pysap() {
        assert_eq!(client_id(None, Some("myhost")), "pysap@myhost");
    }

    #[test]
    fn client_id_uses_supplied_values() {
        assert_eq!(client_id(Some("4711"), Some("myhost")), "4711@myhost");
    }
}
