//! Session-cookie reauthentication: resumes a previous session using the
//! cookie the server handed out at the end of the original CONNECT, with no
//! further proof computation.

use crate::auth::authenticator::Authenticator;
use crate::error::HdbResult;
use crate::protocol::AuthFields;
use secstr::SecUtf8;

pub(crate) struct SessionCookie {
    value: Vec<u8>,
}

impl SessionCookie {
    pub(crate) fn new(cookie: &[u8], client_id: &str) -> Self {
        let mut value = Vec::with_capacity(cookie.len() + client_id.len());
        value.extend_from_slice(cookie);
        value.extend_from_slice(client_id.as_bytes());
        Self { value }
    }
}

impl Authenticator for SessionCookie {
    fn method_name(&self) -> &'static str {
        "SessionCookie"
    }

    fn initial_value(&self) -> Vec<u8> {
        self.value.clone()
    }

    fn needs_challenge(&self) -> bool {
        false
    }

    fn compute_proof(&mut self, _challenge: &AuthFields, _password: &SecUtf8) -> HdbResult<Vec<u8>> {
        Ok(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_concatenates_cookie_and_client_id() {
        let cookie = SessionCookie::new(b"cookiebytes", "pysap@myhost");
        assert_eq!(cookie.initial_value(), b"cookiebytespysap@myhost".to_vec());
    }
}
