//! JWT authentication: the value is a caller-supplied bearer token, opaque
//! to this client.

use crate::auth::authenticator::Authenticator;
use crate::error::HdbResult;
use crate::protocol::AuthFields;
use secstr::SecUtf8;

pub(crate) struct Jwt {
    token: String,
}

impl Jwt {
    pub(crate) fn new(token: String) -> Self {
        Self { token }
    }
}

impl Authenticator for Jwt {
    fn method_name(&self) -> &'static str {
        "JWT"
    }

    fn initial_value(&self) -> Vec<u8> {
        self.token.as_bytes().to_vec()
    }

    fn needs_challenge(&self) -> bool {
        false
    }

    fn compute_proof(&mut self, _challenge: &AuthFields, _password: &SecUtf8) -> HdbResult<Vec<u8>> {
        Ok(self.initial_value())
    }
}
