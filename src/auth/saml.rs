//! SAML authentication: the value is a caller-supplied assertion, opaque to
//! this client.

use crate::auth::authenticator::Authenticator;
use crate::error::HdbResult;
use crate::protocol::AuthFields;
use secstr::SecUtf8;

pub(crate) struct Saml {
    assertion: Vec<u8>,
}

impl Saml {
    pub(crate) fn new(assertion: Vec<u8>) -> Self {
        Self { assertion }
    }
}

impl Authenticator for Saml {
    fn method_name(&self) -> &'static str {
        "SAML"
    }

    fn initial_value(&self) -> Vec<u8> {
        self.assertion.clone()
    }

    fn needs_challenge(&self) -> bool {
        false
    }

    fn compute_proof(&mut self, _challenge: &AuthFields, _password: &SecUtf8) -> HdbResult<Vec<u8>> {
        Ok(self.initial_value())
    }
}
