//! SCRAM-SHA256: the default password-based authentication method.

use crate::auth::authenticator::Authenticator;
use crate::crypto;
use crate::error::HdbResult;
use crate::protocol::AuthFields;
use byteorder::WriteBytesExt;
use rand::{rngs::OsRng, RngCore};
use secstr::SecUtf8;

const CLIENT_PROOF_SIZE: u8 = 32;

pub(crate) struct ScramSha256 {
    client_challenge: Vec<u8>,
    server_proof: Option<Vec<u8>>,
}

impl ScramSha256 {
    pub(crate) fn new() -> Self {
        let mut client_challenge = vec![0_u8; 64];
        OsRng.fill_bytes(&mut client_challenge);
        Self {
            client_challenge,
            server_proof: None,
        }
    }
}

impl Authenticator for ScramSha256 {
    fn method_name(&self) -> &'static str {
        "SCRAMSHA256"
    }

    fn initial_value(&self) -> Vec<u8> {
        self.client_challenge.clone()
    }

    fn needs_challenge(&self) -> bool {
        true
    }

    fn compute_proof(&mut self, challenge: &AuthFields, password: &SecUtf8) -> HdbResult<Vec<u8>> {
        if challenge.len() != 2 {
            return Err(crate::error::HdbError::malformed_challenge(format!(
                "expected [salt, server_key], got {} fields",
                challenge.len()
            )));
        }
        let salt = challenge.get(0).unwrap();
        let server_key = challenge.get(1).unwrap();

        let (client_proof, server_proof) =
            crypto::scram_sha256(salt, server_key, &self.client_challenge, password)?;
        self.server_proof = Some(server_proof);

        Ok(frame_proof(&client_proof))
    }

    fn verify_server(&self, server_proof: &[u8]) -> HdbResult<()> {
        match &self.server_proof {
            Some(expected) if expected.as_slice() == server_proof => Ok(()),
            Some(_) => Err(crate::error::HdbError::authentication(
                "server proof did not match the expected value",
            )),
            None => Err(crate::error::HdbError::Impl(
                "verify_server called before compute_proof",
            )),
        }
    }
}

fn frame_proof(proof: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(3 + proof.len());
    buf.write_u16::<byteorder::LittleEndian>(1).unwrap();
    buf.write_u8(CLIENT_PROOF_SIZE).unwrap();
    buf.extend_from_slice(proof);
    buf
}
