//! SCRAM-PBKDF2-SHA256: same shape as plain SCRAM-SHA256, but the salted
//! password comes from a PBKDF2 pass and the server adds a distinct nonce.

use crate::auth::authenticator::Authenticator;
use crate::crypto;
use crate::error::{HdbError, HdbResult};
use crate::protocol::AuthFields;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use rand::{rngs::OsRng, RngCore};
use secstr::SecUtf8;
use std::io::Cursor;

const CLIENT_PROOF_SIZE: u8 = 32;
const MIN_ROUNDS: u32 = 15_000;
const MIN_SALT_LEN: usize = 16;

pub(crate) struct ScramPbkdf2Sha256 {
    client_challenge: Vec<u8>,
    server_proof: Option<Vec<u8>>,
}

impl ScramPbkdf2Sha256 {
    pub(crate) fn new() -> Self {
        let mut client_challenge = vec![0_u8; 64];
        OsRng.fill_bytes(&mut client_challenge);
        Self {
            client_challenge,
            server_proof: None,
        }
    }
}

impl Authenticator for ScramPbkdf2Sha256 {
    fn method_name(&self) -> &'static str {
        "SCRAMPBKDF2SHA256"
    }

    fn initial_value(&self) -> Vec<u8> {
        self.client_challenge.clone()
    }

    fn needs_challenge(&self) -> bool {
        true
    }

    fn compute_proof(&mut self, challenge: &AuthFields, password: &SecUtf8) -> HdbResult<Vec<u8>> {
        if challenge.len() != 3 {
            return Err(HdbError::malformed_challenge(format!(
                "expected [salt, server_nonce, rounds], got {} fields",
                challenge.len()
            )));
        }
        let salt = challenge.get(0).unwrap();
        let server_nonce = challenge.get(1).unwrap();
        let rounds_bytes = challenge.get(2).unwrap();

        if salt.len() < MIN_SALT_LEN {
            return Err(HdbError::malformed_challenge(format!(
                "salt shorter than {MIN_SALT_LEN} bytes ({})",
                salt.len()
            )));
        }
        let rounds = Cursor::new(rounds_bytes).read_u32::<BigEndian>().map_err(|_| {
            HdbError::malformed_challenge("rounds field is not a 4-byte big-endian integer")
        })?;
        if rounds < MIN_ROUNDS {
            return Err(HdbError::malformed_challenge(format!(
                "rounds {rounds} below the minimum of {MIN_ROUNDS}"
            )));
        }

        let (client_proof, server_proof) = crypto::scram_pbkdf2_sha256(
            salt,
            server_nonce,
            &self.client_challenge,
            password,
            rounds,
        )?;
        self.server_proof = Some(server_proof);

        let mut buf = Vec::with_capacity(3 + client_proof.len());
        buf.write_u16::<byteorder::LittleEndian>(1).unwrap();
        buf.write_u8(CLIENT_PROOF_SIZE).unwrap();
        buf.extend_from_slice(&client_proof);
        Ok(buf)
    }

    fn verify_server(&self, server_proof: &[u8]) -> HdbResult<()> {
        match &self.server_proof {
            Some(expected) if expected.as_slice() == server_proof => Ok(()),
            Some(_) => Err(HdbError::authentication(
                "server proof did not match the expected value",
            )),
            None => Err(HdbError::Impl("verify_server called before compute_proof")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge(salt: &[u8], nonce: &[u8], rounds: u32) -> AuthFields {
        let mut fields = AuthFields::new();
        fields.push(salt.to_vec());
        fields.push(nonce.to_vec());
        let mut rounds_bytes = Vec::new();
        rounds_bytes.write_u32::<BigEndian>(rounds).unwrap();
        fields.push(rounds_bytes);
        fields
    }

    #[test]
    fn rejects_rounds_below_the_minimum() {
        let mut auth = ScramPbkdf2Sha256::new();
        let c = challenge(b"saltsaltsaltsalt", b"server-nonce-val", 100);
        assert!(auth.compute_proof(&c, &SecUtf8::from("pw")).is_err());
    }

    #[test]
    fn rejects_a_short_salt() {
        let mut auth = ScramPbkdf2Sha256::new();
        let c = challenge(b"short", b"server-nonce-val", 15000);
        assert!(auth.compute_proof(&c, &SecUtf8::from("pw")).is_err());
    }

    #[test]
    fn accepts_a_well_formed_challenge() {
        let mut auth = ScramPbkdf2Sha256::new();
        let c = challenge(b"saltsaltsaltsalt", b"server-nonce-val", 15000);
        let proof = auth.compute_proof(&c, &SecUtf8::from("pw")).unwrap();
        assert_eq!(proof.len(), 35);
    }
}
