//! Client-proof derivation for SCRAM-SHA256 and SCRAM-PBKDF2-SHA256.
//!
//! Both variants follow the same shape — derive a salted password, turn it
//! into a client key and a signature over the handshake transcript, then
//! XOR the two together — but disagree on how the salted password is
//! derived and what goes into the transcript. See the two auth modules for
//! where these primitives get wired into a wire-level exchange.

use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2;
use secstr::SecUtf8;
use sha2::{Digest, Sha256};

type HdbResult<T> = crate::error::HdbResult<T>;

fn hmac(key: &[u8], data: &[u8]) -> HdbResult<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub(crate) fn sha256(input: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().to_vec()
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    assert_eq!(a.len(), b.len(), "xor needs two equally long slices");
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for p in parts {
        out.extend_from_slice(p);
    }
    out
}

/// `(client_proof, server_proof)` for SCRAM-SHA256.
///
/// `salted_password = HMAC-SHA256(password, salt)`; `client_key =
/// SHA256(salted_password)`; the signature is computed over
/// `salt || server_key || client_challenge` and XORed with the client key
/// to produce the proof the server can verify against its own copy of
/// `client_key`.
pub(crate) fn scram_sha256(
    salt: &[u8],
    server_key: &[u8],
    client_challenge: &[u8],
    password: &SecUtf8,
) -> HdbResult<(Vec<u8>, Vec<u8>)> {
    let salted_password = hmac(password.unsecure().as_bytes(), salt)?;

    let client_key = sha256(&salted_password);
    let transcript = concat(&[salt, server_key, client_challenge]);
    let signature = hmac(&sha256(&client_key), &transcript)?;
    let client_proof = xor(&signature, &client_key);

    let server_verifier = hmac(&salted_password, salt)?;
    let server_transcript = concat(&[&client_key, salt, server_key]);
    let server_proof = hmac(&server_verifier, &server_transcript)?;

    Ok((client_proof, server_proof))
}

/// `(client_proof, server_proof)` for SCRAM-PBKDF2-SHA256.
///
/// Differs from plain SCRAM-SHA256 in that the salted password comes from
/// `PBKDF2-HMAC-SHA256(password, salt, rounds)` instead of a single HMAC
/// pass, and the transcript is built from `salt || server_nonce ||
/// client_nonce` rather than mixing in the server key directly.
pub(crate) fn scram_pbkdf2_sha256(
    salt: &[u8],
    server_nonce: &[u8],
    client_nonce: &[u8],
    password: &SecUtf8,
    rounds: u32,
) -> HdbResult<(Vec<u8>, Vec<u8>)> {
    let salted_password = pbkdf2_hmac_sha256(password.unsecure().as_bytes(), salt, rounds);

    let server_verifier = hmac(&salted_password, salt)?;

    let client_key = sha256(&salted_password);
    let client_verifier = sha256(&client_key);

    let transcript = concat(&[salt, server_nonce, client_nonce]);
    let shared_key = hmac(&client_verifier, &transcript)?;
    let client_proof = xor(&shared_key, &client_key);

    let server_transcript = concat(&[client_nonce, salt, server_nonce]);
    let server_proof = hmac(&server_verifier, &server_transcript)?;

    Ok((client_proof, server_proof))
}

fn pbkdf2_hmac_sha256(password: &[u8], salt: &[u8], rounds: u32) -> Vec<u8> {
    let mut out = [0_u8; 32];
    pbkdf2::<Hmac<Sha256>>(password, salt, rounds, &mut out)
        .expect("PBKDF2-HMAC-SHA256 output length is fixed and always valid");
    out.to_vec()
}
