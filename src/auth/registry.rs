//! Constructors for each authentication method.
//!
//! All five take `(username, pid, hostname)` in that order. The reference
//! this crate's wire format is modeled on has JWT and SAML constructors
//! that actually take `(pid, hostname)` for what is semantically
//! `(username, pid)` — a parameter-order bug this crate does not reproduce;
//! every constructor here is uniform.

use crate::auth::authenticator::{client_id, Authenticator};
use crate::auth::jwt::Jwt;
use crate::auth::saml::Saml;
use crate::auth::scram_pbkdf2_sha256::ScramPbkdf2Sha256;
use crate::auth::scram_sha256::ScramSha256;
use crate::auth::session_cookie::SessionCookie;

/// The username plus the method implementation chosen to authenticate it.
pub(crate) struct AuthSession {
    pub(crate) username: String,
    pub(crate) client_id: String,
    pub(crate) authenticator: Box<dyn Authenticator>,
}

fn session(
    username: &str,
    pid: Option<&str>,
    hostname: Option<&str>,
    authenticator: Box<dyn Authenticator>,
) -> AuthSession {
    AuthSession {
        username: username.to_string(),
        client_id: client_id(pid, hostname),
        authenticator,
    }
}

pub(crate) fn scram_sha256(username: &str, pid: Option<&str>, hostname: Option<&str>) -> AuthSession {
    session(username, pid, hostname, Box::new(ScramSha256::new()))
}

pub(crate) fn scram_pbkdf2_sha256(
    username: &str,
    pid: Option<&str>,
    hostname: Option<&str>,
) -> AuthSession {
    session(username, pid, hostname, Box::new(ScramPbkdf2Sha256::new()))
}

pub(crate) fn session_cookie(
    username: &str,
    pid: Option<&str>,
    hostname: Option<&str>,
    cookie: &[u8],
) -> AuthSession {
    let id = client_id(pid, hostname);
    session(
        username,
        pid,
        hostname,
        Box::new(SessionCookie::new(cookie, &id)),
    )
}

pub(crate) fn jwt(username: &str, pid: Option<&str>, hostname: Option<&str>, token: String) -> AuthSession {
    session(username, pid, hostname, Box::new(Jwt::new(token)))
}

pub(crate) fn saml(
    username: &str,
    pid: Option<&str>,
    hostname: Option<&str>,
    assertion: Vec<u8>,
) -> AuthSession {
    session(username, pid, hostname, Box::new(Saml::new(assertion)))
}
