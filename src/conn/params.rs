//! Connection parameters: host, port, credentials, optional router route,
//! and the TLS trust policy, built through [`ConnectParamsBuilder`].

use crate::error::{HdbError, HdbResult};
use secstr::SecUtf8;

/// An immutable bundle of everything [`crate::conn::Connection::new`] needs
/// to open a socket and authenticate.
#[derive(Clone, Debug)]
pub struct ConnectParams {
    host: String,
    port: u16,
    dbuser: String,
    password: SecUtf8,
    route: Option<String>,
    tls: Tls,
}

impl ConnectParams {
    /// Returns a new builder.
    pub fn builder() -> ConnectParamsBuilder {
        ConnectParamsBuilder::new()
    }

    /// The target host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The target port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, as passed to [`std::net::TcpStream::connect`].
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The database user.
    pub fn dbuser(&self) -> &str {
        &self.dbuser
    }

    /// The password.
    pub fn password(&self) -> &SecUtf8 {
        &self.password
    }

    /// The SAP Router route, if this connection is to be tunnelled.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Whether a TLS connection is to be used.
    pub fn is_tls(&self) -> bool {
        !matches!(self.tls, Tls::Off)
    }

    /// The TLS trust policy.
    pub fn tls(&self) -> &Tls {
        &self.tls
    }
}

impl std::fmt::Display for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}:{}{}",
            self.dbuser,
            self.host,
            self.port,
            if self.is_tls() { " (tls)" } else { "" }
        )
    }
}

/// Describes whether and how TLS is used for the connection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Tls {
    /// Plain TCP, no TLS.
    #[default]
    Off,
    /// TLS without server certificate validation. Dangerous, for testing
    /// against servers with self-signed certificates only.
    Insecure,
    /// TLS with the given trust anchors.
    Secure(Vec<ServerCerts>),
}

/// A source of trusted server certificates for [`Tls::Secure`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerCerts {
    /// Read every `*.pem` file in the given directory.
    Directory(String),
    /// Read the PEM-encoded certificate from the named environment variable.
    Environment(String),
    /// The PEM-encoded certificate, given directly.
    Direct(String),
    /// Use the Mozilla root store bundled via `webpki-roots`.
    RootCertificates,
}

/// Builds a [`ConnectParams`].
///
/// ```
/// use hdb_protocol::ConnectParams;
/// let params = ConnectParams::builder()
///     .hostname("localhost")
///     .port(30015)
///     .dbuser("SYSTEM")
///     .password("secret")
///     .build()
///     .unwrap();
/// assert_eq!(params.addr(), "localhost:30015");
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConnectParamsBuilder {
    host: Option<String>,
    port: Option<u16>,
    dbuser: Option<String>,
    password: Option<SecUtf8>,
    route: Option<String>,
    tls: Tls,
}

impl ConnectParamsBuilder {
    /// Returns an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target host.
    pub fn hostname(&mut self, hostname: impl Into<String>) -> &mut Self {
        self.host = Some(hostname.into());
        self
    }

    /// Sets the target port.
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Sets the database user. If omitted, `build` falls back to the
    /// OS-reported username.
    pub fn dbuser(&mut self, dbuser: impl Into<String>) -> &mut Self {
        self.dbuser = Some(dbuser.into());
        self
    }

    /// Sets the password.
    pub fn password(&mut self, password: impl Into<String>) -> &mut Self {
        self.password = Some(SecUtf8::from(password.into()));
        self
    }

    /// Sets the SAP Router route, tunnelling the connection through it.
    /// Grammar: `<hop>/S/<port>/H/<hop>/S/<port>...`, opaque to this crate
    /// (see [`crate::conn::router`]).
    pub fn route(&mut self, route: impl Into<String>) -> &mut Self {
        self.route = Some(route.into());
        self
    }

    /// Enables TLS with the given trust anchors.
    pub fn tls_with(&mut self, certs: Vec<ServerCerts>) -> &mut Self {
        self.tls = Tls::Secure(certs);
        self
    }

    /// Enables TLS without server certificate validation. Dangerous.
    pub fn tls_insecure(&mut self) -> &mut Self {
        self.tls = Tls::Insecure;
        self
    }

    /// Builds the `ConnectParams`, validating that a host, port and password
    /// were given, and resolving `dbuser` from the OS user if it was not.
    ///
    /// # Errors
    /// `HdbError::Connection` if host/port/password is missing;
    /// `HdbError::UsernameUnavailable` if `dbuser` was omitted and the OS
    /// user cannot be determined.
    pub fn build(&self) -> HdbResult<ConnectParams> {
        let host = self
            .host
            .clone()
            .ok_or_else(|| HdbError::Connection("hostname is missing".to_string()))?;
        let port = self
            .port
            .ok_or_else(|| HdbError::Connection("port is missing".to_string()))?;
        let password = self
            .password
            .clone()
            .ok_or_else(|| HdbError::Connection("password is missing".to_string()))?;
        let dbuser = match &self.dbuser {
            Some(dbuser) => dbuser.clone(),
            None => username::get_user_name().map_err(|_| HdbError::UsernameUnavailable)?,
        };

        Ok(ConnectParams {
            host,
            port,
            dbuser,
            password,
            route: self.route.clone(),
            tls: self.tls.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_plain_connect_params() {
        let params = ConnectParams::builder()
            .hostname("myhost")
            .port(30013)
            .dbuser("SYSTEM")
            .password("secret")
            .build()
            .unwrap();
        assert_eq!(params.addr(), "myhost:30013");
        assert_eq!(params.dbuser(), "SYSTEM");
        assert!(!params.is_tls());
        assert!(params.route().is_none());
    }

    #[test]
    fn falls_back_to_the_insecure_tls_policy() {
        let params = ConnectParams::builder()
            .hostname("myhost")
            .port(30015)
            .dbuser("SYSTEM")
            .password("secret")
            .tls_insecure()
            .build()
            .unwrap();
        assert!(params.is_tls());
        assert_eq!(*params.tls(), Tls::Insecure);
    }

    #[test]
    fn rejects_a_missing_host() {
        let err = ConnectParams::builder()
            .port(30013)
            .dbuser("SYSTEM")
            .password("secret")
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn carries_a_router_route_unparsed() {
        let params = ConnectParams::builder()
            .hostname("myhost")
            .port(30013)
            .dbuser("SYSTEM")
            .password("secret")
            .route("saprouter1/S/3299/H/saprouter2/S/3299")
            .build()
            .unwrap();
        assert_eq!(
            params.route(),
            Some("saprouter1/S/3299/H/saprouter2/S/3299")
        );
    }
}
