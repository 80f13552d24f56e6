//! The connection state machine: `Unconnected → Connected → Initialized →
//! Authenticated → Closed`, per §4.5.

use crate::auth::{self, AuthMethod, AuthSession};
use crate::conn::params::ConnectParams;
use crate::conn::router::{DirectDialer, RouteDialer};
use crate::conn::transport::Transport;
use crate::error::{HdbError, HdbResult};
use crate::protocol::{FunctionCode, MessageType, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unconnected,
    Connected,
    Initialized,
    Authenticated,
    Closed,
}

/// The product/protocol version pair the server announced during
/// initialization.
#[derive(Debug, Clone, Copy)]
pub struct ServerVersion {
    /// Major product version, e.g. `4` for HANA 2.0.
    pub major_product_version: i8,
    /// Minor product version.
    pub minor_product_version: i16,
    /// Major wire protocol version.
    pub major_protocol_version: i8,
    /// Minor wire protocol version.
    pub minor_protocol_version: i16,
}

/// Drives one HDB session end to end: socket establishment (optionally
/// routed, optionally TLS), protocol-version initialization, authentication
/// and graceful disconnect. Not safe for concurrent use — see §5.
pub struct Connection {
    params: ConnectParams,
    dialer: Box<dyn RouteDialer>,
    transport: Option<Transport>,
    state: State,
    session_id: i64,
    seq_number: i32,
    version: Option<ServerVersion>,
    auth: AuthSession,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Builds a connection for `params`, authenticating with `auth_method`
    /// under the default client-id fingerprint (`pysap@<os hostname>`).
    #[must_use]
    pub fn new(params: ConnectParams, auth_method: AuthMethod) -> Self {
        Self::with_client_id(params, auth_method, None, None)
    }

    /// Like [`Connection::new`], but with an explicit `pid`/`hostname` pair
    /// for the client-id fingerprint (`"<pid>@<hostname>"`) instead of the
    /// `pysap`/OS-hostname defaults.
    #[must_use]
    pub fn with_client_id(
        params: ConnectParams,
        auth_method: AuthMethod,
        pid: Option<&str>,
        hostname: Option<&str>,
    ) -> Self {
        let username = params.dbuser().to_string();
        let auth = auth::build_session(auth_method, &username, pid, hostname);
        Self::from_parts(params, auth, Box::new(DirectDialer))
    }

    /// Like [`Connection::new`], but dials through `dialer` instead of a
    /// direct `TcpStream::connect`. The core never inspects `params.route()`
    /// itself; it is handed to `dialer` unparsed (§6). Tests use this to
    /// substitute a fake router collaborator.
    #[must_use]
    pub fn with_route_dialer(
        params: ConnectParams,
        auth_method: AuthMethod,
        dialer: Box<dyn RouteDialer>,
    ) -> Self {
        let username = params.dbuser().to_string();
        let auth = auth::build_session(auth_method, &username, None, None);
        Self::from_parts(params, auth, dialer)
    }

    fn from_parts(params: ConnectParams, auth: AuthSession, dialer: Box<dyn RouteDialer>) -> Self {
        Self {
            params,
            dialer,
            transport: None,
            state: State::Unconnected,
            session_id: -1,
            seq_number: 0,
            version: None,
            auth,
        }
    }

    /// Opens the socket (through the router, if a route is configured;
    /// through TLS, if configured). `Unconnected → Connected`.
    pub fn connect(&mut self) -> HdbResult<()> {
        log::debug!("connecting to {}", self.params);
        let transport = Transport::connect(&self.params, self.dialer.as_ref())
            .map_err(|e| HdbError::Connection(format!("failed to connect to {}: {e}", self.params)))?;
        self.transport = Some(transport);
        self.state = State::Connected;
        Ok(())
    }

    /// Sends the initialization magic and reads the product/protocol
    /// version reply. `Connected → Initialized`. Idempotent: if the version
    /// is already known, this is a no-op.
    pub fn initialize(&mut self) -> HdbResult<()> {
        if self.version.is_some() {
            return Ok(());
        }
        let transport = self.transport.as_mut().ok_or_else(not_connected)?;
        let reply = transport.initialize()?;
        self.version = Some(ServerVersion {
            major_product_version: reply.major_product_version,
            minor_product_version: reply.minor_product_version,
            major_protocol_version: reply.major_protocol_version,
            minor_protocol_version: reply.minor_protocol_version,
        });
        self.state = State::Initialized;
        log::debug!(
            "initialized: product {}.{}, protocol {}.{}",
            reply.major_product_version,
            reply.minor_product_version,
            reply.major_protocol_version,
            reply.minor_protocol_version
        );
        Ok(())
    }

    /// Runs the method-specific AUTHENTICATE/CONNECT exchange.
    /// `Initialized → Authenticated`. On any failure the socket is
    /// proactively closed to release server-side resources (§7).
    pub fn authenticate(&mut self) -> HdbResult<()> {
        if self.transport.is_none() {
            return Err(not_connected());
        }
        let password = self.params.password().clone();
        let transport = self.transport.as_mut().expect("checked above");
        let session_id_cell = &mut self.session_id;
        let seq_number_cell = &mut self.seq_number;
        let auth = &mut self.auth;

        let outcome = auth::authenticate(auth, Some(&password), |request| {
            transport.send(&request, *session_id_cell, *seq_number_cell)?;
            *seq_number_cell += 1;
            transport.recv()
        });

        match outcome {
            Ok(authenticated) => {
                self.session_id = authenticated.session_id;
                self.state = State::Authenticated;
                log::debug!("authenticated, session id {}", self.session_id);
                Ok(())
            }
            Err(e) => {
                log::warn!("authentication failed, closing socket: {e}");
                self.close_socket();
                Err(e)
            }
        }
    }

    /// Convenience composite: `connect` + `initialize` + `authenticate`.
    pub fn connect_authenticate(&mut self) -> HdbResult<()> {
        self.connect()?;
        self.initialize()?;
        self.authenticate()
    }

    /// Sends a DISCONNECT request and waits for its reply.
    /// `Authenticated → Closed`. The socket is released unconditionally in
    /// the cleanup path, even when the protocol handshake itself failed.
    pub fn close(&mut self) -> HdbResult<()> {
        if self.state == State::Closed {
            return Ok(());
        }
        let result = self.disconnect_roundtrip();
        self.close_socket();
        result
    }

    fn disconnect_roundtrip(&mut self) -> HdbResult<()> {
        let transport = self.transport.as_mut().ok_or_else(not_connected)?;
        let request = Request::new(MessageType::Disconnect);
        transport.send(&request, self.session_id, self.seq_number)?;
        self.seq_number += 1;
        let reply = transport.recv()?;
        match (reply.is_error, reply.function_code) {
            (false, Some(FunctionCode::Disconnect)) => Ok(()),
            _ => Err(HdbError::Connection(
                "Connection incorrectly closed".to_string(),
            )),
        }
    }

    /// Unconditionally releases the socket, regardless of current state.
    pub fn close_socket(&mut self) {
        self.transport = None;
        self.state = State::Closed;
    }

    /// The session id assigned by the server during `authenticate`, or `-1`
    /// before authentication completes.
    #[must_use]
    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    /// `true` once `authenticate` has completed successfully and `close`
    /// has not yet been called.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == State::Authenticated
    }

    /// The product/protocol version the server announced during
    /// `initialize`, if it has run yet.
    #[must_use]
    pub fn server_version(&self) -> Option<ServerVersion> {
        self.version
    }
}

fn not_connected() -> HdbError {
    HdbError::Connection("operation requires an open connection".to_string())
}
