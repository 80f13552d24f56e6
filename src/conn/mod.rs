//! Connection establishment: parameters, routing, TLS and the handshake
//! state machine that drives them (§4.4, §4.5).

mod connection;
mod params;
mod router;
mod tls;
mod transport;

pub use connection::{Connection, ServerVersion};
pub use params::{ConnectParams, ConnectParamsBuilder, ServerCerts, Tls};
pub use router::RouteDialer;
pub(crate) use router::DirectDialer;
