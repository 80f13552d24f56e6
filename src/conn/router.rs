//! The SAP Router tunnel: an external collaborator this crate treats as an
//! opaque socket wrapper, per §6 of the design: given `(host, port, route)`
//! it hands back a byte stream that behaves like a direct socket from then
//! on. The route string's `<hop>/S/<port>/H/<hop>/S/<port>...` grammar is
//! never parsed here; it is forwarded to the dialer verbatim.

use crate::error::HdbResult;
use std::net::TcpStream;

/// Opens a routed connection. Implementations own the SAP Router talk-mode
/// handshake; this crate only needs the resulting stream.
pub trait RouteDialer: Send + Sync {
    /// Dials `host:port`, tunnelling through `route`, and returns a
    /// connected stream.
    fn dial(&self, host: &str, port: u16, route: &str) -> HdbResult<TcpStream>;
}

/// The dialer used when no route is configured: connects directly and never
/// calls out to a router.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DirectDialer;

impl RouteDialer for DirectDialer {
    fn dial(&self, host: &str, port: u16, _route: &str) -> HdbResult<TcpStream> {
        Ok(TcpStream::connect((host, port))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn direct_dialer_ignores_the_route_and_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let _accept = std::thread::spawn(move || listener.accept().unwrap());

        let dialer = DirectDialer;
        dialer
            .dial(&addr.ip().to_string(), addr.port(), "unused/S/3299")
            .unwrap();
    }
}
