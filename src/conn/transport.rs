//! Byte-level transport: a plain or TLS-wrapped TCP stream, used for both
//! the 14/8-byte initialization handshake and framed HDB packets.
//!
//! `recv` reads the 32-byte message header first, decodes `varpartlength`
//! out of it, then reads exactly that many further bytes before handing the
//! combined buffer to [`Reply::parse`] — per §4.4, a short read anywhere in
//! that sequence must keep looping rather than return a partial frame.

use crate::conn::params::ConnectParams;
use crate::conn::router::RouteDialer;
use crate::conn::tls;
use crate::error::{HdbError, HdbResult};
use crate::protocol::{self, InitReply, Reply, Request};
use rustls::{ClientConnection, ServerName, StreamOwned};
use std::io::{Cursor, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

const MESSAGE_HEADER_SIZE: usize = 32;

/// A connected byte stream, plain or TLS, possibly dialed through an SAP
/// Router tunnel. Everything above this module only ever sees "a socket
/// that speaks HDB framing".
pub(crate) enum Transport {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Transport {
    pub(crate) fn connect(params: &ConnectParams, dialer: &dyn RouteDialer) -> HdbResult<Self> {
        let route = params.route().unwrap_or("");
        let tcp_stream = dialer.dial(params.host(), params.port(), route)?;

        if params.is_tls() {
            let config = tls::client_config(params.tls())?;
            let server_name = ServerName::try_from(params.host())?;
            let client_connection = ClientConnection::new(Arc::new(config), server_name)?;
            log::debug!("TLS ClientConnection established for {}", params.host());
            Ok(Self::Tls(Box::new(StreamOwned::new(client_connection, tcp_stream))))
        } else {
            Ok(Self::Plain(tcp_stream))
        }
    }

    fn reader(&mut self) -> &mut dyn Read {
        match self {
            Self::Plain(stream) => stream,
            Self::Tls(stream) => stream.as_mut(),
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Plain(stream) => stream,
            Self::Tls(stream) => stream.as_mut(),
        }
    }

    /// Runs the out-of-band initialization exchange that precedes any HDB
    /// packet: a fixed 14-byte request, then an 8-byte reply carrying the
    /// product/protocol version.
    pub(crate) fn initialize(&mut self) -> HdbResult<InitReply> {
        protocol::emit_initial_request(self.writer())?;
        let bytes = read_full(self.reader(), 8)?;
        protocol::parse_initial_reply(&bytes)
    }

    /// Serializes and sends one request. Loops internally on a short write.
    pub(crate) fn send(&mut self, request: &Request, session_id: i64, seq_number: i32) -> HdbResult<()> {
        let mut buf = Cursor::new(Vec::with_capacity(request.size() as usize));
        request.emit(session_id, seq_number, &mut buf)?;
        let bytes = buf.into_inner();
        log::trace!("sending {} bytes", bytes.len());
        self.writer().write_all(&bytes)?;
        self.writer().flush()?;
        Ok(())
    }

    /// Reads exactly one reply: 32-byte header, then `varpartlength` more
    /// bytes, then parses the combined buffer.
    pub(crate) fn recv(&mut self) -> HdbResult<Reply> {
        let header = read_full(self.reader(), MESSAGE_HEADER_SIZE)?;
        let varpart_length =
            u32::from_le_bytes([header[12], header[13], header[14], header[15]]) as usize;
        log::trace!("received header, varpartlength = {varpart_length}");
        let body = read_full(self.reader(), varpart_length)?;

        let mut combined = Cursor::new([header, body].concat());
        Reply::parse(&mut combined)
    }
}

/// Reads exactly `len` bytes, looping over short reads, surfacing
/// `PeerClosed` the moment the socket returns zero bytes mid-frame.
fn read_full(r: &mut dyn Read, len: usize) -> HdbResult<Vec<u8>> {
    let mut buf = vec![0_u8; len];
    let mut filled = 0;
    while filled < len {
        match r.read(&mut buf[filled..]) {
            Ok(0) => return Err(HdbError::PeerClosed),
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn read_full_recovers_from_a_header_split_across_two_reads() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let writer = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            let bytes = [7_u8; 32];
            stream.write_all(&bytes[..16]).unwrap();
            stream.flush().unwrap();
            thread::sleep(std::time::Duration::from_millis(20));
            stream.write_all(&bytes[16..]).unwrap();
            stream.flush().unwrap();
        });

        let (mut accepted, _) = listener.accept().unwrap();
        let bytes = read_full(&mut accepted, 32).unwrap();
        assert_eq!(bytes, vec![7_u8; 32]);
        writer.join().unwrap();
    }

    #[test]
    fn read_full_reports_peer_closed_on_a_mid_frame_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let writer = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(&[1, 2, 3]).unwrap();
            stream.flush().unwrap();
            // stream dropped here, closing mid-frame
        });

        let (mut accepted, _) = listener.accept().unwrap();
        let err = read_full(&mut accepted, 32).unwrap_err();
        assert!(matches!(err, HdbError::PeerClosed));
        writer.join().unwrap();
    }
}
