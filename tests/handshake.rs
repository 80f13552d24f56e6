//! End-to-end handshake scenarios, driven against a scripted in-process TCP
//! mock server. This is the substitute for the teacher driver's
//! `tests/test_010_connect.rs`-style tests, which run against a live HANA
//! instance that isn't available here.
//!
//! Each mock plays back raw bytes hand-encoded to the wire layout in §3 of
//! the design, rather than going through the crate's (private) codec —
//! these tests exercise the crate strictly through its public API.

use hdb_protocol::{AuthMethod, ConnectParams, Connection, HdbResult, RouteDialer};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

// ---- wire-level scratch encoders, independent of the crate's own codec ----

fn emit_length(len: usize, out: &mut Vec<u8>) {
    if len <= 245 {
        out.push(len as u8);
    } else if len <= 0xFFFF {
        out.push(0xF6);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        out.push(0xF7);
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
}

fn encode_auth_fields(fields: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(fields.len() as u16).to_le_bytes());
    for field in fields {
        emit_length(field.len(), &mut out);
        out.extend_from_slice(field);
    }
    out
}

fn pad_len(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        7 - (n - 1) % 8
    }
}

fn encode_part(kind: i8, argument_count: i16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(kind as u8);
    out.push(0); // attributes
    out.extend_from_slice(&argument_count.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes()); // bigargumentcount
    out.extend_from_slice(&(body.len() as i32).to_le_bytes()); // bufferlength
    out.extend_from_slice(&0i32.to_le_bytes()); // buffersize
    out.extend_from_slice(body);
    out.extend(std::iter::repeat(0_u8).take(pad_len(body.len())));
    out
}

fn encode_segment(kind: i8, tail: [u8; 11], parts: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(part);
    }
    let mut out = Vec::new();
    out.extend_from_slice(&(24 + body.len() as i32).to_le_bytes()); // segmentlength
    out.extend_from_slice(&0i32.to_le_bytes()); // segmentofs
    out.extend_from_slice(&(parts.len() as i16).to_le_bytes()); // noofparts
    out.extend_from_slice(&1i16.to_le_bytes()); // segmentno
    out.push(kind as u8); // segmentkind
    out.extend_from_slice(&tail);
    out.extend_from_slice(&body);
    out
}

fn reply_tail(function_code: i16) -> [u8; 11] {
    let mut tail = [0_u8; 11];
    let fc = function_code.to_le_bytes();
    tail[1] = fc[0];
    tail[2] = fc[1];
    tail
}

const REPLY: i8 = 2;
const ERROR: i8 = 5;

fn encode_message(session_id: i64, packetcount: i32, segment: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&session_id.to_le_bytes());
    out.extend_from_slice(&packetcount.to_le_bytes());
    out.extend_from_slice(&(segment.len() as u32).to_le_bytes()); // varpartlength
    out.extend_from_slice(&(segment.len() as u32).to_le_bytes()); // varpartsize
    out.extend_from_slice(&1i16.to_le_bytes()); // noofsegm
    out.push(0); // packetoptions
    out.push(0); // reserved
    out.extend_from_slice(&0i32.to_le_bytes()); // compressionvarpartlength
    out.extend_from_slice(&[0_u8; 4]); // reserved
    out.extend_from_slice(segment);
    out
}

fn authenticate_reply_bytes(method_echo: &str, salt: &[u8], server_key: &[u8]) -> Vec<u8> {
    let nested = encode_auth_fields(&[salt.to_vec(), server_key.to_vec()]);
    let top = encode_auth_fields(&[method_echo.as_bytes().to_vec(), nested]);
    let part = encode_part(33, 2, &top);
    let segment = encode_segment(REPLY, reply_tail(0), &[part]);
    encode_message(-1, 0, &segment)
}

fn connect_success_reply_bytes(session_id: i64) -> Vec<u8> {
    let segment = encode_segment(REPLY, reply_tail(14), &[]);
    encode_message(session_id, 1, &segment)
}

fn connect_error_reply_bytes() -> Vec<u8> {
    let segment = encode_segment(ERROR, [0_u8; 11], &[]);
    encode_message(-1, 1, &segment)
}

fn disconnect_success_reply_bytes(session_id: i64) -> Vec<u8> {
    let segment = encode_segment(REPLY, reply_tail(18), &[]);
    encode_message(session_id, 2, &segment)
}

fn write_init_reply(stream: &mut impl Write) {
    let mut buf = Vec::new();
    buf.push(4_u8); // product_major
    buf.extend_from_slice(&20_i16.to_be_bytes()); // product_minor
    buf.push(4_u8); // protocol_major
    buf.extend_from_slice(&1_i16.to_be_bytes()); // protocol_minor
    buf.extend_from_slice(&[0, 0]);
    stream.write_all(&buf).unwrap();
    stream.flush().unwrap();
}

fn read_init_request(stream: &mut impl Read) {
    let mut buf = [0_u8; 14];
    stream.read_exact(&mut buf).unwrap();
}

fn discard_one_message(stream: &mut impl Read) {
    let mut header = [0_u8; 32];
    stream.read_exact(&mut header).unwrap();
    let varpart_len = u32::from_le_bytes([header[12], header[13], header[14], header[15]]) as usize;
    let mut body = vec![0_u8; varpart_len];
    stream.read_exact(&mut body).unwrap();
}

fn listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

fn params(addr: SocketAddr) -> ConnectParams {
    ConnectParams::builder()
        .hostname(addr.ip().to_string())
        .port(addr.port())
        .dbuser("SYSTEM")
        .password("correcthorsebatterystaple")
        .build()
        .unwrap()
}

const SALT: &[u8] = b"\x80\x96\x4F\xA8\x54\x28\xAE\x3A\x81\xAC\xD3\xE6\x86\xA2\x79\x33";
const SERVER_KEY: &[u8] = &[7_u8; 48];

/// Scenario 1: happy path. Init, AUTHENTICATE, CONNECT all succeed and the
/// connection reports `Authenticated` with the server-assigned session id.
#[test]
fn happy_path_scram_sha256() {
    let (listener, addr) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_init_request(&mut stream);
        write_init_reply(&mut stream);
        discard_one_message(&mut stream); // AUTHENTICATE request
        stream
            .write_all(&authenticate_reply_bytes("SCRAMSHA256", SALT, SERVER_KEY))
            .unwrap();
        stream.flush().unwrap();
        discard_one_message(&mut stream); // CONNECT request
        stream.write_all(&connect_success_reply_bytes(4711)).unwrap();
        stream.flush().unwrap();
    });

    let mut conn = Connection::new(params(addr), AuthMethod::ScramSha256);
    conn.connect_authenticate().unwrap();
    assert!(conn.is_authenticated());
    assert_eq!(conn.session_id(), 4711);

    server.join().unwrap();
}

/// Scenario 2: the server echoes a method name different from the one the
/// client sent. Authentication must fail and the socket must be released.
#[test]
fn method_mismatch_reports_authentication_error() {
    let (listener, addr) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_init_request(&mut stream);
        write_init_reply(&mut stream);
        discard_one_message(&mut stream);
        stream
            .write_all(&authenticate_reply_bytes("SCRAMMD5", SALT, SERVER_KEY))
            .unwrap();
        stream.flush().unwrap();
    });

    let mut conn = Connection::new(params(addr), AuthMethod::ScramSha256);
    conn.connect().unwrap();
    conn.initialize().unwrap();
    let err = conn.authenticate().unwrap_err();
    assert!(err.to_string().contains("SCRAMMD5"));
    assert!(!conn.is_authenticated());
    // the socket was proactively released; close() is a no-op from here.
    conn.close().unwrap();

    server.join().unwrap();
}

/// Scenario 3: the server answers the CONNECT request with an Error
/// segment. Authentication must fail with the documented message.
#[test]
fn server_error_on_connect_reports_authentication_error() {
    let (listener, addr) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_init_request(&mut stream);
        write_init_reply(&mut stream);
        discard_one_message(&mut stream); // AUTHENTICATE request
        stream
            .write_all(&authenticate_reply_bytes("SCRAMSHA256", SALT, SERVER_KEY))
            .unwrap();
        stream.flush().unwrap();
        discard_one_message(&mut stream); // CONNECT request
        stream.write_all(&connect_error_reply_bytes()).unwrap();
        stream.flush().unwrap();
    });

    let mut conn = Connection::new(params(addr), AuthMethod::ScramSha256);
    let err = conn.connect_authenticate().unwrap_err();
    assert_eq!(err.to_string(), "authentication failed: Authentication failed");
    assert!(!conn.is_authenticated());

    server.join().unwrap();
}

/// Scenario 4: disconnect round-trips cleanly, and any operation attempted
/// afterwards reports a connection error instead of panicking or hanging.
#[test]
fn disconnect_round_trip_then_subsequent_operations_error() {
    let (listener, addr) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_init_request(&mut stream);
        write_init_reply(&mut stream);
        discard_one_message(&mut stream);
        stream
            .write_all(&authenticate_reply_bytes("SCRAMSHA256", SALT, SERVER_KEY))
            .unwrap();
        stream.flush().unwrap();
        discard_one_message(&mut stream);
        stream.write_all(&connect_success_reply_bytes(99)).unwrap();
        stream.flush().unwrap();
        discard_one_message(&mut stream); // DISCONNECT request
        stream.write_all(&disconnect_success_reply_bytes(99)).unwrap();
        stream.flush().unwrap();
    });

    let mut conn = Connection::new(params(addr), AuthMethod::ScramSha256);
    conn.connect_authenticate().unwrap();
    conn.close().unwrap();
    assert!(!conn.is_authenticated());

    // the connection is closed; trying to authenticate again must fail
    // rather than silently no-op or reach for a socket that's gone.
    let err = conn.authenticate().unwrap_err();
    assert!(err.to_string().contains("connection error"));

    server.join().unwrap();
}

/// Scenario 5: short read recovery. The CONNECT reply's 32-byte header
/// arrives as two separate 16-byte writes; the transport must still decode
/// it correctly rather than choking on the partial read.
#[test]
fn short_read_recovery_across_a_split_header() {
    let (listener, addr) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_init_request(&mut stream);
        write_init_reply(&mut stream);
        discard_one_message(&mut stream);
        stream
            .write_all(&authenticate_reply_bytes("SCRAMSHA256", SALT, SERVER_KEY))
            .unwrap();
        stream.flush().unwrap();
        discard_one_message(&mut stream);

        let reply = connect_success_reply_bytes(321);
        stream.write_all(&reply[..16]).unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(20));
        stream.write_all(&reply[16..]).unwrap();
        stream.flush().unwrap();
    });

    let mut conn = Connection::new(params(addr), AuthMethod::ScramSha256);
    conn.connect_authenticate().unwrap();
    assert_eq!(conn.session_id(), 321);

    server.join().unwrap();
}

struct RecordingDialer {
    target: SocketAddr,
    seen_route: Arc<Mutex<Option<String>>>,
}

impl RouteDialer for RecordingDialer {
    fn dial(&self, _host: &str, _port: u16, route: &str) -> HdbResult<TcpStream> {
        *self.seen_route.lock().unwrap() = Some(route.to_string());
        Ok(TcpStream::connect(self.target)?)
    }
}

/// Scenario 6: a route is configured. The transport collaborator receives
/// it verbatim; the core itself never inspects the route string.
#[test]
fn routed_connection_invokes_dialer_with_the_configured_route() {
    let (listener, addr) = listener();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_init_request(&mut stream);
        write_init_reply(&mut stream);
        discard_one_message(&mut stream);
        stream
            .write_all(&authenticate_reply_bytes("SCRAMSHA256", SALT, SERVER_KEY))
            .unwrap();
        stream.flush().unwrap();
        discard_one_message(&mut stream);
        stream.write_all(&connect_success_reply_bytes(1)).unwrap();
        stream.flush().unwrap();
    });

    let route = "host1/S/3299/H/target/S/30015";
    let seen_route = Arc::new(Mutex::new(None));
    let dialer = RecordingDialer {
        target: addr,
        seen_route: Arc::clone(&seen_route),
    };

    let mut connect_params = ConnectParams::builder();
    connect_params
        .hostname("irrelevant-because-the-dialer-decides")
        .port(1)
        .dbuser("SYSTEM")
        .password("secret")
        .route(route);
    let connect_params = connect_params.build().unwrap();

    let mut conn = Connection::with_route_dialer(connect_params, AuthMethod::ScramSha256, Box::new(dialer));
    conn.connect_authenticate().unwrap();

    assert_eq!(seen_route.lock().unwrap().as_deref(), Some(route));

    server.join().unwrap();
}
