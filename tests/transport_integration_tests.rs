//! Integration tests for the transport pipeline
//!
//! These run the resolve -> connect -> frame pipeline against real
//! loopback sockets, with servers that deliver bytes in adversarial
//! chunkings.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

use ircwire::net::{
    Connection, Connector, Disconnect, RecvEvent, ResolvedAddr, TransportConfig,
};

fn test_config() -> TransportConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    TransportConfig {
        read_timeout: Duration::from_millis(200),
        connect_retry: Duration::from_millis(10),
        keepalive: Duration::from_secs(10),
        ..TransportConfig::default()
    }
}

/// Collect `want` lines from a freshly framed connection.
fn read_lines(conn: &Connection, want: usize) -> Vec<Vec<u8>> {
    let mut framer = conn.framer().expect("framer");
    let mut lines = Vec::new();
    while lines.len() < want {
        match framer.next_event() {
            RecvEvent::Line(l) => lines.push(l),
            RecvEvent::Empty => continue,
            RecvEvent::Closed(why) => panic!("connection closed early: {}", why),
        }
    }
    lines
}

fn connect_loopback(port: u16) -> Connection {
    let abort = AtomicBool::new(false);
    let mut conn = Connection::new(test_config());
    conn.resolve("127.0.0.1", port, &abort)
        .expect("resolve loopback");
    conn.connect().expect("connect loopback");
    conn
}

#[test]
fn test_full_session_with_fragmented_delivery() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        // Deliberately misaligned chunks: a line split mid-word, two
        // lines in one write, a terminator arriving alone.
        for chunk in [
            &b":irc.example.net 001 tester :Welc"[..],
            &b"ome to the network\r\n:irc.example.net 376 tester :End of /MOTD\r\nPING :12"[..],
            &b"345"[..],
            &b"\r\n"[..],
        ] {
            stream.write_all(chunk).unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_millis(20));
        }
    });

    let conn = connect_loopback(port);
    let lines = read_lines(&conn, 3);

    assert_eq!(
        lines,
        vec![
            b":irc.example.net 001 tester :Welcome to the network".to_vec(),
            b":irc.example.net 376 tester :End of /MOTD".to_vec(),
            b"PING :12345".to_vec(),
        ]
    );
    server.join().unwrap();
}

#[test]
fn test_byte_trickle_over_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        for byte in b"NOTICE * :one byte at a time\r\n" {
            stream.write_all(&[*byte]).unwrap();
            stream.flush().unwrap();
        }
    });

    let conn = connect_loopback(port);
    let lines = read_lines(&conn, 1);
    assert_eq!(lines[0], b"NOTICE * :one byte at a time".to_vec());
    server.join().unwrap();
}

#[test]
fn test_orderly_close_yields_eof() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"ERROR :Closing Link\r\n").unwrap();
        // Returning drops the stream, closing it cleanly.
    });

    let conn = connect_loopback(port);
    let mut framer = conn.framer().unwrap();

    let mut saw_line = false;
    let why = loop {
        match framer.next_event() {
            RecvEvent::Line(l) => {
                assert_eq!(l, b"ERROR :Closing Link".to_vec());
                saw_line = true;
            }
            RecvEvent::Empty => continue,
            RecvEvent::Closed(why) => break why,
        }
    };
    assert!(saw_line);
    assert_eq!(why, Disconnect::Eof);
    server.join().unwrap();
}

#[test]
fn test_unterminated_tail_is_not_emitted() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        // The second line never receives its terminator before close.
        stream.write_all(b"complete\r\nincompl").unwrap();
    });

    let conn = connect_loopback(port);
    let mut framer = conn.framer().unwrap();

    let mut lines = Vec::new();
    loop {
        match framer.next_event() {
            RecvEvent::Line(l) => lines.push(l),
            RecvEvent::Empty => continue,
            RecvEvent::Closed(_) => break,
        }
    }
    // Only the terminated line comes out; the dangling fragment dies
    // with the connection rather than being surfaced as a line.
    assert_eq!(lines, vec![b"complete".to_vec()]);
    server.join().unwrap();
}

#[test]
fn test_connector_falls_back_to_later_candidate() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let good: ResolvedAddr = listener.local_addr().unwrap().into();

    // A port that was bound and released refuses connections.
    let dead = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr: ResolvedAddr = l.local_addr().unwrap().into();
        drop(l);
        addr
    };

    let accepted = thread::spawn(move || listener.accept().map(|(s, a)| (s, a)));

    let stream: TcpStream = Connector::from_config(&test_config())
        .connect(&[dead, good])
        .expect("fallback connect");
    assert_eq!(stream.peer_addr().unwrap(), good.socket_addr());
    accepted.join().unwrap().unwrap();
}

#[test]
fn test_resolve_hostname_localhost() {
    let abort = AtomicBool::new(false);
    let mut conn = Connection::new(test_config());
    // May legitimately yield several candidates (v4 + v6).
    conn.resolve("localhost", 6667, &abort).expect("resolve localhost");
}

#[test]
fn test_send_line_framing_on_the_wire() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = std::io::BufReader::new(stream);
        let mut first = String::new();
        let mut second = String::new();
        std::io::BufRead::read_line(&mut reader, &mut first).unwrap();
        std::io::BufRead::read_line(&mut reader, &mut second).unwrap();
        (first, second)
    });

    let mut conn = connect_loopback(port);
    conn.send_line(b"NICK tester").unwrap();
    conn.send_line(b"USER tester 0 * :Test User").unwrap();

    let (first, second) = server.join().unwrap();
    assert_eq!(first, "NICK tester\r\n");
    assert_eq!(second, "USER tester 0 * :Test User\r\n");
}

#[test]
fn test_reconnect_after_server_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        // First session: closed immediately. Second: greets.
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"HELLO\r\n").unwrap();
        // Keep the socket open until the client has read the line.
        thread::sleep(Duration::from_millis(300));
    });

    let abort = AtomicBool::new(false);
    let mut conn = connect_loopback(port);

    let mut framer = conn.framer().unwrap();
    let why = loop {
        match framer.next_event() {
            RecvEvent::Closed(why) => break why,
            _ => continue,
        }
    };
    assert_eq!(why, Disconnect::Eof);

    // Caller-driven restart of the whole pipeline.
    conn.reset();
    conn.resolve("127.0.0.1", port, &abort).unwrap();
    conn.connect().unwrap();
    let lines = read_lines(&conn, 1);
    assert_eq!(lines[0], b"HELLO".to_vec());
    server.join().unwrap();
}
