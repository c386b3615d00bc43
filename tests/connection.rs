// ABOUTME: Integration tests for the connection state machine against a loopback fixture server.
// ABOUTME: Covers reply-order, timeout-isolation, pipeline-equivalence and teardown behavior.

use respio::{Arg, Connection, ConnectionConfig, Frame};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Encodes a reply frame the way a server would. Only the shapes the
/// fixture below emits; not a general-purpose encoder.
fn encode_reply(frame: &Frame) -> Vec<u8> {
    match frame {
        Frame::Simple(s) => format!("+{s}\r\n").into_bytes(),
        Frame::Bulk(Some(b)) => {
            let mut out = format!("${}\r\n", b.len()).into_bytes();
            out.extend_from_slice(b);
            out.extend_from_slice(b"\r\n");
            out
        }
        other => panic!("fixture does not encode {other:?}"),
    }
}

fn command_args(frame: Frame) -> Vec<String> {
    match frame {
        Frame::Array(Some(items)) => items
            .into_iter()
            .map(|item| match item {
                Frame::Bulk(Some(b)) => String::from_utf8(b.to_vec()).unwrap(),
                other => panic!("fixture expects bulk arguments, got {other:?}"),
            })
            .collect(),
        other => panic!("fixture expects an array command, got {other:?}"),
    }
}

/// A tiny server: PING -> PONG, ECHO <x> -> bulk(x), DELAY <ms> -> sleeps
/// then OK, anything else -> OK. Enough to exercise ordering, timeouts and
/// pipelining without pulling in a real server implementation.
async fn spawn_fixture() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        handle_connection(socket).await;
    });

    addr
}

async fn handle_connection(mut socket: TcpStream) {
    let mut parser = respio::Parser::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        parser.append(&buf[..n]);

        loop {
            match parser.try_parse() {
                Ok(Some(frame)) => {
                    let args = command_args(frame);
                    let reply = match args[0].to_ascii_uppercase().as_str() {
                        "PING" => Frame::simple("PONG"),
                        "ECHO" => Frame::bulk(args[1].clone().into_bytes()),
                        "DELAY" => {
                            let ms: u64 = args[1].parse().unwrap();
                            tokio::time::sleep(Duration::from_millis(ms)).await;
                            Frame::simple("OK")
                        }
                        _ => Frame::simple("OK"),
                    };
                    if socket.write_all(&encode_reply(&reply)).await.is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(_) => return,
            }
        }
    }
}

fn echo(token: &str) -> Vec<Arg> {
    vec![Arg::from("ECHO"), Arg::from(token)]
}

#[tokio::test]
async fn reply_order_matches_submission_order() {
    let addr = spawn_fixture().await;
    let config = ConnectionConfig::new(addr.ip().to_string(), addr.port()).without_liveness();
    let conn = Connection::connect(config).await.unwrap();

    let (r1, r2, r3) = tokio::join!(conn.send(echo("1")), conn.send(echo("2")), conn.send(echo("3")));

    assert_eq!(r1.unwrap(), Frame::bulk(&b"1"[..]));
    assert_eq!(r2.unwrap(), Frame::bulk(&b"2"[..]));
    assert_eq!(r3.unwrap(), Frame::bulk(&b"3"[..]));

    conn.destroy().await.unwrap();
}

#[tokio::test]
async fn timed_out_command_does_not_misalign_later_replies() {
    let addr = spawn_fixture().await;
    let config = ConnectionConfig::new(addr.ip().to_string(), addr.port())
        .without_liveness()
        .with_command_timeout(Duration::from_millis(50));
    let conn = Connection::connect(config).await.unwrap();

    // The fixture answers commands strictly in arrival order, so the
    // ECHO reply cannot reach the wire before the DELAY ahead of it
    // finishes. Give it a deadline that outlasts the delay instead of
    // racing it, so this test isolates alignment rather than speed.
    let slow = vec![Arg::from("DELAY"), Arg::from("300")];
    let (slow_result, fast_result) = tokio::join!(
        conn.send(slow),
        conn.send_with_timeout(echo("next"), Duration::from_secs(2)),
    );

    assert!(matches!(slow_result, Err(respio::ClientError::Timeout)));
    assert_eq!(fast_result.unwrap(), Frame::bulk(&b"next"[..]));

    conn.destroy().await.unwrap();
}

#[tokio::test]
async fn pipeline_matches_sequential_sends() {
    let addr = spawn_fixture().await;
    let config = ConnectionConfig::new(addr.ip().to_string(), addr.port()).without_liveness();
    let conn = Connection::connect(config).await.unwrap();

    let results = conn
        .pipeline(vec![
            vec![Arg::from("SET"), Arg::from("a"), Arg::from(1i64)],
            vec![Arg::from("SET"), Arg::from("b"), Arg::from(2i64)],
        ])
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result.unwrap(), Frame::simple("OK"));
    }

    conn.destroy().await.unwrap();
}

#[tokio::test]
async fn destroy_fails_every_pending_waiter() {
    let addr = spawn_fixture().await;
    let config = ConnectionConfig::new(addr.ip().to_string(), addr.port()).without_liveness();
    let conn = Connection::connect(config).await.unwrap();

    let waiting_conn = conn.clone();
    let pending = tokio::spawn(async move {
        waiting_conn.send(vec![Arg::from("DELAY"), Arg::from("5000")]).await
    });

    // Give the command a moment to be enqueued before tearing down.
    tokio::time::sleep(Duration::from_millis(20)).await;
    conn.destroy().await.unwrap();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(respio::ClientError::ConnectionClosed(_))));
}
