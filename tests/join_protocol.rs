use overmesh::network::join::{direct_join, JoinError, JoinTimeouts};
use overmesh::topology::NodeAddress;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

fn me() -> NodeAddress {
    NodeAddress::new("10.0.0.1", 58000)
}

fn timeouts() -> JoinTimeouts {
    JoinTimeouts {
        connect: Duration::from_secs(2),
        safe_wait: Duration::from_secs(1),
    }
}

#[tokio::test]
async fn founding_sentinel_joins_without_any_io() {
    let sentinel = NodeAddress::new("0.0.0.0", 0);
    let outcome = direct_join(&me(), &sentinel, timeouts()).await.unwrap();
    assert!(outcome.founded);
    assert_eq!(outcome.external, me());
    assert_eq!(outcome.safeguard, Some(me()));
}

#[tokio::test]
async fn direct_join_sends_entry_and_applies_safe_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut line = String::new();
        BufReader::new(read_half).read_line(&mut line).await.unwrap();
        write_half.write_all(b"SAFE 10.0.0.9 4242\n").await.unwrap();
        line
    });

    let peer = NodeAddress::new("127.0.0.1", addr.port());
    let outcome = direct_join(&me(), &peer, timeouts()).await.unwrap();

    assert!(!outcome.founded);
    assert_eq!(outcome.external, peer);
    assert_eq!(outcome.safeguard, Some(NodeAddress::new("10.0.0.9", 4242)));

    let received = server.await.unwrap();
    assert_eq!(received, "ENTRY 10.0.0.1 58000\n");
}

#[tokio::test]
async fn direct_join_succeeds_when_no_safe_reply_arrives() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, _write_half) = stream.into_split();
        let mut line = String::new();
        BufReader::new(read_half).read_line(&mut line).await.unwrap();
        // Close without replying; the join must still complete.
    });

    let peer = NodeAddress::new("127.0.0.1", addr.port());
    let outcome = direct_join(&me(), &peer, timeouts()).await.unwrap();
    assert_eq!(outcome.external, peer);
    assert_eq!(outcome.safeguard, None);
}

#[tokio::test]
async fn malformed_handshake_reply_leaves_safeguard_unset() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut line = String::new();
        BufReader::new(read_half).read_line(&mut line).await.unwrap();
        write_half.write_all(b"SAFE not enough\n").await.unwrap();
    });

    let peer = NodeAddress::new("127.0.0.1", addr.port());
    let outcome = direct_join(&me(), &peer, timeouts()).await.unwrap();
    assert_eq!(outcome.external, peer);
    assert_eq!(outcome.safeguard, None);
}

#[tokio::test]
async fn connect_failure_aborts_without_retry() {
    // Grab an ephemeral port, then free it so the dial is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let peer = NodeAddress::new("127.0.0.1", addr.port());
    let err = direct_join(&me(), &peer, timeouts()).await.unwrap_err();
    match err {
        JoinError::Connect { peer: failed, .. } => assert_eq!(failed, peer),
        other => panic!("expected Connect error, got {:?}", other),
    }
}
