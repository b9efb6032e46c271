use overmesh::network::join::{assisted_join, JoinError, JoinTimeouts};
use overmesh::network::registry::{RegistryClient, RegistryError};
use overmesh::topology::NodeAddress;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};

fn me() -> NodeAddress {
    NodeAddress::new("10.0.0.1", 58000)
}

fn timeouts() -> JoinTimeouts {
    JoinTimeouts {
        connect: Duration::from_secs(2),
        safe_wait: Duration::from_millis(200),
    }
}

/// A rendezvous server stub that answers the first NODES request with the
/// given reply body.
async fn spawn_registry_stub(reply: String) -> std::net::SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        let (len, from) = socket.recv_from(&mut buf).await.unwrap();
        let request = String::from_utf8_lossy(&buf[..len]).to_string();
        assert!(request.starts_with("NODES "), "unexpected: {}", request);
        socket.send_to(reply.as_bytes(), from).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn assisted_join_dials_exactly_one_listed_candidate() {
    // One joinable member of the mesh.
    let member = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let member_addr = member.local_addr().unwrap();
    let served = tokio::spawn(async move {
        let (stream, _) = member.accept().await.unwrap();
        let (read_half, _write) = stream.into_split();
        let mut line = String::new();
        BufReader::new(read_half).read_line(&mut line).await.unwrap();
        line
    });

    let reply = format!("NODESLIST 001\n127.0.0.1 {}\n", member_addr.port());
    let server = spawn_registry_stub(reply).await;
    let registry = RegistryClient::new("127.0.0.1", server.port(), Duration::from_secs(2))
        .await
        .unwrap();

    let outcome = assisted_join(&registry, &me(), "001", timeouts())
        .await
        .unwrap();
    assert!(!outcome.founded);
    assert_eq!(
        outcome.external,
        NodeAddress::new("127.0.0.1", member_addr.port())
    );
    assert_eq!(served.await.unwrap(), "ENTRY 10.0.0.1 58000\n");
}

#[tokio::test]
async fn empty_candidate_list_founds_a_new_network() {
    let server = spawn_registry_stub("NODESLIST 001\n".to_string()).await;
    let registry = RegistryClient::new("127.0.0.1", server.port(), Duration::from_secs(2))
        .await
        .unwrap();

    let outcome = assisted_join(&registry, &me(), "001", timeouts())
        .await
        .unwrap();
    // Same end state as a direct join against the founding sentinel.
    assert!(outcome.founded);
    assert_eq!(outcome.external, me());
    assert_eq!(outcome.safeguard, Some(me()));
}

#[tokio::test]
async fn silent_registry_fails_the_join_instead_of_founding() {
    // A server that never answers.
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server = socket.local_addr().unwrap();
    let _hold = socket;

    let registry = RegistryClient::new("127.0.0.1", server.port(), Duration::from_millis(200))
        .await
        .unwrap();

    let err = assisted_join(&registry, &me(), "001", timeouts())
        .await
        .unwrap_err();
    match err {
        JoinError::RegistryUnreachable(RegistryError::Timeout) => {}
        other => panic!("expected registry timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn interleaved_confirmation_does_not_eat_the_nodeslist() {
    // A stale OKREG arrives before the NODESLIST on the shared socket; the
    // peer-list wait must skip past it.
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        let (_len, from) = socket.recv_from(&mut buf).await.unwrap();
        socket.send_to(b"OKREG 001", from).await.unwrap();
        socket
            .send_to(b"NODESLIST 001\n", from)
            .await
            .unwrap();
    });

    let registry = RegistryClient::new("127.0.0.1", addr.port(), Duration::from_secs(2))
        .await
        .unwrap();
    let outcome = assisted_join(&registry, &me(), "001", timeouts())
        .await
        .unwrap();
    assert!(outcome.founded);
}
