// The event-loop side of the peer control protocol: how a single inbound
// line mutates the topology and what goes back on the wire.

use overmesh::network::message::PeerMessage;
use overmesh::node::{apply_peer_line, InboundOutcome};
use overmesh::topology::{NodeAddress, Topology, TopologyError};

fn me() -> NodeAddress {
    NodeAddress::new("10.0.0.1", 58000)
}

#[test]
fn accepted_entry_earns_a_safe_reply_carrying_our_external() {
    let mut topo = Topology::new(me(), 10);
    match apply_peer_line(&mut topo, "ENTRY 10.0.0.2 50001\n") {
        InboundOutcome::InternalAdded { peer, safe_reply } => {
            assert_eq!(peer, NodeAddress::new("10.0.0.2", 50001));
            // A founder's external is itself, so the newcomer's safeguard is us.
            assert_eq!(safe_reply, PeerMessage::Safe(me()));
        }
        other => panic!("expected InternalAdded, got {:?}", other),
    }
    assert_eq!(topo.internal(), &[NodeAddress::new("10.0.0.2", 50001)]);
}

#[test]
fn safe_reply_hands_out_a_non_parent_backup_on_deeper_nodes() {
    let mut topo = Topology::new(me(), 10);
    let parent = NodeAddress::new("10.0.0.8", 58008);
    topo.set_external(parent.clone());

    match apply_peer_line(&mut topo, "ENTRY 10.0.0.2 50001\n") {
        InboundOutcome::InternalAdded { safe_reply, .. } => {
            assert_eq!(safe_reply, PeerMessage::Safe(parent));
        }
        other => panic!("expected InternalAdded, got {:?}", other),
    }
}

#[test]
fn entry_past_capacity_is_rejected_without_truncation() {
    let mut topo = Topology::new(me(), 10);
    for i in 0..10u16 {
        let line = format!("ENTRY 10.0.1.1 {}\n", 50000 + i);
        assert!(matches!(
            apply_peer_line(&mut topo, &line),
            InboundOutcome::InternalAdded { .. }
        ));
    }

    match apply_peer_line(&mut topo, "ENTRY 10.0.1.1 50010\n") {
        InboundOutcome::InternalRejected { error, .. } => {
            assert_eq!(error, TopologyError::InternalFull { capacity: 10 });
        }
        other => panic!("expected InternalRejected, got {:?}", other),
    }
    assert_eq!(topo.internal().len(), 10);
    assert_eq!(topo.internal()[0], NodeAddress::new("10.0.1.1", 50000));
}

#[test]
fn repeated_entry_from_the_same_peer_is_rejected() {
    let mut topo = Topology::new(me(), 10);
    assert!(matches!(
        apply_peer_line(&mut topo, "ENTRY 10.0.0.2 50001\n"),
        InboundOutcome::InternalAdded { .. }
    ));
    match apply_peer_line(&mut topo, "ENTRY 10.0.0.2 50001\n") {
        InboundOutcome::InternalRejected { error, .. } => {
            assert!(matches!(error, TopologyError::DuplicateInternal(_)));
        }
        other => panic!("expected InternalRejected, got {:?}", other),
    }
    assert_eq!(topo.internal().len(), 1);
}

#[test]
fn safe_line_overwrites_the_safeguard() {
    let mut topo = Topology::new(me(), 10);
    match apply_peer_line(&mut topo, "SAFE 10.0.0.9 4242\n") {
        InboundOutcome::SafeguardUpdated(addr) => {
            assert_eq!(addr, NodeAddress::new("10.0.0.9", 4242));
        }
        other => panic!("expected SafeguardUpdated, got {:?}", other),
    }
    assert_eq!(topo.safeguard(), &NodeAddress::new("10.0.0.9", 4242));
}

#[test]
fn malformed_line_mutates_nothing() {
    let mut topo = Topology::new(me(), 10);
    topo.set_external(NodeAddress::new("10.0.0.8", 58008));
    topo.set_safeguard(NodeAddress::new("10.0.0.9", 58009));
    apply_peer_line(&mut topo, "ENTRY 10.0.0.2 50001\n");
    let before = topo.snapshot();

    for line in ["GREETINGS 1.2.3.4 5", "ENTRY 10.0.0.3", "ENTRY a b c d", ""] {
        assert!(
            matches!(
                apply_peer_line(&mut topo, line),
                InboundOutcome::Malformed(_)
            ),
            "line {:?} should be malformed",
            line
        );
    }

    let after = topo.snapshot();
    assert_eq!(after.external, before.external);
    assert_eq!(after.safeguard, before.safeguard);
    assert_eq!(after.internal, before.internal);
}
