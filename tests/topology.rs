use overmesh::topology::{NodeAddress, Topology, TopologyError};

fn me() -> NodeAddress {
    NodeAddress::new("10.0.0.1", 58000)
}

#[test]
fn new_node_is_a_network_of_one() {
    let topo = Topology::new(me(), 10);
    assert_eq!(topo.external(), &me());
    assert_eq!(topo.safeguard(), &me());
    assert!(topo.internal().is_empty());
}

#[test]
fn founding_is_idempotent_regardless_of_prior_state() {
    let mut topo = Topology::new(me(), 10);
    topo.set_external(NodeAddress::new("10.0.0.2", 58001));
    topo.set_safeguard(NodeAddress::new("10.0.0.3", 58002));
    topo.add_internal(NodeAddress::new("10.0.0.4", 58003)).unwrap();

    topo.found_network();
    assert_eq!(topo.external(), &me());
    assert_eq!(topo.safeguard(), &me());

    // Founding again changes nothing further.
    topo.found_network();
    assert_eq!(topo.external(), &me());
    assert_eq!(topo.safeguard(), &me());
}

#[test]
fn internal_capacity_is_enforced_without_truncation() {
    let mut topo = Topology::new(me(), 10);
    for i in 0..10u16 {
        topo.add_internal(NodeAddress::new("10.0.1.1", 50000 + i))
            .unwrap();
    }
    assert_eq!(topo.internal().len(), 10);

    let overflow = NodeAddress::new("10.0.1.1", 50010);
    let err = topo.add_internal(overflow).unwrap_err();
    assert_eq!(err, TopologyError::InternalFull { capacity: 10 });

    // The eleventh was rejected; the first ten are intact and in order.
    assert_eq!(topo.internal().len(), 10);
    assert_eq!(topo.internal()[0], NodeAddress::new("10.0.1.1", 50000));
    assert_eq!(topo.internal()[9], NodeAddress::new("10.0.1.1", 50009));
}

#[test]
fn duplicate_internal_neighbor_is_rejected() {
    let mut topo = Topology::new(me(), 10);
    let peer = NodeAddress::new("10.0.1.2", 50001);
    topo.add_internal(peer.clone()).unwrap();

    let err = topo.add_internal(peer.clone()).unwrap_err();
    assert_eq!(err, TopologyError::DuplicateInternal(peer));
    assert_eq!(topo.internal().len(), 1);
}

#[test]
fn safeguard_overwrite_replaces_the_whole_address() {
    let mut topo = Topology::new(me(), 10);
    topo.set_safeguard(NodeAddress::new("10.0.0.5", 7000));
    topo.set_safeguard(NodeAddress::new("10.0.0.6", 7001));
    // No partial host/port mix is possible.
    assert_eq!(topo.safeguard(), &NodeAddress::new("10.0.0.6", 7001));
}

#[test]
fn snapshot_renders_all_relations() {
    let mut topo = Topology::new(me(), 10);
    topo.add_internal(NodeAddress::new("10.0.1.3", 50002)).unwrap();
    topo.add_internal(NodeAddress::new("10.0.1.4", 50003)).unwrap();

    let rendered = topo.snapshot().render();
    assert!(rendered.contains("External Neighbor: 10.0.0.1:58000"));
    assert!(rendered.contains("Safeguard Neighbor: 10.0.0.1:58000"));
    assert!(rendered.contains("Internal Neighbors (2):"));
    assert!(rendered.contains("10.0.1.3:50002"));
    assert!(rendered.contains("10.0.1.4:50003"));
}
