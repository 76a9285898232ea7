//! Stress tests for modemnet-routing
//!
//! These tests verify the correctness of the connectivity engine under long
//! random churn, and that both engines stay consistent under concurrent
//! mutation and transmission.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use modemnet_core::{
    DVec3, DeviceId, Packet, PacketNetwork, PacketReceiver, RecordingReceiver, SenderInfo,
};
use modemnet_routing::{ComponentGraph, WiredNetwork, WirelessNetwork};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Plain adjacency list, answered from scratch with a BFS every time
#[derive(Default)]
struct Oracle {
    adjacency: HashMap<u32, HashSet<u32>>,
}

impl Oracle {
    fn insert(&mut self, n: u32) {
        self.adjacency.entry(n).or_default();
    }

    fn remove(&mut self, n: u32) {
        if let Some(neighbours) = self.adjacency.remove(&n) {
            for m in neighbours {
                if let Some(adj) = self.adjacency.get_mut(&m) {
                    adj.remove(&n);
                }
            }
        }
    }

    fn connect(&mut self, a: u32, b: u32) {
        if a == b || !self.adjacency.contains_key(&a) || !self.adjacency.contains_key(&b) {
            return;
        }
        self.adjacency.get_mut(&a).unwrap().insert(b);
        self.adjacency.get_mut(&b).unwrap().insert(a);
    }

    fn disconnect(&mut self, a: u32, b: u32) {
        if let Some(adj) = self.adjacency.get_mut(&a) {
            adj.remove(&b);
        }
        if let Some(adj) = self.adjacency.get_mut(&b) {
            adj.remove(&a);
        }
    }

    fn reachable(&self, from: u32) -> HashSet<u32> {
        let mut seen = HashSet::new();
        if !self.adjacency.contains_key(&from) {
            return seen;
        }
        seen.insert(from);
        let mut queue = VecDeque::from([from]);
        while let Some(n) = queue.pop_front() {
            for &m in &self.adjacency[&n] {
                if seen.insert(m) {
                    queue.push_back(m);
                }
            }
        }
        seen
    }

    fn component_count(&self) -> usize {
        let mut seen = HashSet::new();
        let mut count = 0;
        for &n in self.adjacency.keys() {
            if !seen.contains(&n) {
                count += 1;
                seen.extend(self.reachable(n));
            }
        }
        count
    }
}

#[test]
fn test_component_graph_matches_oracle_under_churn() {
    const NODES: u32 = 40;
    const STEPS: usize = 5_000;

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut graph = ComponentGraph::new();
    let mut oracle = Oracle::default();

    for n in 0..NODES / 2 {
        graph.insert_node(n);
        oracle.insert(n);
    }

    for step in 0..STEPS {
        let a = rng.random_range(0..NODES);
        let b = rng.random_range(0..NODES);
        match rng.random_range(0..10) {
            0 => {
                graph.insert_node(a);
                oracle.insert(a);
            }
            1 => {
                graph.remove_node(a);
                oracle.remove(a);
            }
            2..=5 => {
                graph.connect(a, b);
                oracle.connect(a, b);
            }
            _ => {
                graph.disconnect(a, b);
                oracle.disconnect(a, b);
            }
        }

        // Check only now and then so several cuts pile up between settles
        if step % 7 == 0 {
            let expected = oracle.reachable(a);
            let actual: HashSet<u32> = graph.members(a).into_iter().collect();
            assert_eq!(actual, expected, "step {}: component of {}", step, a);
            assert_eq!(
                graph.component_count(),
                oracle.component_count(),
                "step {}: component count",
                step
            );
        }
    }
}

#[test]
fn test_large_line_split_throughput() {
    const LENGTH: u32 = 20_000;

    let mut graph = ComponentGraph::new();
    for n in 0..LENGTH {
        graph.insert_node(n);
    }
    let start = Instant::now();
    for n in 1..LENGTH {
        graph.connect(n - 1, n);
    }
    let connect_duration = start.elapsed();
    println!("Connected {} nodes in {:?}", LENGTH, connect_duration);
    assert_eq!(graph.component_count(), 1);

    // Cut the line in the middle, then cut the smaller halves again
    let start = Instant::now();
    graph.disconnect(LENGTH / 2 - 1, LENGTH / 2);
    assert_eq!(graph.component_count(), 2);
    graph.disconnect(LENGTH / 4 - 1, LENGTH / 4);
    assert_eq!(graph.component_count(), 3);
    let split_duration = start.elapsed();
    println!("Split twice in {:?}", split_duration);

    assert!(graph.are_connected(0, LENGTH / 4 - 1));
    assert!(!graph.are_connected(0, LENGTH - 1));

    // Performance assertions (generous bounds)
    assert!(connect_duration < Duration::from_secs(5), "Connect should be fast");
    assert!(split_duration < Duration::from_secs(5), "Split should be fast");
}

#[test]
fn test_wired_concurrent_churn_and_transmit() {
    const DEVICES: u64 = 32;
    const THREADS: u64 = 4;
    const ITERATIONS: usize = 500;

    let network: Arc<WiredNetwork<u64>> = WiredNetwork::shared();
    let receivers: Vec<Arc<RecordingReceiver<u64>>> = (0..DEVICES)
        .map(|i| RecordingReceiver::new(DeviceId::new(i), DVec3::ZERO, "overworld"))
        .collect();
    for r in &receivers {
        network.add_receiver(&r.as_dyn());
    }

    let mut handles = Vec::new();
    for t in 0..THREADS {
        let network = Arc::clone(&network);
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(t);
            for _ in 0..ITERATIONS {
                let a = DeviceId::new(rng.random_range(0..DEVICES));
                let b = DeviceId::new(rng.random_range(0..DEVICES));
                if rng.random_bool(0.5) {
                    network.connect(a, b);
                } else {
                    network.disconnect(a, b);
                }
            }
        }));
    }
    for t in 0..THREADS {
        let network = Arc::clone(&network);
        handles.push(thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(100 + t);
            for i in 0..ITERATIONS {
                let sender = DeviceId::new(rng.random_range(0..DEVICES));
                let packet = Packet::new(
                    SenderInfo::new(sender, DVec3::ZERO, "overworld"),
                    1,
                    1,
                    i as u64,
                    network.id(),
                );
                network.transmit_same_dimension(&packet, 1.0);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    // Nobody ever heard themselves
    for r in &receivers {
        assert_eq!(r.count_from(r.device_id()), 0);
    }

    // Final topology agrees with a from-scratch walk over the cables
    for a in 0..DEVICES {
        for b in 0..DEVICES {
            let (da, db) = (DeviceId::new(a), DeviceId::new(b));
            let mut seen = HashSet::from([da]);
            let mut queue = VecDeque::from([da]);
            while let Some(n) = queue.pop_front() {
                for m in network.neighbours(n) {
                    if seen.insert(m) {
                        queue.push_back(m);
                    }
                }
            }
            assert_eq!(network.are_connected(da, db), seen.contains(&db));
        }
    }

    let stats = network.stats();
    assert_eq!(stats.transmissions, THREADS * ITERATIONS as u64);
    assert_eq!(stats.faults, 0);
}

#[test]
fn test_wireless_concurrent_membership_and_transmit() {
    const DEVICES: u64 = 64;
    const ITERATIONS: usize = 1_000;

    let network: Arc<WirelessNetwork<u64>> = WirelessNetwork::shared();
    let receivers: Arc<Vec<Arc<RecordingReceiver<u64>>>> = Arc::new(
        (0..DEVICES)
            .map(|i| {
                RecordingReceiver::new(DeviceId::new(i), DVec3::new(i as f64, 0.0, 0.0), "overworld")
            })
            .collect(),
    );

    let churn = {
        let network = Arc::clone(&network);
        let receivers = Arc::clone(&receivers);
        thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(7);
            for _ in 0..ITERATIONS {
                let r = &receivers[rng.random_range(0..DEVICES as usize)];
                if rng.random_bool(0.5) {
                    network.add_receiver(&r.as_dyn());
                } else {
                    network.remove_receiver(r.device_id());
                }
            }
        })
    };
    let transmit = {
        let network = Arc::clone(&network);
        thread::spawn(move || {
            for i in 0..ITERATIONS {
                let packet = Packet::new(
                    SenderInfo::new(DeviceId::new(0), DVec3::ZERO, "overworld"),
                    1,
                    1,
                    i as u64,
                    network.id(),
                );
                network.transmit_same_dimension(&packet, DEVICES as f64);
            }
        })
    };
    churn.join().expect("churn panicked");
    transmit.join().expect("transmit panicked");

    // Every payload reached each receiver at most once
    for r in receivers.iter() {
        let payloads: Vec<u64> = r.deliveries().iter().map(|d| *d.packet().payload()).collect();
        let unique: HashSet<u64> = payloads.iter().copied().collect();
        assert_eq!(payloads.len(), unique.len());
    }
    assert_eq!(receivers[0].count(), 0);
}
