//! Reference cable graph answered with a fresh BFS on every query

use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Adjacency list of who is plugged in and which cables exist
#[derive(Debug, Default, Clone)]
pub struct CableOracle {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl CableOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plug(&mut self, name: &str) {
        self.adjacency.entry(name.to_string()).or_default();
    }

    /// Unplugging drops every cable on the node
    pub fn unplug(&mut self, name: &str) {
        let Some(neighbours) = self.adjacency.remove(name) else {
            return;
        };
        for other in neighbours {
            if let Some(adjacent) = self.adjacency.get_mut(&other) {
                adjacent.remove(name);
            }
        }
    }

    pub fn is_plugged(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    pub fn cable(&mut self, a: &str, b: &str) {
        if a == b || !self.is_plugged(a) || !self.is_plugged(b) {
            return;
        }
        if let Some(adjacent) = self.adjacency.get_mut(a) {
            adjacent.insert(b.to_string());
        }
        if let Some(adjacent) = self.adjacency.get_mut(b) {
            adjacent.insert(a.to_string());
        }
    }

    pub fn cut(&mut self, a: &str, b: &str) {
        if let Some(adjacent) = self.adjacency.get_mut(a) {
            adjacent.remove(b);
        }
        if let Some(adjacent) = self.adjacency.get_mut(b) {
            adjacent.remove(a);
        }
    }

    /// Everyone `from` can reach, excluding itself
    pub fn reachable(&self, from: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        if !self.is_plugged(from) {
            return seen;
        }
        seen.insert(from.to_string());
        let mut queue = VecDeque::from([from.to_string()]);
        while let Some(node) = queue.pop_front() {
            for next in self.adjacency.get(&node).into_iter().flatten() {
                if seen.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }
        seen.remove(from);
        seen
    }

    pub fn cable_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}
