//! Incremental connected components over an undirected graph
//!
//! [`ComponentGraph`] keeps a partition of its nodes into connected
//! components while edges come and go.
//!
//! - Adding an edge between two components merges the smaller one into the
//!   larger one, so a merge costs at most the size of the smaller side.
//! - Removing an edge (or a node with more than one neighbour) may or may
//!   not split its component. The component is marked dirty and re-walked
//!   on the next query, restricted to its own node set. Several removals
//!   in the same component between queries cost a single walk.
//!
//! A dirty component is always a superset of the true components it
//! covers, so two nodes with different component ids are never connected.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use tracing::trace;

/// Identifier of a connected component
///
/// Ids are stable across merges for the surviving (larger) side and across
/// splits for the largest part. Nothing else about them is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u64);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Undirected graph with incrementally maintained components
#[derive(Debug, Clone)]
pub struct ComponentGraph<K> {
    adjacency: HashMap<K, HashSet<K>>,
    membership: HashMap<K, ComponentId>,
    components: HashMap<ComponentId, HashSet<K>>,
    /// Components that lost an edge since they were last walked
    dirty: HashSet<ComponentId>,
    next_id: u64,
    edges: usize,
}

impl<K> Default for ComponentGraph<K> {
    fn default() -> Self {
        Self {
            adjacency: HashMap::new(),
            membership: HashMap::new(),
            components: HashMap::new(),
            dirty: HashSet::new(),
            next_id: 0,
            edges: 0,
        }
    }
}

impl<K: Copy + Eq + Hash + Debug> ComponentGraph<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an isolated node in its own component
    pub fn insert_node(&mut self, node: K) -> bool {
        if self.adjacency.contains_key(&node) {
            return false;
        }
        let id = self.fresh_id();
        self.adjacency.insert(node, HashSet::new());
        self.membership.insert(node, id);
        self.components.insert(id, HashSet::from([node]));
        true
    }

    /// Remove a node together with all of its edges
    pub fn remove_node(&mut self, node: K) -> bool {
        let Some(neighbours) = self.adjacency.remove(&node) else {
            return false;
        };
        for neighbour in &neighbours {
            if let Some(adjacent) = self.adjacency.get_mut(neighbour) {
                adjacent.remove(&node);
            }
        }
        self.edges -= neighbours.len();

        if let Some(id) = self.membership.remove(&node) {
            let emptied = match self.components.get_mut(&id) {
                Some(members) => {
                    members.remove(&node);
                    members.is_empty()
                }
                None => true,
            };
            if emptied {
                self.components.remove(&id);
                self.dirty.remove(&id);
            } else if neighbours.len() > 1 {
                // A leaf can leave without splitting anything
                self.dirty.insert(id);
            }
        }
        true
    }

    pub fn contains(&self, node: K) -> bool {
        self.adjacency.contains_key(&node)
    }

    /// Add an edge. Self-loops, duplicates and unknown nodes are ignored.
    pub fn connect(&mut self, a: K, b: K) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        let added = match self.adjacency.get_mut(&a) {
            Some(adjacent) => adjacent.insert(b),
            None => false,
        };
        if !added {
            return false;
        }
        if let Some(adjacent) = self.adjacency.get_mut(&b) {
            adjacent.insert(a);
        }
        self.edges += 1;

        if let (Some(&ca), Some(&cb)) = (self.membership.get(&a), self.membership.get(&b)) {
            if ca != cb {
                self.merge(ca, cb);
            }
        }
        true
    }

    /// Remove an edge. Missing edges are ignored.
    pub fn disconnect(&mut self, a: K, b: K) -> bool {
        let removed = match self.adjacency.get_mut(&a) {
            Some(adjacent) => adjacent.remove(&b),
            None => false,
        };
        if !removed {
            return false;
        }
        if let Some(adjacent) = self.adjacency.get_mut(&b) {
            adjacent.remove(&a);
        }
        self.edges -= 1;

        if let Some(&id) = self.membership.get(&a) {
            self.dirty.insert(id);
        }
        true
    }

    pub fn has_edge(&self, a: K, b: K) -> bool {
        self.adjacency
            .get(&a)
            .map(|adjacent| adjacent.contains(&b))
            .unwrap_or(false)
    }

    /// Direct neighbours of a node
    pub fn neighbours(&self, node: K) -> Vec<K> {
        self.adjacency
            .get(&node)
            .map(|adjacent| adjacent.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Whether some component is waiting to be re-walked
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Re-partition every dirty component. Returns how many were walked.
    pub fn settle(&mut self) -> usize {
        let dirty: Vec<ComponentId> = self.dirty.drain().collect();
        for &id in &dirty {
            self.split(id);
        }
        dirty.len()
    }

    /// Component a node currently belongs to
    pub fn component_of(&mut self, node: K) -> Option<ComponentId> {
        self.settle();
        self.membership.get(&node).copied()
    }

    /// Every node in the same component as `node`, including `node`
    pub fn members(&mut self, node: K) -> Vec<K> {
        match self.component_of(node) {
            Some(id) => self
                .components
                .get(&id)
                .map(|members| members.iter().copied().collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    pub fn are_connected(&mut self, a: K, b: K) -> bool {
        match (self.component_of(a), self.component_of(b)) {
            (Some(ca), Some(cb)) => ca == cb,
            _ => false,
        }
    }

    pub fn component_count(&mut self) -> usize {
        self.settle();
        self.components.len()
    }

    fn fresh_id(&mut self) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Union by size: relabel the smaller component into the larger one
    fn merge(&mut self, a: ComponentId, b: ComponentId) {
        let size = |id: &ComponentId| self.components.get(id).map(HashSet::len).unwrap_or(0);
        let (keep, absorb) = if size(&a) >= size(&b) { (a, b) } else { (b, a) };

        let Some(absorbed) = self.components.remove(&absorb) else {
            return;
        };
        for node in &absorbed {
            self.membership.insert(*node, keep);
        }
        if let Some(members) = self.components.get_mut(&keep) {
            members.extend(absorbed);
        }
        // The merged set is only as trustworthy as its least settled half
        if self.dirty.remove(&absorb) {
            self.dirty.insert(keep);
        }
        trace!(keep = %keep, absorbed = %absorb, "Merged components");
    }

    /// Flood-fill a component's node set and rebuild its parts
    fn split(&mut self, id: ComponentId) {
        let Some(mut unvisited) = self.components.remove(&id) else {
            return;
        };

        let mut parts: Vec<HashSet<K>> = Vec::new();
        while let Some(&start) = unvisited.iter().next() {
            unvisited.remove(&start);
            let mut part = HashSet::from([start]);
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                let Some(adjacent) = self.adjacency.get(&node) else {
                    continue;
                };
                for &next in adjacent {
                    if unvisited.remove(&next) {
                        part.insert(next);
                        queue.push_back(next);
                    }
                }
            }
            parts.push(part);
        }

        parts.sort_by_key(|part| Reverse(part.len()));
        let created = parts.len().saturating_sub(1);
        let mut parts = parts.into_iter();

        // The largest part keeps the old id; its nodes are already labelled
        if let Some(largest) = parts.next() {
            self.components.insert(id, largest);
        }
        for part in parts {
            let fresh = self.fresh_id();
            for node in &part {
                self.membership.insert(*node, fresh);
            }
            self.components.insert(fresh, part);
        }

        trace!(component = %id, created, "Re-walked component");
    }
}
