//! Undirected "combinable" links between resources. Each edge is stored
//! once in canonical `(min, max)` form; the adjacency index is kept
//! consistent with the edge set on every edit.

use std::collections::{BTreeSet, HashMap, VecDeque};

use ulid::Ulid;

use crate::engine::EngineError;

#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    edges: BTreeSet<(Ulid, Ulid)>,
    adjacency: HashMap<Ulid, BTreeSet<Ulid>>,
}

fn canonical(u: Ulid, v: Ulid) -> (Ulid, Ulid) {
    if u < v { (u, v) } else { (v, u) }
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `u` and `v` combinable. Returns false when the edge already
    /// existed. Self-loops are rejected.
    pub fn link(&mut self, u: Ulid, v: Ulid) -> Result<bool, EngineError> {
        if u == v {
            return Err(EngineError::InvalidRequest(
                "a resource cannot be linked to itself",
            ));
        }
        if !self.edges.insert(canonical(u, v)) {
            return Ok(false);
        }
        self.adjacency.entry(u).or_default().insert(v);
        self.adjacency.entry(v).or_default().insert(u);
        Ok(true)
    }

    /// Remove the edge; returns false when it did not exist.
    pub fn unlink(&mut self, u: Ulid, v: Ulid) -> bool {
        if !self.edges.remove(&canonical(u, v)) {
            return false;
        }
        if let Some(n) = self.adjacency.get_mut(&u) {
            n.remove(&v);
        }
        if let Some(n) = self.adjacency.get_mut(&v) {
            n.remove(&u);
        }
        true
    }

    /// Drop a resource and every edge touching it.
    pub fn remove_node(&mut self, r: Ulid) {
        if let Some(neighbors) = self.adjacency.remove(&r) {
            for n in neighbors {
                self.edges.remove(&canonical(r, n));
                if let Some(back) = self.adjacency.get_mut(&n) {
                    back.remove(&r);
                }
            }
        }
    }

    pub fn is_linked(&self, u: Ulid, v: Ulid) -> bool {
        self.edges.contains(&canonical(u, v))
    }

    pub fn neighbors(&self, r: Ulid) -> impl Iterator<Item = Ulid> + '_ {
        self.adjacency.get(&r).into_iter().flatten().copied()
    }

    pub fn degree(&self, r: Ulid) -> usize {
        self.adjacency.get(&r).map_or(0, |n| n.len())
    }

    /// `{r} ∪ neighbors(r)`.
    pub fn closed_neighborhood(&self, r: Ulid) -> BTreeSet<Ulid> {
        let mut set: BTreeSet<Ulid> = self.neighbors(r).collect();
        set.insert(r);
        set
    }

    /// Every resource reachable from `r` over combinability edges.
    pub fn connected_component(&self, r: Ulid) -> BTreeSet<Ulid> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();
        seen.insert(r);
        queue.push_back(r);
        while let Some(cur) = queue.pop_front() {
            for n in self.neighbors(cur) {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
