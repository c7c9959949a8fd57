//! Remaining-capacity computation over immutable snapshots. The engine
//! clones every `ResourceBook` under read locks at the start of a slot
//! query; everything below is pure.

use std::collections::HashMap;

use ulid::Ulid;

use crate::graph::ResourceGraph;
use crate::model::{ResourceBook, Span};

/// Point-in-time copy of the booking store, keyed by resource id.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    books: HashMap<Ulid, ResourceBook>,
}

impl Snapshot {
    pub fn new(books: HashMap<Ulid, ResourceBook>) -> Self {
        Self { books }
    }

    pub fn get(&self, id: &Ulid) -> Option<&ResourceBook> {
        self.books.get(id)
    }

    pub fn contains(&self, id: &Ulid) -> bool {
        self.books.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn books(&self) -> impl Iterator<Item = &ResourceBook> {
        self.books.values()
    }

    /// All resource ids sorted by `(sequence asc, id asc)` — the iteration
    /// order every selection pass uses.
    pub fn ids_by_sequence(&self) -> Vec<Ulid> {
        let mut ids: Vec<Ulid> = self.books.keys().copied().collect();
        ids.sort_by_key(|id| self.books[id].resource.sort_key());
        ids
    }

    pub fn remaining_self(&self, id: &Ulid, window: &Span) -> u32 {
        self.get(id).map_or(0, |book| remaining_self(book, window))
    }

    /// Remaining capacity aggregated over the closed neighborhood of `r`.
    pub fn remaining_combined(
        &self,
        graph: &ResourceGraph,
        r: Ulid,
        window: &Span,
    ) -> CapacityReport {
        let mut per_resource = HashMap::new();
        let mut total_remaining = 0u32;
        for id in graph.closed_neighborhood(r) {
            let rem = self.remaining_self(&id, window);
            total_remaining += rem;
            per_resource.insert(id, rem);
        }
        CapacityReport { total_remaining, per_resource }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityReport {
    pub total_remaining: u32,
    pub per_resource: HashMap<Ulid, u32>,
}

/// Units `book` still has free in `window`.
///
/// A non-shareable resource with any overlapping line is fully consumed.
/// Otherwise the `used` weight of every overlapping line is subtracted
/// from the capacity, saturating at zero.
pub fn remaining_self(book: &ResourceBook, window: &Span) -> u32 {
    let capacity = book.resource.capacity;
    if !book.resource.shareable {
        if book.overlapping(window).next().is_some() {
            return 0;
        }
        return capacity;
    }
    let used: u32 = book.overlapping(window).map(|l| l.used).sum();
    capacity.saturating_sub(used)
}
