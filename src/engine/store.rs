use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::{BookingInfo, BookingLine, LineInfo, ResourceBook, Span};

use super::capacity::Snapshot;

pub type SharedBook = Arc<RwLock<ResourceBook>>;

/// Owner of all bookings. Per-resource books behind their own locks plus a
/// booking → resources reverse index; writers take multi-resource locks in
/// sorted id order.
pub struct BookingStore {
    books: DashMap<Ulid, SharedBook>,
    booking_index: DashMap<Ulid, Vec<Ulid>>,
}

impl Default for BookingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingStore {
    pub fn new() -> Self {
        Self { books: DashMap::new(), booking_index: DashMap::new() }
    }

    // ── Resource catalog ─────────────────────────────────────

    pub fn resource_count(&self) -> usize {
        self.books.len()
    }

    pub fn contains_resource(&self, id: &Ulid) -> bool {
        self.books.contains_key(id)
    }

    pub fn get(&self, id: &Ulid) -> Option<SharedBook> {
        self.books.get(id).map(|e| e.value().clone())
    }

    pub fn insert_resource(&self, id: Ulid, book: SharedBook) {
        self.books.insert(id, book);
    }

    pub fn remove_resource(&self, id: &Ulid) -> Option<(Ulid, SharedBook)> {
        self.books.remove(id)
    }

    pub fn resource_ids(&self) -> Vec<Ulid> {
        self.books.iter().map(|e| *e.key()).collect()
    }

    // ── Booking index ────────────────────────────────────────

    pub fn index_booking(&self, booking_id: Ulid, resource_ids: Vec<Ulid>) {
        self.booking_index.insert(booking_id, resource_ids);
    }

    pub fn booking_resources(&self, booking_id: &Ulid) -> Option<Vec<Ulid>> {
        self.booking_index.get(booking_id).map(|e| e.value().clone())
    }

    // ── Queries ──────────────────────────────────────────────

    /// All booking lines on `resource_id` overlapping `window`.
    pub async fn reservations(&self, resource_id: &Ulid, window: &Span) -> Vec<BookingLine> {
        let Some(book) = self.get(resource_id) else {
            return Vec::new();
        };
        let guard = book.read().await;
        guard.overlapping(window).copied().collect()
    }

    /// Materialize a booking from its distributed lines.
    pub async fn get_booking(&self, booking_id: &Ulid) -> Option<BookingInfo> {
        let resource_ids = self.booking_resources(booking_id)?;
        let mut span: Option<Span> = None;
        let mut lines = Vec::new();
        for rid in resource_ids {
            let Some(book) = self.get(&rid) else { continue };
            let guard = book.read().await;
            for line in guard.lines.iter().filter(|l| l.booking_id == *booking_id) {
                span = Some(line.span);
                lines.push(LineInfo {
                    resource_id: rid,
                    reserved: line.reserved,
                    used: line.used,
                });
            }
        }
        span.map(|span| BookingInfo { id: *booking_id, span, lines })
    }

    /// Point-in-time copy of every book, taken under read locks.
    pub async fn snapshot(&self) -> Snapshot {
        let ids = self.resource_ids();
        let mut books = HashMap::with_capacity(ids.len());
        for id in ids {
            // A resource deleted mid-iteration just drops out of the copy.
            if let Some(book) = self.get(&id) {
                let guard = book.read().await;
                books.insert(id, guard.clone());
            }
        }
        Snapshot::new(books)
    }

    // ── Mutations ────────────────────────────────────────────

    /// Remove a booking everywhere. Idempotent: unknown ids and repeated
    /// deletes are no-ops. Returns true when lines were actually removed.
    pub async fn delete_booking(&self, booking_id: &Ulid) -> bool {
        let Some((_, mut resource_ids)) = self.booking_index.remove(booking_id) else {
            return false;
        };
        resource_ids.sort();
        resource_ids.dedup();
        let mut removed = 0;
        for rid in resource_ids {
            if let Some(book) = self.get(&rid) {
                let mut guard = book.write().await;
                removed += guard.remove_booking(*booking_id);
            }
        }
        removed > 0
    }
}
