mod capacity;
mod error;
mod selection;
mod slots;
mod store;
#[cfg(test)]
mod tests;

pub use capacity::{CapacityReport, Snapshot, remaining_self};
pub use error::EngineError;
pub use selection::{Selection, SelectionKind, select};
pub use slots::SlotGenerator;
pub use store::{BookingStore, SharedBook};

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

use crate::calendar::{CalendarModel, WorkingHoursSpec};
use crate::config::{EngineConfig, ScheduleConfig};
use crate::graph::ResourceGraph;
use crate::limits::*;
use crate::model::{
    BookingInfo, BookingLine, GetSlotsRequest, LineInfo, Ms, ReserveRequest, Resource,
    ResourceBook, Slot, SlotTemplate, Span,
};
use crate::observability;

pub(crate) fn now_ms() -> Ms {
    SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as Ms
}

/// Deadlines are absolute Unix-ms instants, checked at suspension points.
pub(crate) fn check_deadline(deadline: Option<Ms>) -> Result<(), EngineError> {
    if let Some(d) = deadline
        && now_ms() > d
    {
        return Err(EngineError::Timeout);
    }
    Ok(())
}

pub(crate) fn validate_span(span: &Span) -> Result<(), EngineError> {
    if span.start >= span.end {
        return Err(EngineError::InvalidWindow(*span));
    }
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    if span.duration_ms() > MAX_SPAN_DURATION_MS {
        return Err(EngineError::LimitExceeded("span too wide"));
    }
    Ok(())
}

/// The booking service: slot enumeration, reservation, cancellation, and
/// the administrative surface for resources, links, calendars, and
/// templates. Reads take immutable snapshots; writes serialize through the
/// store's per-resource locks.
pub struct Engine {
    store: BookingStore,
    graph: RwLock<ResourceGraph>,
    calendar: RwLock<CalendarModel>,
    templates: RwLock<Vec<SlotTemplate>>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: BookingStore::new(),
            graph: RwLock::new(ResourceGraph::new()),
            calendar: RwLock::new(CalendarModel::new(
                chrono_tz::Tz::UTC,
                WorkingHoursSpec::default(),
            )),
            templates: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Apply a declarative schedule: calendar, resources, links, templates.
    pub async fn bootstrap(&self, schedule: &ScheduleConfig) -> Result<(), EngineError> {
        let tz: chrono_tz::Tz = schedule
            .tz
            .parse()
            .map_err(|_| EngineError::InvalidRequest("unknown timezone"))?;
        self.set_working_hours(tz, schedule.working_hours.clone())
            .await?;
        for resource in &schedule.resources {
            self.create_resource(*resource).await?;
        }
        for &(u, v) in &schedule.links {
            self.link_resources(u, v).await?;
        }
        self.set_templates(schedule.templates.clone()).await?;
        info!(
            resources = schedule.resources.len(),
            links = schedule.links.len(),
            templates = schedule.templates.len(),
            "schedule bootstrapped"
        );
        Ok(())
    }

    // ── Administrative surface ───────────────────────────────

    pub async fn create_resource(&self, resource: Resource) -> Result<(), EngineError> {
        if resource.capacity == 0 {
            return Err(EngineError::InvalidRequest("capacity must be at least 1"));
        }
        if self.store.resource_count() >= MAX_RESOURCES {
            return Err(EngineError::LimitExceeded("too many resources"));
        }
        if self.store.contains_resource(&resource.id) {
            return Err(EngineError::AlreadyExists(resource.id));
        }
        self.store.insert_resource(
            resource.id,
            Arc::new(RwLock::new(ResourceBook::new(resource))),
        );
        metrics::gauge!(observability::RESOURCES_ACTIVE).increment(1.0);
        debug!(id = %resource.id, capacity = resource.capacity, "resource created");
        Ok(())
    }

    pub async fn update_resource(
        &self,
        id: Ulid,
        capacity: u32,
        sequence: u32,
        shareable: bool,
    ) -> Result<(), EngineError> {
        if capacity == 0 {
            return Err(EngineError::InvalidRequest("capacity must be at least 1"));
        }
        let book = self.store.get(&id).ok_or(EngineError::UnknownResource(id))?;
        let mut guard = book.write().await;
        guard.resource.capacity = capacity;
        guard.resource.sequence = sequence;
        guard.resource.shareable = shareable;
        Ok(())
    }

    /// Refused while booking lines exist on the resource.
    pub async fn delete_resource(&self, id: Ulid) -> Result<(), EngineError> {
        let book = self.store.get(&id).ok_or(EngineError::UnknownResource(id))?;
        let guard = book.write().await;
        if guard.has_bookings() {
            return Err(EngineError::InvalidRequest("resource has active bookings"));
        }
        self.store.remove_resource(&id);
        self.graph.write().await.remove_node(id);
        self.calendar.write().await.clear_override(&id);
        drop(guard);
        metrics::gauge!(observability::RESOURCES_ACTIVE).decrement(1.0);
        debug!(%id, "resource deleted");
        Ok(())
    }

    pub async fn link_resources(&self, u: Ulid, v: Ulid) -> Result<bool, EngineError> {
        for id in [u, v] {
            if !self.store.contains_resource(&id) {
                return Err(EngineError::UnknownResource(id));
            }
        }
        let mut graph = self.graph.write().await;
        if graph.degree(u) >= MAX_LINKS_PER_RESOURCE || graph.degree(v) >= MAX_LINKS_PER_RESOURCE {
            return Err(EngineError::LimitExceeded("too many links on resource"));
        }
        graph.link(u, v)
    }

    pub async fn unlink_resources(&self, u: Ulid, v: Ulid) -> bool {
        self.graph.write().await.unlink(u, v)
    }

    /// Replace the default calendar. Per-resource overrides are kept.
    pub async fn set_working_hours(
        &self,
        tz: chrono_tz::Tz,
        spec: WorkingHoursSpec,
    ) -> Result<(), EngineError> {
        spec.validate()?;
        let mut calendar = self.calendar.write().await;
        calendar.set_tz(tz);
        calendar.set_default(spec);
        Ok(())
    }

    pub async fn set_resource_hours(
        &self,
        id: Ulid,
        spec: WorkingHoursSpec,
    ) -> Result<(), EngineError> {
        if !self.store.contains_resource(&id) {
            return Err(EngineError::UnknownResource(id));
        }
        spec.validate()?;
        self.calendar.write().await.set_override(id, spec);
        Ok(())
    }

    pub async fn set_templates(&self, templates: Vec<SlotTemplate>) -> Result<(), EngineError> {
        if templates.len() > MAX_TEMPLATES {
            return Err(EngineError::LimitExceeded("too many templates"));
        }
        for template in &templates {
            match template {
                SlotTemplate::Weekly { start_min, end_min, duration_min, .. } => {
                    if *duration_min == 0
                        || *start_min >= *end_min
                        || *end_min > MINUTES_PER_DAY
                        || start_min + duration_min > *end_min
                    {
                        return Err(EngineError::InvalidRequest(
                            "weekly template minutes are inconsistent",
                        ));
                    }
                }
                SlotTemplate::OneShot { span, .. } => validate_span(span)?,
            }
        }
        *self.templates.write().await = templates;
        Ok(())
    }

    // ── Read queries ─────────────────────────────────────────

    pub async fn list_resources(&self) -> Vec<Resource> {
        let mut resources = Vec::new();
        for id in self.store.resource_ids() {
            if let Some(book) = self.store.get(&id) {
                resources.push(book.read().await.resource);
            }
        }
        resources.sort_by_key(|r| r.sort_key());
        resources
    }

    pub async fn get_booking(&self, booking_id: Ulid) -> Option<BookingInfo> {
        self.store.get_booking(&booking_id).await
    }

    pub async fn remaining_capacity(&self, id: Ulid, window: &Span) -> Result<u32, EngineError> {
        if window.start >= window.end {
            return Err(EngineError::InvalidWindow(*window));
        }
        let book = self.store.get(&id).ok_or(EngineError::UnknownResource(id))?;
        let guard = book.read().await;
        Ok(remaining_self(&guard, window))
    }

    /// Remaining capacity of a resource together with everything it is
    /// combinable with.
    pub async fn linked_remaining(
        &self,
        id: Ulid,
        window: &Span,
    ) -> Result<CapacityReport, EngineError> {
        if window.start >= window.end {
            return Err(EngineError::InvalidWindow(*window));
        }
        if !self.store.contains_resource(&id) {
            return Err(EngineError::UnknownResource(id));
        }
        let graph = self.graph.read().await.clone();
        let snapshot = self.store.snapshot().await;
        Ok(snapshot.remaining_combined(&graph, id, window))
    }

    pub async fn connected_resources(&self, id: Ulid) -> Result<Vec<Ulid>, EngineError> {
        if !self.store.contains_resource(&id) {
            return Err(EngineError::UnknownResource(id));
        }
        Ok(self
            .graph
            .read()
            .await
            .connected_component(id)
            .into_iter()
            .collect())
    }

    /// Point-in-time copy of the booking store.
    pub async fn snapshot(&self) -> Snapshot {
        self.store.snapshot().await
    }

    // ── Booking service ──────────────────────────────────────

    /// Enumerate bookable slots. Read-only; the result is a point-in-time
    /// snapshot and may be stale by the time the caller reserves — the
    /// commit-time recheck in `reserve` compensates.
    pub async fn get_slots(
        &self,
        req: &GetSlotsRequest,
        deadline: Option<Ms>,
    ) -> Result<Vec<Slot>, EngineError> {
        let started = std::time::Instant::now();
        if req.requested_capacity == 0 {
            return Err(EngineError::InvalidRequest(
                "requested capacity must be at least 1",
            ));
        }
        if req.window.start >= req.window.end {
            return Err(EngineError::InvalidWindow(req.window));
        }
        if req.window.duration_ms() > MAX_QUERY_WINDOW_MS {
            return Err(EngineError::LimitExceeded("query window too wide"));
        }
        check_deadline(deadline)?;

        let calendar = self.calendar.read().await.clone();
        let graph = self.graph.read().await.clone();
        let templates = self.templates.read().await.clone();
        let snapshot = self.store.snapshot().await;
        let tz = req.tz.unwrap_or_else(|| calendar.tz());

        let mut generator = SlotGenerator::new(&snapshot, &graph, &calendar, &templates, tz);
        let slots = generator.generate(&req.window, req.requested_capacity, req.mode, deadline)?;

        metrics::counter!(observability::SLOT_QUERIES_TOTAL).increment(1);
        metrics::histogram!(observability::SLOT_QUERY_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::histogram!(observability::SLOTS_PER_QUERY).record(slots.len() as f64);
        debug!(slots = slots.len(), capacity = req.requested_capacity, "slot query");
        Ok(slots)
    }

    /// Reserve capacity on the given resources. Capacity is rechecked under
    /// the per-resource write locks, so two concurrent reservations cannot
    /// both observe the same free capacity and both commit. All-or-nothing.
    pub async fn reserve(
        &self,
        req: &ReserveRequest,
        deadline: Option<Ms>,
    ) -> Result<BookingInfo, EngineError> {
        validate_span(&req.span)?;
        if req.capacity_reserved == 0 {
            return Err(EngineError::InvalidRequest(
                "capacity_reserved must be at least 1",
            ));
        }
        if req.resource_ids.is_empty() {
            return Err(EngineError::InvalidRequest("no target resources"));
        }
        let mut target_ids = req.resource_ids.clone();
        target_ids.sort();
        target_ids.dedup();
        if target_ids.len() > MAX_RESERVE_TARGETS {
            return Err(EngineError::LimitExceeded("too many reservation targets"));
        }
        for id in &target_ids {
            if !self.store.contains_resource(id) {
                return Err(EngineError::UnknownResource(*id));
            }
        }

        let calendar = self.calendar.read().await.clone();
        let tz = calendar.tz();
        for id in &target_ids {
            if !calendar.covers(Some(*id), &req.span, tz)? {
                let err = EngineError::WindowClosed(req.span);
                self.count_reservation(err.kind());
                return Err(err);
            }
        }
        check_deadline(deadline)?;

        // Write locks in sorted id order — the linearization point.
        let mut guards = Vec::with_capacity(target_ids.len());
        for id in &target_ids {
            let book = self
                .store
                .get(id)
                .ok_or(EngineError::ConcurrentModification(*id))?;
            guards.push(book.write_owned().await);
        }
        // Nothing is applied yet, so a late deadline still has no effects.
        check_deadline(deadline)?;

        // Recheck and allocate greedily in (sequence, id) order.
        let mut order: Vec<usize> = (0..guards.len()).collect();
        order.sort_by_key(|&i| guards[i].resource.sort_key());

        let mut need = req.capacity_reserved;
        let mut available = 0u32;
        let mut planned: Vec<(usize, u32, u32)> = Vec::new();
        for &i in &order {
            let rem = remaining_self(&guards[i], &req.span);
            available += rem;
            if need == 0 || rem == 0 {
                continue;
            }
            let take = need.min(rem);
            let resource = guards[i].resource;
            let used = if !self.config.manage_capacity || !resource.shareable {
                resource.capacity
            } else {
                take
            };
            planned.push((i, take, used));
            need -= take;
        }
        if need > 0 {
            let err = EngineError::CapacityExceeded {
                requested: req.capacity_reserved,
                available,
            };
            self.count_reservation(err.kind());
            return Err(err);
        }

        let booking_id = Ulid::new();
        let mut lines = Vec::with_capacity(planned.len());
        let mut line_resources = Vec::with_capacity(planned.len());
        for (i, reserved, used) in planned {
            guards[i].insert_line(BookingLine { booking_id, span: req.span, reserved, used });
            line_resources.push(guards[i].resource.id);
            lines.push(LineInfo { resource_id: guards[i].resource.id, reserved, used });
        }
        self.store.index_booking(booking_id, line_resources);

        self.count_reservation("ok");
        info!(%booking_id, reserved = req.capacity_reserved, lines = lines.len(), "booking confirmed");
        Ok(BookingInfo { id: booking_id, span: req.span, lines })
    }

    /// Idempotent: cancelling an unknown or already-cancelled booking is a
    /// no-op.
    pub async fn cancel(&self, booking_id: Ulid) -> Result<(), EngineError> {
        let removed = self.store.delete_booking(&booking_id).await;
        metrics::counter!(observability::CANCELLATIONS_TOTAL).increment(1);
        if removed {
            info!(%booking_id, "booking cancelled");
        } else {
            debug!(%booking_id, "cancel of unknown booking ignored");
        }
        Ok(())
    }

    fn count_reservation(&self, status: &'static str) {
        metrics::counter!(observability::RESERVATIONS_TOTAL, "status" => status).increment(1);
    }
}
