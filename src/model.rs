use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Intersection with `bounds`, or None when the overlap is empty.
    pub fn clamp_to(&self, bounds: &Span) -> Option<Span> {
        let start = self.start.max(bounds.start);
        let end = self.end.min(bounds.end);
        if start < end { Some(Span::new(start, end)) } else { None }
    }
}

/// A bookable unit. Configuration owned by the administrator; immutable
/// while a slot enumeration is running (enumeration works on snapshots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Ulid,
    /// Simultaneous reservation units this resource can hold (>= 1).
    pub capacity: u32,
    /// Tie-break order, smaller wins.
    pub sequence: u32,
    /// If true, concurrent bookings may share the capacity; if false, any
    /// booking consumes the full capacity for its window.
    pub shareable: bool,
}

impl Resource {
    pub fn sort_key(&self) -> (u32, Ulid) {
        (self.sequence, self.id)
    }
}

/// One resource's share of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingLine {
    pub booking_id: Ulid,
    pub span: Span,
    /// Units claimed on behalf of the demand.
    pub reserved: u32,
    /// Units removed from availability (equals `reserved` for shareable
    /// resources under managed capacity, the full capacity otherwise).
    pub used: u32,
}

/// A resource plus its booking lines, sorted by `span.start`.
/// This is the unit of locking in the booking store.
#[derive(Debug, Clone)]
pub struct ResourceBook {
    pub resource: Resource,
    pub lines: Vec<BookingLine>,
}

impl ResourceBook {
    pub fn new(resource: Resource) -> Self {
        Self { resource, lines: Vec::new() }
    }

    /// Insert a line maintaining sort order by span.start.
    pub fn insert_line(&mut self, line: BookingLine) {
        let pos = self
            .lines
            .binary_search_by_key(&line.span.start, |l| l.span.start)
            .unwrap_or_else(|e| e);
        self.lines.insert(pos, line);
    }

    /// Remove every line belonging to `booking_id`. Returns how many were removed.
    pub fn remove_booking(&mut self, booking_id: Ulid) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| l.booking_id != booking_id);
        before - self.lines.len()
    }

    /// Return only lines whose span overlaps the query window.
    /// Uses binary search to skip lines starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &BookingLine> {
        let right_bound = self.lines.partition_point(|l| l.span.start < query.end);
        self.lines[..right_bound]
            .iter()
            .filter(move |l| l.span.end > query.start)
    }

    pub fn has_bookings(&self) -> bool {
        !self.lines.is_empty()
    }
}

// ── Request / response types ─────────────────────────────────────

/// Whether the engine picks one resource per slot or lists all viable ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignMode {
    AutoAssign,
    TimeResource,
}

/// A candidate-start template for slot generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotTemplate {
    /// Weekly recurrence: starts at `start_min`, stepped by `duration_min`,
    /// while the slot still ends at or before `end_min`. Minutes are from
    /// local midnight in the expansion timezone.
    Weekly {
        weekday: chrono::Weekday,
        start_min: u32,
        end_min: u32,
        duration_min: u32,
        #[serde(default)]
        restrict_to: Vec<Ulid>,
    },
    /// A concrete one-shot window.
    OneShot {
        span: Span,
        #[serde(default)]
        restrict_to: Vec<Ulid>,
    },
}

impl SlotTemplate {
    pub fn restrict_to(&self) -> &[Ulid] {
        match self {
            SlotTemplate::Weekly { restrict_to, .. } => restrict_to,
            SlotTemplate::OneShot { restrict_to, .. } => restrict_to,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSlotsRequest {
    pub requested_capacity: u32,
    pub window: Span,
    /// Timezone the recurrences are expanded in; calendar default when None.
    pub tz: Option<chrono_tz::Tz>,
    pub mode: AssignMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub span: Span,
    pub capacity_reserved: u32,
    pub resource_ids: Vec<Ulid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub booking_id: Ulid,
}

/// One resource offered inside a slot. `capacity` is what the resource has
/// left in the slot's window at enumeration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotResource {
    pub id: Ulid,
    pub sequence: u32,
    pub capacity: u32,
}

/// Transient slot value — never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub span: Span,
    pub resources: Vec<SlotResource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInfo {
    pub resource_id: Ulid,
    pub reserved: u32,
    pub used: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
    pub id: Ulid,
    pub span: Span,
    pub lines: Vec<LineInfo>,
}
