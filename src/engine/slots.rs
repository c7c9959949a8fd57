//! Slot enumeration: expand candidate-start templates across the query
//! window, keep the starts that working hours fully cover, and attach the
//! selected resources per assignment mode. Working intervals are memoized
//! per `(resource, window)` for the lifetime of one request.

use std::collections::HashMap;

use chrono_tz::Tz;
use ulid::Ulid;

use crate::calendar::{CalendarModel, day_range, local_instant, subtract_intervals};
use crate::graph::ResourceGraph;
use crate::limits::MAX_SLOTS_PER_QUERY;
use crate::model::{AssignMode, Ms, Slot, SlotResource, SlotTemplate, Span};

use super::capacity::Snapshot;
use super::selection::{Selection, select};
use super::{EngineError, check_deadline};

pub struct SlotGenerator<'a> {
    snapshot: &'a Snapshot,
    graph: &'a ResourceGraph,
    calendar: &'a CalendarModel,
    templates: &'a [SlotTemplate],
    tz: Tz,
    memo: HashMap<(Option<Ulid>, Span), Vec<Span>>,
}

impl<'a> SlotGenerator<'a> {
    pub fn new(
        snapshot: &'a Snapshot,
        graph: &'a ResourceGraph,
        calendar: &'a CalendarModel,
        templates: &'a [SlotTemplate],
        tz: Tz,
    ) -> Self {
        Self { snapshot, graph, calendar, templates, tz, memo: HashMap::new() }
    }

    /// Enumerate slots in `window`, sorted by start. Windows produced by
    /// different templates are evaluated independently — overlapping or
    /// identical spans are all emitted.
    pub fn generate(
        &mut self,
        window: &Span,
        requested: u32,
        mode: AssignMode,
        deadline: Option<Ms>,
    ) -> Result<Vec<Slot>, EngineError> {
        if window.start >= window.end {
            return Err(EngineError::InvalidWindow(*window));
        }
        if requested == 0 {
            return Err(EngineError::InvalidRequest(
                "requested capacity must be at least 1",
            ));
        }

        let mut slots: Vec<Slot> = Vec::new();
        for template in self.templates {
            check_deadline(deadline)?;
            for span in self.expand(template, window) {
                if !self.covered(None, &span, window)? {
                    continue;
                }
                let pool = self.pool_for(template, &span, window)?;
                if pool.is_empty() {
                    continue;
                }
                let emitted = match mode {
                    AssignMode::AutoAssign => self.auto_assign(&pool, &span, requested)?,
                    AssignMode::TimeResource => self.time_resource(&pool, &span, requested)?,
                };
                if let Some(slot) = emitted {
                    slots.push(slot);
                    if slots.len() > MAX_SLOTS_PER_QUERY {
                        return Err(EngineError::LimitExceeded("too many slots in one query"));
                    }
                }
            }
        }
        slots.sort_by_key(|s| s.span.start);
        Ok(slots)
    }

    fn auto_assign(
        &self,
        pool: &[Ulid],
        span: &Span,
        requested: u32,
    ) -> Result<Option<Slot>, EngineError> {
        let selection = select(self.snapshot, self.graph, pool, span, requested)?;
        Ok(selection.map(|sel| self.make_slot(span, &sel.resources)))
    }

    /// List every resource that could serve the slot alone; when none can,
    /// fall back to the best combination so the caller still sees the slot.
    fn time_resource(
        &self,
        pool: &[Ulid],
        span: &Span,
        requested: u32,
    ) -> Result<Option<Slot>, EngineError> {
        let mut viable: Vec<Ulid> = pool
            .iter()
            .filter(|id| self.snapshot.remaining_self(id, span) >= requested)
            .copied()
            .collect();
        if viable.is_empty() {
            match select(self.snapshot, self.graph, pool, span, requested)? {
                Some(Selection { resources, .. }) => viable = resources,
                None => return Ok(None),
            }
        }
        Ok(Some(self.make_slot(span, &viable)))
    }

    fn make_slot(&self, span: &Span, ids: &[Ulid]) -> Slot {
        let mut resources: Vec<SlotResource> = ids
            .iter()
            .filter_map(|id| self.snapshot.get(id))
            .map(|book| SlotResource {
                id: book.resource.id,
                sequence: book.resource.sequence,
                capacity: super::capacity::remaining_self(book, span),
            })
            .collect();
        resources.sort_by_key(|r| (r.sequence, r.id));
        Slot { span: *span, resources }
    }

    /// Concrete candidate spans of one template inside `window`.
    fn expand(&self, template: &SlotTemplate, window: &Span) -> Vec<Span> {
        match template {
            SlotTemplate::OneShot { span, .. } => {
                if window.contains_span(span) { vec![*span] } else { Vec::new() }
            }
            SlotTemplate::Weekly { weekday, start_min, end_min, duration_min, .. } => {
                if *duration_min == 0 || start_min + duration_min > *end_min {
                    return Vec::new();
                }
                let mut spans = Vec::new();
                for date in day_range(self.tz, window) {
                    if chrono::Datelike::weekday(&date) != *weekday {
                        continue;
                    }
                    let mut minute = *start_min;
                    while minute + duration_min <= *end_min {
                        if let (Some(start), Some(end)) = (
                            local_instant(self.tz, date, minute),
                            local_instant(self.tz, date, minute + duration_min),
                        ) && start < end
                        {
                            let span = Span::new(start, end);
                            if window.contains_span(&span) {
                                spans.push(span);
                            }
                        }
                        minute += duration_min;
                    }
                }
                spans
            }
        }
    }

    /// The candidate pool for a slot: the template's restriction when
    /// present, else every known resource — in both cases narrowed to
    /// resources whose own calendar covers the slot.
    fn pool_for(
        &mut self,
        template: &SlotTemplate,
        span: &Span,
        window: &Span,
    ) -> Result<Vec<Ulid>, EngineError> {
        let restrict = template.restrict_to();
        let base: Vec<Ulid> = if restrict.is_empty() {
            self.snapshot.ids_by_sequence()
        } else {
            restrict
                .iter()
                .filter(|id| self.snapshot.contains(id))
                .copied()
                .collect()
        };
        let mut pool = Vec::with_capacity(base.len());
        for id in base {
            if self.covered(Some(id), span, window)? {
                pool.push(id);
            }
        }
        Ok(pool)
    }

    fn covered(
        &mut self,
        resource: Option<Ulid>,
        span: &Span,
        window: &Span,
    ) -> Result<bool, EngineError> {
        let working = self.working(resource, window)?;
        Ok(subtract_intervals(&[*span], &working).is_empty())
    }

    fn working(
        &mut self,
        resource: Option<Ulid>,
        window: &Span,
    ) -> Result<Vec<Span>, EngineError> {
        let key = (resource, *window);
        if let Some(cached) = self.memo.get(&key) {
            return Ok(cached.clone());
        }
        let working = self.calendar.working_intervals(resource, window, self.tz)?;
        self.memo.insert(key, working.clone());
        Ok(working)
    }
}
