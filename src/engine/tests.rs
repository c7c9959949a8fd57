use super::*;

use chrono::{TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::calendar::Attendance;
use crate::model::AssignMode;

fn rid(n: u64) -> Ulid {
    Ulid::from_parts(n, 0)
}

fn utc_ms(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Ms {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
        .timestamp_millis()
}

// 2026-01-05 is a Monday.
fn monday(h: u32) -> Ms {
    utc_ms(2026, 1, 5, h, 0)
}

fn tuesday(h: u32) -> Ms {
    utc_ms(2026, 1, 6, h, 0)
}

fn sunday(h: u32) -> Ms {
    utc_ms(2026, 1, 11, h, 0)
}

fn week_window() -> Span {
    Span::new(monday(0), utc_ms(2026, 1, 12, 0, 0))
}

/// Engine with an always-open calendar.
async fn engine_open() -> Engine {
    let engine = Engine::new(EngineConfig::default());
    engine
        .set_working_hours(Tz::UTC, WorkingHoursSpec::every_day(0, 24 * 60))
        .await
        .unwrap();
    engine
}

async fn add(engine: &Engine, n: u64, capacity: u32, sequence: u32, shareable: bool) {
    engine
        .create_resource(Resource { id: rid(n), capacity, sequence, shareable })
        .await
        .unwrap();
}

fn weekly(weekday: Weekday, start_h: u32, end_h: u32, dur_min: u32, restrict: &[u64]) -> SlotTemplate {
    SlotTemplate::Weekly {
        weekday,
        start_min: start_h * 60,
        end_min: end_h * 60,
        duration_min: dur_min,
        restrict_to: restrict.iter().map(|&n| rid(n)).collect(),
    }
}

fn slots_req(capacity: u32, mode: AssignMode) -> GetSlotsRequest {
    GetSlotsRequest { requested_capacity: capacity, window: week_window(), tz: None, mode }
}

fn reserve_req(span: Span, capacity: u32, resources: &[u64]) -> ReserveRequest {
    ReserveRequest {
        span,
        capacity_reserved: capacity,
        resource_ids: resources.iter().map(|&n| rid(n)).collect(),
    }
}

async fn auto_slots(engine: &Engine, capacity: u32) -> Vec<Slot> {
    engine
        .get_slots(&slots_req(capacity, AssignMode::AutoAssign), None)
        .await
        .unwrap()
}

fn selected_ids(slot: &Slot) -> Vec<Ulid> {
    slot.resources.iter().map(|r| r.id).collect()
}

// ── Scenario S1: smallest sequence wins among singletons ─────────

#[tokio::test]
async fn scenario_smallest_sequence_singleton() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, false).await; // A
    add(&engine, 2, 2, 3, false).await; // B
    add(&engine, 3, 2, 2, false).await; // C
    engine
        .set_templates(vec![weekly(Weekday::Mon, 15, 16, 60, &[])])
        .await
        .unwrap();

    let slots = auto_slots(&engine, 1).await;
    assert_eq!(slots.len(), 1);
    assert_eq!(selected_ids(&slots[0]), vec![rid(1)]);
}

// ── Scenario S2/S3: single coverage beats combinations ───────────

#[tokio::test]
async fn scenario_single_coverage_beats_combination() {
    let engine = engine_open().await;
    add(&engine, 1, 4, 2, true).await; // A
    add(&engine, 2, 8, 3, true).await; // B
    add(&engine, 3, 6, 4, true).await; // C
    engine.link_resources(rid(1), rid(2)).await.unwrap();
    engine
        .set_templates(vec![weekly(Weekday::Mon, 15, 16, 60, &[])])
        .await
        .unwrap();

    let slots = auto_slots(&engine, 5).await;
    assert_eq!(selected_ids(&slots[0]), vec![rid(2)]);
}

#[tokio::test]
async fn scenario_smallest_sequence_among_sufficient() {
    let engine = engine_open().await;
    add(&engine, 1, 4, 2, true).await;
    add(&engine, 2, 8, 3, true).await;
    add(&engine, 3, 6, 1, true).await; // C now has the smallest sequence
    engine.link_resources(rid(1), rid(2)).await.unwrap();
    engine
        .set_templates(vec![weekly(Weekday::Mon, 15, 16, 60, &[])])
        .await
        .unwrap();

    let slots = auto_slots(&engine, 5).await;
    assert_eq!(selected_ids(&slots[0]), vec![rid(3)]);
}

// ── Scenario S4: a triangle that needs all three members ─────────

#[tokio::test]
async fn scenario_triangle_requires_all_members() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, false).await;
    add(&engine, 2, 2, 2, false).await;
    add(&engine, 3, 2, 3, false).await;
    for (u, v) in [(1, 2), (1, 3), (2, 3)] {
        engine.link_resources(rid(u), rid(v)).await.unwrap();
    }
    engine
        .set_templates(vec![weekly(Weekday::Mon, 15, 16, 60, &[])])
        .await
        .unwrap();

    // Two resources only cover 4, so 5 takes the whole triangle.
    let slots = auto_slots(&engine, 5).await;
    assert_eq!(selected_ids(&slots[0]), vec![rid(1), rid(2), rid(3)]);
}

// ── Scenario S5: shareable partial reservation ───────────────────

#[tokio::test]
async fn scenario_shareable_partial_reservation() {
    let engine = engine_open().await;
    add(&engine, 1, 5, 1, true).await;
    engine
        .set_templates(vec![weekly(Weekday::Mon, 15, 16, 60, &[])])
        .await
        .unwrap();
    let slot = Span::new(monday(15), monday(16));
    engine.reserve(&reserve_req(slot, 4, &[1]), None).await.unwrap();

    let one = auto_slots(&engine, 1).await;
    assert_eq!(one.len(), 1);
    assert_eq!(selected_ids(&one[0]), vec![rid(1)]);

    let two = auto_slots(&engine, 2).await;
    assert!(two.is_empty());
}

// ── Scenario S6: template restrictions are hard boundaries ───────

#[tokio::test]
async fn scenario_template_restrictions() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await; // A
    add(&engine, 2, 2, 2, true).await; // B
    add(&engine, 3, 2, 3, true).await; // C
    engine
        .set_templates(vec![
            weekly(Weekday::Mon, 15, 16, 60, &[1]),
            weekly(Weekday::Tue, 15, 16, 60, &[2, 3]),
        ])
        .await
        .unwrap();

    let slots = auto_slots(&engine, 1).await;
    assert_eq!(slots.len(), 2);
    let mon = slots.iter().find(|s| s.span.start == monday(15)).unwrap();
    let tue = slots.iter().find(|s| s.span.start == tuesday(15)).unwrap();
    assert_eq!(selected_ids(mon), vec![rid(1)]);
    assert_eq!(selected_ids(tue), vec![rid(2)]);
}

#[tokio::test]
async fn restriction_excludes_neighbors_of_restricted_resources() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    add(&engine, 2, 8, 2, true).await;
    engine.link_resources(rid(1), rid(2)).await.unwrap();
    // Restricted to A alone, a request of 3 cannot lean on neighbor B.
    engine
        .set_templates(vec![weekly(Weekday::Mon, 15, 16, 60, &[1])])
        .await
        .unwrap();

    assert!(auto_slots(&engine, 3).await.is_empty());
}

// ── Properties over remaining capacity ───────────────────────────

#[tokio::test]
async fn remaining_stays_within_bounds() {
    let engine = engine_open().await;
    add(&engine, 1, 5, 1, true).await;
    let w = Span::new(monday(9), monday(10));
    engine.reserve(&reserve_req(w, 3, &[1]), None).await.unwrap();

    let rem = engine.remaining_capacity(rid(1), &w).await.unwrap();
    assert_eq!(rem, 2);
    // Outside the booked window the full capacity is back.
    let outside = Span::new(monday(10), monday(11));
    assert_eq!(engine.remaining_capacity(rid(1), &outside).await.unwrap(), 5);
}

#[tokio::test]
async fn combined_equals_sum_over_neighborhood() {
    let engine = engine_open().await;
    add(&engine, 1, 4, 1, true).await;
    add(&engine, 2, 8, 2, true).await;
    add(&engine, 3, 6, 3, true).await; // not linked
    engine.link_resources(rid(1), rid(2)).await.unwrap();
    let w = Span::new(monday(9), monday(10));
    engine.reserve(&reserve_req(w, 3, &[2]), None).await.unwrap();

    let report = engine.linked_remaining(rid(1), &w).await.unwrap();
    let a = engine.remaining_capacity(rid(1), &w).await.unwrap();
    let b = engine.remaining_capacity(rid(2), &w).await.unwrap();
    assert_eq!(report.total_remaining, a + b);
    assert_eq!(report.per_resource[&rid(1)], 4);
    assert_eq!(report.per_resource[&rid(2)], 5);
    assert!(!report.per_resource.contains_key(&rid(3)));
}

#[tokio::test]
async fn cancellation_never_decreases_remaining() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, false).await;
    let w = Span::new(monday(9), monday(10));
    let booking = engine.reserve(&reserve_req(w, 1, &[1]), None).await.unwrap();
    let before = engine.remaining_capacity(rid(1), &w).await.unwrap();
    assert_eq!(before, 0);

    engine.cancel(booking.id).await.unwrap();
    let after = engine.remaining_capacity(rid(1), &w).await.unwrap();
    assert!(after >= before);
    assert_eq!(after, 2);
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    let w = Span::new(monday(9), monday(10));
    let booking = engine.reserve(&reserve_req(w, 1, &[1]), None).await.unwrap();

    engine.cancel(booking.id).await.unwrap();
    let rem = engine.remaining_capacity(rid(1), &w).await.unwrap();
    engine.cancel(booking.id).await.unwrap();
    assert_eq!(engine.remaining_capacity(rid(1), &w).await.unwrap(), rem);
    // Cancelling a booking that never existed is a no-op too.
    engine.cancel(rid(99)).await.unwrap();
}

#[tokio::test]
async fn reservation_conservation() {
    let engine = engine_open().await;
    add(&engine, 1, 5, 1, true).await;
    add(&engine, 2, 5, 2, false).await;
    let w = Span::new(monday(9), monday(10));

    engine.reserve(&reserve_req(w, 2, &[1]), None).await.unwrap();
    assert_eq!(engine.remaining_capacity(rid(1), &w).await.unwrap(), 3);

    engine.reserve(&reserve_req(w, 2, &[2]), None).await.unwrap();
    assert_eq!(engine.remaining_capacity(rid(2), &w).await.unwrap(), 0);
}

// ── Reservation path ─────────────────────────────────────────────

#[tokio::test]
async fn reserve_returns_booking_lines() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 2, true).await;
    add(&engine, 2, 2, 1, true).await;
    let w = Span::new(monday(9), monday(10));

    // Allocation follows (sequence, id) order: resource 2 first.
    let booking = engine.reserve(&reserve_req(w, 3, &[1, 2]), None).await.unwrap();
    assert_eq!(booking.span, w);
    assert_eq!(booking.lines.len(), 2);
    let by_resource: std::collections::HashMap<Ulid, LineInfo> =
        booking.lines.iter().map(|l| (l.resource_id, *l)).collect();
    assert_eq!(by_resource[&rid(2)].reserved, 2);
    assert_eq!(by_resource[&rid(1)].reserved, 1);

    let fetched = engine.get_booking(booking.id).await.unwrap();
    assert_eq!(fetched, booking);
}

#[tokio::test]
async fn reserve_skips_targets_it_does_not_need() {
    let engine = engine_open().await;
    add(&engine, 1, 5, 1, true).await;
    add(&engine, 2, 5, 2, true).await;
    let w = Span::new(monday(9), monday(10));

    let booking = engine.reserve(&reserve_req(w, 4, &[1, 2]), None).await.unwrap();
    assert_eq!(booking.lines.len(), 1);
    assert_eq!(booking.lines[0].resource_id, rid(1));
    assert_eq!(engine.remaining_capacity(rid(2), &w).await.unwrap(), 5);
}

#[tokio::test]
async fn reserve_non_shareable_consumes_full_capacity() {
    let engine = engine_open().await;
    add(&engine, 1, 4, 1, false).await;
    let w = Span::new(monday(9), monday(10));

    let booking = engine.reserve(&reserve_req(w, 1, &[1]), None).await.unwrap();
    assert_eq!(booking.lines[0].reserved, 1);
    assert_eq!(booking.lines[0].used, 4);
    assert_eq!(engine.remaining_capacity(rid(1), &w).await.unwrap(), 0);
}

#[tokio::test]
async fn unmanaged_capacity_consumes_full_capacity() {
    let engine = Engine::new(EngineConfig { manage_capacity: false, metrics_port: None });
    engine
        .set_working_hours(Tz::UTC, WorkingHoursSpec::every_day(0, 24 * 60))
        .await
        .unwrap();
    add(&engine, 1, 3, 1, true).await;
    let w = Span::new(monday(9), monday(10));

    let booking = engine.reserve(&reserve_req(w, 1, &[1]), None).await.unwrap();
    assert_eq!(booking.lines[0].used, 3);
    assert_eq!(engine.remaining_capacity(rid(1), &w).await.unwrap(), 0);
}

#[tokio::test]
async fn reserve_rechecks_capacity_at_commit() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, false).await;
    let w = Span::new(monday(9), monday(10));

    engine.reserve(&reserve_req(w, 1, &[1]), None).await.unwrap();
    let second = engine.reserve(&reserve_req(w, 1, &[1]), None).await;
    assert!(matches!(
        second,
        Err(EngineError::CapacityExceeded { requested: 1, available: 0 })
    ));
}

#[tokio::test]
async fn concurrent_reservations_cannot_both_commit() {
    let engine = std::sync::Arc::new(engine_open().await);
    add(&engine, 1, 1, 1, true).await;
    let w = Span::new(monday(9), monday(10));

    let req_a = reserve_req(w, 1, &[1]);
    let req_b = reserve_req(w, 1, &[1]);
    let (a, b) = tokio::join!(
        engine.reserve(&req_a, None),
        engine.reserve(&req_b, None),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(engine.remaining_capacity(rid(1), &w).await.unwrap(), 0);
}

#[tokio::test]
async fn stale_slot_fails_at_reserve_time() {
    let engine = engine_open().await;
    add(&engine, 1, 1, 1, true).await;
    engine
        .set_templates(vec![weekly(Weekday::Mon, 9, 10, 60, &[])])
        .await
        .unwrap();

    let slots = auto_slots(&engine, 1).await;
    assert_eq!(slots.len(), 1);
    let span = slots[0].span;

    // Someone else takes the capacity between enumeration and commit.
    engine.reserve(&reserve_req(span, 1, &[1]), None).await.unwrap();
    let stale = engine.reserve(&reserve_req(span, 1, &[1]), None).await;
    assert!(matches!(stale, Err(EngineError::CapacityExceeded { .. })));
}

#[tokio::test]
async fn reserve_outside_working_hours_is_rejected() {
    let engine = Engine::new(EngineConfig::default());
    let spec = WorkingHoursSpec {
        attendances: vec![Attendance::new(Weekday::Mon, 9 * 60, 17 * 60)],
        exceptions: vec![],
    };
    engine.set_working_hours(Tz::UTC, spec).await.unwrap();
    add(&engine, 1, 2, 1, true).await;

    let sunday_span = Span::new(sunday(9), sunday(10));
    let result = engine.reserve(&reserve_req(sunday_span, 1, &[1]), None).await;
    assert!(matches!(result, Err(EngineError::WindowClosed(_))));

    let monday_span = Span::new(monday(9), monday(10));
    assert!(engine.reserve(&reserve_req(monday_span, 1, &[1]), None).await.is_ok());
}

#[tokio::test]
async fn reserve_validates_inputs() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    let w = Span::new(monday(9), monday(10));

    let unknown = engine.reserve(&reserve_req(w, 1, &[42]), None).await;
    assert!(matches!(unknown, Err(EngineError::UnknownResource(_))));

    let zero = engine.reserve(&reserve_req(w, 0, &[1]), None).await;
    assert!(matches!(zero, Err(EngineError::InvalidRequest(_))));

    let empty = engine.reserve(&reserve_req(w, 1, &[]), None).await;
    assert!(matches!(empty, Err(EngineError::InvalidRequest(_))));

    let backwards = ReserveRequest {
        span: Span { start: monday(10), end: monday(9) },
        capacity_reserved: 1,
        resource_ids: vec![rid(1)],
    };
    assert!(matches!(
        engine.reserve(&backwards, None).await,
        Err(EngineError::InvalidWindow(_))
    ));
}

#[tokio::test]
async fn deadlines_time_out_without_effects() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    engine
        .set_templates(vec![weekly(Weekday::Mon, 9, 10, 60, &[])])
        .await
        .unwrap();
    let w = Span::new(monday(9), monday(10));

    let slots = engine.get_slots(&slots_req(1, AssignMode::AutoAssign), Some(1)).await;
    assert!(matches!(slots, Err(EngineError::Timeout)));

    let reserve = engine.reserve(&reserve_req(w, 1, &[1]), Some(1)).await;
    assert!(matches!(reserve, Err(EngineError::Timeout)));
    // No partial effects.
    assert_eq!(engine.remaining_capacity(rid(1), &w).await.unwrap(), 2);
}

// ── Slot queries through the façade ──────────────────────────────

#[tokio::test]
async fn get_slots_auto_assign_end_to_end() {
    let engine = Engine::new(EngineConfig::default());
    let spec = WorkingHoursSpec {
        attendances: vec![Attendance::new(Weekday::Mon, 9 * 60, 17 * 60)],
        exceptions: vec![],
    };
    engine.set_working_hours(Tz::UTC, spec).await.unwrap();
    add(&engine, 1, 2, 1, true).await;
    engine
        .set_templates(vec![weekly(Weekday::Mon, 9, 12, 60, &[])])
        .await
        .unwrap();

    let slots = auto_slots(&engine, 1).await;
    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0].span, Span::new(monday(9), monday(10)));
    assert!(slots.windows(2).all(|w| w[0].span.start <= w[1].span.start));
}

#[tokio::test]
async fn get_slots_time_resource_lists_viable_resources() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    add(&engine, 2, 3, 2, true).await;
    add(&engine, 3, 1, 3, true).await;
    engine
        .set_templates(vec![weekly(Weekday::Mon, 9, 10, 60, &[])])
        .await
        .unwrap();

    let slots = engine
        .get_slots(&slots_req(2, AssignMode::TimeResource), None)
        .await
        .unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(selected_ids(&slots[0]), vec![rid(1), rid(2)]);
    // Remaining capacity is reported per resource.
    assert_eq!(slots[0].resources[0].capacity, 2);
    assert_eq!(slots[0].resources[1].capacity, 3);
}

#[tokio::test]
async fn get_slots_empty_is_not_an_error() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    // No templates configured.
    let slots = auto_slots(&engine, 1).await;
    assert!(slots.is_empty());
}

#[tokio::test]
async fn get_slots_validates_inputs() {
    let engine = engine_open().await;
    let zero = engine.get_slots(&slots_req(0, AssignMode::AutoAssign), None).await;
    assert!(matches!(zero, Err(EngineError::InvalidRequest(_))));

    let backwards = GetSlotsRequest {
        requested_capacity: 1,
        window: Span { start: monday(10), end: monday(9) },
        tz: None,
        mode: AssignMode::AutoAssign,
    };
    assert!(matches!(
        engine.get_slots(&backwards, None).await,
        Err(EngineError::InvalidWindow(_))
    ));
}

#[tokio::test]
async fn request_timezone_shifts_template_expansion() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    engine
        .set_templates(vec![weekly(Weekday::Mon, 15, 16, 60, &[])])
        .await
        .unwrap();

    // Brussels is UTC+1 in January: 15:00 local is 14:00 UTC.
    let req = GetSlotsRequest {
        requested_capacity: 1,
        window: week_window(),
        tz: Some("Europe/Brussels".parse().unwrap()),
        mode: AssignMode::AutoAssign,
    };
    let slots = engine.get_slots(&req, None).await.unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].span.start, monday(14));
}

// ── Administrative surface ───────────────────────────────────────

#[tokio::test]
async fn resource_crud_guards() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;

    let dup = engine
        .create_resource(Resource { id: rid(1), capacity: 2, sequence: 9, shareable: true })
        .await;
    assert!(matches!(dup, Err(EngineError::AlreadyExists(_))));

    let zero_cap = engine
        .create_resource(Resource { id: rid(2), capacity: 0, sequence: 1, shareable: true })
        .await;
    assert!(matches!(zero_cap, Err(EngineError::InvalidRequest(_))));

    let missing = engine.update_resource(rid(7), 2, 1, true).await;
    assert!(matches!(missing, Err(EngineError::UnknownResource(_))));

    engine.update_resource(rid(1), 6, 4, false).await.unwrap();
    let listed = engine.list_resources().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].capacity, 6);
    assert!(!listed[0].shareable);
}

#[tokio::test]
async fn delete_resource_refused_while_booked() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    let w = Span::new(monday(9), monday(10));
    let booking = engine.reserve(&reserve_req(w, 1, &[1]), None).await.unwrap();

    let blocked = engine.delete_resource(rid(1)).await;
    assert!(matches!(blocked, Err(EngineError::InvalidRequest(_))));

    engine.cancel(booking.id).await.unwrap();
    engine.delete_resource(rid(1)).await.unwrap();
    assert!(engine.list_resources().await.is_empty());
}

#[tokio::test]
async fn links_maintain_graph_invariants() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    add(&engine, 2, 2, 2, true).await;
    add(&engine, 3, 2, 3, true).await;

    let self_link = engine.link_resources(rid(1), rid(1)).await;
    assert!(matches!(self_link, Err(EngineError::InvalidRequest(_))));
    let unknown = engine.link_resources(rid(1), rid(9)).await;
    assert!(matches!(unknown, Err(EngineError::UnknownResource(_))));

    assert!(engine.link_resources(rid(1), rid(2)).await.unwrap());
    assert!(!engine.link_resources(rid(2), rid(1)).await.unwrap());
    engine.link_resources(rid(2), rid(3)).await.unwrap();

    let component = engine.connected_resources(rid(1)).await.unwrap();
    assert_eq!(component, vec![rid(1), rid(2), rid(3)]);

    assert!(engine.unlink_resources(rid(2), rid(3)).await);
    let component = engine.connected_resources(rid(1)).await.unwrap();
    assert_eq!(component, vec![rid(1), rid(2)]);
}

#[tokio::test]
async fn per_resource_hours_narrow_the_pool() {
    let engine = engine_open().await;
    add(&engine, 1, 2, 1, true).await;
    add(&engine, 2, 2, 2, true).await;
    // Resource 1 only works Tuesdays; the Monday slot falls to resource 2.
    engine
        .set_resource_hours(
            rid(1),
            WorkingHoursSpec {
                attendances: vec![Attendance::new(Weekday::Tue, 0, 24 * 60)],
                exceptions: vec![],
            },
        )
        .await
        .unwrap();
    engine
        .set_templates(vec![weekly(Weekday::Mon, 9, 10, 60, &[])])
        .await
        .unwrap();

    let slots = auto_slots(&engine, 1).await;
    assert_eq!(slots.len(), 1);
    assert_eq!(selected_ids(&slots[0]), vec![rid(2)]);
}

#[tokio::test]
async fn template_validation() {
    let engine = engine_open().await;
    let bad = engine
        .set_templates(vec![SlotTemplate::Weekly {
            weekday: Weekday::Mon,
            start_min: 600,
            end_min: 540,
            duration_min: 60,
            restrict_to: vec![],
        }])
        .await;
    assert!(matches!(bad, Err(EngineError::InvalidRequest(_))));

    let zero_duration = engine
        .set_templates(vec![SlotTemplate::Weekly {
            weekday: Weekday::Mon,
            start_min: 540,
            end_min: 600,
            duration_min: 0,
            restrict_to: vec![],
        }])
        .await;
    assert!(matches!(zero_duration, Err(EngineError::InvalidRequest(_))));
}

#[tokio::test]
async fn bootstrap_applies_a_full_schedule() {
    let engine = Engine::new(EngineConfig::default());
    let schedule = ScheduleConfig {
        tz: "UTC".into(),
        working_hours: WorkingHoursSpec::every_day(0, 24 * 60),
        resources: vec![
            Resource { id: rid(1), capacity: 2, sequence: 1, shareable: true },
            Resource { id: rid(2), capacity: 2, sequence: 2, shareable: true },
        ],
        links: vec![(rid(1), rid(2))],
        templates: vec![weekly(Weekday::Mon, 9, 10, 60, &[])],
    };
    engine.bootstrap(&schedule).await.unwrap();

    assert_eq!(engine.list_resources().await.len(), 2);
    let slots = auto_slots(&engine, 4).await;
    assert_eq!(slots.len(), 1);
    assert_eq!(selected_ids(&slots[0]), vec![rid(1), rid(2)]);
}
