//! rendez — appointment slot scheduling over combinable, shareable,
//! capacity-managed resources with working-hours awareness.
//!
//! The [`Engine`] is the façade: enumerate slots with
//! [`Engine::get_slots`], commit with [`Engine::reserve`] (capacity is
//! rechecked under per-resource locks), release with [`Engine::cancel`].

pub mod calendar;
pub mod config;
pub mod engine;
pub mod graph;
pub mod limits;
pub mod model;
pub mod observability;

pub use config::{EngineConfig, ScheduleConfig};
pub use engine::{Engine, EngineError};
pub use model::{
    AssignMode, BookingInfo, BookingLine, CancelRequest, GetSlotsRequest, LineInfo, Ms,
    ReserveRequest, Resource, Slot, SlotResource, SlotTemplate, Span,
};
