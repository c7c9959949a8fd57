use ulid::Ulid;

use crate::model::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Bad caller input (zero capacity, empty pool, malformed config).
    InvalidRequest(&'static str),
    /// Window with `start >= end`.
    InvalidWindow(Span),
    UnknownResource(Ulid),
    /// The targets cannot cover the requested amount at commit time.
    CapacityExceeded { requested: u32, available: u32 },
    /// The reservation window is no longer inside working hours.
    WindowClosed(Span),
    /// Deadline exceeded; no partial effects were applied.
    Timeout,
    /// State changed between validation and commit; the caller may retry.
    ConcurrentModification(Ulid),
    AlreadyExists(Ulid),
    LimitExceeded(&'static str),
}

impl EngineError {
    /// Stable label for the wire-level `{ kind, detail }` shape and for
    /// metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidRequest(_) => "invalid_request",
            EngineError::InvalidWindow(_) => "invalid_window",
            EngineError::UnknownResource(_) => "unknown_resource",
            EngineError::CapacityExceeded { .. } => "capacity_exceeded",
            EngineError::WindowClosed(_) => "window_closed",
            EngineError::Timeout => "timeout",
            EngineError::ConcurrentModification(_) => "concurrent_modification",
            EngineError::AlreadyExists(_) => "already_exists",
            EngineError::LimitExceeded(_) => "limit_exceeded",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            EngineError::InvalidWindow(w) => {
                write!(f, "invalid window [{}, {})", w.start, w.end)
            }
            EngineError::UnknownResource(id) => write!(f, "unknown resource: {id}"),
            EngineError::CapacityExceeded { requested, available } => {
                write!(f, "capacity exceeded: requested {requested}, available {available}")
            }
            EngineError::WindowClosed(w) => {
                write!(f, "window [{}, {}) is outside working hours", w.start, w.end)
            }
            EngineError::Timeout => write!(f, "deadline exceeded"),
            EngineError::ConcurrentModification(id) => {
                write!(f, "concurrent modification on resource {id}")
            }
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
