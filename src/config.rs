//! Engine configuration from environment variables, plus an optional JSON
//! schedule bootstrap (resources, links, calendar, templates).

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::calendar::WorkingHoursSpec;
use crate::model::{Resource, SlotTemplate};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// When false, every booking line consumes the full resource capacity
    /// regardless of the shareable flag.
    pub manage_capacity: bool,
    /// Prometheus exporter port; disabled when None.
    pub metrics_port: Option<u16>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { manage_capacity: true, metrics_port: None }
    }
}

impl EngineConfig {
    /// Read `RENDEZ_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        let manage_capacity = std::env::var("RENDEZ_MANAGE_CAPACITY")
            .ok()
            .map(|v| !matches!(v.as_str(), "0" | "false" | "no"))
            .unwrap_or(true);
        let metrics_port = std::env::var("RENDEZ_METRICS_PORT")
            .ok()
            .and_then(|s| s.parse().ok());
        Self { manage_capacity, metrics_port }
    }
}

/// Declarative schedule applied through `Engine::bootstrap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// IANA timezone name the working hours are written in.
    pub tz: String,
    pub working_hours: WorkingHoursSpec,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub links: Vec<(Ulid, Ulid)>,
    #[serde(default)]
    pub templates: Vec<SlotTemplate>,
}

impl ScheduleConfig {
    pub fn from_json(json: &str) -> io::Result<Self> {
        serde_json::from_str(json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
