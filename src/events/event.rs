//! Farm lifecycle event names

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Lifecycle events raised by the farm's event system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FarmEvent {
    JobSubmitted,
    JobStarted,
    JobFinished,
    JobRequeued,
    JobFailed,
    JobSuspended,
    JobResumed,
    JobPended,
    JobReleased,
    JobDeleted,
    JobError,
    JobPurged,
    HouseCleaning,
    RepositoryRepair,
    SlaveStarted,
    SlaveStopped,
    SlaveIdle,
    SlaveRendering,
    SlaveStartingJob,
    SlaveStalled,
    IdleShutdown,
    MachineStartup,
    ThermalShutdown,
    MachineRestart,
}

impl FarmEvent {
    pub const ALL: [FarmEvent; 24] = [
        FarmEvent::JobSubmitted,
        FarmEvent::JobStarted,
        FarmEvent::JobFinished,
        FarmEvent::JobRequeued,
        FarmEvent::JobFailed,
        FarmEvent::JobSuspended,
        FarmEvent::JobResumed,
        FarmEvent::JobPended,
        FarmEvent::JobReleased,
        FarmEvent::JobDeleted,
        FarmEvent::JobError,
        FarmEvent::JobPurged,
        FarmEvent::HouseCleaning,
        FarmEvent::RepositoryRepair,
        FarmEvent::SlaveStarted,
        FarmEvent::SlaveStopped,
        FarmEvent::SlaveIdle,
        FarmEvent::SlaveRendering,
        FarmEvent::SlaveStartingJob,
        FarmEvent::SlaveStalled,
        FarmEvent::IdleShutdown,
        FarmEvent::MachineStartup,
        FarmEvent::ThermalShutdown,
        FarmEvent::MachineRestart,
    ];

    /// Event name as the farm reports it, e.g. `OnJobFinished`
    pub fn name(&self) -> &'static str {
        match self {
            FarmEvent::JobSubmitted => "OnJobSubmitted",
            FarmEvent::JobStarted => "OnJobStarted",
            FarmEvent::JobFinished => "OnJobFinished",
            FarmEvent::JobRequeued => "OnJobRequeued",
            FarmEvent::JobFailed => "OnJobFailed",
            FarmEvent::JobSuspended => "OnJobSuspended",
            FarmEvent::JobResumed => "OnJobResumed",
            FarmEvent::JobPended => "OnJobPended",
            FarmEvent::JobReleased => "OnJobReleased",
            FarmEvent::JobDeleted => "OnJobDeleted",
            FarmEvent::JobError => "OnJobError",
            FarmEvent::JobPurged => "OnJobPurged",
            FarmEvent::HouseCleaning => "OnHouseCleaning",
            FarmEvent::RepositoryRepair => "OnRepositoryRepair",
            FarmEvent::SlaveStarted => "OnSlaveStarted",
            FarmEvent::SlaveStopped => "OnSlaveStopped",
            FarmEvent::SlaveIdle => "OnSlaveIdle",
            FarmEvent::SlaveRendering => "OnSlaveRendering",
            FarmEvent::SlaveStartingJob => "OnSlaveStartingJob",
            FarmEvent::SlaveStalled => "OnSlaveStalled",
            FarmEvent::IdleShutdown => "OnIdleShutdown",
            FarmEvent::MachineStartup => "OnMachineStartup",
            FarmEvent::ThermalShutdown => "OnThermalShutdown",
            FarmEvent::MachineRestart => "OnMachineRestart",
        }
    }

    /// Event plugin config entry listing publish plugin paths, e.g. `OnJobFinishedPaths`
    pub fn config_entry(&self) -> String {
        format!("{}Paths", self.name())
    }
}

impl std::fmt::Display for FarmEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Name that matches no farm event
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown farm event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for FarmEvent {
    type Err = UnknownEvent;

    /// Accepts `OnJobFinished`, `OnJobFinishedPaths` or `JobFinished`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let base = trimmed.strip_suffix("Paths").unwrap_or(trimmed);
        let base = base.strip_prefix("On").unwrap_or(base);
        FarmEvent::ALL
            .iter()
            .copied()
            .find(|e| e.name().eq_ignore_ascii_case(&format!("On{}", base)))
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// Farm job as exported by the event plugin shim
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmJob {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Job environment key/values
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Job extra info key/values
    #[serde(default)]
    pub extra_info: BTreeMap<String, String>,

    /// Anything else the shim exports
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// What an event handler receives
#[derive(Debug, Clone, Default)]
pub struct EventPayload {
    /// Affected job; house cleaning carries none
    pub job: Option<FarmJob>,
    /// Event-specific extras (e.g. task and report for job errors)
    pub additional: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_config_entries() {
        assert_eq!(FarmEvent::JobFinished.name(), "OnJobFinished");
        assert_eq!(FarmEvent::JobFinished.config_entry(), "OnJobFinishedPaths");
        assert_eq!(FarmEvent::ALL.len(), 24);
    }

    #[test]
    fn test_parse_accepts_all_forms() {
        for event in FarmEvent::ALL {
            assert_eq!(event.name().parse::<FarmEvent>().unwrap(), event);
            assert_eq!(event.config_entry().parse::<FarmEvent>().unwrap(), event);
        }
        assert_eq!(
            "JobError".parse::<FarmEvent>().unwrap(),
            FarmEvent::JobError
        );
        assert!("OnCoffeeBreak".parse::<FarmEvent>().is_err());
    }

    #[test]
    fn test_farm_job_keeps_unknown_fields() {
        let job: FarmJob = serde_json::from_str(
            r#"{"id": "63f1", "name": "comp", "environment": {"A": "1"}, "pool": "nuke"}"#,
        )
        .unwrap();
        assert_eq!(job.environment["A"], "1");
        assert_eq!(job.other["pool"], "nuke");
    }
}
