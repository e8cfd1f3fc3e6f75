//! Wire shapes of the cluster API responses the client reads.
//!
//! Only the fields the pages display are modelled; everything else is ignored.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JobStub {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: String,
    pub namespace: String,
    pub priority: i64,
    pub status: String,
    /// Unix nanoseconds.
    pub submit_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AllocStub {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(rename = "JobID")]
    pub job_id: String,
    pub node_name: String,
    pub client_status: String,
    /// Unix nanoseconds.
    pub create_time: i64,
    pub task_states: Option<HashMap<String, TaskState>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskState {
    pub state: String,
    pub failed: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskState {
    /// The API reports unset times as year one.
    pub fn started(&self) -> Option<&DateTime<Utc>> {
        self.started_at.as_ref().filter(|t| t.year() > 1)
    }

    pub fn finished(&self) -> Option<&DateTime<Utc>> {
        self.finished_at.as_ref().filter(|t| t.year() > 1)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MemoryStats {
    #[serde(rename = "RSS")]
    pub rss: u64,
    pub usage: u64,
    pub cache: u64,
    pub swap: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CpuStats {
    pub percent: f64,
    pub total_ticks: f64,
    pub throttled_time: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ResourceUsage {
    pub memory_stats: MemoryStats,
    pub cpu_stats: CpuStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskResourceUsage {
    pub resource_usage: ResourceUsage,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AllocResourceUsage {
    pub resource_usage: ResourceUsage,
    pub tasks: HashMap<String, TaskResourceUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_stub_decodes_task_states() {
        let raw = r#"{
            "ID": "5f0c7a1e-0000-0000-0000-000000000000",
            "Name": "web.api[0]",
            "Namespace": "default",
            "JobID": "web",
            "NodeName": "node-1",
            "ClientStatus": "running",
            "CreateTime": 1700000000000000000,
            "TaskStates": {
                "server": {
                    "State": "running",
                    "Failed": false,
                    "StartedAt": "2024-01-01T10:00:00Z",
                    "FinishedAt": "0001-01-01T00:00:00Z"
                }
            }
        }"#;
        let alloc: AllocStub = serde_json::from_str(raw).unwrap();
        let state = &alloc.task_states.as_ref().unwrap()["server"];
        assert_eq!(alloc.job_id, "web");
        assert!(state.started().is_some());
        assert!(state.finished().is_none());
    }

    #[test]
    fn test_job_stub_ignores_unknown_fields() {
        let raw = r#"{"ID":"web","Name":"web","Type":"service","Namespace":"default","Priority":50,"Status":"running","SubmitTime":1,"Datacenters":["dc1"]}"#;
        let job: JobStub = serde_json::from_str(raw).unwrap();
        assert_eq!(job.kind, "service");
        assert_eq!(job.priority, 50);
    }

    #[test]
    fn test_stats_decode() {
        let raw = r#"{"ResourceUsage":{"MemoryStats":{"RSS":1024,"Usage":2048},"CpuStats":{"Percent":12.5}},"Tasks":{"server":{"ResourceUsage":{"MemoryStats":{"RSS":512},"CpuStats":{"Percent":3.0}}}}}"#;
        let usage: AllocResourceUsage = serde_json::from_str(raw).unwrap();
        assert_eq!(usage.resource_usage.memory_stats.rss, 1024);
        assert_eq!(usage.tasks["server"].resource_usage.cpu_stats.percent, 3.0);
    }
}
