//! The data source seam: everything that talks to the cluster.
//!
//! The navigator never performs I/O. It describes what it wants with the
//! request types below and `cmd::execute` hands them to a [`DataSource`].

pub mod model;
pub mod nomad;
pub mod rows;

use async_trait::async_trait;

use crate::cmd::admin::AdminAction;
use crate::error::SourceError;
use crate::streaming::events::{ClusterEvent, EventScope};
use crate::streaming::{ExecHandle, StreamHandle};
use crate::structs::{LogKind, PageData, TtySize};

/// What a page fetch should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Jobs,
    JobSpec { namespace: String, job_id: String },
    JobMeta { namespace: String, job_id: String },
    JobTasks { namespace: String, job_id: String },
    AllTasks,
    AllocSpec { namespace: String, alloc_id: String },
    Logs(LogRequest),
    Stats { namespace: String, alloc_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub namespace: String,
    pub alloc_id: String,
    pub task: String,
    pub kind: LogKind,
    /// Bytes back from the end of the log.
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub namespace: String,
    pub alloc_id: String,
    pub task: String,
    /// Argument vector, already split shell-style.
    pub command: Vec<String>,
    pub size: TtySize,
}

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_rows(&self, request: &FetchRequest) -> Result<PageData, SourceError>;

    async fn open_event_stream(&self, scope: &EventScope) -> Result<StreamHandle<ClusterEvent>, SourceError>;

    /// Follows a log from its current end. Items are raw text chunks.
    async fn open_log_tail(&self, request: &LogRequest) -> Result<StreamHandle<String>, SourceError>;

    async fn open_exec_session(&self, request: &ExecRequest) -> Result<ExecHandle, SourceError>;

    /// Runs an admin action, returning the server's acknowledgement.
    async fn run_admin(&self, action: &AdminAction) -> Result<String, SourceError>;
}
