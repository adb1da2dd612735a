//! The minimal transport interface between the adapter and the remote
//! service.
//!
//! Exactly three remote operations are used: writing a log group, running a
//! log query, and listing the stores of a project. Keeping them behind a
//! trait lets storages be exercised against a fake transport.

use crate::error::SlsError;
use crate::proto::LogGroup;
use crate::record::RemoteRecord;
use async_trait::async_trait;
use compact_str::CompactString;

/// Parameters of one log query against a single store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetLogsRequest {
    /// Project name.
    pub project: CompactString,
    /// Log store name.
    pub logstore: CompactString,
    /// Window start, epoch seconds.
    pub from: i64,
    /// Window end, epoch seconds.
    pub to: i64,
    /// Free-text query. `None` means no query key is transmitted at all.
    pub query: Option<CompactString>,
    /// Topic filter.
    pub topic: Option<CompactString>,
    /// Maximum number of returned rows.
    pub line: Option<u32>,
    /// Row offset for caller-driven pagination.
    pub offset: Option<u32>,
}

/// The three remote SLS operations this crate relies on.
///
/// Each method issues exactly one network request; no retries, batching or
/// pagination happen at this level.
#[async_trait]
pub trait SlsApi: Send + Sync {
    /// Write one log group to `project`/`logstore`. One atomic call; there is
    /// no partial success.
    async fn put_log_group(
        &self,
        project: &str,
        logstore: &str,
        group: LogGroup,
    ) -> Result<(), SlsError>;

    /// Run a log query, returning the raw rows in service order.
    async fn get_logs(&self, request: GetLogsRequest) -> Result<Vec<RemoteRecord>, SlsError>;

    /// List the log store names of a project.
    async fn list_log_stores(&self, project: &str) -> Result<Vec<String>, SlsError>;
}
