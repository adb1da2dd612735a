//! Client for [Aliyun SLS](https://help.aliyun.com/zh/sls/) (Simple Log
//! Service) log stores.
//!
//! An [`SlsClient`] is built once per process from connection configuration
//! and hands out [`Storage`] handles, one per `(project, logstore)` pair.
//! A storage writes generic [`LogRecord`]s and reads them back, translating
//! to and from the SLS wire format at the boundary. Everything is a single
//! request per call: retries, pagination and timeouts are the caller's (or
//! the HTTP stack's) concern.
//!
//! ```no_run
//! use sls_logstore::{FindOptions, LogRecord, SlsClient, WriteOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SlsClient::builder()
//!     .access_key_id("LTAI4example")
//!     .access_key_secret("secret")?
//!     .region("cn-hangzhou")
//!     .build()?;
//!
//! let storage = client.get_storage("my-project", "app-log");
//! storage
//!     .put_log(
//!         &LogRecord::new().with("level", "info").with("msg", "started"),
//!         &WriteOptions::new().with_topic("app"),
//!     )
//!     .await?;
//!
//! let records = storage
//!     .get_logs(1700000000i64, 1700000600i64, &FindOptions::new().with_line(100))
//!     .await?;
//! # let _ = records;
//! # Ok(())
//! # }
//! ```
//!
//! The transport behind a client is the minimal [`SlsApi`] interface; tests
//! can substitute a fake implementation via [`SlsClient::from_api`].
#![deny(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod client;
mod config;
mod error;
mod proto;
mod record;
mod storage;

pub use api::{GetLogsRequest, SlsApi};
pub use client::{SlsClient, SlsClientBuilder, SlsClientBuilderError};
pub use config::SlsConfig;
pub use error::SlsError;
pub use proto::{Log, LogGroup};
pub use record::{FieldValue, LogRecord, RemoteRecord};
pub use storage::{FindOptions, QueryTime, Storage, WriteOptions};

#[cfg(test)]
#[cfg_attr(test, ctor::ctor)]
fn init() {
    // Initialize the tracing subscriber for tests
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .init();
}
