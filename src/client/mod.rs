//! Aliyun SLS client factory.

pub use self::builder::{SlsClientBuilder, SlsClientBuilderError};
use crate::api::SlsApi;
use crate::config::SlsConfig;
use crate::error::SlsError;
use crate::storage::Storage;
use std::sync::Arc;

mod builder;
mod headers;
mod http;
mod signer;

/// A client for one Aliyun SLS endpoint.
///
/// Constructed once and shared for the process lifetime; cheap to clone, all
/// clones and all [`Storage`] handles share the same connection
/// configuration.
#[derive(Clone)]
pub struct SlsClient {
    api: Arc<dyn SlsApi>,
}

impl std::fmt::Debug for SlsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlsClient").finish_non_exhaustive()
    }
}

impl SlsClient {
    /// Create a new client builder.
    pub fn builder() -> SlsClientBuilder {
        SlsClientBuilder::default()
    }

    /// Build a client from resolved configuration.
    ///
    /// The [`enable`](SlsConfig::enable) gate is deliberately not consulted
    /// here: whether to construct a client at all is the caller's decision.
    pub fn from_config(config: &SlsConfig) -> Result<Self, SlsClientBuilderError> {
        Self::builder()
            .access_key_id(&config.access_key_id)
            .access_key_secret(&config.access_key_secret)?
            .region(&config.region)
            .internal(config.internal)
            .build()
    }

    /// Wrap an arbitrary transport implementation.
    ///
    /// Useful for exercising storages against a fake [`SlsApi`].
    pub fn from_api(api: Arc<dyn SlsApi>) -> Self {
        SlsClient { api }
    }

    /// List the log stores of a project, each wrapped into a [`Storage`]
    /// sharing this client's connection. Issues exactly one remote call; the
    /// error of a failed listing is propagated unchanged.
    pub async fn list_storages_in_project(
        &self,
        project: &str,
    ) -> Result<Vec<Storage>, SlsError> {
        let names = self.api.list_log_stores(project).await?;
        tracing::debug!(project, stores = names.len(), "listed log stores");
        Ok(names
            .into_iter()
            .map(|name| Storage::new(self.api.clone(), project.to_owned(), name))
            .collect())
    }

    /// Get a handle to one log store.
    ///
    /// Purely local construction: no network call is made and the store is
    /// not checked for existence.
    pub fn get_storage(&self, project: impl Into<String>, name: impl Into<String>) -> Storage {
        Storage::new(self.api.clone(), project.into(), name.into())
    }
}
