use crate::client::SlsClient;
use crate::client::http::HttpApi;
use crate::client::signer::Signer;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::sync::Arc;

const SERVICE_DOMAIN: &str = "sls.aliyuncs.com";
const INTRANET_SUFFIX: &str = "-intranet";

/// Builder error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SlsClientBuilderError {
    /// Invalid access secret length.
    #[error("invalid access secret length")]
    Hmac,
    /// Missing required field in the builder.
    #[error("missing required field: {0}")]
    Missing(&'static str),
}

/// Builder for an [`SlsClient`] bound to one regional endpoint.
#[derive(Default)]
pub struct SlsClientBuilder {
    access_key_id: Option<String>,
    hmac: Option<Hmac<Sha1>>,
    region: Option<String>,
    internal: bool,
}

type Result<T, E = SlsClientBuilderError> = std::result::Result<T, E>;

impl SlsClientBuilder {
    /// Set the credential id.
    pub fn access_key_id(mut self, access_key_id: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self
    }

    /// Set the credential secret.
    pub fn access_key_secret(mut self, access_key_secret: impl AsRef<[u8]>) -> Result<Self> {
        self.hmac = Some(
            Hmac::<Sha1>::new_from_slice(access_key_secret.as_ref())
                .map_err(|_| SlsClientBuilderError::Hmac)?,
        );
        Ok(self)
    }

    /// Set the geographic endpoint identifier, e.g. `cn-hangzhou`.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Route over the intranet-only endpoint variant.
    ///
    /// Disabled by default.
    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    /// Build the client. No network call happens here; the connection is
    /// established lazily on first use.
    pub fn build(self) -> Result<SlsClient> {
        let access_key_id = self
            .access_key_id
            .ok_or(SlsClientBuilderError::Missing("access_key_id"))?;
        let hmac = self
            .hmac
            .ok_or(SlsClientBuilderError::Missing("access_key_secret"))?;
        let region = self
            .region
            .ok_or(SlsClientBuilderError::Missing("region"))?;

        let endpoint = endpoint_host(&region, self.internal);
        let api = HttpApi::new(
            endpoint,
            Signer {
                hmac,
                access_key_id,
            },
        );
        Ok(SlsClient::from_api(Arc::new(api)))
    }
}

fn endpoint_host(region: &str, internal: bool) -> String {
    if internal {
        format!("{region}{INTRANET_SUFFIX}.{SERVICE_DOMAIN}")
    } else {
        format!("{region}.{SERVICE_DOMAIN}")
    }
}
