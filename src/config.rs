//! Connection configuration, as resolved by the embedding application.

use serde::Deserialize;

/// Configuration recognized by [`SlsClient::from_config`].
///
/// Whether a client should be constructed at all is the caller's decision:
/// inspect [`enable`](SlsConfig::enable) (and the presence of the section in
/// the application's config tree) before calling the factory. The factory
/// itself only consumes the connection fields.
///
/// [`SlsClient::from_config`]: crate::SlsClient::from_config
#[derive(Debug, Clone, Deserialize)]
pub struct SlsConfig {
    /// Gate flag. `false` (the default) means the client should not be
    /// constructed.
    #[serde(default)]
    pub enable: bool,
    /// Credential id.
    pub access_key_id: String,
    /// Credential secret.
    pub access_key_secret: String,
    /// Geographic endpoint identifier, e.g. `cn-hangzhou`.
    pub region: String,
    /// Route over the intranet-only endpoint variant.
    #[serde(default)]
    pub internal: bool,
}
