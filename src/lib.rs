//! Resolves versioned asset packs to cached zip archives.
//!
//! Packs live under a packs root as `<app>/<version>/<pack>/...`. A request
//! for a pack at some application release is served from the highest release
//! directory at or below it that still ships the pack. Archives are built on
//! first request, optionally narrowed by a subdirectory selection, and cached
//! next to their sources under a name that encodes the pack, the selection,
//! and a checksum of the archive bytes.
//!
//! The library exposes the resolution and caching engine ([`resolve_version_dir`],
//! [`locate_or_build`], [`build_archive`], [`find_archive`]) and a request
//! layer ([`serve`], [`handle_request`]) that validates client input and
//! renders the [`PackResponse`] document.

mod cache;
mod error;
mod fs;
mod observability;
mod request;
mod response;
mod selection;
#[doc(hidden)]
pub mod test_support;
mod version;

pub use cache::{
    ArchiveLookup, ArchiveWriter, DirectoryFilter, PackEntry, ZipPackWriter, build_archive,
    encode_cache_key, find_archive, locate_or_build,
};
pub use error::{
    AssetPackError, BuildError, BuildErrorKind, BuildResult, ConfigError, ConfigResult,
    FilterError, RequestError, RequestResult, Result, SelectionError,
};
pub use request::{RequestContext, handle_request, serve};
pub use response::{AssetPackInfo, PackInfo, PackResponse, StatusCode};
pub use selection::SelectionSpec;
pub use version::{VersionDir, resolve_version_dir};

use camino::Utf8PathBuf;
use color_eyre::eyre::eyre;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;

/// Packs root used when none is configured.
const DEFAULT_PACKS_ROOT: &str = "packs";

/// Public path prefix used when none is configured.
const DEFAULT_PUBLIC_PREFIX: &str = "packs";

/// Captures service settings supplied via environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, OrthoConfig, Default)]
#[ortho_config(prefix = "ASSET_PACK")]
///
/// # Examples
/// ```
/// use asset_pack_cache::PackEnvCfg;
///
/// let cfg = PackEnvCfg::default();
/// assert!(cfg.packs_root.is_none());
/// ```
pub struct PackEnvCfg {
    /// Directory holding one subdirectory per application.
    pub packs_root: Option<Utf8PathBuf>,
    /// Prefix under which the packs root is published to clients.
    pub public_prefix: Option<String>,
}

impl PackEnvCfg {
    /// Loads configuration from environment variables without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a variable cannot be interpreted.
    pub fn load() -> ConfigResult<Self> {
        let args = [OsString::from("asset-pack-cache")];
        Self::load_from_iter(args).map_err(|err| ConfigError::from(eyre!(err)))
    }

    /// Converts the configuration into [`ServiceSettings`], applying defaults
    /// for unset values.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a configured value is blank.
    pub fn to_settings(&self) -> ConfigResult<ServiceSettings> {
        let packs_root = self
            .packs_root
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_PACKS_ROOT));
        if packs_root.as_str().trim().is_empty() {
            return Err(ConfigError::from(eyre!(
                "ASSET_PACK_PACKS_ROOT must not be blank"
            )));
        }

        let public_prefix = self
            .public_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_PUBLIC_PREFIX.to_owned());
        if public_prefix.trim().is_empty() {
            return Err(ConfigError::from(eyre!(
                "ASSET_PACK_PUBLIC_PREFIX must not be blank"
            )));
        }

        Ok(ServiceSettings {
            packs_root,
            public_prefix,
        })
    }
}

/// Loads [`ServiceSettings`] from the environment and serves `request`.
///
/// Request failures are reported inside the returned [`PackResponse`]; only
/// configuration problems surface as errors.
///
/// # Errors
///
/// Returns [`AssetPackError::Config`] when the environment cannot be
/// interpreted.
pub fn run(request: &RequestContext) -> Result<PackResponse> {
    let settings = PackEnvCfg::load()?.to_settings()?;
    Ok(handle_request(&settings, request))
}

/// Resolved settings the request layer runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Directory holding one subdirectory per application.
    pub packs_root: Utf8PathBuf,
    /// Prefix prepended to archive paths reported to clients.
    pub public_prefix: String,
}
