//! Response document and status codes returned to asset-pack clients.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::RequestError;

/// Outcome codes understood by clients.
///
/// Code `1` is reserved for the HTTP boundary, which rejects requests that
/// were not POSTed before they reach this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
#[repr(u8)]
pub enum StatusCode {
    /// Every requested pack was resolved.
    Success = 0,
    /// A required request property was missing or empty.
    EmptyProperty = 2,
    /// Asset directories are not set up as expected.
    BadDirSetup = 3,
    /// A request property contained invalid JSON.
    InvalidJson = 4,
    /// An asset pack archive could not be generated.
    GenerateError = 5,
}

impl StatusCode {
    /// Returns the numeric code, also used as the process exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

/// Download information for one resolved pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackInfo {
    /// Archive location relative to the public web root.
    pub relative_path: String,
}

/// Resolved packs keyed by pack identifier.
pub type AssetPackInfo = BTreeMap<String, PackInfo>;

/// The document written back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackResponse {
    /// Outcome of the request.
    pub status_code: StatusCode,
    /// Human-readable outcome.
    pub message: String,
    /// Present only when the request succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_pack_info: Option<AssetPackInfo>,
}

impl PackResponse {
    /// Builds a success response carrying the resolved packs.
    #[must_use]
    pub fn success(info: AssetPackInfo) -> Self {
        Self {
            status_code: StatusCode::Success,
            message: "ok".to_owned(),
            asset_pack_info: Some(info),
        }
    }

    /// Builds a failure response from a request error.
    #[must_use]
    pub fn failure(err: &RequestError) -> Self {
        Self {
            status_code: err.status_code(),
            message: err.to_string(),
            asset_pack_info: None,
        }
    }
}

impl From<Result<AssetPackInfo, RequestError>> for PackResponse {
    fn from(outcome: Result<AssetPackInfo, RequestError>) -> Self {
        match outcome {
            Ok(info) => Self::success(info),
            Err(err) => Self::failure(&err),
        }
    }
}
