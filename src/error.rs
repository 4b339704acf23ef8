//! Domain error types for asset-pack resolution and archive building.

use color_eyre::Report;
use thiserror::Error;

use crate::response::StatusCode;

/// Result alias for operations that may return an [`AssetPackError`].
pub type Result<T> = std::result::Result<T, AssetPackError>;

/// Result alias for archive-building fallible operations.
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Result alias for request-handling fallible operations.
pub type RequestResult<T> = std::result::Result<T, RequestError>;

/// Result alias for configuration fallible operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level error exposed by the crate.
#[derive(Debug, Error)]
pub enum AssetPackError {
    /// Indicates the request could not be served.
    #[error("request failed")]
    Request(#[from] RequestError),
    /// Indicates configuration parsing failed.
    #[error("configuration parsing failed")]
    Config(#[from] ConfigError),
}

/// Categorises build failures so callers can branch on structured errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BuildErrorKind {
    /// The pack source directory does not exist.
    SourceMissing,
    /// The pack source directory exists but cannot be read.
    SourceNotReadable,
    /// The version directory cannot receive a new archive.
    TargetNotWritable,
    /// Adding entries to, or closing, the archive failed.
    ArchiveWrite,
    /// Hashing or renaming the finished archive failed.
    Finalise,
}

/// Captures archive-build failures.
#[derive(Debug, Error)]
#[error("{report}")]
pub struct BuildError {
    kind: BuildErrorKind,
    #[source]
    report: Report,
}

impl BuildError {
    /// Constructs a new build error with the provided kind and diagnostic
    /// report.
    #[must_use]
    pub const fn new(kind: BuildErrorKind, report: Report) -> Self {
        Self { kind, report }
    }

    /// Returns the semantic category for this build failure.
    #[must_use]
    pub const fn kind(&self) -> BuildErrorKind {
        self.kind
    }

    /// Extracts the underlying diagnostic report.
    pub fn into_report(self) -> Report {
        self.report
    }
}

/// Rejections of a malformed subdirectory selection.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The selection text is not valid JSON.
    #[error("selection is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    /// The selection is valid JSON but not an object.
    #[error("selection must be a JSON object")]
    NotAnObject,
    /// A parent's value is not an array.
    #[error("selection for '{parent}' must be an array")]
    NotAnArray {
        /// Parent directory whose value was rejected.
        parent: String,
    },
    /// A parent's array has no entries.
    #[error("selection for '{parent}' must name at least one subdirectory")]
    Empty {
        /// Parent directory whose value was rejected.
        parent: String,
    },
    /// A parent's array contains something other than a string.
    #[error("selection for '{parent}' must only contain directory names")]
    NonStringEntry {
        /// Parent directory whose value was rejected.
        parent: String,
    },
}

/// Failures raised while walking a pack source directory.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The directory walk failed.
    #[error("failed to walk pack source: {0}")]
    Walk(#[from] walkdir::Error),
    /// A path in the pack source is not valid UTF-8.
    #[error("pack source path is not valid UTF-8: {}", .0.display())]
    NonUtf8(std::path::PathBuf),
}

/// Request-level failures; each maps onto a response [`StatusCode`].
#[derive(Debug, Error)]
pub enum RequestError {
    /// A required request property was missing or empty.
    #[error("required property '{name}' is missing or empty")]
    EmptyProperty {
        /// Wire name of the missing property.
        name: &'static str,
    },
    /// Asset directories are not laid out as expected, or a pack has no
    /// version directory at or below the requested version.
    #[error("{message}")]
    BadDirSetup {
        /// Human-readable explanation.
        message: String,
    },
    /// A JSON request property could not be interpreted.
    #[error("{message}")]
    InvalidJson {
        /// Human-readable explanation.
        message: String,
    },
    /// A pack archive could not be generated although its source exists.
    #[error("could not generate asset pack: {pack_id}")]
    Generate {
        /// Pack whose archive failed to build.
        pack_id: String,
        /// Underlying build failure.
        #[source]
        source: BuildError,
    },
}

impl RequestError {
    /// Returns the response status code for this failure.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyProperty { .. } => StatusCode::EmptyProperty,
            Self::BadDirSetup { .. } => StatusCode::BadDirSetup,
            Self::InvalidJson { .. } => StatusCode::InvalidJson,
            Self::Generate { .. } => StatusCode::GenerateError,
        }
    }

    pub(crate) fn bad_dir_setup(message: impl Into<String>) -> Self {
        Self::BadDirSetup {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: message.into(),
        }
    }
}

/// Captures configuration failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConfigError(#[from] Report);
