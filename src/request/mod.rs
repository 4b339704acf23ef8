//! Request orchestration: validates a request, resolves each pack, and
//! collects the public archive paths.
//!
//! A request names an application, the release it runs, and the packs it
//! wants. Each pack is served from the highest release at or below the
//! requested one that still ships it. Packs whose source disappears between
//! resolution and building are left out of the response instead of failing
//! the request.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use crate::ServiceSettings;
use crate::cache::locate_or_build;
use crate::error::{BuildError, RequestError, RequestResult, SelectionError};
use crate::observability::REQUEST_TARGET;
use crate::response::{AssetPackInfo, PackInfo, PackResponse};
use crate::selection::SelectionSpec;
use crate::version::resolve_version_dir;

/// Raw request properties as received from the client.
///
/// Values are kept as supplied; [`serve`] validates them in a fixed order so
/// the first problem found decides the status code.
///
/// # Examples
/// ```
/// use asset_pack_cache::RequestContext;
///
/// let request = RequestContext {
///     app_id: Some("com.example.game".into()),
///     app_version: Some("12".into()),
///     asset_pack_ids: Some(r#"["world-sand"]"#.into()),
///     select_subdirs: None,
/// };
/// assert!(request.select_subdirs.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Application identifier; names a directory under the packs root.
    pub app_id: Option<String>,
    /// Release the client runs.
    pub app_version: Option<String>,
    /// JSON array of pack identifiers.
    pub asset_pack_ids: Option<String>,
    /// Optional JSON object selecting subdirectories to archive.
    pub select_subdirs: Option<String>,
}

/// Serves a request and wraps the outcome in a [`PackResponse`].
///
/// # Examples
/// ```no_run
/// use asset_pack_cache::{RequestContext, ServiceSettings, handle_request};
///
/// let settings = ServiceSettings {
///     packs_root: "packs".into(),
///     public_prefix: "packs".into(),
/// };
/// let response = handle_request(&settings, &RequestContext::default());
/// assert_eq!(response.status_code.code(), 2);
/// ```
#[must_use]
pub fn handle_request(settings: &ServiceSettings, request: &RequestContext) -> PackResponse {
    PackResponse::from(serve(settings, request))
}

/// Validates `request` and resolves every requested pack.
///
/// Packs are processed in request order. The first fatal pack aborts the
/// request; a repeated identifier yields a single response entry.
///
/// # Errors
///
/// - [`RequestError::EmptyProperty`] when `appId`, `appVersion` or
///   `assetPackIds` is missing or empty
/// - [`RequestError::BadDirSetup`] when the application directory does not
///   exist or a pack has no release at or below the requested one
/// - [`RequestError::InvalidJson`] when the selection or the pack list cannot
///   be interpreted
/// - [`RequestError::Generate`] when a pack's archive cannot be built although
///   its source is present
pub fn serve(settings: &ServiceSettings, request: &RequestContext) -> RequestResult<AssetPackInfo> {
    let app_id = required(request.app_id.as_deref(), "appId")?;
    let app_version = required(request.app_version.as_deref(), "appVersion")?;
    let pack_list = required(request.asset_pack_ids.as_deref(), "assetPackIds")?;

    let app_root = app_directory(&settings.packs_root, app_id)?;
    let selection = parse_selection(request.select_subdirs.as_deref())?;
    let pack_ids = parse_pack_ids(pack_list)?;

    debug!(
        target: REQUEST_TARGET,
        app_id,
        app_version,
        packs = pack_ids.len(),
        "serving asset pack request"
    );

    let mut info = AssetPackInfo::new();
    for pack_id in pack_ids {
        if let Some(relative_path) =
            serve_pack(settings, &app_root, app_version, &pack_id, &selection)?
        {
            info.insert(pack_id, PackInfo { relative_path });
        }
    }
    Ok(info)
}

/// Resolves one pack to its public archive path.
///
/// Returns `Ok(None)` when the build failed because the pack source is gone.
fn serve_pack(
    settings: &ServiceSettings,
    app_root: &Utf8Path,
    app_version: &str,
    pack_id: &str,
    selection: &SelectionSpec,
) -> RequestResult<Option<String>> {
    let Some(version_dir) = resolve_version_dir(app_root, app_version, pack_id) else {
        warn!(
            target: REQUEST_TARGET,
            pack_id,
            app_version,
            "no release serves asset pack"
        );
        return Err(RequestError::bad_dir_setup(format!(
            "no matching asset directory found: {pack_id}"
        )));
    };

    match locate_or_build(&version_dir.path, pack_id, selection) {
        Ok(archive) => public_path(settings, &archive).map(Some),
        Err(err) => omit_or_fail(&version_dir.pack_source(pack_id), pack_id, err).map(|()| None),
    }
}

/// Decides whether a failed build omits the pack or fails the request.
///
/// The source check runs after the build attempt, so a source removed in
/// between is reported as absent.
fn omit_or_fail(source_dir: &Utf8Path, pack_id: &str, err: BuildError) -> RequestResult<()> {
    if source_dir.exists() {
        warn!(
            target: REQUEST_TARGET,
            pack_id,
            kind = ?err.kind(),
            error = %err,
            "asset pack archive could not be generated"
        );
        return Err(RequestError::Generate {
            pack_id: pack_id.to_owned(),
            source: err,
        });
    }
    info!(
        target: REQUEST_TARGET,
        pack_id,
        source = %source_dir,
        "asset pack source absent; omitting from response"
    );
    Ok(())
}

/// Clients send `"0"` for a property they leave unset.
const UNSET: &str = "0";

fn is_unset(text: &str) -> bool {
    text.is_empty() || text == UNSET
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> RequestResult<&'a str> {
    match value {
        Some(text) if !is_unset(text) => Ok(text),
        _ => Err(RequestError::EmptyProperty { name }),
    }
}

fn app_directory(packs_root: &Utf8Path, app_id: &str) -> RequestResult<Utf8PathBuf> {
    let app_root = packs_root.join(app_id);
    if is_plain_component(app_id) && app_root.is_dir() {
        Ok(app_root)
    } else {
        Err(RequestError::bad_dir_setup("app ID directory does not exist"))
    }
}

fn parse_selection(text: Option<&str>) -> RequestResult<SelectionSpec> {
    let Some(json) = text.filter(|raw| !is_unset(raw.trim())) else {
        return Ok(SelectionSpec::empty());
    };
    SelectionSpec::from_json(json).map_err(|err| {
        let message = match err {
            SelectionError::Malformed(_) | SelectionError::NotAnObject => {
                "bad selected subdirs JSON"
            }
            SelectionError::NotAnArray { .. }
            | SelectionError::Empty { .. }
            | SelectionError::NonStringEntry { .. } => {
                "selected subdirs values must be arrays with at least one element"
            }
        };
        RequestError::invalid_json(message)
    })
}

fn parse_pack_ids(text: &str) -> RequestResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(text)
        .ok()
        .filter(|ids| ids.iter().all(|id| is_plain_component(id)))
        .ok_or_else(|| RequestError::invalid_json("bad asset pack IDs JSON"))
}

/// Whether `name` can only ever name a direct child directory.
fn is_plain_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Rewrites an archive path under the packs root into its public form.
fn public_path(settings: &ServiceSettings, archive: &Utf8Path) -> RequestResult<String> {
    let relative = archive.strip_prefix(&settings.packs_root).map_err(|_| {
        RequestError::bad_dir_setup(format!("archive {archive} lies outside the packs root"))
    })?;
    let parts: Vec<&str> = relative.components().map(|part| part.as_str()).collect();
    Ok(format!(
        "{}/{}",
        settings.public_prefix.trim_end_matches('/'),
        parts.join("/")
    ))
}
