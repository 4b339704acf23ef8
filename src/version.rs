//! Best-match version directory resolution.
//!
//! An application root holds one directory per integer-named release. Each
//! release directory holds one directory per pack it ships. A request for
//! version `v` is served from the highest release whose name is `<= v` and
//! which still ships the pack.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

use crate::observability::CACHE_TARGET;

/// A release directory selected for a pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDir {
    /// Directory name, which is the release number.
    pub version: String,
    /// Full path to the release directory.
    pub path: Utf8PathBuf,
}

impl VersionDir {
    /// Path of the pack's source tree inside this release.
    #[must_use]
    pub fn pack_source(&self, pack_id: &str) -> Utf8PathBuf {
        self.path.join(pack_id)
    }
}

/// Finds the best-matching release directory for `pack_id`.
///
/// Release directories are visited from the highest integer value down. The
/// first one whose name compares `<=` `target_version` and which contains a
/// `pack_id` subdirectory wins.
///
/// The `<=` test compares numerically only when both the directory name and
/// the target are integer literals. Otherwise it falls back to byte-wise
/// string comparison, which disagrees with numeric order across digit counts:
/// a target of `"9b"` is served from release `10` because `"10" <= "9b"`.
/// Decimal and exponent forms such as `"12.0"` or `"1e1"` are not integer
/// literals either, so release `9` is not served for a target of `"12.0"`
/// because `"9" > "12.0"` as strings.
///
/// Returns `None` when no release qualifies or the application root cannot
/// be read.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use asset_pack_cache::resolve_version_dir;
///
/// let app_root = Utf8Path::new("packs/com.example.game");
/// if let Some(found) = resolve_version_dir(app_root, "12", "world-sand") {
///     println!("serving world-sand from release {}", found.version);
/// }
/// ```
#[must_use]
pub fn resolve_version_dir(
    app_root: &Utf8Path,
    target_version: &str,
    pack_id: &str,
) -> Option<VersionDir> {
    let dir_entries = read_app_directory(app_root)?;

    let mut candidates: Vec<(i64, VersionDir)> = dir_entries
        .filter_map(Result::ok)
        .filter_map(|entry| try_parse_version_entry(&entry))
        .collect();
    candidates.sort_by(|(num_a, dir_a), (num_b, dir_b)| {
        num_b.cmp(num_a).then_with(|| dir_b.version.cmp(&dir_a.version))
    });

    let found = candidates.into_iter().map(|(_, dir)| dir).find(|dir| {
        version_not_above(&dir.version, target_version) && dir.pack_source(pack_id).is_dir()
    });

    match &found {
        Some(dir) => debug!(
            target: CACHE_TARGET,
            pack_id,
            target_version,
            matched_version = %dir.version,
            path = %dir.path,
            "resolved version directory"
        ),
        None => debug!(
            target: CACHE_TARGET,
            pack_id,
            target_version,
            app_root = %app_root,
            "no version directory serves pack"
        ),
    }
    found
}

/// Reads the application root, logging errors as debug messages.
fn read_app_directory(app_root: &Utf8Path) -> Option<fs::ReadDir> {
    match fs::read_dir(app_root) {
        Ok(entries) => Some(entries),
        Err(err) => {
            debug!(
                target: CACHE_TARGET,
                app_root = %app_root,
                error = %err,
                "failed to read application directory"
            );
            None
        }
    }
}

/// Interprets a directory entry as a release directory with its sort key.
fn try_parse_version_entry(entry: &fs::DirEntry) -> Option<(i64, VersionDir)> {
    let path = entry.path();
    let dir_name = path.file_name()?.to_str()?;

    if dir_name.starts_with('.') || !path.is_dir() {
        return None;
    }

    let number = leading_integer(dir_name);
    let version = dir_name.to_owned();
    let utf8_path = Utf8PathBuf::from_path_buf(path).ok()?;
    Some((
        number,
        VersionDir {
            version,
            path: utf8_path,
        },
    ))
}

/// Compares a release name against the requested version.
fn version_not_above(name: &str, target: &str) -> bool {
    match (parse_integer_literal(name), parse_integer_literal(target)) {
        (Some(release), Some(requested)) => release <= requested,
        _ => name <= target,
    }
}

/// Parses a string that is entirely an integer literal, ignoring surrounding
/// whitespace.
fn parse_integer_literal(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// Integer value of a directory name's leading digits, with an optional
/// sign. Names without leading digits count as zero.
fn leading_integer(name: &str) -> i64 {
    let trimmed = name.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let magnitude = digits
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0_i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit))
        });
    if negative { -magnitude } else { magnitude }
}
