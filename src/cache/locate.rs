//! Archive lookup and hit/miss detection.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use super::key::{ARCHIVE_EXTENSION, KEY_SEPARATOR};
use crate::observability::CACHE_TARGET;

/// Result of an archive lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLookup {
    /// A finished archive exists for the key.
    Hit {
        /// Path to the cached archive.
        archive: Utf8PathBuf,
    },
    /// No archive exists yet; one has to be built.
    Miss,
}

impl ArchiveLookup {
    /// Returns the archive path on a hit.
    #[must_use]
    pub fn into_archive(self) -> Option<Utf8PathBuf> {
        match self {
            Self::Hit { archive } => Some(archive),
            Self::Miss => None,
        }
    }
}

/// Looks for a finished archive named `<cache_key>-<hash>.zip` in
/// `directory`.
///
/// Every regular file whose name starts with `cache_key` and ends in `.zip`
/// is a candidate, visited in ascending name order. A candidate matches only
/// if `cache_key` is followed by exactly one `-` and the remainder holds no
/// further `-`. This keeps `pack` from claiming the archives of a longer key
/// such as `pack-ext`.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use asset_pack_cache::{ArchiveLookup, find_archive};
///
/// let version_dir = Utf8Path::new("packs/com.example.game/10");
/// match find_archive(version_dir, "world-sand-tildxt") {
///     ArchiveLookup::Hit { archive } => println!("cached at {archive}"),
///     ArchiveLookup::Miss => println!("needs a build"),
/// }
/// ```
#[must_use]
pub fn find_archive(directory: &Utf8Path, cache_key: &str) -> ArchiveLookup {
    let Some(candidates) = list_candidates(directory, cache_key) else {
        return ArchiveLookup::Miss;
    };

    let found = candidates
        .into_iter()
        .find(|(name, _)| is_archive_for_key(name, cache_key));

    if let Some((_, archive)) = found {
        debug!(
            target: CACHE_TARGET,
            cache_key,
            path = %archive,
            "archive cache hit"
        );
        ArchiveLookup::Hit { archive }
    } else {
        debug!(
            target: CACHE_TARGET,
            cache_key,
            directory = %directory,
            "archive cache miss"
        );
        ArchiveLookup::Miss
    }
}

/// Lists regular files named `<cache_key>*.zip`, sorted by name.
fn list_candidates(directory: &Utf8Path, cache_key: &str) -> Option<Vec<(String, Utf8PathBuf)>> {
    let entries = match directory.read_dir_utf8() {
        Ok(entries) => entries,
        Err(err) => {
            debug!(
                target: CACHE_TARGET,
                directory = %directory,
                error = %err,
                "failed to read archive directory"
            );
            return None;
        }
    };

    let mut candidates: Vec<(String, Utf8PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            name.starts_with(cache_key) && name.ends_with(ARCHIVE_EXTENSION)
        })
        .filter(|entry| entry.path().is_file())
        .map(|entry| (entry.file_name().to_owned(), entry.into_path()))
        .collect();
    candidates.sort();
    Some(candidates)
}

/// Checks that `file_name` is `cache_key`, one separator, then a hash segment
/// free of separators.
fn is_archive_for_key(file_name: &str, cache_key: &str) -> bool {
    file_name
        .strip_prefix(cache_key)
        .and_then(|rest| rest.strip_prefix(KEY_SEPARATOR))
        .is_some_and(|hash_segment| !hash_segment.contains(KEY_SEPARATOR))
}
