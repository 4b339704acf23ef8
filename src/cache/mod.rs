//! On-disk cache of asset-pack archives.
//!
//! Archives live beside the pack sources they were built from, inside the
//! release directory:
//!
//! ```text
//! <app>/<version>/<pack id>/...                      pack source tree
//! <app>/<version>/<cache key>-<content hash>.zip     finished archive
//! ```
//!
//! The cache key encodes the pack id and the subdirectory selection, so a
//! lookup needs no index: the archive is found by listing the release
//! directory. Archives are immutable once installed and are never removed
//! here.
//!
//! # Concurrent builds
//!
//! Two requests that miss on the same key may both build. Each writes its
//! own hidden partial file, and both arrive at the same final name because
//! archives are byte-for-byte reproducible. Whichever rename lands second
//! finds the archive already present and reuses it.

mod build;
mod filter;
mod key;
mod locate;
mod writer;

pub use build::build_archive;
pub use filter::{DirectoryFilter, PackEntry};
pub use key::encode_cache_key;
pub use locate::{ArchiveLookup, find_archive};
pub use writer::{ArchiveWriter, ZipPackWriter};

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::BuildResult;
use crate::selection::SelectionSpec;

/// Returns the cached archive for `pack_id` in `version_dir`, building it
/// from `<version_dir>/<pack_id>` on a miss.
///
/// # Errors
///
/// Propagates [`build_archive`] failures on a cache miss.
pub fn locate_or_build(
    version_dir: &Utf8Path,
    pack_id: &str,
    selection: &SelectionSpec,
) -> BuildResult<Utf8PathBuf> {
    let cache_key = encode_cache_key(pack_id, selection);
    match find_archive(version_dir, &cache_key) {
        ArchiveLookup::Hit { archive } => Ok(archive),
        ArchiveLookup::Miss => build_archive(
            pack_id,
            selection,
            version_dir,
            &version_dir.join(pack_id),
        ),
    }
}

#[cfg(test)]
mod tests;
