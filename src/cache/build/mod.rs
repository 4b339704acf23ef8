//! Archive generation for cache misses.

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::Report;
use color_eyre::eyre::{Context, eyre};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use tempfile::NamedTempFile;
use tracing::debug;

use super::filter::DirectoryFilter;
use super::key::{KEY_SEPARATOR, archive_file_name, encode_cache_key};
use super::writer::{ArchiveWriter, ZipPackWriter};
use crate::error::{BuildError, BuildErrorKind, BuildResult};
use crate::fs::{ensure_readable_dir, ensure_readable_file, ensure_writable_dir};
use crate::observability::CACHE_TARGET;
use crate::selection::SelectionSpec;

/// Suffix of archives that are still being written.
const PARTIAL_SUFFIX: &str = ".zip.part";

/// Builds the archive for `pack_id` from `source_dir` and installs it in
/// `target_dir` as `<cache key>-<content hash>.zip`.
///
/// The archive is first written to a hidden, randomly named partial file in
/// `target_dir`, then hashed with Adler-32 and renamed into place. If another
/// build already installed an archive under the same name, that archive is
/// kept and its path returned. On failure the partial file is removed.
///
/// # Errors
///
/// Returns a [`BuildError`] whose kind reports which step failed:
/// - [`BuildErrorKind::SourceMissing`] if `source_dir` does not exist
/// - [`BuildErrorKind::SourceNotReadable`] if the source tree or one of its
///   files cannot be read
/// - [`BuildErrorKind::TargetNotWritable`] if `target_dir` cannot receive the
///   archive
/// - [`BuildErrorKind::ArchiveWrite`] if the archive writer fails
/// - [`BuildErrorKind::Finalise`] if hashing or renaming fails
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use asset_pack_cache::{SelectionSpec, build_archive};
///
/// let version_dir = Utf8Path::new("packs/com.example.game/10");
/// let archive = build_archive(
///     "world-sand",
///     &SelectionSpec::empty(),
///     version_dir,
///     &version_dir.join("world-sand"),
/// )?;
/// println!("built {archive}");
/// # Ok::<(), asset_pack_cache::BuildError>(())
/// ```
pub fn build_archive(
    pack_id: &str,
    selection: &SelectionSpec,
    target_dir: &Utf8Path,
    source_dir: &Utf8Path,
) -> BuildResult<Utf8PathBuf> {
    ensure_source_dir(source_dir)?;
    ensure_target_dir(target_dir)?;

    let cache_key = encode_cache_key(pack_id, selection);
    log_build_start(&cache_key, source_dir, target_dir);

    let mut partial = tempfile::Builder::new()
        .prefix(&format!(".{cache_key}{KEY_SEPARATOR}"))
        .suffix(PARTIAL_SUFFIX)
        .tempfile_in(target_dir)
        .with_context(|| format!("failed to create partial archive in {target_dir}"))
        .map_err(with_kind(BuildErrorKind::TargetNotWritable))?;

    let entries = write_archive(
        ZipPackWriter::new(BufWriter::new(partial.as_file_mut())),
        source_dir,
        selection,
    )?;

    let hash = content_hash(partial.path())?;
    let archive = target_dir.join(archive_file_name(&cache_key, &hash));
    install_archive(partial, &archive)?;

    log_build_complete(&cache_key, &archive, entries);
    Ok(archive)
}

/// Feeds every file admitted by the selection into `writer` and closes it.
///
/// Returns the number of entries written.
pub(crate) fn write_archive<W: ArchiveWriter>(
    mut writer: W,
    source_dir: &Utf8Path,
    selection: &SelectionSpec,
) -> BuildResult<usize> {
    let mut entries = 0_usize;
    for walked in DirectoryFilter::new(selection).walk(source_dir) {
        let entry = walked
            .with_context(|| format!("failed to walk pack source {source_dir}"))
            .map_err(with_kind(BuildErrorKind::SourceNotReadable))?;
        ensure_readable_file(&entry.source)
            .map_err(with_kind(BuildErrorKind::SourceNotReadable))?;

        let entry_name = entry.entry_name();
        writer
            .add_file(&entry.source, &entry_name)
            .with_context(|| format!("failed to add {entry_name} to archive"))
            .map_err(with_kind(BuildErrorKind::ArchiveWrite))?;
        entries += 1;
    }

    writer
        .finish()
        .context("failed to finalise archive")
        .map_err(with_kind(BuildErrorKind::ArchiveWrite))?;
    Ok(entries)
}

/// Adler-32 of the file at `path` as eight lowercase hex digits.
pub(crate) fn content_hash(path: &std::path::Path) -> BuildResult<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open archive for hashing: {}", path.display()))
        .map_err(with_kind(BuildErrorKind::Finalise))?;
    let checksum = adler2::adler32(BufReader::new(file))
        .with_context(|| format!("failed to hash archive: {}", path.display()))
        .map_err(with_kind(BuildErrorKind::Finalise))?;
    Ok(format!("{checksum:08x}"))
}

/// Renames the partial archive into place without replacing an existing
/// archive of the same name.
fn install_archive(partial: NamedTempFile, archive: &Utf8Path) -> BuildResult<()> {
    match partial.persist_noclobber(archive) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
            debug!(
                target: CACHE_TARGET,
                path = %archive,
                "archive already installed by a concurrent build"
            );
            Ok(())
        }
        Err(err) => Err(BuildError::new(
            BuildErrorKind::Finalise,
            Report::new(err.error).wrap_err(format!("failed to install archive {archive}")),
        )),
    }
}

fn ensure_source_dir(source_dir: &Utf8Path) -> BuildResult<()> {
    if !source_dir.is_dir() {
        return Err(BuildError::new(
            BuildErrorKind::SourceMissing,
            eyre!("pack source directory does not exist: {source_dir}"),
        ));
    }
    ensure_readable_dir(source_dir).map_err(with_kind(BuildErrorKind::SourceNotReadable))
}

fn ensure_target_dir(target_dir: &Utf8Path) -> BuildResult<()> {
    if !target_dir.is_dir() {
        return Err(BuildError::new(
            BuildErrorKind::TargetNotWritable,
            eyre!("archive directory does not exist: {target_dir}"),
        ));
    }
    ensure_writable_dir(target_dir).map_err(with_kind(BuildErrorKind::TargetNotWritable))
}

fn with_kind(kind: BuildErrorKind) -> impl Fn(Report) -> BuildError {
    move |report| BuildError::new(kind, report)
}

fn log_build_start(cache_key: &str, source_dir: &Utf8Path, target_dir: &Utf8Path) {
    debug!(
        target: CACHE_TARGET,
        cache_key,
        source = %source_dir,
        target = %target_dir,
        "building archive"
    );
}

fn log_build_complete(cache_key: &str, archive: &Utf8Path, entries: usize) {
    debug!(
        target: CACHE_TARGET,
        cache_key,
        path = %archive,
        entries,
        "archive build completed"
    );
}
