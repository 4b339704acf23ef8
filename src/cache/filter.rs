//! Selection-aware traversal of a pack source tree.

use camino::{Utf8Path, Utf8PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::FilterError;
use crate::selection::SelectionSpec;

/// Leading byte of names that are never archived.
const HIDDEN_MARKER: u8 = b'.';

/// A file that belongs in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackEntry {
    /// Location of the file on disk.
    pub source: Utf8PathBuf,
    /// Path relative to the traversal root, used as the archive entry name.
    pub relative: Utf8PathBuf,
}

impl PackEntry {
    /// Entry name with `/` separators regardless of platform.
    #[must_use]
    pub fn entry_name(&self) -> String {
        self.relative
            .components()
            .map(|component| component.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Decides which entries of a pack source tree are archived.
///
/// Hidden files and directories are skipped. A directory directly beneath a
/// parent named in the selection is only entered if the selection retains
/// it; all other directories are entered.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryFilter<'a> {
    selection: &'a SelectionSpec,
}

impl<'a> DirectoryFilter<'a> {
    /// Creates a filter applying `selection`.
    #[must_use]
    pub const fn new(selection: &'a SelectionSpec) -> Self {
        Self { selection }
    }

    /// Returns `true` if `entry` should be visited.
    ///
    /// The traversal root is always visited. Names are matched on their raw
    /// bytes, so a directory whose name is not valid UTF-8 is never retained
    /// beneath a parent the selection names.
    #[must_use]
    pub fn admits(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let raw_name = entry.file_name();
        if raw_name.as_encoded_bytes().first() == Some(&HIDDEN_MARKER) {
            return false;
        }
        if !entry.file_type().is_dir() {
            return true;
        }
        let Some(parent) = entry
            .path()
            .parent()
            .and_then(|parent| parent.file_name())
            .and_then(|parent| parent.to_str())
        else {
            return true;
        };
        raw_name.to_str().map_or_else(
            || !self.selection.filters(parent),
            |name| self.selection.retains(parent, name),
        )
    }

    /// Walks `root` depth-first, lazily yielding every admitted file.
    ///
    /// Each call starts a fresh traversal. Siblings are visited in file-name
    /// order. Symbolic links to files are yielded; symbolic links to
    /// directories are not followed.
    pub fn walk(
        self,
        root: &Utf8Path,
    ) -> impl Iterator<Item = Result<PackEntry, FilterError>> + use<'a> {
        WalkDir::new(root.as_std_path())
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| self.admits(entry))
            .filter_map(move |walked| match walked {
                Ok(entry) if is_archivable_file(&entry) => Some(pack_entry(entry)),
                Ok(_) => None,
                Err(err) => Some(Err(FilterError::Walk(err))),
            })
    }
}

fn is_archivable_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

/// The entry's depth counts the components below the traversal root.
fn pack_entry(entry: DirEntry) -> Result<PackEntry, FilterError> {
    let depth = entry.depth();
    let source = Utf8PathBuf::from_path_buf(entry.into_path()).map_err(FilterError::NonUtf8)?;
    let mut below_root: Vec<_> = source.components().rev().take(depth).collect();
    below_root.reverse();
    let relative = below_root.into_iter().collect();
    Ok(PackEntry { source, relative })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn source_tree(files: &[&str]) -> (TempDir, Utf8PathBuf) {
        let temp = tempdir().expect("tempdir");
        let root = Utf8Path::from_path(temp.path())
            .expect("utf8 path")
            .join("pack");
        fs::create_dir_all(&root).expect("create root");
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().expect("parent")).expect("create parents");
            fs::write(&path, *file).expect("write file");
        }
        (temp, root)
    }

    fn walked(root: &Utf8Path, selection: &SelectionSpec) -> Vec<String> {
        DirectoryFilter::new(selection)
            .walk(root)
            .map(|entry| entry.expect("walk entry").entry_name())
            .collect()
    }

    #[test]
    fn keeps_only_selected_children() {
        let (_temp, root) = source_tree(&["tiles/dxt/a.png", "tiles/png/b.png"]);
        let selection = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#).expect("selection");

        assert_eq!(walked(&root, &selection), ["tiles/dxt/a.png"]);
    }

    #[test]
    fn unmentioned_directories_are_walked_in_full() {
        let (_temp, root) = source_tree(&[
            "manifest.json",
            "sounds/ogg/splash.ogg",
            "sounds/wav/splash.wav",
            "tiles/dxt/deep/a.dds",
            "tiles/png/b.png",
        ]);
        let selection = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#).expect("selection");

        assert_eq!(
            walked(&root, &selection),
            [
                "manifest.json",
                "sounds/ogg/splash.ogg",
                "sounds/wav/splash.wav",
                "tiles/dxt/deep/a.dds",
            ]
        );
    }

    #[test]
    fn files_beside_filtered_directories_are_kept() {
        let (_temp, root) = source_tree(&["tiles/index.json", "tiles/png/b.png"]);
        let selection = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#).expect("selection");

        assert_eq!(walked(&root, &selection), ["tiles/index.json"]);
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let (_temp, root) = source_tree(&[".DS_Store", ".git/config", "art/.hidden", "art/a.png"]);

        assert_eq!(walked(&root, &SelectionSpec::empty()), ["art/a.png"]);
    }

    #[test]
    fn selected_empty_directory_yields_nothing() {
        let (_temp, root) = source_tree(&["tiles/png/b.png"]);
        fs::create_dir_all(root.join("tiles/dxt")).expect("create empty dir");
        let selection = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#).expect("selection");

        assert!(walked(&root, &selection).is_empty());
    }

    #[test]
    fn walks_are_restartable() {
        let (_temp, root) = source_tree(&["a.txt", "b/c.txt"]);
        let selection = SelectionSpec::empty();
        let filter = DirectoryFilter::new(&selection);

        let first: Vec<_> = filter.walk(&root).map(|e| e.expect("entry")).collect();
        let second: Vec<_> = filter.walk(&root).map(|e| e.expect("entry")).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].source, root.join("b/c.txt"));
        assert_eq!(first[1].relative, Utf8PathBuf::from("b/c.txt"));
    }

    #[test]
    fn missing_root_reports_a_walk_error() {
        let temp = tempdir().expect("tempdir");
        let root = Utf8Path::from_path(temp.path()).expect("utf8 path").join("absent");
        let selection = SelectionSpec::empty();

        let results: Vec<_> = DirectoryFilter::new(&selection).walk(&root).collect();
        assert!(matches!(results.as_slice(), [Err(FilterError::Walk(_))]));
    }

    #[cfg(unix)]
    #[test]
    fn hidden_names_that_are_not_utf8_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_temp, root) = source_tree(&["art/a.png"]);
        let hidden = OsStr::from_bytes(b".\xffrsrc");
        fs::write(root.as_std_path().join(hidden), "fork").expect("write hidden file");
        fs::create_dir(root.as_std_path().join("art").join(hidden)).expect("create hidden dir");

        assert_eq!(walked(&root, &SelectionSpec::empty()), ["art/a.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_directories_under_a_selected_parent_are_dropped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_temp, root) = source_tree(&["tiles/dxt/a.dds"]);
        let stale = root.as_std_path().join("tiles").join(OsStr::from_bytes(b"\xffold"));
        fs::create_dir(&stale).expect("create stale dir");
        fs::write(stale.join("x.png"), "x").expect("write stale file");
        let selection = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#).expect("selection");

        assert_eq!(walked(&root, &selection), ["tiles/dxt/a.dds"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_directories_elsewhere_still_report_their_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_temp, root) = source_tree(&[]);
        let odd = root.as_std_path().join(OsStr::from_bytes(b"\xffold"));
        fs::create_dir(&odd).expect("create dir");
        fs::write(odd.join("x.png"), "x").expect("write file");
        let selection = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#).expect("selection");

        let results: Vec<_> = DirectoryFilter::new(&selection).walk(&root).collect();
        assert!(matches!(results.as_slice(), [Err(FilterError::NonUtf8(_))]));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_archived_but_linked_directories_are_not() {
        let (_temp, root) = source_tree(&["real/a.txt"]);
        std::os::unix::fs::symlink(root.join("real/a.txt"), root.join("link.txt"))
            .expect("file symlink");
        std::os::unix::fs::symlink(root.join("real"), root.join("mirror")).expect("dir symlink");

        assert_eq!(
            walked(&root, &SelectionSpec::empty()),
            ["link.txt", "real/a.txt"]
        );
    }
}
