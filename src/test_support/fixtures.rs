//! Scratch packs roots for tests.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Context, Result, eyre};
use tempfile::TempDir;

use crate::ServiceSettings;

/// A temporary packs root laid out as `<app>/<version>/<pack>/...`.
///
/// The directory tree is removed when the value is dropped.
///
/// # Examples
/// ```
/// use asset_pack_cache::test_support::PackTree;
///
/// # fn main() -> color_eyre::Result<()> {
/// let tree = PackTree::new()?;
/// tree.add_file("com.example.game", "10", "world-sand", "tiles/dxt/a.dds", "dds")?;
/// assert!(tree.pack_dir("com.example.game", "10", "world-sand").is_dir());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PackTree {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl PackTree {
    /// Creates an empty packs root.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created or its
    /// path is not valid UTF-8.
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create temporary packs root")?;
        let base = Utf8Path::from_path(temp.path())
            .ok_or_else(|| eyre!("temporary directory path is not valid UTF-8"))?;
        let root = base.join("packs");
        fs::create_dir(&root).with_context(|| format!("create {root}"))?;
        Ok(Self { _temp: temp, root })
    }

    /// Path of the packs root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of an application directory.
    #[must_use]
    pub fn app_root(&self, app_id: &str) -> Utf8PathBuf {
        self.root.join(app_id)
    }

    /// Path of a release directory.
    #[must_use]
    pub fn version_dir(&self, app_id: &str, version: &str) -> Utf8PathBuf {
        self.app_root(app_id).join(version)
    }

    /// Path of a pack source directory.
    #[must_use]
    pub fn pack_dir(&self, app_id: &str, version: &str, pack_id: &str) -> Utf8PathBuf {
        self.version_dir(app_id, version).join(pack_id)
    }

    /// Creates a directory beneath the packs root, including parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn add_dir(&self, relative: &str) -> Result<Utf8PathBuf> {
        let path = self.root.join(relative);
        fs::create_dir_all(&path).with_context(|| format!("create {path}"))?;
        Ok(path)
    }

    /// Writes a file inside a pack, creating every missing directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or the file cannot be written.
    pub fn add_file(
        &self,
        app_id: &str,
        version: &str,
        pack_id: &str,
        relative: &str,
        contents: &str,
    ) -> Result<Utf8PathBuf> {
        let path = self.pack_dir(app_id, version, pack_id).join(relative);
        let parent = path
            .parent()
            .ok_or_else(|| eyre!("{path} has no parent directory"))?;
        fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        fs::write(&path, contents).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// Names of the files directly inside a release directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the release directory cannot be listed.
    pub fn files_in_version(&self, app_id: &str, version: &str) -> Result<Vec<String>> {
        let dir = self.version_dir(app_id, version);
        let mut names = Vec::new();
        for entry in dir.read_dir_utf8().with_context(|| format!("list {dir}"))? {
            let entry = entry.with_context(|| format!("list {dir}"))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Service settings rooted at this tree, publishing under `packs`.
    #[must_use]
    pub fn settings(&self) -> ServiceSettings {
        ServiceSettings {
            packs_root: self.root.clone(),
            public_prefix: "packs".to_owned(),
        }
    }
}
