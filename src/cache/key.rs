//! Cache keys: the deterministic filename prefix of a pack archive.

use crate::selection::SelectionSpec;

/// Joins the tokens of a cache key and separates the key from the content
/// hash in archive filenames.
pub(crate) const KEY_SEPARATOR: char = '-';

/// Extension of finished archives.
pub(crate) const ARCHIVE_EXTENSION: &str = ".zip";

/// Characters kept from each parent and child name.
const DECORATOR_WIDTH: usize = 3;

/// Derives the cache key for a pack under a subdirectory selection.
///
/// The key is the pack id followed by one `-<parent><child>` decorator per
/// selected parent, in ascending parent order, where `<parent>` is the first
/// three characters of the parent name and `<child>` the first three
/// characters of the *first* retained child.
///
/// The encoding is lossy: selections that differ only past the first child,
/// or past three characters, share a key and therefore share an archive.
/// These keys are already baked into published archive names, so the
/// encoding stays as is.
///
/// # Examples
///
/// ```
/// use asset_pack_cache::{SelectionSpec, encode_cache_key};
///
/// let spec = SelectionSpec::from_json(r#"{"tiles":["dxt"],"sprites":["png","xml"]}"#)?;
/// assert_eq!(encode_cache_key("world-reef", &spec), "world-reef-sprpng-tildxt");
/// assert_eq!(encode_cache_key("world-reef", &SelectionSpec::empty()), "world-reef");
/// # Ok::<(), asset_pack_cache::SelectionError>(())
/// ```
#[must_use]
pub fn encode_cache_key(pack_id: &str, selection: &SelectionSpec) -> String {
    let mut key = pack_id.to_owned();
    for (parent, children) in selection.iter() {
        let first_child = children.first().map_or("", String::as_str);
        key.push(KEY_SEPARATOR);
        key.extend(parent.chars().take(DECORATOR_WIDTH));
        key.extend(first_child.chars().take(DECORATOR_WIDTH));
    }
    key
}

/// Final filename of an archive with the given key and content hash.
pub(crate) fn archive_file_name(cache_key: &str, content_hash: &str) -> String {
    format!("{cache_key}{KEY_SEPARATOR}{content_hash}{ARCHIVE_EXTENSION}")
}
