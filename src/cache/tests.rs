//! Tests spanning key encoding, lookup, and building.

use super::*;
use crate::test_support::{PackTree, capture_logs};
use std::fs;
use std::sync::Barrier;
use std::thread;
use tracing::Level;

const APP: &str = "com.example.game";

fn reef_tree() -> PackTree {
    let tree = PackTree::new().expect("pack tree");
    for file in [
        "tiles/dxt/reef.dds",
        "tiles/png/reef.png",
        "spritesheets/png/fish.png",
        "spritesheets/xml/fish.xml",
        "music/theme.ogg",
    ] {
        tree.add_file(APP, "7", "world-reef", file, file)
            .expect("add file");
    }
    tree
}

#[test]
fn locator_recognises_what_the_builder_installed() {
    let tree = reef_tree();
    let version_dir = tree.version_dir(APP, "7");
    let spec = SelectionSpec::from_json(r#"{"tiles":["dxt"],"spritesheets":["png","xml"]}"#)
        .expect("selection");

    let built = build_archive(
        "world-reef",
        &spec,
        &version_dir,
        &tree.pack_dir(APP, "7", "world-reef"),
    )
    .expect("build archive");
    let key = encode_cache_key("world-reef", &spec);

    assert_eq!(key, "world-reef-sprpng-tildxt");
    assert_eq!(
        find_archive(&version_dir, &key),
        ArchiveLookup::Hit { archive: built }
    );
}

#[test]
fn unfiltered_key_does_not_claim_filtered_archives() {
    let tree = reef_tree();
    let version_dir = tree.version_dir(APP, "7");
    let spec = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#).expect("selection");

    locate_or_build(&version_dir, "world-reef", &spec).expect("build filtered");

    assert_eq!(
        find_archive(&version_dir, &encode_cache_key("world-reef", &SelectionSpec::empty())),
        ArchiveLookup::Miss
    );
}

#[test]
fn second_request_is_served_from_cache() {
    let tree = reef_tree();
    let version_dir = tree.version_dir(APP, "7");
    let spec = SelectionSpec::empty();

    let (first_logs, first) =
        capture_logs(Level::DEBUG, || locate_or_build(&version_dir, "world-reef", &spec));
    let (second_logs, second) =
        capture_logs(Level::DEBUG, || locate_or_build(&version_dir, "world-reef", &spec));

    let built = first.expect("first request builds");
    let reused = second.expect("second request hits");
    assert_eq!(built, reused);
    assert!(first_logs.iter().any(|line| line.contains("archive build completed")));
    assert!(second_logs.iter().any(|line| line.contains("archive cache hit")));
    assert!(!second_logs.iter().any(|line| line.contains("building archive")));
}

#[test]
fn cached_archive_is_reused_even_after_sources_change() {
    let tree = reef_tree();
    let version_dir = tree.version_dir(APP, "7");
    let spec = SelectionSpec::empty();

    let first = locate_or_build(&version_dir, "world-reef", &spec).expect("build");
    tree.add_file(APP, "7", "world-reef", "music/extra.ogg", "late addition")
        .expect("add file");
    let second = locate_or_build(&version_dir, "world-reef", &spec).expect("lookup");

    assert_eq!(first, second);
}

#[test]
fn concurrent_builds_converge_on_one_archive() {
    let tree = reef_tree();
    let version_dir = tree.version_dir(APP, "7");
    let source = tree.pack_dir(APP, "7", "world-reef");
    let spec = SelectionSpec::from_json(r#"{"tiles":["png"]}"#).expect("selection");
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    build_archive("world-reef", &spec, &version_dir, &source)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("builder thread"))
            .collect()
    });

    let paths: Vec<Utf8PathBuf> = results
        .into_iter()
        .map(|result| result.expect("both builds succeed"))
        .collect();
    assert_eq!(paths[0], paths[1]);
    let size = fs::metadata(&paths[0]).expect("archive exists").len();
    assert!(size > 0);
    assert_eq!(
        tree.files_in_version(APP, "7").expect("list"),
        [paths[0].file_name().expect("file name")]
    );
}

#[test]
fn distinct_selections_get_distinct_archives() {
    let tree = reef_tree();
    let version_dir = tree.version_dir(APP, "7");
    let dxt = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#).expect("selection");
    let png = SelectionSpec::from_json(r#"{"tiles":["png"]}"#).expect("selection");

    let dxt_archive = locate_or_build(&version_dir, "world-reef", &dxt).expect("dxt");
    let png_archive = locate_or_build(&version_dir, "world-reef", &png).expect("png");

    assert_ne!(dxt_archive, png_archive);
    assert_eq!(tree.files_in_version(APP, "7").expect("list").len(), 2);
}
