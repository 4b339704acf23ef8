//! Archive writers used to package pack files.

use camino::Utf8Path;
use std::fs::File;
use std::io::{self, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Packages files as independently addressable archive entries.
pub trait ArchiveWriter {
    /// Adds the file at `source` under `entry_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the entry cannot be
    /// written.
    fn add_file(&mut self, source: &Utf8Path, entry_name: &str) -> io::Result<()>;

    /// Completes the archive. Nothing written before this call is guaranteed
    /// to be readable.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be finalised.
    fn finish(self) -> io::Result<()>;
}

/// Writes deflated zip archives with fixed entry metadata.
///
/// Entries carry a 1980-01-01 timestamp and mode `0644`, so the same files
/// added in the same order always produce the same bytes.
pub struct ZipPackWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> ZipPackWriter<W> {
    /// Starts a new archive in `inner`.
    #[must_use]
    pub fn new(inner: W) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);
        Self {
            zip: ZipWriter::new(inner),
            options,
        }
    }
}

impl<W: Write + Seek> ArchiveWriter for ZipPackWriter<W> {
    fn add_file(&mut self, source: &Utf8Path, entry_name: &str) -> io::Result<()> {
        let mut file = File::open(source)?;
        self.zip
            .start_file(entry_name, self.options)
            .map_err(io::Error::other)?;
        io::copy(&mut file, &mut self.zip)?;
        Ok(())
    }

    fn finish(self) -> io::Result<()> {
        let mut inner = self.zip.finish().map_err(io::Error::other)?;
        inner.flush()
    }
}
