//! Reading and writing file bytes, with transparent gzip for `.gz` paths.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Returns `true` if `path` names a gzip-compressed file.
#[must_use]
pub fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Reads the (decompressed) contents of `path`.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] if the file does not exist and
/// [`Error::Io`] for any other failure.
pub fn read(path: &Path) -> Result<Vec<u8>> {
    let raw = fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        _ => Error::from(err),
    })?;
    if !is_gzip(path) {
        return Ok(raw);
    }

    let mut contents = Vec::with_capacity(raw.len() * 4);
    GzDecoder::new(raw.as_slice()).read_to_end(&mut contents)?;
    debug!(
        "decompressed {} ({} -> {} bytes)",
        path.display(),
        raw.len(),
        contents.len()
    );
    Ok(contents)
}

/// Writes `contents` to `path`, compressing first for `.gz` paths.
///
/// # Errors
///
/// Returns [`Error::Io`] if compression or the write fails.
pub fn write(path: &Path, contents: &[u8]) -> Result<()> {
    if !is_gzip(path) {
        fs::write(path, contents)?;
        return Ok(());
    }

    let mut encoder = GzEncoder::new(Vec::with_capacity(contents.len() / 2), Compression::default());
    encoder.write_all(contents)?;
    let compressed = encoder.finish()?;
    debug!(
        "compressed {} ({} -> {} bytes)",
        path.display(),
        contents.len(),
        compressed.len()
    );
    fs::write(path, compressed)?;
    Ok(())
}
