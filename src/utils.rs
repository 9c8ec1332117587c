use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

/// Creates `path` (and its parents) unless it already exists as a directory.
pub(crate) async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("Creating directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Serializes `value` as JSON indented by four spaces. Non-ASCII text is
/// written as-is.
pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Directory a temp file for `path` should live in, so the final rename stays
/// on one filesystem.
pub(crate) fn temp_dir_for(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Writes `contents` to `path` through a sibling temp file and a rename.
/// Readers see either the old file or the complete new one.
pub(crate) fn persist_bytes(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut temp_file = NamedTempFile::new_in(temp_dir_for(path))?;
    temp_file.write_all(contents)?;
    temp_file.flush()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// [`persist_bytes`] on the blocking thread pool.
pub(crate) async fn write_atomically(path: PathBuf, contents: Vec<u8>) -> io::Result<()> {
    task::spawn_blocking(move || persist_bytes(&path, &contents))
        .await
        .map_err(io::Error::other)?
}

/// A bar drawn on stderr, or a hidden one that still counts. The length is
/// set by the stage once it knows how many items it has.
pub(crate) fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
