//! Export payloads and the sinks that receive them.

use std::path::{Path, PathBuf};

use crate::constants::EXPORT_EXTENSION;
use crate::error::Result;

/// Generated text ready to hand to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    /// File name derived from the source image name.
    pub filename: String,
    /// Newline-joined normalized records.
    pub contents: String,
}

impl ExportPayload {
    /// Create a payload for `image_name`, deriving the filename.
    pub fn for_image(image_name: &str, contents: impl Into<String>) -> Self {
        Self {
            filename: export_filename(image_name),
            contents: contents.into(),
        }
    }

    /// Number of records in the payload.
    pub fn record_count(&self) -> usize {
        self.contents.lines().filter(|l| !l.trim().is_empty()).count()
    }
}

/// Derive the export filename from an image name.
///
/// Only the final path component is kept and its extension is replaced
/// with `.txt` (or `.txt` is appended when there is none).
pub fn export_filename(image_name: &str) -> String {
    let name = Path::new(image_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "annotations".to_string());
    Path::new(&name)
        .with_extension(EXPORT_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

/// Receiver for exported payloads (download trigger, file writer, ...).
///
/// The engine never touches the filesystem itself; it only hands payloads
/// to a sink.
pub trait ExportSink {
    /// Accept one payload.
    fn accept(&mut self, payload: &ExportPayload) -> Result<()>;
}

/// Sink that keeps every payload in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    payloads: Vec<ExportPayload>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads received so far, oldest first.
    pub fn payloads(&self) -> &[ExportPayload] {
        &self.payloads
    }

    /// Most recent payload, if any.
    pub fn last(&self) -> Option<&ExportPayload> {
        self.payloads.last()
    }
}

impl ExportSink for MemorySink {
    fn accept(&mut self, payload: &ExportPayload) -> Result<()> {
        self.payloads.push(payload.clone());
        Ok(())
    }
}

/// Sink that writes each payload as a file inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a payload will be written to.
    pub fn path_for(&self, payload: &ExportPayload) -> PathBuf {
        self.dir.join(&payload.filename)
    }
}

impl ExportSink for DirectorySink {
    fn accept(&mut self, payload: &ExportPayload) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(payload);
        std::fs::write(&path, &payload.contents)?;
        log::info!(
            "Wrote {} records to {:?}",
            payload.record_count(),
            path
        );
        Ok(())
    }
}
