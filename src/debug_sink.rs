//! Raw content captured when a fetch succeeds but nothing could be parsed.
//!
//! Artifacts are named `debug_<source>_<category>.<ext>`. A file that already
//! exists is never overwritten, so the first capture of a run (or of an
//! earlier run) is what an operator inspects.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Receives raw content for offline inspection. Writing is best effort and
/// never fails the caller.
pub trait DebugSink: Send + Sync {
    fn capture(&self, source: &str, category: &str, extension: &str, body: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn capture(&self, _source: &str, _category: &str, _extension: &str, _body: &str) {}
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct FileDebugSink {
    dir: PathBuf,
}

impl FileDebugSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an artifact for `source`/`category` is written to.
    #[must_use]
    pub fn artifact_path(&self, source: &str, category: &str, extension: &str) -> PathBuf {
        self.dir.join(format!(
            "debug_{}_{}.{extension}",
            file_component(source),
            file_component(category)
        ))
    }
}

impl DebugSink for FileDebugSink {
    fn capture(&self, source: &str, category: &str, extension: &str, body: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), "Cannot create debug directory: {e}");
            return;
        }

        let path = self.artifact_path(source, category, extension);
        let file = OpenOptions::new().write(true).create_new(true).open(&path);
        let result = match file {
            Ok(mut f) => f.write_all(body.as_bytes()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Debug artifact already exists, keeping it");
                return;
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!(path = %path.display(), bytes = body.len(), "Saved debug artifact"),
            Err(e) => warn!(path = %path.display(), "Failed to save debug artifact: {e}"),
        }
    }
}

fn file_component(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
