//! Persistence boundary for a finished run.
//!
//! A store replaces its whole content with one run's records. Readers never
//! see a mix of two runs.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::model::Wrestler;

pub trait RankingStore {
    /// Replace everything stored with `records`.
    fn replace_all(&self, records: &[Wrestler]) -> Result<()>;
}

/// JSON array on disk, replaced through a temporary file and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records currently stored; a missing file is an empty store.
    pub fn load(&self) -> Result<Vec<Wrestler>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("decoding {}", self.path.display()))
    }
}

impl RankingStore for JsonFileStore {
    fn replace_all(&self, records: &[Wrestler]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("creating temporary file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, records).context("encoding records")?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        info!(path = %self.path.display(), records = records.len(), "Rankings stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrestler(rank: u32, name: &str) -> Wrestler {
        Wrestler {
            rank,
            name: name.into(),
            school: "Iowa".into(),
            category: "125".into(),
            source: "pages".into(),
            grade: None,
            previous_rank: None,
        }
    }

    #[test]
    fn replace_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("rankings.json"));
        assert!(store.load().unwrap().is_empty());

        store.replace_all(&[wrestler(1, "Old"), wrestler(2, "Older")]).unwrap();
        store.replace_all(&[wrestler(1, "New")]).unwrap();

        let stored = store.load().unwrap();
        assert_eq!(stored, vec![wrestler(1, "New")]);
    }

    #[test]
    fn empty_run_stores_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("out/rankings.json"));
        store.replace_all(&[]).unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap().trim(), "[]");
    }
}
