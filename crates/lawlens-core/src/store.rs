use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::types::{sample_document, DocumentView};

/// Key the analyzed document is stored under.
pub const DOCUMENT_KEY: &str = "documentAnalysis";

/// Holds at most one analyzed document as a JSON file in the data directory.
pub struct DocumentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DocumentStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating data dir {}", dir.display()))?;
        Ok(Self {
            path: dir.join(format!("{DOCUMENT_KEY}.json")),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<DocumentView>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };
        let doc = serde_json::from_str(&raw)
            .with_context(|| format!("decoding {}", self.path.display()))?;
        Ok(Some(doc))
    }

    /// The stored document, or the built-in sample when nothing usable is stored.
    pub fn load_or_sample(&self) -> DocumentView {
        match self.load() {
            Ok(Some(doc)) => doc,
            Ok(None) => sample_document(),
            Err(e) => {
                warn!("stored document unreadable, showing sample: {e:#}");
                sample_document()
            },
        }
    }

    /// Replace the stored document. The file is swapped in with a rename.
    pub fn save(&self, doc: &DocumentView) -> Result<()> {
        let json = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        std::fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        info!(title = %doc.title, clauses = doc.clauses.len(), "stored analyzed document");
        Ok(())
    }

    /// Remove the stored document. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("cleared stored document");
                Ok(true)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}
