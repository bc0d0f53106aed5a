use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::Result;

use super::clean::CleaningConfig;
use super::loader::load_file;
use super::model::ListingTable;

/// Lazily loaded, read-only table bound to one input file.
///
/// The first successful [`DatasetCache::get`] loads and cleans the file; later
/// calls hand out the same `Arc`. A failed load is not remembered, so the
/// next call retries. Owners pass the table on explicitly; there is no
/// process-global instance.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    config: CleaningConfig,
    table: OnceLock<Arc<ListingTable>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>, config: CleaningConfig) -> Self {
        DatasetCache {
            path: path.into(),
            config,
            table: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    pub fn get(&self) -> Result<Arc<ListingTable>> {
        if let Some(table) = self.table.get() {
            log::debug!("Cache hit for {}", self.path.display());
            return Ok(Arc::clone(table));
        }

        log::info!("Loading {}", self.path.display());
        let loaded = Arc::new(load_file(&self.path, &self.config)?);
        // If another caller won the race its table is identical; keep theirs.
        Ok(Arc::clone(self.table.get_or_init(|| loaded)))
    }
}
