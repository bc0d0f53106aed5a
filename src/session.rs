use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::aggregate::Dashboard;
use crate::data::clean::CleaningConfig;
use crate::data::filter::{apply, FilterSpec, FilteredView};
use crate::data::model::ListingTable;

// ---------------------------------------------------------------------------
// Session configuration
// ---------------------------------------------------------------------------

/// Optional JSON settings: `{ "cleaning": {...}, "filter": {...} }`.
/// Without a `filter` the session starts from the table's defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cleaning: CleaningConfig,
    pub filter: Option<FilterSpec>,
}

impl SessionConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading session file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing session file {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// What a front end holds between interactions: the shared cleaned table and
/// the current filter. Every change re-runs the filter from scratch.
#[derive(Debug, Clone)]
pub struct Session {
    table: Arc<ListingTable>,
    pub filter: FilterSpec,
}

impl Session {
    /// Start with every range at its column bounds and nothing selected.
    pub fn new(table: Arc<ListingTable>) -> Self {
        let filter = FilterSpec::defaults_for(&table);
        Session { table, filter }
    }

    pub fn with_filter(table: Arc<ListingTable>, filter: FilterSpec) -> Self {
        Session { table, filter }
    }

    /// Start from the filter in `config`, or from the defaults when it has none.
    pub fn from_config(table: Arc<ListingTable>, config: &SessionConfig) -> Self {
        match &config.filter {
            Some(filter) => Session::with_filter(table, filter.clone()),
            None => Session::new(table),
        }
    }

    pub fn table(&self) -> &ListingTable {
        &self.table
    }

    pub fn view(&self) -> FilteredView<'_> {
        apply(&self.table, &self.filter)
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::build(&self.view())
    }
}
