//! Static station reference table.
//!
//! The table is a row-oriented XML export: each `row` element carries a
//! `stop_name`, a `gtfs_stop_ids` list and a `daytime_routes` description.
//! Socrata exports wrap the data rows in an outer `row`, so rows are matched
//! at any depth and only those with a direct `stop_name` child count.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::StationError;

/// Placeholder shown when a row carries no routes field.
pub const NO_ROUTES: &str = "N/A";

/// One row of the station table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRecord {
    pub name: String,
    pub stop_ids: Vec<String>,
    pub daytime_routes: String,
}

/// Read access to a set of stops.
pub trait StopDirectory {
    /// Every distinct stop name, sorted.
    fn stop_names(&self) -> Result<Vec<String>, StationError>;

    /// The records whose name equals `name` exactly and that carry at least
    /// one stop identifier.
    fn find_stop(&self, name: &str) -> Result<Vec<StopRecord>, StationError>;
}

/// An in-memory, already parsed station table.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    records: Vec<StopRecord>,
}

impl StationTable {
    /// Parses a station table from its XML text.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::Xml`] if the document is malformed.
    pub fn parse(xml: &str) -> Result<Self, StationError> {
        let doc = Document::parse(xml)?;

        let records = doc
            .descendants()
            .filter(|n| n.has_tag_name("row"))
            .filter_map(read_row)
            .collect::<Vec<_>>();

        debug!(rows = records.len(), "Station table parsed");
        Ok(Self { records })
    }

    /// Reads and parses the station table at `path`.
    pub fn load(path: &Path) -> Result<Self, StationError> {
        let xml = std::fs::read_to_string(path).map_err(|source| StationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml)
    }

    pub fn records(&self) -> &[StopRecord] {
        &self.records
    }
}

impl StopDirectory for StationTable {
    fn stop_names(&self) -> Result<Vec<String>, StationError> {
        let names: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.name.as_str())
            .filter(|name| !name.is_empty())
            .collect();

        Ok(names.into_iter().map(str::to_string).collect())
    }

    fn find_stop(&self, name: &str) -> Result<Vec<StopRecord>, StationError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.name == name && !r.stop_ids.is_empty())
            .cloned()
            .collect())
    }
}

/// A station table on disk, re-read on every lookup so edits to the file
/// are picked up without restarting.
#[derive(Debug, Clone)]
pub struct StationFile {
    path: PathBuf,
}

impl StationFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StopDirectory for StationFile {
    fn stop_names(&self) -> Result<Vec<String>, StationError> {
        StationTable::load(&self.path)?.stop_names()
    }

    fn find_stop(&self, name: &str) -> Result<Vec<StopRecord>, StationError> {
        StationTable::load(&self.path)?.find_stop(name)
    }
}

fn read_row(row: Node) -> Option<StopRecord> {
    let name = child_text(row, "stop_name")?;

    let stop_ids = child_text(row, "gtfs_stop_ids")
        .map(|ids| {
            ids.split(';')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let daytime_routes = child_text(row, "daytime_routes")
        .unwrap_or(NO_ROUTES)
        .to_string();

    Some(StopRecord {
        name: name.to_string(),
        stop_ids,
        daytime_routes,
    })
}

fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.has_tag_name(tag))
        .and_then(|c| c.text())
}
