//! Label map loading.
//!
//! The label map is the sole source of truth for which base operations
//! exist and which phrases are insertable. Two on-disk formats are
//! supported, auto-detected by extension: a JSON object mapping tag
//! strings to ids, or a plain text file with one tag per line where ids
//! run 0, 1, ... over the non-empty lines.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::{PrepError, PrepResult};

/// Mapping from tag-label strings (e.g. `"KEEP"`, `"DELETE|the"`) to ids.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    by_tag: HashMap<String, u32>,
}

impl LabelMap {
    /// Build a label map directly from (tag, id) entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, u32)>) -> Self {
        Self {
            by_tag: entries.into_iter().collect(),
        }
    }

    /// Look up the id of a tag label.
    pub fn id_for(&self, tag: &str) -> Option<u32> {
        self.by_tag.get(tag).copied()
    }

    /// Number of tag labels.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Whether the map holds no labels.
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Tag label strings in a stable (sorted) order.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.by_tag.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

/// Read a label map from `path`, choosing the parser by file extension.
pub fn read_label_map(path: &Path) -> PrepResult<LabelMap> {
    let raw = fs::read_to_string(path)?;
    if path.extension().map_or(false, |ext| ext == "json") {
        let by_tag: HashMap<String, u32> =
            serde_json::from_str(&raw).map_err(|e| PrepError::LabelMap {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(LabelMap { by_tag })
    } else {
        let mut by_tag = HashMap::new();
        for line in raw.lines() {
            let tag = line.trim_end();
            if tag.is_empty() {
                continue;
            }
            let id = by_tag.len() as u32;
            if by_tag.insert(tag.to_string(), id).is_some() {
                return Err(PrepError::LabelMap {
                    path: path.to_path_buf(),
                    reason: format!("duplicate tag {:?}", tag),
                });
            }
        }
        Ok(LabelMap { by_tag })
    }
}
