//! Issuer directory: normalized company name / ticker -> issuer id.
//!
//! The index is built once from a reference table and is read-only afterwards.
//! When two issuers normalize to the same key, the one built later wins.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use crate::error::{AnnotationError, AnnotationResult};
use crate::types::{parse_id, IssuerId};

/// Collapse runs of whitespace and upper-case.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

/// Which columns of the reference table carry what.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    pub issuer_column: String,
    pub full_name_column: String,
}

impl Default for DirectoryLayout {
    fn default() -> Self {
        Self {
            issuer_column: "issuerid".to_string(),
            full_name_column: "EMITENT_FULL_NAME".to_string(),
        }
    }
}

impl DirectoryLayout {
    /// Positional (unnamed) columns hold tickers and short names.
    fn is_name_column(&self, header: &str) -> bool {
        let header = header.trim();
        header.is_empty() || header.contains("Unnamed") || header == self.full_name_column
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub issuer_id: IssuerId,
    /// Trimmed name variants as they appear in the reference data.
    pub names: BTreeSet<String>,
}

impl DirectoryEntry {
    pub fn new<I, S>(issuer_id: IssuerId, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { issuer_id, names }
    }
}

/// Read the reference table. A repeated issuer row replaces that issuer's
/// earlier name set but keeps its first-seen position.
pub fn read_reference_table<R: Read>(
    reader: R,
    layout: &DirectoryLayout,
) -> AnnotationResult<Vec<DirectoryEntry>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let issuer_idx = headers
        .iter()
        .position(|h| h.trim() == layout.issuer_column)
        .ok_or_else(|| AnnotationError::MissingColumn(layout.issuer_column.clone()))?;
    let name_columns: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != issuer_idx && layout.is_name_column(h))
        .map(|(i, _)| i)
        .collect();

    let mut entries: Vec<DirectoryEntry> = Vec::new();
    let mut positions: HashMap<IssuerId, usize> = HashMap::new();

    for (row_no, record) in reader.records().enumerate() {
        let record = record?;
        let Some(issuer_id) = record.get(issuer_idx).and_then(parse_id) else {
            tracing::warn!("Reference row {} has no usable {}, skipping", row_no + 1, layout.issuer_column);
            continue;
        };

        let entry = DirectoryEntry::new(
            issuer_id,
            name_columns.iter().filter_map(|&i| record.get(i)),
        );

        match positions.get(&issuer_id) {
            Some(&pos) => entries[pos] = entry,
            None => {
                positions.insert(issuer_id, entries.len());
                entries.push(entry);
            }
        }
    }

    Ok(entries)
}

/// Load the reference table from disk. Exports that are not UTF-8 are read
/// as Windows-1252.
pub fn load_reference_table(
    path: impl AsRef<Path>,
    layout: &DirectoryLayout,
) -> AnnotationResult<Vec<DirectoryEntry>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{} is not valid UTF-8, decoding as cp1252", path.display());
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(e.as_bytes());
            text.into_owned()
        }
    };
    read_reference_table(text.as_bytes(), layout)
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    by_name: HashMap<String, IssuerId>,
    issuers: HashSet<IssuerId>,
}

impl DirectoryIndex {
    pub fn build(entries: &[DirectoryEntry]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.issuers.insert(entry.issuer_id);
            for name in &entry.names {
                let key = normalize_name(name);
                if key.is_empty() {
                    continue;
                }
                index.by_name.insert(key, entry.issuer_id);
            }
        }
        index
    }

    /// Case-insensitive exact lookup. Callers pass whitespace-collapsed text.
    pub fn lookup(&self, name: &str) -> Option<IssuerId> {
        if name.is_empty() {
            return None;
        }
        self.by_name.get(&name.to_uppercase()).copied()
    }

    pub fn contains_issuer(&self, issuer_id: IssuerId) -> bool {
        self.issuers.contains(&issuer_id)
    }

    /// Number of distinct normalized names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn issuer_count(&self) -> usize {
        self.issuers.len()
    }
}
