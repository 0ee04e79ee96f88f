//! Catalog assembly from three-line element files
//!
//! A catalog is a set of element files, one per source. Each file is a flat
//! list of `name`, `line1`, `line2` triples. Every source except the one named
//! `all` is a curated group with its own kind and description; `all` is the
//! full public catalog and only fills in objects no curated group claimed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{ObjectKind, OrbitalElementRecord};

/// Name of the catch-all source
pub const ALL_SOURCE: &str = "all";

/// One entry of the source definitions file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDefinition {
    pub name: String,
    /// Where the refresh job downloads the file from
    pub url: String,
    /// Local element file, relative to the definitions file
    pub filename: String,
    #[serde(rename = "type", default)]
    pub kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A source definition together with the contents of its element file
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSource {
    pub name: String,
    pub kind: ObjectKind,
    pub description: Option<String>,
    pub contents: String,
}

impl CatalogSource {
    pub fn new(name: impl Into<String>, kind: ObjectKind, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            contents: contents.into(),
        }
    }

    pub fn from_definition(definition: &SourceDefinition, contents: String) -> Self {
        Self {
            name: definition.name.clone(),
            kind: definition.kind,
            description: definition.description.clone(),
            contents,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_all(&self) -> bool {
        self.name == ALL_SOURCE
    }
}

/// A raw `(name, line1, line2)` triple, name trimmed
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTriple {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

/// Split a three-line element file into triples.
///
/// Lines are consumed three at a time; a triple with any empty line is
/// skipped without resynchronizing. Line 1 and 2 keep their content but lose
/// any trailing carriage return.
pub fn parse_three_line(text: &str) -> Vec<ElementTriple> {
    let lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();

    lines
        .chunks(3)
        .filter_map(|chunk| match chunk {
            [name, line1, line2] if !name.is_empty() && !line1.is_empty() && !line2.is_empty() => {
                Some(ElementTriple {
                    name: name.trim().to_string(),
                    line1: line1.to_string(),
                    line2: line2.to_string(),
                })
            }
            _ => None,
        })
        .collect()
}

/// Merge sources into the record list served to the tracking core.
///
/// Curated sources come first, in the given order, with their own kind and
/// description. The `all` source contributes only names no curated source
/// produced, typed `other` without description. Names compare exactly after
/// trimming.
pub fn merge_sources(sources: &[CatalogSource]) -> Vec<OrbitalElementRecord> {
    let mut records = Vec::new();
    let mut claimed: HashSet<String> = HashSet::new();

    for source in sources.iter().filter(|s| !s.is_all()) {
        let before = records.len();
        for triple in parse_three_line(&source.contents) {
            claimed.insert(triple.name.clone());
            records.push(OrbitalElementRecord {
                name: triple.name,
                line1: triple.line1,
                line2: triple.line2,
                kind: source.kind,
                description: source.description.clone(),
            });
        }
        log::debug!("Source {}: {} records", source.name, records.len() - before);
    }

    if let Some(all) = sources.iter().find(|s| s.is_all()) {
        let before = records.len();
        for triple in parse_three_line(&all.contents) {
            if claimed.contains(&triple.name) {
                continue;
            }
            records.push(OrbitalElementRecord::new(
                triple.name,
                triple.line1,
                triple.line2,
                ObjectKind::Other,
            ));
        }
        log::debug!("Source {}: {} unclaimed records", all.name, records.len() - before);
    }

    log::info!("Merged {} sources into {} records", sources.len(), records.len());
    records
}
