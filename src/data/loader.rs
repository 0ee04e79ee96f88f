//! Record loading from JSON dumps and element file catalogs

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde_json::Value;

use super::catalog::{merge_sources, CatalogSource, SourceDefinition};
use super::record::{decode_value, DecodedRecords};

/// Load a `/satellite-data` dump, gzipped when the path ends in `.gz`
pub fn load_records(path: impl AsRef<Path>) -> Result<DecodedRecords> {
    let path = path.as_ref();
    log::info!("Loading satellite records from {:?}", path);

    let file =
        File::open(path).with_context(|| format!("Failed to open satellite records: {:?}", path))?;
    let reader = BufReader::new(file);

    let value: Value = if is_gzip(path) {
        serde_json::from_reader(GzDecoder::new(reader))
    } else {
        serde_json::from_reader(reader)
    }
    .with_context(|| format!("Failed to parse satellite records JSON: {:?}", path))?;

    decode_value(value).with_context(|| format!("Invalid satellite records file: {:?}", path))
}

/// Load the source definitions file
pub fn load_source_definitions(path: impl AsRef<Path>) -> Result<Vec<SourceDefinition>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open source definitions: {:?}", path))?;

    let definitions: Vec<SourceDefinition> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| "Failed to parse source definitions JSON")?;

    log::info!("Loaded {} source definitions", definitions.len());
    Ok(definitions)
}

/// Read every defined element file that exists next to the definitions file.
///
/// Missing files are skipped, the refresh job may not have fetched them yet.
pub fn load_catalog_sources(definitions_path: impl AsRef<Path>) -> Result<Vec<CatalogSource>> {
    let definitions_path = definitions_path.as_ref();
    let definitions = load_source_definitions(definitions_path)?;
    let base = definitions_path.parent().unwrap_or_else(|| Path::new("."));

    let mut sources = Vec::with_capacity(definitions.len());
    for definition in &definitions {
        let path = base.join(&definition.filename);
        if !path.exists() {
            log::warn!("Element file for source {} not found: {:?}", definition.name, path);
            continue;
        }

        let mut contents = String::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .with_context(|| format!("Failed to read element file: {:?}", path))?;

        sources.push(CatalogSource::from_definition(definition, contents));
    }

    Ok(sources)
}

/// Assemble the merged record list from a definitions file
pub fn load_catalog(definitions_path: impl AsRef<Path>) -> Result<DecodedRecords> {
    let sources = load_catalog_sources(definitions_path)?;
    Ok(DecodedRecords {
        records: merge_sources(&sources),
        rejected: Vec::new(),
    })
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
