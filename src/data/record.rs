//! Orbital element records as served by `/satellite-data`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InvalidRecordError;

/// Broad category of a tracked object, drives marker color and popup label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Starlink,
    Debris,
    Weather,
    Communication,
    #[default]
    #[serde(other)]
    Other,
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Starlink => "starlink",
            Self::Debris => "debris",
            Self::Weather => "weather",
            Self::Communication => "communication",
            Self::Other => "other",
        }
    }
}

/// One element-set record, immutable once ingested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElementRecord {
    pub name: String,
    pub line1: String,
    pub line2: String,
    #[serde(rename = "type", default)]
    pub kind: ObjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OrbitalElementRecord {
    pub fn new(
        name: impl Into<String>,
        line1: impl Into<String>,
        line2: impl Into<String>,
        kind: ObjectKind,
    ) -> Self {
        Self {
            name: name.into(),
            line1: line1.into(),
            line2: line2.into(),
            kind,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Identity of the source record, used to refuse re-admission
    pub(crate) fn source_key(&self) -> (String, String, String) {
        (
            self.name.trim().to_string(),
            self.line1.trim_end().to_string(),
            self.line2.trim_end().to_string(),
        )
    }
}

/// Result of validating a decoded payload against the record schema
#[derive(Debug, Default)]
pub struct DecodedRecords {
    pub records: Vec<OrbitalElementRecord>,
    /// Array index and reason for every entry that failed the schema
    pub rejected: Vec<(usize, InvalidRecordError)>,
}

/// Validate a `/satellite-data` body entry by entry.
///
/// The body itself must be a JSON array, anything else is a structural failure
/// of the whole payload. Entries that do not match the record shape are
/// reported individually and skipped.
pub fn decode_records(body: &str) -> anyhow::Result<DecodedRecords> {
    let value: Value = serde_json::from_str(body)?;
    decode_value(value)
}

pub fn decode_value(value: Value) -> anyhow::Result<DecodedRecords> {
    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(anyhow::anyhow!(
                "satellite data must be a JSON array, got {}",
                json_kind(&other)
            ))
        }
    };

    let mut decoded = DecodedRecords {
        records: Vec::with_capacity(entries.len()),
        rejected: Vec::new(),
    };

    for (index, entry) in entries.into_iter().enumerate() {
        match validate_entry(entry) {
            Ok(record) => decoded.records.push(record),
            Err(e) => {
                log::warn!("Skipping satellite data entry {}: {}", index, e);
                decoded.rejected.push((index, e));
            }
        }
    }

    log::info!(
        "Decoded {} records ({} rejected by schema)",
        decoded.records.len(),
        decoded.rejected.len()
    );

    Ok(decoded)
}

fn validate_entry(entry: Value) -> Result<OrbitalElementRecord, InvalidRecordError> {
    if !entry.is_object() {
        return Err(InvalidRecordError::Schema(format!(
            "expected object, got {}",
            json_kind(&entry)
        )));
    }

    // Explicit `null` description is accepted as absent
    let record: OrbitalElementRecord = serde_json::from_value(entry)
        .map_err(|e| InvalidRecordError::Schema(e.to_string()))?;

    if record.name.trim().is_empty() {
        return Err(InvalidRecordError::EmptyName);
    }

    Ok(record)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
