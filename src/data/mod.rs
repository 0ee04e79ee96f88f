//! Element records, catalogs and the tracked object registry

pub mod catalog;
pub mod loader;
pub mod record;
pub mod registry;

pub use catalog::{merge_sources, parse_three_line, CatalogSource, SourceDefinition};
pub use loader::*;
pub use record::{decode_records, DecodedRecords, ObjectKind, OrbitalElementRecord};
pub use registry::{ObjectId, Registry, TrackedObject};
