//! Manifest definition, parsing, defaulting and validation.
//!
//! A manifest is YAML and declares:
//! - Workflows: named pipelines of a given type
//! - Processes: triggers, tasks and exits inside a workflow
//! - Subscriptions: which processes each process listens to

mod defaults;
mod fields;
mod parser;
mod resources;
mod subscriptions;
mod types;
mod validator;

#[cfg(test)]
mod fixtures;

pub use defaults::{
    apply_defaults, DEFAULT_GPU, DEFAULT_PORT, DEFAULT_PROTOCOL, DEFAULT_REPLICAS,
};
pub use fields::MAX_NAME_LENGTH;
pub use parser::{
    parse_manifest, parse_manifest_file, parse_manifest_file_raw, parse_manifest_raw,
    serialize_manifest,
};
pub use resources::{parse_cpu_millis, parse_memory_bytes};
pub use subscriptions::can_subscribe;
pub use types::*;
pub use validator::{check_manifest_file, validate_manifest, ManifestValidator};
