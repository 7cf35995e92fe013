//! Manifest YAML parser.

use std::path::Path;

use tracing::debug;

use super::defaults::apply_defaults;
use super::types::Manifest;
use crate::error::{Error, Result};

/// Parse a manifest from a YAML string without filling defaults.
pub fn parse_manifest_raw(yaml: &str) -> Result<Manifest> {
    if yaml.trim().is_empty() {
        return Err(Error::InvalidYaml("empty manifest".to_string()));
    }

    let manifest: Manifest = serde_yaml::from_str(yaml).map_err(|e| {
        let msg = e.to_string();
        if let Some(field) = extract_missing_field(&msg) {
            Error::InvalidYaml(format!("missing required field: {}", field))
        } else {
            Error::InvalidYaml(msg)
        }
    })?;
    Ok(manifest)
}

/// Parse a manifest from a YAML string and fill its defaults.
pub fn parse_manifest(yaml: &str) -> Result<Manifest> {
    let mut manifest = parse_manifest_raw(yaml)?;
    apply_defaults(&mut manifest);
    Ok(manifest)
}

/// Parse a manifest from a file path and fill its defaults.
pub fn parse_manifest_file(path: &Path) -> Result<Manifest> {
    parse_manifest(&read_manifest(path)?)
}

/// Parse a manifest from a file path without filling defaults.
pub fn parse_manifest_file_raw(path: &Path) -> Result<Manifest> {
    parse_manifest_raw(&read_manifest(path)?)
}

fn read_manifest(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading manifest");
    std::fs::read_to_string(path).map_err(|source| Error::ReadingFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a manifest back to YAML. Key order is stable.
pub fn serialize_manifest(manifest: &Manifest) -> Result<String> {
    Ok(serde_yaml::to_string(manifest)?)
}

fn extract_missing_field(error_message: &str) -> Option<&str> {
    let marker = "missing field `";
    let start = error_message.find(marker)? + marker.len();
    let rest = &error_message[start..];
    let end = rest.find('`')?;
    Some(&rest[..end])
}
