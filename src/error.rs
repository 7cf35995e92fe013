//! Error types for krt-lint.
//!
//! Validation never stops at the first problem: every violation becomes a
//! [`ValidationError`] tagged with an [`ErrorKind`] and the path of the
//! offending field, and all of them are collected into [`ValidationErrors`].
//! Callers match on kinds, not on message text.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for krt-lint operations.
pub type Result<T> = std::result::Result<T, Error>;

/// krt-lint error types.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid yaml: {0}")]
    InvalidYaml(String),

    #[error("error reading file {}: {source}", path.display())]
    ReadingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Get the error code for programmatic matching.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidYaml(_) => ErrorKind::InvalidYaml.code(),
            Error::ReadingFile { .. } => ErrorKind::ReadingFile.code(),
            Error::Config(_) => "CONFIG_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
        }
    }

    /// Whether this error is, or contains, an error of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        match self {
            Error::InvalidYaml(_) => kind == ErrorKind::InvalidYaml,
            Error::ReadingFile { .. } => kind == ErrorKind::ReadingFile,
            Error::Validation(errors) => errors.contains(kind),
            _ => false,
        }
    }

    /// The validation aggregate, if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Every kind of problem the validator or the parser can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MissingRequiredField,
    InvalidFieldName,
    InvalidLengthField,
    InvalidVersionTag,
    InvalidWorkflowType,
    InvalidProcessType,
    InvalidProcessBuild,
    InvalidProcessObjectStoreScope,
    InvalidNetworkingProtocol,
    InvalidProcessCpuResourceLimit,
    InvalidProcessCpuRelation,
    InvalidProcessMemoryResourceLimit,
    InvalidProcessMemoryRelation,
    InvalidNodeSelector,
    DuplicatedWorkflowName,
    DuplicatedProcessName,
    DuplicatedProcessSubscription,
    InvalidProcessSubscription,
    CannotSubscribeToItself,
    CannotSubscribeToNonExistentProcess,
    NotEnoughProcesses,
    InvalidYaml,
    ReadingFile,
}

impl ErrorKind {
    /// Stable machine-parseable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorKind::InvalidFieldName => "INVALID_FIELD_NAME",
            ErrorKind::InvalidLengthField => "INVALID_LENGTH_FIELD",
            ErrorKind::InvalidVersionTag => "INVALID_VERSION_TAG",
            ErrorKind::InvalidWorkflowType => "INVALID_WORKFLOW_TYPE",
            ErrorKind::InvalidProcessType => "INVALID_PROCESS_TYPE",
            ErrorKind::InvalidProcessBuild => "INVALID_PROCESS_BUILD",
            ErrorKind::InvalidProcessObjectStoreScope => "INVALID_PROCESS_OBJECT_STORE_SCOPE",
            ErrorKind::InvalidNetworkingProtocol => "INVALID_NETWORKING_PROTOCOL",
            ErrorKind::InvalidProcessCpuResourceLimit => "INVALID_PROCESS_CPU_RESOURCE_LIMIT",
            ErrorKind::InvalidProcessCpuRelation => "INVALID_PROCESS_CPU_RELATION",
            ErrorKind::InvalidProcessMemoryResourceLimit => {
                "INVALID_PROCESS_MEMORY_RESOURCE_LIMIT"
            }
            ErrorKind::InvalidProcessMemoryRelation => "INVALID_PROCESS_MEMORY_RELATION",
            ErrorKind::InvalidNodeSelector => "INVALID_NODE_SELECTOR",
            ErrorKind::DuplicatedWorkflowName => "DUPLICATED_WORKFLOW_NAME",
            ErrorKind::DuplicatedProcessName => "DUPLICATED_PROCESS_NAME",
            ErrorKind::DuplicatedProcessSubscription => "DUPLICATED_PROCESS_SUBSCRIPTION",
            ErrorKind::InvalidProcessSubscription => "INVALID_PROCESS_SUBSCRIPTION",
            ErrorKind::CannotSubscribeToItself => "CANNOT_SUBSCRIBE_TO_ITSELF",
            ErrorKind::CannotSubscribeToNonExistentProcess => {
                "CANNOT_SUBSCRIBE_TO_NON_EXISTENT_PROCESS"
            }
            ErrorKind::NotEnoughProcesses => "NOT_ENOUGH_PROCESSES",
            ErrorKind::InvalidYaml => "INVALID_YAML",
            ErrorKind::ReadingFile => "READING_FILE",
        }
    }

    /// Human-readable description shared by every error of this kind.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequiredField => "missing required field",
            ErrorKind::InvalidFieldName => {
                "invalid field name; only numbers, hyphens and lowercase letters are allowed"
            }
            ErrorKind::InvalidLengthField => "field length is higher than the maximum",
            ErrorKind::InvalidVersionTag => "invalid version tag; must follow the format 'vX.Y.Z'",
            ErrorKind::InvalidWorkflowType => {
                "invalid workflow type; must be one of 'data', 'training', 'feedback' or 'serving'"
            }
            ErrorKind::InvalidProcessType => {
                "invalid process type; must be one of 'trigger', 'task' or 'exit'"
            }
            ErrorKind::InvalidProcessBuild => {
                "invalid process build; must declare either 'image' or 'dockerfile', not both"
            }
            ErrorKind::InvalidProcessObjectStoreScope => {
                "invalid object store scope; must be either 'product' or 'workflow'"
            }
            ErrorKind::InvalidNetworkingProtocol => {
                "invalid networking protocol; must be either 'TCP' or 'UDP'"
            }
            ErrorKind::InvalidProcessCpuResourceLimit => {
                "invalid CPU quantity; must look like '0.5' or '500m'"
            }
            ErrorKind::InvalidProcessCpuRelation => "CPU limit must be equal or higher than request",
            ErrorKind::InvalidProcessMemoryResourceLimit => {
                "invalid memory quantity; must be an integer followed by a byte unit like 'Mi' or 'G'"
            }
            ErrorKind::InvalidProcessMemoryRelation => {
                "memory limit must be equal or higher than request"
            }
            ErrorKind::InvalidNodeSelector => "invalid node selector",
            ErrorKind::DuplicatedWorkflowName => "workflow names must be unique",
            ErrorKind::DuplicatedProcessName => "process names must be unique",
            ErrorKind::DuplicatedProcessSubscription => "subscriptions cannot be duplicated",
            ErrorKind::InvalidProcessSubscription => "invalid subscription",
            ErrorKind::CannotSubscribeToItself => "cannot subscribe to itself",
            ErrorKind::CannotSubscribeToNonExistentProcess => {
                "cannot subscribe to non existent process"
            }
            ErrorKind::NotEnoughProcesses => {
                "not enough processes declared for this workflow; needs at least 1 trigger and 1 exit"
            }
            ErrorKind::InvalidYaml => "invalid yaml",
            ErrorKind::ReadingFile => "error reading file",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single violation found while validating a manifest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {}{}", .kind.message(), .path, .detail.as_ref().map(|d| format!("; {d}")).unwrap_or_default())]
pub struct ValidationError {
    pub kind: ErrorKind,
    /// Location of the offending field, e.g. `krt.workflows[0].processes[1].name`.
    pub path: String,
    pub detail: Option<String>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn missing(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingRequiredField, path)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.kind.code(),
            "path": self.path,
            "message": self.to_string(),
        })
    }
}

/// Aggregate of every violation found in one validation run, in the order
/// the checks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record `error` if there is one. Convenience for single-result checks.
    pub fn record(&mut self, error: Option<ValidationError>) {
        if let Some(error) = error {
            self.errors.push(error);
        }
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    pub fn as_slice(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Whether any collected error has the given kind.
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Number of collected errors of the given kind.
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Machine-readable report.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "valid": self.errors.is_empty(),
            "errors": self.errors.iter().map(ValidationError::to_json).collect::<Vec<_>>(),
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.errors.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl Extend<ValidationError> for ValidationErrors {
    fn extend<T: IntoIterator<Item = ValidationError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<T: IntoIterator<Item = ValidationError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
