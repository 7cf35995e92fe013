//! Kubernetes label syntax for node selectors.
//!
//! The manifest validator only asks "is this key / value acceptable?"; the
//! grammar lives behind [`LabelValidator`] so deployments targeting a
//! different scheduler can plug in their own rules.

use std::sync::OnceLock;

use regex_lite::Regex;
use thiserror::Error;

const MAX_NAME_LENGTH: usize = 63;
const MAX_VALUE_LENGTH: usize = 63;
const MAX_DNS_SUBDOMAIN_LENGTH: usize = 253;

/// Reasons a node selector key or value is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("invalid key format: key must be a name with an optional DNS subdomain prefix joined by '/'")]
    InvalidKeyFormat,

    #[error("invalid prefix {prefix:?}: {reason}")]
    InvalidPrefix { prefix: String, reason: String },

    #[error("missing mandatory name")]
    MissingName,

    #[error("name {0:?} is longer than 63 characters")]
    NameTooLong(String),

    #[error("invalid name {0:?}: must be alphanumeric, '-', '_' or '.', starting and ending with an alphanumeric character")]
    InvalidName(String),

    #[error("value {0:?} is longer than 63 characters")]
    ValueTooLong(String),

    #[error("invalid value {0:?}: must be alphanumeric, '-', '_' or '.', starting and ending with an alphanumeric character")]
    InvalidValue(String),
}

/// Syntax rules for node selector labels.
pub trait LabelValidator {
    fn validate_key(&self, key: &str) -> Result<(), LabelError>;
    fn validate_value(&self, value: &str) -> Result<(), LabelError>;
}

/// Kubernetes qualified-name and label-value syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubernetesLabels;

fn qualified_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("valid regex")
    })
}

fn dns_subdomain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
            .expect("valid regex")
    })
}

impl KubernetesLabels {
    fn validate_name(name: &str) -> Result<(), LabelError> {
        if name.is_empty() {
            return Err(LabelError::MissingName);
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(LabelError::NameTooLong(name.to_string()));
        }
        if !qualified_name_regex().is_match(name) {
            return Err(LabelError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn validate_prefix(prefix: &str) -> Result<(), LabelError> {
        let reason = if prefix.is_empty() {
            "prefix cannot be empty"
        } else if prefix.len() > MAX_DNS_SUBDOMAIN_LENGTH {
            "prefix too long"
        } else if !dns_subdomain_regex().is_match(prefix) {
            "prefix must be a lowercase DNS subdomain"
        } else {
            return Ok(());
        };

        Err(LabelError::InvalidPrefix {
            prefix: prefix.to_string(),
            reason: reason.to_string(),
        })
    }
}

impl LabelValidator for KubernetesLabels {
    fn validate_key(&self, key: &str) -> Result<(), LabelError> {
        let sections: Vec<&str> = key.split('/').collect();
        match sections.as_slice() {
            [name] => Self::validate_name(name),
            [prefix, name] => {
                Self::validate_prefix(prefix)?;
                Self::validate_name(name)
            }
            _ => Err(LabelError::InvalidKeyFormat),
        }
    }

    fn validate_value(&self, value: &str) -> Result<(), LabelError> {
        if value.len() > MAX_VALUE_LENGTH {
            return Err(LabelError::ValueTooLong(value.to_string()));
        }
        if !qualified_name_regex().is_match(value) {
            return Err(LabelError::InvalidValue(value.to_string()));
        }
        Ok(())
    }
}
