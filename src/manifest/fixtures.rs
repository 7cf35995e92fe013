//! Manifest builders shared by the validator tests.

use super::types::{Manifest, Process, ResourceLimit, ResourceLimits, Workflow};

pub(crate) fn valid_limits() -> ResourceLimits {
    ResourceLimits {
        cpu: Some(ResourceLimit {
            request: "100m".into(),
            limit: Some("200m".into()),
        }),
        memory: Some(ResourceLimit {
            request: "100Mi".into(),
            limit: Some("200Mi".into()),
        }),
    }
}

/// A process that passes every per-process rule.
pub(crate) fn process(name: &str, process_type: &str, subscriptions: &[&str]) -> Process {
    Process {
        name: name.into(),
        process_type: process_type.into(),
        image: format!("registry.local/{name}:v1"),
        subscriptions: subscriptions.iter().map(|s| s.to_string()).collect(),
        resource_limits: Some(valid_limits()),
        ..Default::default()
    }
}

/// One data workflow: `test-trigger` and `test-exit` subscribed to each other.
pub(crate) fn manifest() -> Manifest {
    Manifest {
        version: "v1.0.0".into(),
        description: "Test manifest".into(),
        workflows: vec![Workflow {
            name: "test-workflow".into(),
            workflow_type: "data".into(),
            processes: vec![
                process("test-trigger", "trigger", &["test-exit"]),
                process("test-exit", "exit", &["test-trigger"]),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}
