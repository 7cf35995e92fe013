//! Manifest validation.
//!
//! Composes, in order:
//! - manifest fields (description, version)
//! - workflow list presence and duplicated workflow names
//! - per workflow: name, type, process list presence, every process, then
//!   the subscription graph
//! - per process: name, type, build, object store, subscriptions presence,
//!   networking, resource limits, node selectors
//!
//! Every independent check runs and all errors are returned together. A
//! check is skipped only when it depends on an absent block.

use std::path::Path;

use tracing::{debug, info};

use super::fields::{validate_enum, validate_name, validate_required, validate_version};
use super::parser::{parse_manifest_file, parse_manifest_file_raw};
use super::resources::{validate_cpu, validate_memory};
use super::subscriptions::validate_subscriptions;
use super::types::{
    Manifest, Networking, NetworkingProtocol, ObjectStore, ObjectStoreScope, Process,
    ProcessType, Workflow, WorkflowType,
};
use crate::error::{ErrorKind, ValidationError, ValidationErrors};
use crate::labels::{KubernetesLabels, LabelValidator};

/// Validate a manifest with the default Kubernetes label rules.
pub fn validate_manifest(manifest: &Manifest) -> Result<(), ValidationErrors> {
    ManifestValidator::new(KubernetesLabels).validate(manifest)
}

/// Read, parse and validate a manifest file.
///
/// Rule violations come back as [`Error::Validation`](crate::Error::Validation).
pub fn check_manifest_file(path: &Path, apply_defaults: bool) -> crate::Result<Manifest> {
    let manifest = if apply_defaults {
        parse_manifest_file(path)?
    } else {
        parse_manifest_file_raw(path)?
    };
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Manifest validator, generic over the node selector syntax.
///
/// `ManifestValidator::new(KubernetesLabels)` is what [`validate_manifest`]
/// uses.
#[derive(Debug, Clone, Default)]
pub struct ManifestValidator<L = KubernetesLabels> {
    labels: L,
}

impl<L: LabelValidator> ManifestValidator<L> {
    pub fn new(labels: L) -> Self {
        Self { labels }
    }

    /// Run every check and return all violations found.
    pub fn validate(&self, manifest: &Manifest) -> Result<(), ValidationErrors> {
        let errors = self.collect(manifest);
        if errors.is_empty() {
            info!(
                workflows = manifest.workflows.len(),
                processes = manifest.process_count(),
                "manifest is valid"
            );
        } else {
            info!(errors = errors.len(), "manifest is invalid");
        }
        errors.into_result()
    }

    /// Run every check and return the (possibly empty) aggregate.
    pub fn collect(&self, manifest: &Manifest) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        errors.record(validate_required(&manifest.description, "krt.description"));
        errors.record(validate_version(&manifest.version, "krt.version"));

        if manifest.workflows.is_empty() {
            errors.push(ValidationError::missing("krt.workflows"));
            return errors;
        }

        errors.merge(duplicated_workflow_names(&manifest.workflows));

        for (workflow_idx, workflow) in manifest.workflows.iter().enumerate() {
            errors.merge(self.validate_workflow(workflow, workflow_idx));
        }

        errors
    }

    fn validate_workflow(&self, workflow: &Workflow, workflow_idx: usize) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let path = format!("krt.workflows[{workflow_idx}]");
        debug!(workflow = %workflow.name, index = workflow_idx, "validating workflow");

        errors.record(validate_name(&workflow.name, &format!("{path}.name")));
        errors.record(validate_enum(
            &workflow.workflow_type,
            WorkflowType::parse,
            ErrorKind::InvalidWorkflowType,
            &format!("{path}.type"),
        ));

        if workflow.processes.is_empty() {
            errors.push(ValidationError::missing(format!("{path}.processes")));
            return errors;
        }

        for (process_idx, process) in workflow.processes.iter().enumerate() {
            let process_path = format!("{path}.processes[{process_idx}]");
            errors.merge(self.validate_process(process, &process_path));
        }

        errors.merge(validate_subscriptions(&workflow.processes, workflow_idx));
        errors
    }

    fn validate_process(&self, process: &Process, path: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        errors.record(validate_name(&process.name, &format!("{path}.name")));
        errors.record(validate_enum(
            &process.process_type,
            ProcessType::parse,
            ErrorKind::InvalidProcessType,
            &format!("{path}.type"),
        ));
        errors.record(validate_build(process, path));

        if let Some(object_store) = &process.object_store {
            errors.merge(validate_object_store(object_store, &format!("{path}.objectStore")));
        }

        // Triggers originate data and need no subscriptions.
        if process.kind() != Some(ProcessType::Trigger) && process.subscriptions.is_empty() {
            errors.push(ValidationError::missing(format!("{path}.subscriptions")));
        }

        if let Some(networking) = &process.networking {
            errors.merge(validate_networking(networking, &format!("{path}.networking")));
        }

        let limits_path = format!("{path}.resourceLimits");
        match &process.resource_limits {
            Some(limits) => {
                errors.merge(validate_cpu(limits.cpu.as_ref(), &format!("{limits_path}.CPU")));
                errors.merge(validate_memory(
                    limits.memory.as_ref(),
                    &format!("{limits_path}.memory"),
                ));
            }
            None => errors.push(ValidationError::missing(limits_path)),
        }

        for (key, value) in &process.node_selectors {
            let selector_path = format!("{path}.nodeSelectors.{key}");
            let result = self
                .labels
                .validate_key(key)
                .and_then(|_| self.labels.validate_value(value));
            if let Err(e) = result {
                errors.push(
                    ValidationError::new(ErrorKind::InvalidNodeSelector, selector_path)
                        .with_detail(e.to_string()),
                );
            }
        }

        errors
    }
}

fn duplicated_workflow_names(workflows: &[Workflow]) -> ValidationErrors {
    let mut seen = std::collections::HashSet::with_capacity(workflows.len());
    workflows
        .iter()
        .enumerate()
        .filter(|(_, workflow)| !seen.insert(workflow.name.as_str()))
        .map(|(idx, workflow)| {
            ValidationError::new(
                ErrorKind::DuplicatedWorkflowName,
                format!("krt.workflows[{idx}].name"),
            )
            .with_detail(format!("{:?} is already declared", workflow.name))
        })
        .collect()
}

/// A process is built from exactly one source: an image or a Dockerfile.
fn validate_build(process: &Process, path: &str) -> Option<ValidationError> {
    let has_dockerfile = process.dockerfile.as_deref().is_some_and(|d| !d.is_empty());
    match (process.image.is_empty(), has_dockerfile) {
        (true, false) => Some(ValidationError::missing(format!("{path}.image"))),
        (false, true) => Some(ValidationError::new(
            ErrorKind::InvalidProcessBuild,
            format!("{path}.build"),
        )),
        _ => None,
    }
}

fn validate_object_store(object_store: &ObjectStore, path: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    errors.record(validate_name(&object_store.name, &format!("{path}.name")));

    let scope_path = format!("{path}.scope");
    if object_store.scope.is_empty() {
        errors.push(ValidationError::missing(scope_path));
    } else {
        errors.record(validate_enum(
            &object_store.scope,
            ObjectStoreScope::parse,
            ErrorKind::InvalidProcessObjectStoreScope,
            &scope_path,
        ));
    }

    errors
}

fn validate_networking(networking: &Networking, path: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let endpoints = [
        ("target", networking.target_port, &networking.target_protocol),
        (
            "destination",
            networking.destination_port,
            &networking.destination_protocol,
        ),
    ];

    for (side, port, protocol) in endpoints {
        if port.unwrap_or(0) == 0 {
            errors.push(ValidationError::missing(format!("{path}.{side}Port")));
        }

        let protocol_path = format!("{path}.{side}Protocol");
        match protocol.as_deref() {
            None | Some("") => errors.push(ValidationError::missing(protocol_path)),
            Some(protocol) => errors.record(validate_enum(
                protocol,
                NetworkingProtocol::parse,
                ErrorKind::InvalidNetworkingProtocol,
                &protocol_path,
            )),
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelError;
    use crate::manifest::fixtures::{manifest, process};
    use crate::manifest::types::{ResourceLimit, ResourceLimits};

    fn collect(manifest: &Manifest) -> ValidationErrors {
        ManifestValidator::new(KubernetesLabels).collect(manifest)
    }

    fn paths(errors: &ValidationErrors) -> Vec<&str> {
        errors.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_valid_manifest() {
        assert!(validate_manifest(&manifest()).is_ok());
    }

    #[test]
    fn test_trigger_subscribing_to_itself_is_the_only_error() {
        let mut m = manifest();
        m.workflows[0].processes[0].subscriptions = vec!["test-trigger".into()];

        let errors = validate_manifest(&m).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(ErrorKind::CannotSubscribeToItself));
        assert_eq!(
            errors.as_slice()[0].path,
            "krt.workflows[0].processes[0].subscriptions.test-trigger"
        );
    }

    #[test]
    fn test_manifest_fields() {
        let mut m = manifest();
        m.description.clear();
        m.version = "1.0".into();

        let errors = collect(&m);
        assert_eq!(paths(&errors), vec!["krt.description", "krt.version"]);
        assert!(errors.contains(ErrorKind::MissingRequiredField));
        assert!(errors.contains(ErrorKind::InvalidVersionTag));
    }

    #[test]
    fn test_missing_workflows() {
        let mut m = manifest();
        m.workflows.clear();

        let errors = collect(&m);
        assert_eq!(paths(&errors), vec!["krt.workflows"]);
    }

    #[test]
    fn test_duplicated_workflow_names() {
        let mut m = manifest();
        let copy = m.workflows[0].clone();
        m.workflows.push(copy.clone());
        m.workflows.push(copy);

        let errors = collect(&m);
        assert_eq!(errors.count(ErrorKind::DuplicatedWorkflowName), 2);
        assert_eq!(
            paths(&errors),
            vec!["krt.workflows[1].name", "krt.workflows[2].name"]
        );
    }

    #[test]
    fn test_workflow_name_and_type() {
        let mut m = manifest();
        m.workflows[0].name = "Invalid string!".into();
        m.workflows[0].workflow_type = "batch".into();

        let errors = collect(&m);
        assert_eq!(
            errors.iter().map(|e| e.kind).collect::<Vec<_>>(),
            vec![ErrorKind::InvalidFieldName, ErrorKind::InvalidWorkflowType]
        );
        assert_eq!(
            paths(&errors),
            vec!["krt.workflows[0].name", "krt.workflows[0].type"]
        );
    }

    #[test]
    fn test_missing_processes_skips_graph() {
        let mut m = manifest();
        m.workflows[0].processes.clear();

        let errors = collect(&m);
        assert_eq!(paths(&errors), vec!["krt.workflows[0].processes"]);
        assert!(!errors.contains(ErrorKind::NotEnoughProcesses));
    }

    #[test]
    fn test_process_name_rules() {
        let mut m = manifest();
        m.workflows[0].processes[1].name = "this-is-a-very-long-name-for-a-valid-resource".into();
        m.workflows[0].processes[0].subscriptions =
            vec!["this-is-a-very-long-name-for-a-valid-resource".into()];

        let errors = collect(&m);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(ErrorKind::InvalidLengthField));
        assert_eq!(paths(&errors), vec!["krt.workflows[0].processes[1].name"]);
    }

    #[test]
    fn test_invalid_enums_reported_together() {
        let mut m = manifest();
        m.workflows[0].workflow_type = "invalid".into();
        let p = &mut m.workflows[0].processes[1];
        p.object_store = Some(ObjectStore {
            name: "store".into(),
            scope: "global".into(),
        });
        p.networking = Some(Networking {
            target_port: Some(9000),
            target_protocol: Some("HTTP".into()),
            destination_port: Some(9000),
            destination_protocol: Some("TCP".into()),
        });

        let errors = collect(&m);
        assert!(errors.contains(ErrorKind::InvalidWorkflowType));
        assert!(errors.contains(ErrorKind::InvalidProcessObjectStoreScope));
        assert!(errors.contains(ErrorKind::InvalidNetworkingProtocol));
        assert!(paths(&errors).contains(&"krt.workflows[0].processes[1].networking.targetProtocol"));
    }

    #[test]
    fn test_invalid_process_type_also_breaks_graph_rules() {
        let mut m = manifest();
        m.workflows[0].processes[1].process_type = "invalid".into();

        let errors = collect(&m);
        assert!(errors.contains(ErrorKind::InvalidProcessType));
        assert!(errors.contains(ErrorKind::NotEnoughProcesses));
        assert!(errors.contains(ErrorKind::InvalidProcessSubscription));
    }

    #[test]
    fn test_object_store_required_fields() {
        let mut m = manifest();
        m.workflows[0].processes[0].object_store = Some(ObjectStore::default());

        let errors = collect(&m);
        assert_eq!(
            paths(&errors),
            vec![
                "krt.workflows[0].processes[0].objectStore.name",
                "krt.workflows[0].processes[0].objectStore.scope",
            ]
        );
        assert_eq!(errors.count(ErrorKind::MissingRequiredField), 2);
    }

    #[test]
    fn test_networking_required_fields() {
        let mut m = manifest();
        m.workflows[0].processes[0].networking = Some(Networking {
            target_port: None,
            target_protocol: Some("UDP".into()),
            destination_port: Some(0),
            destination_protocol: None,
        });

        let errors = collect(&m);
        assert_eq!(
            paths(&errors),
            vec![
                "krt.workflows[0].processes[0].networking.targetPort",
                "krt.workflows[0].processes[0].networking.destinationPort",
                "krt.workflows[0].processes[0].networking.destinationProtocol",
            ]
        );
    }

    #[test]
    fn test_build_sources() {
        let mut m = manifest();
        m.workflows[0].processes[0].image.clear();
        m.workflows[0].processes[1].dockerfile = Some("./Dockerfile".into());

        let errors = collect(&m);
        assert_eq!(
            paths(&errors),
            vec![
                "krt.workflows[0].processes[0].image",
                "krt.workflows[0].processes[1].build",
            ]
        );
        assert!(errors.contains(ErrorKind::InvalidProcessBuild));

        let mut m = manifest();
        m.workflows[0].processes[0].image.clear();
        m.workflows[0].processes[0].dockerfile = Some("./Dockerfile".into());
        assert!(collect(&m).is_empty());
    }

    #[test]
    fn test_subscriptions_required_for_non_triggers() {
        let mut m = manifest();
        m.workflows[0].processes[0].subscriptions.clear();
        m.workflows[0].processes[1].subscriptions.clear();

        let errors = collect(&m);
        assert_eq!(
            paths(&errors),
            vec!["krt.workflows[0].processes[1].subscriptions"]
        );
    }

    #[test]
    fn test_resource_limits() {
        let mut m = manifest();
        m.workflows[0].processes[0].resource_limits = None;
        m.workflows[0].processes[1].resource_limits = Some(ResourceLimits {
            cpu: Some(ResourceLimit {
                request: "100m".into(),
                limit: Some("50m".into()),
            }),
            memory: Some(ResourceLimit {
                request: "2Mi".into(),
                limit: Some("2000k".into()),
            }),
        });

        let errors = collect(&m);
        assert_eq!(
            paths(&errors),
            vec![
                "krt.workflows[0].processes[0].resourceLimits",
                "krt.workflows[0].processes[1].resourceLimits.CPU",
                "krt.workflows[0].processes[1].resourceLimits.memory",
            ]
        );
        assert!(errors.contains(ErrorKind::InvalidProcessCpuRelation));
        assert!(errors.contains(ErrorKind::InvalidProcessMemoryRelation));
    }

    #[test]
    fn test_resource_limits_missing_blocks() {
        let mut m = manifest();
        m.workflows[0].processes[0].resource_limits = Some(ResourceLimits::default());

        let errors = collect(&m);
        assert_eq!(
            paths(&errors),
            vec![
                "krt.workflows[0].processes[0].resourceLimits.CPU",
                "krt.workflows[0].processes[0].resourceLimits.memory",
            ]
        );
    }

    #[test]
    fn test_node_selectors() {
        let mut m = manifest();
        let selectors = &mut m.workflows[0].processes[0].node_selectors;
        selectors.insert("kubernetes.io/arch".into(), "amd64".into());
        selectors.insert("bad key!".into(), "x".into());
        selectors.insert("gpu".into(), "not valid".into());

        let errors = collect(&m);
        assert_eq!(errors.count(ErrorKind::InvalidNodeSelector), 2);
        assert_eq!(
            paths(&errors),
            vec![
                "krt.workflows[0].processes[0].nodeSelectors.bad key!",
                "krt.workflows[0].processes[0].nodeSelectors.gpu",
            ]
        );
    }

    struct RejectEverything;

    impl LabelValidator for RejectEverything {
        fn validate_key(&self, _key: &str) -> Result<(), LabelError> {
            Err(LabelError::InvalidKeyFormat)
        }

        fn validate_value(&self, _value: &str) -> Result<(), LabelError> {
            Ok(())
        }
    }

    #[test]
    fn test_custom_label_validator() {
        let mut m = manifest();
        m.workflows[0].processes[1]
            .node_selectors
            .insert("gpu".into(), "true".into());

        let errors = ManifestValidator::new(RejectEverything).collect(&m);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(ErrorKind::InvalidNodeSelector));
    }

    #[test]
    fn test_errors_from_every_level_are_collected() {
        let mut m = manifest();
        m.description.clear();
        m.workflows[0].workflow_type = "nope".into();
        m.workflows[0].processes.push(process("test-exit", "exit", &["test-trigger"]));
        m.workflows[0].processes[0]
            .subscriptions
            .push("test-exit".into());

        let errors = collect(&m);
        assert_eq!(
            errors.iter().map(|e| e.kind).collect::<Vec<_>>(),
            vec![
                ErrorKind::MissingRequiredField,
                ErrorKind::InvalidWorkflowType,
                ErrorKind::DuplicatedProcessSubscription,
                ErrorKind::DuplicatedProcessName,
            ]
        );
        assert_eq!(errors.to_string().lines().count(), 4);
    }

    const PIPELINE: &str = r#"
version: v1.0.0
description: Minimal pipeline
workflows:
  - name: pipeline
    type: data
    processes:
      - name: entrypoint
        type: trigger
        image: registry.local/entrypoint:v1
        subscriptions: [exit]
        networking:
          targetProtocol: UDP
        resourceLimits:
          CPU: { request: 100m }
          memory: { request: 100Mi }
      - name: exit
        type: exit
        image: registry.local/exit:v1
        subscriptions: [entrypoint]
        resourceLimits:
          CPU: { request: "1" }
          memory: { request: 100Mi }
"#;

    #[test]
    fn test_malformed_request_reported_once_after_defaults() {
        let m = crate::manifest::parse_manifest(PIPELINE).unwrap();
        let errors = validate_manifest(&m).unwrap_err();
        assert_eq!(errors.len(), 1, "{errors}");
        assert_eq!(
            errors.as_slice()[0].path,
            "krt.workflows[0].processes[1].resourceLimits.CPU.request"
        );
    }

    #[test]
    fn test_networking_ports_come_from_defaults() {
        let yaml = PIPELINE.replace(r#"request: "1""#, "request: 100m");

        let m = crate::manifest::parse_manifest(&yaml).unwrap();
        assert!(validate_manifest(&m).is_ok());

        let raw = crate::manifest::parse_manifest_raw(&yaml).unwrap();
        let errors = collect(&raw);
        assert_eq!(
            paths(&errors),
            vec![
                "krt.workflows[0].processes[0].networking.targetPort",
                "krt.workflows[0].processes[0].networking.destinationPort",
                "krt.workflows[0].processes[0].networking.destinationProtocol",
            ]
        );
    }

    #[test]
    fn test_check_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("krt.yml");

        std::fs::write(&path, PIPELINE.replace(r#"request: "1""#, "request: 100m")).unwrap();
        let m = check_manifest_file(&path, true).unwrap();
        assert_eq!(m.process_count(), 2);

        std::fs::write(&path, PIPELINE).unwrap();
        let err = check_manifest_file(&path, true).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.is(ErrorKind::InvalidProcessCpuResourceLimit));
        assert_eq!(err.validation_errors().map(ValidationErrors::len), Some(1));

        let err = check_manifest_file(&dir.path().join("absent.yml"), true).unwrap_err();
        assert!(err.validation_errors().is_none());
        assert!(err.is(ErrorKind::ReadingFile));
    }
}
