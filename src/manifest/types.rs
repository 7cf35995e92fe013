//! Manifest type definitions.
//!
//! The model keeps enum-like fields (`type`, `scope`, protocols) as plain
//! strings so a manifest with an unknown value still deserializes and the
//! validator can report it with its path. The typed views live in
//! [`WorkflowType`], [`ProcessType`], [`ObjectStoreScope`] and
//! [`NetworkingProtocol`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A complete workflow manifest.
///
/// # Example YAML
///
/// ```yaml
/// version: v1.0.0
/// description: Email classification pipeline
/// workflows:
///   - name: classify
///     type: data
///     processes:
///       - name: entrypoint
///         type: trigger
///         image: registry/entrypoint:v1
///         subscriptions: [exit]
///         resourceLimits:
///           CPU: { request: 100m, limit: 200m }
///           memory: { request: 100Mi }
///       - name: exit
///         type: exit
///         image: registry/exit:v1
///         subscriptions: [entrypoint]
///         resourceLimits:
///           CPU: { request: 100m }
///           memory: { request: 100Mi }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Semantic version tag (`vX.Y.Z`)
    pub version: String,

    /// Human-readable description
    pub description: String,

    /// Free-form configuration shared by every workflow
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,

    pub workflows: Vec<Workflow>,
}

/// A named group of processes forming one pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workflow {
    pub name: String,

    /// Workflow type: data, training, feedback or serving
    #[serde(rename = "type")]
    pub workflow_type: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,

    pub processes: Vec<Process>,
}

/// A unit of work inside a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Process {
    pub name: String,

    /// Process type: trigger, task or exit
    #[serde(rename = "type")]
    pub process_type: String,

    /// Container image reference
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,

    /// Dockerfile to build the image from, as an alternative to `image`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<bool>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_store: Option<ObjectStore>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: BTreeMap<String, String>,

    /// Names of the processes this one receives messages from
    pub subscriptions: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub networking: Option<Networking>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_limits: Option<ResourceLimits>,

    /// Kubernetes node selector labels
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selectors: BTreeMap<String, String>,
}

/// Object store attached to a process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStore {
    pub name: String,
    /// product or workflow
    pub scope: String,
}

/// Network exposure of a process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Networking {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_protocol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_protocol: Option<String>,
}

/// CPU and memory reservations for a process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    #[serde(rename = "CPU", skip_serializing_if = "Option::is_none")]
    pub cpu: Option<ResourceLimit>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<ResourceLimit>,
}

/// A request/limit pair of resource quantities, e.g. `request: 100m`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimit {
    pub request: String,

    /// Defaults to `request` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

impl ResourceLimit {
    /// The effective limit: the declared one, or the request when absent.
    pub fn effective_limit(&self) -> &str {
        match self.limit.as_deref() {
            Some(limit) if !limit.is_empty() => limit,
            _ => &self.request,
        }
    }
}

/// Workflow types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowType {
    Data,
    Training,
    Feedback,
    Serving,
}

impl WorkflowType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "data" => Some(Self::Data),
            "training" => Some(Self::Training),
            "feedback" => Some(Self::Feedback),
            "serving" => Some(Self::Serving),
            _ => None,
        }
    }
}

/// Process types. Data enters through triggers, is relayed by tasks and
/// leaves through exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessType {
    Trigger,
    Task,
    Exit,
}

impl ProcessType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trigger" => Some(Self::Trigger),
            "task" => Some(Self::Task),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Object store scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectStoreScope {
    Product,
    Workflow,
}

impl ObjectStoreScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "product" => Some(Self::Product),
            "workflow" => Some(Self::Workflow),
            _ => None,
        }
    }
}

/// Networking protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkingProtocol {
    Tcp,
    Udp,
}

impl NetworkingProtocol {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TCP" => Some(Self::Tcp),
            "UDP" => Some(Self::Udp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }
}

impl Manifest {
    /// Total number of processes across every workflow.
    pub fn process_count(&self) -> usize {
        self.workflows.iter().map(|w| w.processes.len()).sum()
    }
}

impl Workflow {
    /// Get a process by name.
    pub fn get_process(&self, name: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.name == name)
    }
}

impl Process {
    /// Typed process type, if valid.
    pub fn kind(&self) -> Option<ProcessType> {
        ProcessType::parse(&self.process_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_membership_is_exact() {
        assert_eq!(WorkflowType::parse("serving"), Some(WorkflowType::Serving));
        assert_eq!(WorkflowType::parse("Serving"), None);
        assert_eq!(ProcessType::parse("exit"), Some(ProcessType::Exit));
        assert_eq!(ProcessType::parse(""), None);
        assert_eq!(ObjectStoreScope::parse("product"), Some(ObjectStoreScope::Product));
        assert_eq!(ObjectStoreScope::parse("global"), None);
        assert_eq!(NetworkingProtocol::parse("UDP"), Some(NetworkingProtocol::Udp));
        assert_eq!(NetworkingProtocol::parse("tcp"), None);
    }

    #[test]
    fn test_effective_limit_falls_back_to_request() {
        let mut limit = ResourceLimit {
            request: "100m".into(),
            limit: None,
        };
        assert_eq!(limit.effective_limit(), "100m");

        limit.limit = Some(String::new());
        assert_eq!(limit.effective_limit(), "100m");

        limit.limit = Some("200m".into());
        assert_eq!(limit.effective_limit(), "200m");
    }
}
