//! Default value population.
//!
//! Runs once after parsing so downstream consumers see explicit values.
//! Running it again is a no-op.

use super::resources::{parse_cpu_millis, parse_memory_bytes};
use super::types::{Manifest, NetworkingProtocol, Process, ResourceLimit};

pub const DEFAULT_REPLICAS: u32 = 1;
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_GPU: bool = false;
pub const DEFAULT_PROTOCOL: NetworkingProtocol = NetworkingProtocol::Tcp;

/// Fill every omitted optional field of the manifest with its default.
pub fn apply_defaults(manifest: &mut Manifest) {
    for workflow in &mut manifest.workflows {
        for process in &mut workflow.processes {
            apply_process_defaults(process);
        }
    }
}

fn apply_process_defaults(process: &mut Process) {
    process.replicas.get_or_insert(DEFAULT_REPLICAS);
    process.gpu.get_or_insert(DEFAULT_GPU);

    if let Some(networking) = &mut process.networking {
        fill_port(&mut networking.target_port);
        fill_port(&mut networking.destination_port);
        fill_blank(&mut networking.target_protocol, DEFAULT_PROTOCOL.as_str());
        fill_blank(&mut networking.destination_protocol, DEFAULT_PROTOCOL.as_str());
    }

    if let Some(limits) = &mut process.resource_limits {
        if let Some(cpu) = &mut limits.cpu {
            if parse_cpu_millis(&cpu.request).is_some() {
                default_limit_to_request(cpu);
            }
        }
        if let Some(memory) = &mut limits.memory {
            if parse_memory_bytes(&memory.request).is_some() {
                default_limit_to_request(memory);
            }
        }
    }
}

fn fill_blank(field: &mut Option<String>, value: &str) {
    if field.as_deref().map_or(true, str::is_empty) {
        *field = Some(value.to_string());
    }
}

fn fill_port(port: &mut Option<u16>) {
    if port.unwrap_or(0) == 0 {
        *port = Some(DEFAULT_PORT);
    }
}

/// Only called for a request that parses; a malformed one is left for the
/// validator to report once.
fn default_limit_to_request(resource: &mut ResourceLimit) {
    if resource.limit.as_deref().map_or(true, str::is_empty) {
        resource.limit = Some(resource.request.clone());
    }
}
