//! Subscription graph checks for one workflow.
//!
//! Runs over the full process list in two passes. The first indexes process
//! names, counts process types and flags duplicated names and duplicated
//! subscriptions. The second checks every subscription against the index:
//! no self references, no unknown targets, and the type compatibility rule
//! (see [`can_subscribe`]).
//!
//! Only the local type rule is enforced. Tasks may subscribe to each other in
//! a loop; no acyclicity check is performed across task chains.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::types::{Process, ProcessType};
use crate::error::{ErrorKind, ValidationError, ValidationErrors};

/// Whether a process of type `subscriber` may subscribe to one of type
/// `target`. Triggers only listen to exits; tasks and exits listen to
/// anything but exits. Unknown types never subscribe.
pub fn can_subscribe(subscriber: Option<ProcessType>, target: Option<ProcessType>) -> bool {
    match subscriber {
        Some(ProcessType::Trigger) => target == Some(ProcessType::Exit),
        Some(ProcessType::Task | ProcessType::Exit) => target != Some(ProcessType::Exit),
        None => false,
    }
}

fn subscription_path(workflow_idx: usize, process_idx: usize, subscription: &str) -> String {
    format!("krt.workflows[{workflow_idx}].processes[{process_idx}].subscriptions.{subscription}")
}

#[derive(Default)]
struct TypeCounts {
    triggers: usize,
    tasks: usize,
    exits: usize,
}

/// Validate the subscriptions of every process in a workflow.
pub fn validate_subscriptions(processes: &[Process], workflow_idx: usize) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let index = index_processes(processes, workflow_idx, &mut errors);
    check_subscriptions(processes, workflow_idx, &index, &mut errors);
    errors
}

/// First pass. Returns name → raw process type; the first occurrence of a
/// duplicated name wins.
fn index_processes<'a>(
    processes: &'a [Process],
    workflow_idx: usize,
    errors: &mut ValidationErrors,
) -> HashMap<&'a str, &'a str> {
    let mut types_by_name: HashMap<&str, &str> = HashMap::with_capacity(processes.len());
    let mut counts = TypeCounts::default();

    for (process_idx, process) in processes.iter().enumerate() {
        let mut seen = HashSet::with_capacity(process.subscriptions.len());
        for subscription in &process.subscriptions {
            if !seen.insert(subscription.as_str()) {
                errors.push(ValidationError::new(
                    ErrorKind::DuplicatedProcessSubscription,
                    subscription_path(workflow_idx, process_idx, subscription),
                ));
            }
        }

        match process.kind() {
            Some(ProcessType::Trigger) => counts.triggers += 1,
            Some(ProcessType::Task) => counts.tasks += 1,
            Some(ProcessType::Exit) => counts.exits += 1,
            None => {}
        }

        if types_by_name.contains_key(process.name.as_str()) {
            errors.push(
                ValidationError::new(
                    ErrorKind::DuplicatedProcessName,
                    format!("krt.workflows[{workflow_idx}].processes[{process_idx}].name"),
                )
                .with_detail(format!("{:?} is already declared", process.name)),
            );
        } else {
            types_by_name.insert(process.name.as_str(), process.process_type.as_str());
        }
    }

    debug!(
        workflow = workflow_idx,
        triggers = counts.triggers,
        tasks = counts.tasks,
        exits = counts.exits,
        "indexed workflow processes"
    );

    if counts.triggers == 0 || counts.exits == 0 {
        errors.push(ValidationError::new(
            ErrorKind::NotEnoughProcesses,
            format!("krt.workflows[{workflow_idx}].processes"),
        ));
    }

    types_by_name
}

/// Second pass over every (process, subscription) pair.
fn check_subscriptions(
    processes: &[Process],
    workflow_idx: usize,
    types_by_name: &HashMap<&str, &str>,
    errors: &mut ValidationErrors,
) {
    for (process_idx, process) in processes.iter().enumerate() {
        for subscription in &process.subscriptions {
            let path = subscription_path(workflow_idx, process_idx, subscription);

            if *subscription == process.name {
                errors.push(ValidationError::new(ErrorKind::CannotSubscribeToItself, path));
                continue;
            }

            let Some(target_type) = types_by_name.get(subscription.as_str()) else {
                errors.push(
                    ValidationError::new(ErrorKind::CannotSubscribeToNonExistentProcess, path)
                        .with_detail(format!("process named {:?} does not exist", subscription)),
                );
                continue;
            };

            if !can_subscribe(process.kind(), ProcessType::parse(target_type)) {
                errors.push(
                    ValidationError::new(ErrorKind::InvalidProcessSubscription, path).with_detail(
                        format!(
                            "a process of type {:?} cannot subscribe to {:?} processes",
                            process.process_type, target_type
                        ),
                    ),
                );
            }
        }
    }
}
