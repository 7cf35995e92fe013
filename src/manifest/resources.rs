//! CPU and memory quantity parsing and request/limit checks.
//!
//! CPU is accepted as whole cores with one decimal (`0.5`) or as millicores
//! with at most three digits (`500m`, `50m`). Memory is an integer followed by a decimal
//! (`k`, `M`, `G`, `T`, `P`, `E`) or binary (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`,
//! `Ei`) byte unit.

use std::sync::OnceLock;

use regex_lite::Regex;

use super::types::ResourceLimit;
use crate::error::{ErrorKind, ValidationError, ValidationErrors};

fn fractional_cpu_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d\.\d$").expect("valid regex"))
}

fn milli_cpu_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}m$").expect("valid regex"))
}

fn memory_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(Ei?|Pi?|Ti?|Gi?|Mi?|k|Ki)$").expect("valid regex"))
}

/// Parse a CPU quantity into millicores.
pub fn parse_cpu_millis(value: &str) -> Option<u64> {
    if fractional_cpu_regex().is_match(value) {
        let (whole, tenths) = value.split_once('.')?;
        let whole: u64 = whole.parse().ok()?;
        let tenths: u64 = tenths.parse().ok()?;
        return Some(whole * 1000 + tenths * 100);
    }

    if milli_cpu_regex().is_match(value) {
        return value.trim_end_matches('m').parse().ok();
    }

    None
}

/// Parse a memory quantity into bytes. Quantities that overflow are rejected.
pub fn parse_memory_bytes(value: &str) -> Option<u128> {
    let caps = memory_regex().captures(value)?;
    let amount: u128 = caps.get(1)?.as_str().parse().ok()?;
    let multiplier = memory_multiplier(caps.get(2)?.as_str())?;
    amount.checked_mul(multiplier)
}

fn memory_multiplier(unit: &str) -> Option<u128> {
    let multiplier = match unit {
        "k" => 1000u128,
        "M" => 1000u128.pow(2),
        "G" => 1000u128.pow(3),
        "T" => 1000u128.pow(4),
        "P" => 1000u128.pow(5),
        "E" => 1000u128.pow(6),
        "Ki" => 1u128 << 10,
        "Mi" => 1u128 << 20,
        "Gi" => 1u128 << 30,
        "Ti" => 1u128 << 40,
        "Pi" => 1u128 << 50,
        "Ei" => 1u128 << 60,
        _ => return None,
    };
    Some(multiplier)
}

fn parse_cpu_quantity(value: &str) -> Option<u128> {
    parse_cpu_millis(value).map(u128::from)
}

fn is_cpu_syntax(value: &str) -> bool {
    fractional_cpu_regex().is_match(value) || milli_cpu_regex().is_match(value)
}

fn is_memory_syntax(value: &str) -> bool {
    memory_regex().is_match(value)
}

/// Rules shared by CPU and memory: how to parse and which kinds to report.
struct QuantityRules {
    format_kind: ErrorKind,
    relation_kind: ErrorKind,
    parse: fn(&str) -> Option<u128>,
    syntax: fn(&str) -> bool,
}

const CPU_RULES: QuantityRules = QuantityRules {
    format_kind: ErrorKind::InvalidProcessCpuResourceLimit,
    relation_kind: ErrorKind::InvalidProcessCpuRelation,
    parse: parse_cpu_quantity,
    syntax: is_cpu_syntax,
};

const MEMORY_RULES: QuantityRules = QuantityRules {
    format_kind: ErrorKind::InvalidProcessMemoryResourceLimit,
    relation_kind: ErrorKind::InvalidProcessMemoryRelation,
    parse: parse_memory_bytes,
    syntax: is_memory_syntax,
};

/// Well-formed quantities that fail to parse are out of range.
fn format_error(rules: &QuantityRules, path: String, value: &str) -> ValidationError {
    let detail = if (rules.syntax)(value) {
        format!("quantity too large: {:?}", value)
    } else {
        format!("got {:?}", value)
    };
    ValidationError::new(rules.format_kind, path).with_detail(detail)
}

/// Validate a process CPU block located at `path` (e.g. `…resourceLimits.CPU`).
pub fn validate_cpu(cpu: Option<&ResourceLimit>, path: &str) -> ValidationErrors {
    validate_quantity(cpu, path, &CPU_RULES)
}

/// Validate a process memory block located at `path`.
pub fn validate_memory(memory: Option<&ResourceLimit>, path: &str) -> ValidationErrors {
    validate_quantity(memory, path, &MEMORY_RULES)
}

fn validate_quantity(
    resource: Option<&ResourceLimit>,
    path: &str,
    rules: &QuantityRules,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let Some(resource) = resource else {
        errors.push(ValidationError::missing(path));
        return errors;
    };

    if resource.request.is_empty() {
        errors.push(ValidationError::missing(format!("{path}.request")));
        return errors;
    }

    let request = (rules.parse)(&resource.request);
    if request.is_none() {
        errors.push(format_error(rules, format!("{path}.request"), &resource.request));
    }

    let limit = match resource.limit.as_deref() {
        Some(limit) if !limit.is_empty() => {
            let parsed = (rules.parse)(limit);
            if parsed.is_none() {
                errors.push(format_error(rules, format!("{path}.limit"), limit));
            }
            parsed
        }
        _ => request,
    };

    if let (Some(request), Some(limit)) = (request, limit) {
        if limit < request {
            errors.push(
                ValidationError::new(rules.relation_kind, path).with_detail(format!(
                    "limit {:?} is lower than request {:?}",
                    resource.effective_limit(),
                    resource.request
                )),
            );
        }
    }

    errors
}
