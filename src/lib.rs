//! krt-lint - validator for KRT workflow manifests
//!
//! A manifest declares one or more workflows. Each workflow is a set of
//! processes (triggers, tasks and exits) wired together by subscriptions.
//! krt-lint checks a manifest and reports every violation at once, each with
//! a stable error kind and the path of the offending field.
//!
//! ## Example
//!
//! ```yaml
//! version: v1.0.0
//! description: Email classification pipeline
//!
//! workflows:
//!   - name: classify
//!     type: data
//!     processes:
//!       - name: entrypoint
//!         type: trigger
//!         image: registry.local/entrypoint:v1
//!         subscriptions: [exit]
//!         resourceLimits:
//!           CPU: { request: 100m }
//!           memory: { request: 100Mi }
//!
//!       - name: exit
//!         type: exit
//!         image: registry.local/exit:v1
//!         subscriptions: [entrypoint]
//!         resourceLimits:
//!           CPU: { request: 100m }
//!           memory: { request: 100Mi }
//! ```
//!
//! ```no_run
//! use krt_lint::manifest::{parse_manifest_file, validate_manifest};
//!
//! let manifest = parse_manifest_file("krt.yml".as_ref())?;
//! if let Err(errors) = validate_manifest(&manifest) {
//!     eprintln!("{errors}");
//! }
//! # Ok::<(), krt_lint::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod labels;
pub mod manifest;

pub use error::{Error, ErrorKind, Result, ValidationError, ValidationErrors};
