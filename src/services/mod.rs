//! Service layer containing business logic and side-effect helpers.
//!
//! ## Service map
//! - `config_store.rs`: graft.json load/validate/save and root registration.
//! - `path_resolver.rs`: root layout discovery and module references to the stub.
//! - `template.rs`: reporter stub rendering and activation statements.
//! - `python_scan.rs`: top-level statement scanner for Python sources.
//! - `patcher.rs`: idempotent insertion after the import block.
//! - `orchestrator.rs`: add-reporter and add-report use cases.
//! - `inventory.rs`: read-only listing of report sites.
//! - `storage.rs`: atomic replace/create-new file writes.
//! - `output.rs`: JSON/text output helpers.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod config_store;
pub mod inventory;
pub mod orchestrator;
pub mod output;
pub mod path_resolver;
pub mod patcher;
pub mod python_scan;
pub mod storage;
pub mod template;
