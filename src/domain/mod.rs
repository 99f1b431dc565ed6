//! Shared data model layer (structs/constants/errors only).
//!
//! ## Files
//! - `models.rs`: configuration document, resolved roots, report structs.
//! - `constants.rs`: file names and template placeholders.
//! - `errors.rs`: `GraftError`, the failure taxonomy of the core.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem side effects.
//!
//! ## Compatibility note
//! `RootEntry` is the on-disk schema of `graft.json` and the report structs
//! are the `--json` output schema. Keep changes synchronized with `docs/contracts/*`.

pub mod constants;
pub mod errors;
pub mod models;
