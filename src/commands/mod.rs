//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `setup.rs`: init/register/token/validate/show over graft.json.
//! - `instrument.rs`: add-reporter/add-report/list-reports over Python sources.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `services/*`.
//! - Keep behavior and output schema stable.

pub mod instrument;
pub mod setup;

pub use instrument::handle_instrument_commands;
pub use setup::handle_setup_commands;
