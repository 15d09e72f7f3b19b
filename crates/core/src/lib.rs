//! classplit: split a monolithic C++ source into per-class translation units.
//!
//! There is no compiler front end here. Class boundaries, access sections and
//! member signatures are inferred from surface syntax and brace nesting. Every
//! heuristic prefers skipping a class, with a warning, over corrupting the
//! source.
//!
//! # Modules
//!
//! - [`braces`]: Brace-depth scanning
//! - [`locate`]: Class boundary location from approximate line hints
//! - [`extract`]: In-place removal of located class ranges
//! - [`qualify`]: `ClassName::` qualification of member signatures
//! - [`splice`]: Include block insertion after the anchor line
//! - [`run`]: Orchestration of a whole split run
//! - [`header`]: Optional `<Class>.h` declaration synthesis
//! - [`dedupe`]: Duplicate include block removal
//! - [`raw_strings`]: Raw string literal to quoted literal conversion
//! - [`config`]: `.classplit.toml` loading
//! - [`types`]: Core types shared across the crate
//! - [`error`]: Fatal error taxonomy

pub mod braces;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod extract;
pub mod header;
pub mod locate;
pub mod qualify;
pub mod raw_strings;
pub mod run;
pub mod splice;
pub mod types;

pub use config::{load_config, SplitConfig};
pub use error::SplitError;
pub use run::{run, split_buffer, RunOptions};
