//! Bundling of the update-payload generator and its dependencies.
//!
//! Resolves the shared libraries a set of dynamically-linked executables
//! need via `ldd`, filters out libraries assumed present on every target
//! system, and stages everything alongside declared scripts and support
//! directories for zipping into a single self-contained archive.

mod archive;
mod blacklist;
mod ldd;
mod manifest;
mod runner;
mod stage;

pub use archive::{copy_to_destination, create_zip};
pub use blacklist::Blacklist;
pub use ldd::{parse_ldd_line, parse_ldd_output, resolve_dependencies, LDD};
pub use manifest::default_bundle;
pub use runner::{CommandRunner, SystemRunner};
pub use stage::{copy_dir_recursive, stage_bundle, Bundle};
