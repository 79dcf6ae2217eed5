//! Narrow process-execution capability.
//!
//! Everything in this crate that shells out (`ldd`, `zip`) goes through
//! [`CommandRunner`], so tests can substitute a fake instead of invoking
//! real system tools.

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::{Command, Output};

/// Runs an external command and captures its stdout, stderr and exit status.
pub trait CommandRunner {
    /// Run `program` with `args`, optionally from working directory `cwd`.
    ///
    /// An `Err` means the process could not be launched at all; an abnormal
    /// exit is reported through `Output::status`, not as an `Err`.
    fn run(&self, program: &str, args: &[&OsStr], cwd: Option<&Path>) -> io::Result<Output>;
}

/// The real thing: spawns processes via [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&OsStr], cwd: Option<&Path>) -> io::Result<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd.output()
    }
}
