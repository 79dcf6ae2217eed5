//! Shared-library dependency discovery using ldd.

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, error};

use crate::blacklist::Blacklist;
use crate::runner::CommandRunner;

/// The dynamic-linker query tool.
pub const LDD: &str = "/usr/bin/ldd";

/// Extract the resolved library from one line of ldd output.
///
/// Example ldd output:
/// ```text
///     linux-vdso.so.1 =>  (0x00007ffffc96a000)
///     libbz2.so.1 => /lib/libbz2.so.1 (0x00007f3ff8782000)
///     libc.so.6 => /lib/libc.so.6 (0x00007f3ff83ff000)
///     /lib64/ld-linux-x86-64.so.2 (0x00007f3ff89b3000)
/// ```
///
/// Returns `None` for lines carrying nothing copyable: "not a dynamic
/// executable" diagnostics, the vdso line (arrow but no resolved path),
/// blank lines. This is a best-effort scrape over tool output, so odd
/// lines are dropped rather than treated as errors.
pub fn parse_ldd_line(line: &str) -> Option<String> {
    if line.contains("not a dynamic executable") {
        return None;
    }
    // Strip everything up through the arrow, if there is one. Loader lines
    // have no arrow and are already a path.
    let rest = match line.find("=>") {
        Some(idx) => &line[idx + 2..],
        None => line,
    };
    // Strip the trailing parenthesized load address.
    let rest = match rest.find("(0x") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    let rest = rest.trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Parse a whole ldd stdout capture into the libraries it names.
pub fn parse_ldd_output(output: &str) -> Vec<String> {
    output.lines().filter_map(parse_ldd_line).collect()
}

/// Resolve the deduplicated set of shared libraries needed by `ldd_files`,
/// with `blacklist` applied to the union.
///
/// Each file is queried with `ldd` through `runner`. stderr is logged for
/// diagnosis but never parsed; an empty stdout means "no dependencies
/// reported" and is skipped.
///
/// # Errors
///
/// Any query that cannot be launched or exits abnormally fails the whole
/// resolution. There is no per-binary partial success.
#[must_use = "resolved dependencies should be copied into the bundle"]
pub fn resolve_dependencies(
    runner: &dyn CommandRunner,
    ldd_files: &[PathBuf],
    blacklist: &Blacklist,
) -> Result<BTreeSet<String>> {
    let mut libs = BTreeSet::new();

    for file in ldd_files {
        debug!("Running {LDD} on {}", file.display());
        let output = match runner.run(LDD, &[file.as_os_str()], None) {
            Ok(output) => output,
            Err(e) => {
                error!("Failed to launch {LDD} {}: {e}", file.display());
                return Err(e)
                    .with_context(|| format!("Failed to launch {LDD} {}", file.display()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                "Command {LDD} {} failed with {}: {}",
                file.display(),
                output.status,
                stderr.trim()
            );
            bail!("{LDD} {} failed with {}", file.display(), output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.is_empty() {
            continue;
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(
            "ldd for {} stdout = {stdout} stderr = {stderr}",
            file.display()
        );

        libs.extend(parse_ldd_output(&stdout));
    }

    Ok(blacklist.filter(libs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::io;
    use std::os::unix::process::ExitStatusExt;
    use std::path::Path;
    use std::process::{ExitStatus, Output};
    use std::sync::Mutex;

    #[test]
    fn test_parse_arrow_line() {
        let line = "\tlibbz2.so.1 => /lib/libbz2.so.1 (0x00007f3ff8782000)";
        assert_eq!(parse_ldd_line(line), Some("/lib/libbz2.so.1".to_string()));
    }

    #[test]
    fn test_parse_loader_line_without_arrow() {
        let line = "\t/lib64/ld-linux-x86-64.so.2 (0x00007f3ff89b3000)";
        assert_eq!(
            parse_ldd_line(line),
            Some("/lib64/ld-linux-x86-64.so.2".to_string())
        );
    }

    #[test]
    fn test_parse_vdso_line_yields_nothing() {
        // Arrow with no resolved path, only an address
        let line = "\tlinux-vdso.so.1 =>  (0x00007ffffc96a000)";
        assert_eq!(parse_ldd_line(line), None);
    }

    #[test]
    fn test_parse_not_a_dynamic_executable() {
        assert_eq!(parse_ldd_line("\tnot a dynamic executable"), None);
    }

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(parse_ldd_line(""), None);
        assert_eq!(parse_ldd_line("   "), None);
    }

    #[test]
    fn test_parse_full_output() {
        let output = "\tlinux-vdso.so.1 =>  (0x00007ffffc96a000)\n\
                      \tlibbz2.so.1 => /lib/libbz2.so.1 (0x00007f3ff8782000)\n\
                      \tlibc.so.6 => /lib/libc.so.6 (0x00007f3ff83ff000)\n\
                      \t/lib64/ld-linux-x86-64.so.2 (0x00007f3ff89b3000)\n";
        assert_eq!(
            parse_ldd_output(output),
            vec![
                "/lib/libbz2.so.1",
                "/lib/libc.so.6",
                "/lib64/ld-linux-x86-64.so.2"
            ]
        );
    }

    /// Canned per-invocation results, keyed by invocation order.
    struct FakeRunner {
        results: Mutex<Vec<io::Result<Output>>>,
    }

    impl FakeRunner {
        fn new(results: Vec<io::Result<Output>>) -> Self {
            let mut results = results;
            results.reverse();
            Self {
                results: Mutex::new(results),
            }
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, _program: &str, _args: &[&OsStr], _cwd: Option<&Path>) -> io::Result<Output> {
            self.results
                .lock()
                .unwrap()
                .pop()
                .expect("unexpected extra command invocation")
        }
    }

    fn ok_output(stdout: &str) -> io::Result<Output> {
        Ok(Output {
            status: ExitStatus::from_raw(0),
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        })
    }

    #[test]
    fn test_resolve_deduplicates_across_binaries() {
        let shared = "\tlibc.so.6 => /lib/libc.so.6 (0x00007f3ff83ff000)\n";
        let first = format!("\tlibbz2.so.1 => /lib/libbz2.so.1 (0x00007f3ff8782000)\n{shared}");
        let runner = FakeRunner::new(vec![ok_output(&first), ok_output(shared)]);

        let libs = resolve_dependencies(
            &runner,
            &[PathBuf::from("/usr/bin/a"), PathBuf::from("/usr/bin/b")],
            &Blacklist::empty(),
        )
        .unwrap();

        let expected: BTreeSet<String> = ["/lib/libbz2.so.1", "/lib/libc.so.6"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(libs, expected);
    }

    #[test]
    fn test_resolve_applies_blacklist() {
        let output = "\tlibc.so.6 => /lib/libc.so.6 (0x00007f3ff83ff000)\n\
                      \tlibbz2.so.1 => /lib/libbz2.so.1 (0x00007f3ff8782000)\n";
        let runner = FakeRunner::new(vec![ok_output(output)]);
        let blacklist = Blacklist::new(&["libc.so"]).unwrap();

        let libs =
            resolve_dependencies(&runner, &[PathBuf::from("/usr/bin/a")], &blacklist).unwrap();
        let expected: BTreeSet<String> =
            std::iter::once("/lib/libbz2.so.1".to_string()).collect();
        assert_eq!(libs, expected);
    }

    #[test]
    fn test_empty_stdout_is_skipped() {
        let runner = FakeRunner::new(vec![ok_output("")]);
        let libs = resolve_dependencies(
            &runner,
            &[PathBuf::from("/usr/bin/a")],
            &Blacklist::empty(),
        )
        .unwrap();
        assert!(libs.is_empty());
    }

    #[test]
    fn test_tool_exit_failure_is_fatal() {
        let failed = Ok(Output {
            status: ExitStatus::from_raw(256), // exit code 1
            stdout: Vec::new(),
            stderr: b"ldd: broken".to_vec(),
        });
        let runner = FakeRunner::new(vec![failed]);

        let result = resolve_dependencies(
            &runner,
            &[PathBuf::from("/usr/bin/a"), PathBuf::from("/usr/bin/b")],
            &Blacklist::empty(),
        );
        assert!(result.is_err(), "abnormal ldd exit must abort resolution");
    }

    #[test]
    fn test_launch_failure_is_fatal() {
        let runner = FakeRunner::new(vec![Err(io::Error::from(io::ErrorKind::NotFound))]);
        let result = resolve_dependencies(
            &runner,
            &[PathBuf::from("/usr/bin/a")],
            &Blacklist::empty(),
        );
        assert!(result.is_err());
    }
}
