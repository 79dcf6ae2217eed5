//! Zip creation and delivery of the finished archive.
//!
//! Unlike staging, failures here are reported as a `bool` rather than
//! raised: the caller decides what a failed archive means for the run.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

use crate::runner::CommandRunner;

/// Zip up the contents of `root_dir` into `zip_path`.
///
/// Runs `zip -r -9 <zip_path> .` from inside `root_dir` so archived paths
/// are relative to the staging root. Returns `false` if the archiver
/// cannot be launched or exits abnormally; never returns an error.
pub fn create_zip(runner: &dyn CommandRunner, zip_path: &Path, root_dir: &Path) -> bool {
    debug!(
        "Generating zip file {} with contents from {}",
        zip_path.display(),
        root_dir.display()
    );

    let args = [
        OsStr::new("-r"),
        OsStr::new("-9"),
        zip_path.as_os_str(),
        OsStr::new("."),
    ];
    match runner.run("zip", &args, Some(root_dir)) {
        Ok(output) if output.status.success() => true,
        Ok(output) => {
            error!(
                "zip exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            false
        }
        Err(e) => {
            error!("Failed to execute zip: {e}");
            false
        }
    }
}

/// Copy the finished archive into `output_dir`, creating the directory if
/// needed.
///
/// Returns `false` without creating anything when the archive is missing.
pub fn copy_to_destination(output_dir: &Path, zip_path: &Path) -> bool {
    if !zip_path.is_file() {
        error!("Zip file {} doesn't exist", zip_path.display());
        return false;
    }

    if !output_dir.is_dir() {
        debug!("Creating {}", output_dir.display());
        if let Err(e) = fs::create_dir_all(output_dir) {
            error!("Failed to create {}: {e}", output_dir.display());
            return false;
        }
    }

    let dest = match zip_path.file_name() {
        Some(name) => output_dir.join(name),
        None => {
            error!("Zip path {} has no file name", zip_path.display());
            return false;
        }
    };
    debug!("Copying {} to {}", zip_path.display(), dest.display());
    if let Err(e) = fs::copy(zip_path, &dest) {
        error!(
            "Failed to copy {} to {}: {e}",
            zip_path.display(),
            output_dir.display()
        );
        return false;
    }
    true
}
