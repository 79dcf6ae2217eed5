//! Staging-root assembly.
//!
//! Collects everything the bundle needs into one directory: the declared
//! binaries and scripts, every shared library they pull in, and the
//! recursively-copied support directories. All filesystem mutation in the
//! crate happens here.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::blacklist::Blacklist;
use crate::ldd::resolve_dependencies;
use crate::runner::CommandRunner;

/// Everything that goes into one bundle.
///
/// Paths may use `~` notation; they are tilde-expanded at staging time.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    /// Dynamically-linked executables whose dependencies are resolved.
    pub ldd_files: Vec<String>,
    /// Files copied verbatim, no dependency inspection.
    pub static_files: Vec<String>,
    /// Source directory -> relative destination under the staging root,
    /// copied recursively.
    pub recurse_dirs: BTreeMap<String, String>,
    /// Library-name patterns excluded from the bundle.
    pub blacklist: Vec<String>,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Populate `dest_root` with the bundle contents.
///
/// Every declared file must exist as a regular file and every declared
/// directory as a directory; the first missing path aborts the run before
/// anything is copied and before any dependency query runs. There is no
/// skip-and-continue mode.
pub fn stage_bundle(runner: &dyn CommandRunner, bundle: &Bundle, dest_root: &Path) -> Result<()> {
    if dest_root.as_os_str().is_empty() {
        error!("Invalid destination root: empty path");
        bail!("Destination root must not be empty");
    }

    let ldd_files: Vec<PathBuf> = bundle.ldd_files.iter().map(|p| expand(p)).collect();
    let static_files: Vec<PathBuf> = bundle.static_files.iter().map(|p| expand(p)).collect();

    for file in ldd_files.iter().chain(static_files.iter()) {
        if !file.is_file() {
            error!("file {} does not exist", file.display());
            bail!("Declared input {} does not exist", file.display());
        }
    }
    for (source, _) in &bundle.recurse_dirs {
        let full_path = expand(source);
        if !full_path.is_dir() {
            error!(
                "Directory {} expanded to {} does not exist",
                source,
                full_path.display()
            );
            bail!("Declared directory {} does not exist", full_path.display());
        }
    }

    for file in ldd_files.iter().chain(static_files.iter()) {
        copy_into(file, dest_root)?;
    }

    let blacklist = Blacklist::new(&bundle.blacklist)?;
    let libs = resolve_dependencies(runner, &ldd_files, &blacklist)?;
    for lib in &libs {
        copy_into(Path::new(lib), dest_root)?;
    }

    for (source, target) in &bundle.recurse_dirs {
        let full_path = expand(source);
        let dest = dest_root.join(target);
        debug!("Copying directory {} to {}", full_path.display(), dest.display());
        copy_dir_recursive(&full_path, &dest)
            .with_context(|| format!("Failed to copy directory {}", full_path.display()))?;
    }

    Ok(())
}

/// Flat-copy `src` into the directory `dest_dir`, keeping its file name.
fn copy_into(src: &Path, dest_dir: &Path) -> Result<()> {
    let name = src
        .file_name()
        .with_context(|| format!("Path {} has no file name", src.display()))?;
    let dest = dest_dir.join(name);
    debug!("Copying file {} to {}", src.display(), dest.display());
    copy_file(src, &dest)
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
    Ok(())
}

/// Copy one file, carrying the source's modification time along with the
/// permissions `fs::copy` already preserves.
fn copy_file(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest)?;
    let mtime = fs::metadata(src)?.modified()?;
    fs::File::options().write(true).open(dest)?.set_modified(mtime)?;
    Ok(())
}

/// Copy a directory tree, preserving symlinks as symlinks.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create directory {}", dst.display()))?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let dest_path = dst.join(entry.file_name());

        if path.is_dir() {
            copy_dir_recursive(&path, &dest_path)?;
        } else if path.is_symlink() {
            let target = fs::read_link(&path)?;
            if !dest_path.exists() && !dest_path.is_symlink() {
                std::os::unix::fs::symlink(&target, &dest_path)?;
            }
        } else {
            copy_file(&path, &dest_path)
                .with_context(|| format!("Failed to copy {}", path.display()))?;
        }
    }

    Ok(())
}
