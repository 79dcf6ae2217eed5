//! Default contents of the au-generator bundle.
//!
//! These are the files the update-payload generator needs at runtime on a
//! machine without the full build chroot, plus the libraries assumed to be
//! present on any host and therefore left out of the bundle.

use std::collections::BTreeMap;

use crate::stage::Bundle;

/// Executables that go through dependency resolution.
const LDD_FILES: &[&str] = &[
    "/usr/bin/delta_generator",
    "/usr/bin/bsdiff",
    "/usr/bin/bspatch",
    "/usr/bin/cgpt",
];

/// Scripts and statically-linked files copied as-is.
const STATIC_FILES: &[&str] = &[
    "~/trunk/src/scripts/common.sh",
    "/usr/bin/cros_generate_update_payload",
    "~/trunk/src/scripts/chromeos-common.sh",
    "~/trunk/src/platform/vboot_reference/scripts/image_signing/convert_recovery_to_ssd.sh",
    "~/trunk/src/platform/vboot_reference/scripts/image_signing/common_minimal.sh",
];

/// Libraries present on every target system, never bundled.
const BLACKLIST: &[&str] = &[
    "linux-vdso.so",
    "libgcc_s.so",
    "libgthread-2.0.so",
    "libpthread.so",
    "librt.so",
    "libstdc",
    "libc.so",
    "ld-linux-x86-64",
    "libm.so",
    "libdl.so",
    "libresolv.so",
];

/// The default au-generator bundle description.
pub fn default_bundle() -> Bundle {
    let mut recurse_dirs = BTreeMap::new();
    recurse_dirs.insert(
        "~/trunk/src/scripts/lib/shflags".to_string(),
        "lib/shflags".to_string(),
    );

    Bundle {
        ldd_files: LDD_FILES.iter().map(|s| s.to_string()).collect(),
        static_files: STATIC_FILES.iter().map(|s| s.to_string()).collect(),
        recurse_dirs,
        blacklist: BLACKLIST.iter().map(|s| s.to_string()).collect(),
    }
}
