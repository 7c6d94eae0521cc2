//! Refuse to run with root privileges.

use anyhow::Result;

#[cfg(unix)]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

/// Fails when the effective user is root.
pub fn ensure_not_root() -> Result<()> {
    if is_root() {
        anyhow::bail!(
            "refusing to run as root; server-supplied files would be written with root privileges"
        );
    }
    Ok(())
}
