//! commit-msg hook installation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const HOOK_NAME: &str = "commit-msg";
const BACKUP_SUFFIX: &str = ".backup";
/// First line after the shebang; marks hooks this tool wrote.
const HOOK_MARKER: &str = "# Installed by intentgate install-hooks.";

/// Result of an installation.
#[derive(Debug)]
pub struct HookInstall {
    pub path: PathBuf,
    /// Where a foreign hook was moved, if there was one.
    pub backup: Option<PathBuf>,
}

pub fn hook_script(binary: &str) -> String {
    format!(
        "#!/bin/sh\n{HOOK_MARKER}\nexec {binary} check-commit --message-file \"$1\"\n"
    )
}

/// Write the hook into `hooks_dir`.
///
/// A foreign hook is moved to `commit-msg.backup`; one written by this tool
/// is overwritten in place.
pub fn install_commit_msg_hook(hooks_dir: &Path, binary: &str) -> Result<HookInstall> {
    std::fs::create_dir_all(hooks_dir)
        .with_context(|| format!("failed to create {}", hooks_dir.display()))?;

    let path = hooks_dir.join(HOOK_NAME);
    let mut backup = None;

    if path.exists() {
        let existing = std::fs::read_to_string(&path).unwrap_or_default();
        if !existing.contains(HOOK_MARKER) {
            let target = hooks_dir.join(format!("{HOOK_NAME}{BACKUP_SUFFIX}"));
            std::fs::rename(&path, &target)
                .with_context(|| format!("failed to back up {}", path.display()))?;
            backup = Some(target);
        }
    }

    std::fs::write(&path, hook_script(binary))
        .with_context(|| format!("failed to write {}", path.display()))?;
    make_executable(&path)?;

    Ok(HookInstall { path, backup })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to chmod {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
