use std::{fs, io, path::Path};

/// Removes `dir` with all of its contents, if present, and creates it empty.
pub fn reset_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        tracing::info!(path = %dir.display(), "removing existing output directory");
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)
}

pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Owner read/write only. No-op off unix.
pub fn restrict_permissions(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
