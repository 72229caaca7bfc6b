// src/utils/archive.rs
use flate2::{write::GzEncoder, Compression};
use glob::{glob, Pattern};
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

/// Regular files below `dir`, recursively, sorted by path.
pub fn collect_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*", Pattern::escape(&dir.display().to_string()));
    let entries =
        glob(&pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(io::Error::from)?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Writes `dir/archive_name` as a gzip-compressed tarball of every file in
/// `dir`, each stored under its basename. The archive never contains itself.
pub fn archive_directory(dir: &Path, archive_name: &str) -> io::Result<PathBuf> {
    let archive_path = dir.join(archive_name);
    let files: Vec<PathBuf> = collect_files(dir)?
        .into_iter()
        .filter(|p| p != &archive_path)
        .collect();

    let encoder = GzEncoder::new(File::create(&archive_path)?, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for path in &files {
        let name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no file name in {}", path.display()),
            )
        })?;
        builder.append_path_with_name(path, name)?;
    }

    builder.into_inner()?.finish()?;
    tracing::debug!(archive = %archive_path.display(), files = files.len(), "archive written");
    Ok(archive_path)
}
