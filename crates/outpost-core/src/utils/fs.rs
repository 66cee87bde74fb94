use std::fs;
use std::io;
use std::path::Path;

/// Create `path` and any missing parents, then apply `mode` to `path` itself.
///
/// Permissions are only applied on Unix; elsewhere the mode is ignored.
pub fn ensure_dir_with_mode<P: AsRef<Path>>(path: P, mode: u32) -> io::Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path)?;
    apply_mode(path, mode)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Read a UTF-8 file if it exists. A missing file is `Ok(None)`.
pub fn read_optional_string<P: AsRef<Path>>(path: P) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
