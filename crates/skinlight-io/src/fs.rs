//! Filesystem helpers shared by the orchestrator and the session.

use std::path::Path;

use skinlight_pipeline::{PipelineError, RgbImage};

use crate::AnalyzeError;

/// Read the raw bytes of a source photo.
///
/// # Errors
///
/// Returns [`AnalyzeError::Load`] if the file cannot be read or is empty.
pub fn read_image_bytes(path: &Path) -> Result<Vec<u8>, AnalyzeError> {
    let bytes = std::fs::read(path).map_err(|e| load_error(path, e.to_string()))?;
    if bytes.is_empty() {
        return Err(load_error(path, PipelineError::EmptyInput.to_string()));
    }
    Ok(bytes)
}

/// Read and decode a source photo.
///
/// # Errors
///
/// Returns [`AnalyzeError::Load`] if the file cannot be read, is empty,
/// or cannot be decoded.
pub fn load_image(path: &Path) -> Result<RgbImage, AnalyzeError> {
    let bytes = read_image_bytes(path)?;
    skinlight_pipeline::decode(&bytes).map_err(|e| load_error(path, e.to_string()))
}

/// Build the load error for `path`.
pub(crate) fn load_error(path: &Path, reason: String) -> AnalyzeError {
    AnalyzeError::Load {
        path: path.to_path_buf(),
        reason,
    }
}

/// Create the parent directory of `path` if it has one.
///
/// # Errors
///
/// Returns [`AnalyzeError::CreateDir`] if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), AnalyzeError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| AnalyzeError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Write `contents` to `path`, creating parent directories and
/// overwriting any existing file.
///
/// # Errors
///
/// Returns [`AnalyzeError::CreateDir`] or [`AnalyzeError::Write`].
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), AnalyzeError> {
    ensure_parent_dir(path)?;
    std::fs::write(path, contents).map_err(|source| AnalyzeError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_load_error_naming_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.jpg");
        let err = load_image(&path).unwrap_err();
        assert!(matches!(&err, AnalyzeError::Load { path: p, .. } if *p == path));
        assert!(err.to_string().contains("absent.jpg"));
    }

    #[test]
    fn empty_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(load_image(&path), Err(AnalyzeError::Load { .. })));
    }

    #[test]
    fn garbage_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not an image at all").unwrap();
        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, AnalyzeError::Load { .. }));
    }

    #[test]
    fn write_file_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.txt");
        write_file(&path, b"first").unwrap();
        write_file(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn bare_file_name_needs_no_directory() {
        assert!(ensure_parent_dir(Path::new("result.png")).is_ok());
    }
}
