//! Input resolution: normalise the user-supplied path to an absolute local
//! file.
//!
//! Relative paths are resolved against the current working directory, so a
//! bare filename on the command line means "this file, here". The file must
//! exist and be readable before the pipeline starts; whether it actually
//! parses as a PDF is pdfium's call when the document loads.

use crate::error::Pdf2TexError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve a user-supplied PDF path to an absolute path, validating that
/// the file exists and is readable.
pub fn resolve_pdf_path(input: impl AsRef<Path>) -> Result<PathBuf, Pdf2TexError> {
    let input = input.as_ref();
    let path = if input.is_absolute() {
        input.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(input),
            Err(_) => input.to_path_buf(),
        }
    };

    if !path.exists() {
        return Err(Pdf2TexError::FileNotFound { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2TexError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2TexError::FileNotFound { path });
        }
    }

    debug!("Resolved input PDF: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_relative_path_is_absolutised_in_error() {
        let err = resolve_pdf_path("definitely-missing-417.pdf").unwrap_err();
        match err {
            Pdf2TexError::FileNotFound { path } => {
                assert!(path.is_absolute());
                assert!(path.ends_with("definitely-missing-417.pdf"));
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn existing_absolute_path_resolves_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.pdf");
        std::fs::write(&file, b"%PDF-1.4 stub").unwrap();

        let resolved = resolve_pdf_path(&file).unwrap();
        assert_eq!(resolved, file);
    }
}
