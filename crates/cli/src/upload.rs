//! Getting the chosen document into the upload directory.

use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

/// Remove surrounding whitespace and the quotes a drag-and-drop path
/// usually carries.
pub fn clean_path(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '\'' || c == '"')
}

/// Copy `source` into `upload_dir` under its own file name and return the
/// new path. A file already in place is left alone.
pub fn copy_to_uploads(source: &Path, upload_dir: &Path) -> io::Result<PathBuf> {
    let name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", source.display()),
        )
    })?;
    std::fs::create_dir_all(upload_dir)?;
    let dest = upload_dir.join(name);

    if dest.exists() && dest.canonicalize()? == source.canonicalize()? {
        return Ok(dest);
    }
    std::fs::copy(source, &dest)?;
    info!(from = %source.display(), to = %dest.display(), "document copied to uploads");
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn strips_quotes_and_whitespace() {
        assert_eq!(clean_path("  '/tmp/a b.pdf' "), "/tmp/a b.pdf");
        assert_eq!(clean_path("\"notes.txt\""), "notes.txt");
        assert_eq!(clean_path("plain.txt"), "plain.txt");
    }

    #[test]
    fn copies_into_a_new_upload_dir() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("report.txt");
        std::fs::write(&source, "quarterly numbers").unwrap();

        let uploads = tmp.path().join("uploads");
        let dest = copy_to_uploads(&source, &uploads).unwrap();
        assert_eq!(dest, uploads.join("report.txt"));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "quarterly numbers");
        assert!(source.exists());
    }

    #[test]
    fn file_already_in_uploads_is_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.txt");
        std::fs::write(&path, "content").unwrap();

        let dest = copy_to_uploads(&path, tmp.path()).unwrap();
        assert_eq!(dest, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = copy_to_uploads(&tmp.path().join("gone.pdf"), &tmp.path().join("u")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
