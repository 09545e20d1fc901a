//! Input resolution: turn a path on disk into a [`SelectedFile`].
//!
//! The declared media type is what the selection check looks at, the same
//! way a browser reports `File.type` from the file name. It is guessed from
//! the extension unless the caller supplies one. Contents are read in full;
//! the magic bytes are checked only to log a warning, never to reject.

use crate::error::ClientError;
use crate::session::SelectedFile;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Media type a picker would declare for `path`, from its extension.
///
/// Unknown extensions map to `application/octet-stream`.
pub fn declared_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Read `path` into memory as a selectable file.
///
/// `media_type` overrides the extension-based guess. The file name (last
/// path component) becomes the display name.
pub async fn load_file(path: impl AsRef<Path>, media_type: Option<&str>) -> Result<SelectedFile, ClientError> {
    let path = path.as_ref();
    let contents = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ClientError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => ClientError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ClientError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = media_type
        .map(str::to_string)
        .unwrap_or_else(|| declared_media_type(path));

    let file = SelectedFile::new(name, media_type, contents);
    if lacks_pdf_magic(&file) {
        let magic: Vec<u8> = file.contents().iter().take(4).copied().collect();
        warn!(
            "'{}' is declared {} but starts with {:?}, not %PDF",
            path.display(),
            file.media_type(),
            String::from_utf8_lossy(&magic)
        );
    }

    debug!("Loaded '{}' as {} ({} bytes)", file.name(), file.media_type(), file.len());
    Ok(file)
}

/// True when `file` is declared a PDF but does not start with `%PDF`.
fn lacks_pdf_magic(file: &SelectedFile) -> bool {
    file.declares_pdf() && !file.contents().starts_with(PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn media_type_from_extension() {
        assert_eq!(declared_media_type(Path::new("doc.pdf")), "application/pdf");
        assert_eq!(declared_media_type(Path::new("DOC.PDF")), "application/pdf");
        assert_eq!(declared_media_type(Path::new("notes.txt")), "text/plain");
        assert_eq!(
            declared_media_type(Path::new("no_extension")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn loads_name_type_and_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4 body").unwrap();

        let file = load_file(&path, None).await.unwrap();
        assert_eq!(file.name(), "doc.pdf");
        assert_eq!(file.media_type(), "application/pdf");
        assert_eq!(file.contents().as_ref(), b"%PDF-1.4 body");
        assert!(file.declares_pdf());
    }

    #[tokio::test]
    async fn override_wins_over_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.bin");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let guessed = load_file(&path, None).await.unwrap();
        assert!(!guessed.declares_pdf());

        let declared = load_file(&path, Some("application/pdf")).await.unwrap();
        assert!(declared.declares_pdf());
    }

    #[tokio::test]
    async fn wrong_magic_is_still_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"PK\x03\x04").unwrap();
        let file = load_file(&path, None).await.unwrap();
        assert!(file.declares_pdf());
    }

    #[test]
    fn magic_check_follows_the_declared_essence() {
        let fake = |media_type: &str| SelectedFile::new("fake.pdf", media_type, &b"PK\x03\x04"[..]);
        assert!(lacks_pdf_magic(&fake("application/pdf")));
        assert!(lacks_pdf_magic(&fake("application/pdf; charset=binary")));
        assert!(lacks_pdf_magic(&fake("Application/PDF")));
        assert!(!lacks_pdf_magic(&fake("text/plain")));

        let real = SelectedFile::new("doc.pdf", "application/pdf; charset=binary", &b"%PDF-1.7"[..]);
        assert!(!lacks_pdf_magic(&real));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = load_file(PathBuf::from("/definitely/not/here.pdf"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::FileNotFound { .. }), "got {err:?}");
        assert!(err.is_input_error());
    }
}
