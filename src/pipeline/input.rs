//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! Extension gating happens here, before anything reaches the rasteriser or
//! OCR stage: only `.pdf`, `.png`, `.jpg`, `.jpeg` are accepted. Magic bytes
//! are verified as well so a mislabelled file produces a meaningful error
//! rather than a decoder crash later in the pipeline.
//!
//! URL inputs are downloaded to a `TempDir`, which keeps the file alive for
//! the duration of processing and cleans up automatically on drop, even if
//! the process panics.

use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// File format accepted by the pipeline, derived from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Pdf,
    Png,
    Jpeg,
}

impl InputFormat {
    /// Classify a path by its extension. `None` for anything unsupported.
    pub fn from_path(path: &Path) -> Option<InputFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(InputFormat::Pdf),
            "png" => Some(InputFormat::Png),
            "jpg" | "jpeg" => Some(InputFormat::Jpeg),
            _ => None,
        }
    }
}

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub struct ResolvedInput {
    source: Source,
    pub format: InputFormat,
}

#[derive(Debug)]
enum Source {
    Local(PathBuf),
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match &self.source {
            Source::Local(p) => p,
            Source::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local file with a supported format.
///
/// If the input is a URL, download it to a temporary directory.
/// If the input is a local file, validate it exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating extension, existence, and magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, ExtractError> {
    let path = PathBuf::from(path_str);
    let format = classify(&path)?;

    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut head = [0u8; 8];
            let n = f.read(&mut head).unwrap_or(0);
            check_magic(&path, format, &head[..n])?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound { path });
        }
    }

    debug!("Resolved local {:?} input: {}", format, path.display());
    Ok(ResolvedInput {
        source: Source::Local(path),
        format,
    })
}

/// Map a path to its `InputFormat` or the `UnsupportedExtension` error.
fn classify(path: &Path) -> Result<InputFormat, ExtractError> {
    InputFormat::from_path(path).ok_or_else(|| ExtractError::UnsupportedExtension {
        path: path.to_path_buf(),
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string(),
    })
}

/// Verify the leading bytes match the format the extension claims.
fn check_magic(path: &Path, format: InputFormat, head: &[u8]) -> Result<(), ExtractError> {
    match format {
        InputFormat::Pdf => {
            if head.len() < 4 || &head[..4] != b"%PDF" {
                let mut magic = [0u8; 4];
                magic[..head.len().min(4)].copy_from_slice(&head[..head.len().min(4)]);
                return Err(ExtractError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        InputFormat::Png => {
            const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
            if head.len() < 8 || head[..8] != PNG_MAGIC {
                return Err(ExtractError::InvalidImage {
                    path: path.to_path_buf(),
                    detail: "missing PNG signature".into(),
                });
            }
        }
        InputFormat::Jpeg => {
            if head.len() < 2 || head[..2] != [0xFF, 0xD8] {
                return Err(ExtractError::InvalidImage {
                    path: path.to_path_buf(),
                    detail: "missing JPEG SOI marker".into(),
                });
            }
        }
    }
    Ok(())
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    info!("Downloading document from: {}", url);

    let filename = extract_filename(url);
    let format = classify(Path::new(&filename))?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ExtractError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let temp_dir = TempDir::new().map_err(|e| ExtractError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ExtractError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| ExtractError::Internal(format!("Failed to write temp file: {}", e)))?;

    // Only now does the path in a magic-byte error point at a real file.
    check_magic(&file_path, format, &bytes[..bytes.len().min(8)])?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput {
        source: Source::Downloaded {
            path: file_path,
            _temp_dir: temp_dir,
        },
        format,
    })
}

/// Extract a filename from the URL path; a bare URL gets a `.pdf` default
/// since that is the only format servers commonly serve without a name.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/scan.pdf"));
        assert!(is_url("http://example.com/scan.png"));
        assert!(!is_url("/tmp/scan.pdf"));
        assert!(!is_url("scan.jpg"));
        assert!(!is_url(""));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a.pdf")), Some(InputFormat::Pdf));
        assert_eq!(InputFormat::from_path(Path::new("a.PNG")), Some(InputFormat::Png));
        assert_eq!(InputFormat::from_path(Path::new("a.jpg")), Some(InputFormat::Jpeg));
        assert_eq!(InputFormat::from_path(Path::new("a.jpeg")), Some(InputFormat::Jpeg));
        assert_eq!(InputFormat::from_path(Path::new("a.webp")), None);
        assert_eq!(InputFormat::from_path(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn unsupported_extension_rejected_before_open() {
        // The .docx file does not even need to exist: classification runs first.
        let err = resolve_input("/nonexistent/report.docx", 5).await.unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedExtension { .. }));
    }

    #[tokio::test]
    async fn mislabelled_pdf_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"hello world")
            .unwrap();
        let err = resolve_input(path.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, ExtractError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn mislabelled_png_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"not a png at all")
            .unwrap();
        let err = resolve_input(path.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, ExtractError::InvalidImage { .. }));
    }

    #[tokio::test]
    async fn mislabelled_download_rejected_with_local_path() {
        // One-shot loopback server returning an HTML page for a ".pdf" URL.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = std::io::Read::read(&mut stream, &mut buf);
                let body = b"<html>not a pdf</html>";
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body);
            }
        });

        let url = format!("http://127.0.0.1:{port}/fake.pdf");
        let err = resolve_input(&url, 5).await.unwrap_err();
        match err {
            // The reported path is the written temp file, named after the URL.
            ExtractError::NotAPdf { path, .. } => {
                assert!(path.ends_with("fake.pdf"), "got: {}", path.display());
            }
            other => panic!("expected NotAPdf, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_magic_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.7 rest of file")
            .unwrap();
        let resolved = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.format, InputFormat::Pdf);
        assert_eq!(resolved.path(), path.as_path());
    }
}
