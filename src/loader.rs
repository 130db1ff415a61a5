use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// Remote fetches get one attempt with this timeout, never a retry.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Load an image from an http(s) URL or the local filesystem. Relative
/// paths resolve against `base`.
pub fn load_image(src: &str, base: Option<&Path>) -> Result<LoadedImage> {
    if is_http_url(src) {
        fetch_remote(src)
    } else {
        read_local(src, base)
    }
}

pub fn is_http_url(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn fetch_remote(src: &str) -> Result<LoadedImage> {
    debug!(url = src, "fetching remote image");

    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("mdocx/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client.get(src).send()?;
    if !response.status().is_success() {
        return Err(Error::Image {
            src: src.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "image/png".to_string());

    let bytes = response.bytes()?.to_vec();
    debug!(url = src, bytes = bytes.len(), mime = %mime, "fetched remote image");
    Ok(LoadedImage { bytes, mime })
}

fn read_local(src: &str, base: Option<&Path>) -> Result<LoadedImage> {
    let path = resolve_path(src, base);
    debug!(path = %path.display(), "reading local image");
    let bytes = fs::read(&path)?;
    Ok(LoadedImage {
        bytes,
        mime: mime_for_path(&path).to_string(),
    })
}

fn resolve_path(src: &str, base: Option<&Path>) -> PathBuf {
    let path = Path::new(src);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match base {
        Some(base) => base.join(path),
        None => path.to_path_buf(),
    }
}

/// Mime type from the file extension. Unknown extensions fall back to PNG.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(is_http_url("http://example.com/a.png"));
        assert!(is_http_url("HTTPS://example.com/a.png"));
        assert!(!is_http_url("file:///tmp/a.png"));
        assert!(!is_http_url("images/a.png"));
        assert!(!is_http_url("/abs/a.png"));
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("a.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("a.unknown")), "image/png");
        assert_eq!(mime_for_path(Path::new("noext")), "image/png");
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.gif");
        fs::write(&path, b"GIF89a").unwrap();

        let loaded = load_image("pic.gif", Some(dir.path())).unwrap();
        assert_eq!(loaded.bytes, b"GIF89a");
        assert_eq!(loaded.mime, "image/gif");
    }

    #[test]
    fn absolute_path_ignores_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        fs::write(&path, b"x").unwrap();

        let src = path.to_string_lossy().into_owned();
        let loaded = load_image(&src, Some(Path::new("/elsewhere"))).unwrap();
        assert_eq!(loaded.bytes, b"x");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_image("gone.png", Some(dir.path())).is_err());
    }
}
