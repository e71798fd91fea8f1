//! Images travel as data URLs (`data:<mime>;base64,<payload>`)

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

pub const SVG_MIME: &str = "image/svg+xml";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to read drawing: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("image file is empty")]
    Empty,
}

/// A decoded data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its mime type and payload
pub fn decode_data_url(url: &str) -> Option<DataUrl> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some(DataUrl {
        mime: mime.to_string(),
        bytes,
    })
}

pub fn svg_data_url(svg: &str) -> String {
    encode_data_url(SVG_MIME, svg.as_bytes())
}

/// SVG markup carried by a data URL, if that is what it holds
pub fn svg_markup(url: &str) -> Option<String> {
    let decoded = decode_data_url(url)?;
    if decoded.mime != SVG_MIME {
        return None;
    }
    String::from_utf8(decoded.bytes).ok()
}

fn mime_for(path: &Path) -> Result<&'static str, MediaError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "svg" => Ok(SVG_MIME),
        other => Err(MediaError::UnsupportedType(other.to_string())),
    }
}

/// Read an image file from disk as a drawing payload
pub fn load_drawing(path: impl AsRef<Path>) -> Result<String, MediaError> {
    let path = path.as_ref();
    let mime = mime_for(path)?;
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(MediaError::Empty);
    }
    Ok(encode_data_url(mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_data_url() {
        let decoded = decode_data_url("data:image/png;base64,AAEC").unwrap();
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, vec![0, 1, 2]);
    }

    #[test]
    fn test_decode_rejects_non_data_urls() {
        assert!(decode_data_url("https://example.com/a.png").is_none());
        assert!(decode_data_url("data:image/png,plain").is_none());
        assert!(decode_data_url("data:image/png;base64,@@@").is_none());
    }

    #[test]
    fn test_svg_markup() {
        let url = svg_data_url("<svg></svg>");
        assert!(url.starts_with("data:image/svg+xml;base64,"));
        assert_eq!(svg_markup(&url).as_deref(), Some("<svg></svg>"));
        assert!(svg_markup("data:image/png;base64,AAEC").is_none());
    }

    #[test]
    fn test_load_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frog.PNG");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

        let url = load_drawing(&path).unwrap();
        assert_eq!(decode_data_url(&url).unwrap().mime, "image/png");
    }

    #[test]
    fn test_load_drawing_errors() {
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.png");
        std::fs::File::create(&empty).unwrap();
        assert!(matches!(load_drawing(&empty), Err(MediaError::Empty)));

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "hi").unwrap();
        assert!(matches!(
            load_drawing(&text),
            Err(MediaError::UnsupportedType(ext)) if ext == "txt"
        ));

        assert!(matches!(
            load_drawing(dir.path().join("missing.png")),
            Err(MediaError::Io(_))
        ));
    }
}
