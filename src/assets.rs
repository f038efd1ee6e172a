//! Logo sources: data-URI decoding and inlining of remote/local images so
//! generated HTML is self-contained.

use std::path::Path;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::error::AssetError;

/// Decoded `data:<mime>;base64,<data>` URI.
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub fn is_data_uri(src: &str) -> bool {
    src.trim_start().starts_with("data:")
}

pub fn parse_data_uri(src: &str) -> Result<DataUri, AssetError> {
    let rest = src
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::InvalidDataUri("missing `data:` prefix".to_string()))?;
    let comma = rest.find(',').ok_or_else(|| {
        AssetError::InvalidDataUri("missing `,` between header and data".to_string())
    })?;
    let header = &rest[..comma];
    let Some(mime) = header.strip_suffix(";base64") else {
        return Err(AssetError::InvalidDataUri(
            "only base64-encoded data URIs are supported".to_string(),
        ));
    };
    let bytes = BASE64_STD
        .decode(rest[comma + 1..].trim())
        .map_err(|e| AssetError::InvalidDataUri(format!("base64 decode error: {e}")))?;
    Ok(DataUri {
        mime: mime.to_string(),
        bytes,
    })
}

pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64_STD.encode(bytes))
}

/// width / height of an embedded image, if it decodes.
pub fn image_aspect(src: &str) -> Option<f32> {
    let data = parse_data_uri(src).ok()?;
    let img = ::image::load_from_memory(&data.bytes).ok()?;
    if img.width() == 0 || img.height() == 0 {
        return None;
    }
    Some(img.width() as f32 / img.height() as f32)
}

fn sniff_mime(bytes: &[u8], fallback: &str) -> String {
    match ::image::guess_format(bytes) {
        Ok(::image::ImageFormat::Png) => "image/png".to_string(),
        Ok(::image::ImageFormat::Jpeg) => "image/jpeg".to_string(),
        Ok(::image::ImageFormat::Gif) => "image/gif".to_string(),
        Ok(::image::ImageFormat::WebP) => "image/webp".to_string(),
        _ => fallback.to_string(),
    }
}

/// Turn any logo source into a data URI.
///
/// - `data:` URIs pass through unchanged,
/// - `http(s)://` URLs are downloaded,
/// - anything else is read as a local path.
pub fn inline_image_source(src: &str, timeout: Duration) -> Result<String, AssetError> {
    let src = src.trim();
    if is_data_uri(src) {
        return Ok(src.to_string());
    }
    if src.starts_with("http://") || src.starts_with("https://") {
        return fetch_remote(src, timeout);
    }
    let path = Path::new(src.strip_prefix("file://").unwrap_or(src));
    if !path.is_file() {
        return Err(AssetError::Unsupported(src.to_string()));
    }
    let bytes = std::fs::read(path)?;
    let fallback = if src.ends_with(".svg") {
        "image/svg+xml"
    } else {
        "application/octet-stream"
    };
    Ok(to_data_uri(&sniff_mime(&bytes, fallback), &bytes))
}

fn fetch_remote(url: &str, timeout: Duration) -> Result<String, AssetError> {
    use ureq::Agent;

    let fetch_err = |reason: String| AssetError::Fetch {
        url: url.to_string(),
        reason,
    };

    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into();
    let mut response = agent.get(url).call().map_err(|e| fetch_err(e.to_string()))?;
    let declared = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let bytes = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| fetch_err(e.to_string()))?;
    Ok(to_data_uri(&sniff_mime(&bytes, &declared), &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    #[test]
    fn decodes_png_data_uri() {
        let data = parse_data_uri(PIXEL).unwrap();
        assert_eq!(data.mime, "image/png");
        assert_eq!(image_aspect(PIXEL), Some(1.0));
    }

    #[test]
    fn rejects_non_base64() {
        assert!(parse_data_uri("data:text/plain,hello").is_err());
        assert!(parse_data_uri("https://example.com/logo.png").is_err());
        assert_eq!(image_aspect("data:image/png;base64,AAAA"), None);
    }

    #[test]
    fn inlines_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, parse_data_uri(PIXEL).unwrap().bytes).unwrap();
        let uri = inline_image_source(path.to_str().unwrap(), Duration::from_secs(1)).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(inline_image_source(PIXEL, Duration::from_secs(1)).unwrap(), PIXEL);
    }

    #[test]
    fn missing_file_is_unsupported() {
        let err = inline_image_source("/definitely/not/here.png", Duration::from_secs(1));
        assert!(matches!(err, Err(AssetError::Unsupported(_))));
    }
}
