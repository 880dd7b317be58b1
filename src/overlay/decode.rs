//! Decoding of try-on images returned by the service.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Empty image payload")]
    Empty,

    #[error("Image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unsupported image payload: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Decode a base64 image, with or without a `data:<mime>;base64,` prefix.
pub fn decode_data_url(payload: &str) -> Result<RgbaImage, DecodeError> {
    let encoded = match payload.split_once(',') {
        Some((header, body)) if header.starts_with("data:") => body,
        _ => payload,
    };
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(DecodeError::Empty);
    }
    let bytes = BASE64.decode(encoded)?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

/// Decode a try-on image on the blocking pool.
///
/// This is the suspending half of decode-then-composite; the caller
/// composites the result once it resolves.
pub async fn decode_image(payload: String) -> Result<RgbaImage, DecodeError> {
    tokio::task::spawn_blocking(move || decode_data_url(&payload)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_data_url(width: u32, height: u32) -> String {
        let image = RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 255, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    #[test]
    fn test_decodes_data_url() {
        let image = decode_data_url(&png_data_url(3, 2)).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
    }

    #[test]
    fn test_decodes_bare_base64() {
        let url = png_data_url(1, 1);
        let bare = url.split_once(',').unwrap().1;
        assert!(decode_data_url(bare).is_ok());
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert!(matches!(decode_data_url("data:image/png;base64,"), Err(DecodeError::Empty)));
        assert!(matches!(decode_data_url("!!!"), Err(DecodeError::Base64(_))));
        let not_an_image = BASE64.encode(b"hello");
        assert!(matches!(decode_data_url(&not_an_image), Err(DecodeError::Image(_))));
    }

    #[tokio::test]
    async fn test_async_decode_matches_sync() {
        let image = decode_image(png_data_url(4, 4)).await.unwrap();
        assert_eq!(image.dimensions(), (4, 4));
    }
}
