//! Encoded still frames submitted for detection.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use super::CaptureError;

/// Default JPEG quality for submitted frames.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// A JPEG still captured on one sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Sampling tick the frame was captured on.
    pub tick: u64,
    pub width: u32,
    pub height: u32,
    /// `data:image/jpeg;base64,...` URL.
    pub data_url: String,
}

impl Frame {
    /// Encode an RGB image as a JPEG data URL.
    pub fn encode(image: &RgbImage, tick: u64, quality: u8) -> Result<Self, CaptureError> {
        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
        image.write_with_encoder(encoder)?;

        let mut data_url = String::with_capacity(DATA_URL_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
        data_url.push_str(DATA_URL_PREFIX);
        BASE64.encode_string(&jpeg, &mut data_url);

        Ok(Self {
            tick,
            width: image.width(),
            height: image.height(),
            data_url,
        })
    }

    /// Size of the encoded payload in bytes.
    pub fn encoded_len(&self) -> usize {
        self.data_url.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_jpeg_data_url() {
        let image = RgbImage::from_pixel(8, 6, image::Rgb([200, 10, 10]));
        let frame = Frame::encode(&image, 3, DEFAULT_JPEG_QUALITY).unwrap();

        assert_eq!(frame.tick, 3);
        assert_eq!((frame.width, frame.height), (8, 6));
        assert!(frame.data_url.starts_with(DATA_URL_PREFIX));

        let bytes = BASE64
            .decode(&frame.data_url[DATA_URL_PREFIX.len()..])
            .unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
