//! Image decoding: file paths or encoded bytes into in-memory images.

use crate::error::OcrError;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Encodings the decoder accepts.
pub const SUPPORTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Tiff,
    ImageFormat::Gif,
];

/// Reported when the decoder fails without saying why.
pub const PATH_DECODE_FALLBACK: &str = "Failed to create image from path";
pub const BUFFER_DECODE_FALLBACK: &str = "Failed to create image from buffer";

/// Decoder failure message, or `fallback` when the decoder gave none.
pub fn decode_failure_message(err: &OcrError, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// A decoded image, owned by the worker for the duration of one recognition.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
}

impl DecodedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Re-encode as PNG for engines that take encoded bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, OcrError> {
        let mut png_bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
            .map_err(|e| OcrError::Recognition(format!("PNG encode failed: {}", e)))?;
        Ok(png_bytes)
    }
}

/// Produces decoded images. Called only from worker threads.
pub trait ImageDecoder: Send + Sync {
    fn decode_path(&self, path: &Path) -> Result<DecodedImage, OcrError>;

    fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodedImage, OcrError>;
}

/// Decoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

fn ensure_supported(format: Option<ImageFormat>) -> Result<ImageFormat, OcrError> {
    match format {
        Some(format) if SUPPORTED_FORMATS.contains(&format) => Ok(format),
        Some(format) => Err(OcrError::Decode(format!(
            "Unsupported image format: {:?}",
            format
        ))),
        None => Err(OcrError::Decode("Unrecognized image format".to_string())),
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode_path(&self, path: &Path) -> Result<DecodedImage, OcrError> {
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| {
                OcrError::Decode(format!("Failed to open image at {}: {}", path.display(), e))
            })?;
        ensure_supported(reader.format())?;

        let image = reader
            .decode()
            .map_err(|e| OcrError::Decode(format!("Failed to decode image: {}", e)))?;
        Ok(DecodedImage::new(image))
    }

    fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodedImage, OcrError> {
        if bytes.is_empty() {
            return Err(OcrError::Decode("Image buffer is empty".to_string()));
        }
        let format = ensure_supported(image::guess_format(bytes).ok())?;

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| OcrError::Decode(format!("Failed to decode image: {}", e)))?;
        Ok(DecodedImage::new(image))
    }
}
