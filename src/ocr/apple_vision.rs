//! macOS OCR via Apple Vision Framework (swift-bridge FFI).
//!
//! This module is only compiled on macOS with the `apple-vision` feature.
//! The Swift side wraps VNRecognizeTextRequest and hands observations back
//! as JSON with Vision's bottom-left normalized bounding boxes.

use super::decoder::DecodedImage;
use super::options::OcrOptions;
use super::types::{Recognition, TextObservation};
use super::OcrEngine;
use crate::error::OcrError;
use std::time::Instant;

#[swift_bridge::bridge]
mod ffi {
    #[swift_bridge(swift_repr = "struct")]
    struct VisionOcrOutput {
        error: String,
        observations_json: String,
    }

    extern "Swift" {
        fn run_vision_ocr(png: Vec<u8>, languages: String, level: i32) -> VisionOcrOutput;
        fn warm_up_vision();
    }
}

/// Apple Vision text recognizer. Vision requests are independent, so one
/// instance is shared by all workers.
#[derive(Debug, Default)]
pub struct VisionOcrEngine;

impl VisionOcrEngine {
    pub fn new() -> Self {
        Self
    }
}

impl OcrEngine for VisionOcrEngine {
    fn name(&self) -> &'static str {
        "apple-vision"
    }

    fn warm_up(&self) -> Result<(), OcrError> {
        let start = Instant::now();
        ffi::warm_up_vision();
        log::info!("[VISION] Warm-up took {}ms", start.elapsed().as_millis());
        Ok(())
    }

    fn recognize(
        &self,
        image: &DecodedImage,
        options: &OcrOptions,
    ) -> Result<Recognition, OcrError> {
        let png = image.to_png_bytes()?;
        let output = ffi::run_vision_ocr(
            png,
            options.languages.as_str().to_string(),
            options.recognition_level as i32,
        );

        if !output.error.is_empty() {
            return Err(OcrError::Recognition(output.error));
        }

        let observations: Vec<TextObservation> = serde_json::from_str(&output.observations_json)
            .map_err(|e| OcrError::Recognition(format!("Malformed Vision output: {}", e)))?;
        log::debug!(
            "[VISION] Returned {} observations for {}x{} image",
            observations.len(),
            image.width(),
            image.height()
        );
        Ok(Recognition::from_observations(
            observations,
            options.min_confidence,
        ))
    }
}
