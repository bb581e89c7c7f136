//! OCR domain: engine seam, decoder, options and the result graph.
//!
//! The coordinator only talks to engines through `OcrEngine`. On macOS
//! with the `apple-vision` feature the platform engine is Apple Vision
//! (swift-bridge FFI); elsewhere it is `NoopOcrEngine`.
//! External code should only use the items exported here.

#[cfg(all(target_os = "macos", feature = "apple-vision"))]
mod apple_vision;
pub mod batch;
pub mod decoder;
pub mod options;
pub mod types;

#[cfg(all(target_os = "macos", feature = "apple-vision"))]
pub use apple_vision::VisionOcrEngine;
pub use batch::BatchInputs;
pub use decoder::{DecodedImage, ImageCrateDecoder, ImageDecoder};
pub use options::{BatchOptions, Languages, OcrOptions, RecognitionLevel};
pub use types::{BatchResult, OcrResult, Recognition, TextObservation};

use crate::error::OcrError;
use std::sync::Arc;

/// Common interface for native OCR engines. Implementations must tolerate
/// concurrent calls from distinct worker threads.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn warm_up(&self) -> Result<(), OcrError> {
        Ok(())
    }

    fn recognize(
        &self,
        image: &DecodedImage,
        options: &OcrOptions,
    ) -> Result<Recognition, OcrError>;

    /// Batch entry point. Scheduling across `max_threads` and grouping by
    /// `batch_size` happen here, not in the coordinator.
    fn recognize_batch(
        &self,
        inputs: BatchInputs<'_>,
        options: &BatchOptions,
        decoder: &dyn ImageDecoder,
    ) -> BatchResult {
        batch::run_batch(self, decoder, inputs, options)
    }
}

/// Engine that recognizes nothing, for platforms without a native engine.
#[derive(Debug, Default)]
pub struct NoopOcrEngine;

impl OcrEngine for NoopOcrEngine {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn recognize(&self, _: &DecodedImage, _: &OcrOptions) -> Result<Recognition, OcrError> {
        Ok(Recognition::default())
    }
}

/// The native engine for this build.
pub fn platform_engine() -> Arc<dyn OcrEngine> {
    #[cfg(all(target_os = "macos", feature = "apple-vision"))]
    {
        Arc::new(VisionOcrEngine::new())
    }
    #[cfg(not(all(target_os = "macos", feature = "apple-vision")))]
    {
        log::warn!("[OCR] No native OCR engine in this build; using noop engine");
        Arc::new(NoopOcrEngine)
    }
}
