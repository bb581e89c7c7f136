//! Shared test helpers for the OCR coordinator tests.

#![allow(dead_code)]

use native_ocr::host::{HostValue, Promise};
use native_ocr::ocr::{
    DecodedImage, ImageCrateDecoder, ImageDecoder, OcrEngine, OcrOptions, Recognition,
    TextObservation,
};
use native_ocr::{CoordinatorConfig, OcrAddon, OcrError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Image widths the scripted engine recognizes.
pub const HELLO_WIDTH: u32 = 10;
pub const WORLD_WIDTH: u32 = 20;
pub const ENGINE_ERROR_WIDTH: u32 = 13;

pub fn hello_observation() -> TextObservation {
    TextObservation {
        text: "Hello".to_string(),
        confidence: 0.95,
        x: 0.1,
        y: 0.8,
        width: 0.2,
        height: 0.05,
    }
}

pub fn world_observation() -> TextObservation {
    TextObservation {
        text: "World".to_string(),
        confidence: 0.75,
        x: 0.3,
        y: 0.1,
        width: 0.4,
        height: 0.1,
    }
}

/// Engine whose output is keyed on the decoded image width. Records the
/// options of every call.
#[derive(Default)]
pub struct ScriptedEngine {
    pub seen: Mutex<Vec<OcrOptions>>,
}

impl ScriptedEngine {
    pub fn seen_options(&self) -> Vec<OcrOptions> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn recognize(
        &self,
        image: &DecodedImage,
        options: &OcrOptions,
    ) -> Result<Recognition, OcrError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(options.clone());
        }
        let observations = match image.width() {
            HELLO_WIDTH => vec![hello_observation()],
            WORLD_WIDTH => vec![hello_observation(), world_observation()],
            ENGINE_ERROR_WIDTH => {
                return Err(OcrError::Recognition("Vision request failed".to_string()))
            }
            _ => Vec::new(),
        };
        Ok(Recognition::from_observations(
            observations,
            options.min_confidence,
        ))
    }
}

pub struct PanickingEngine;

impl OcrEngine for PanickingEngine {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn recognize(&self, _: &DecodedImage, _: &OcrOptions) -> Result<Recognition, OcrError> {
        panic!("native engine crashed");
    }
}

/// Decoder that always fails with a fixed message.
pub struct FailingDecoder(pub &'static str);

impl ImageDecoder for FailingDecoder {
    fn decode_path(&self, _: &Path) -> Result<DecodedImage, OcrError> {
        Err(OcrError::Decode(self.0.to_string()))
    }

    fn decode_bytes(&self, _: &[u8]) -> Result<DecodedImage, OcrError> {
        Err(OcrError::Decode(self.0.to_string()))
    }
}

pub fn config() -> CoordinatorConfig {
    CoordinatorConfig {
        worker_threads: 2,
        warm_up: false,
        ..CoordinatorConfig::default()
    }
}

pub fn addon_with(engine: Arc<dyn OcrEngine>) -> OcrAddon {
    OcrAddon::new(engine, Arc::new(ImageCrateDecoder), &config()).unwrap()
}

pub fn scripted_addon() -> (OcrAddon, Arc<ScriptedEngine>) {
    let engine = Arc::new(ScriptedEngine::default());
    (addon_with(engine.clone()), engine)
}

/// Encoded PNG of the given width.
pub fn png_bytes(width: u32) -> Vec<u8> {
    DecodedImage::new(image::DynamicImage::ImageRgb8(image::RgbImage::new(width, 4)))
        .to_png_bytes()
        .unwrap()
}

/// Write a PNG fixture to the temp dir and return its path.
pub fn png_fixture(name: &str, width: u32) -> String {
    let dir = std::env::temp_dir().join("native-ocr-tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}-{}.png", name, std::process::id()));
    std::fs::write(&path, png_bytes(width)).unwrap();
    path.to_string_lossy().into_owned()
}

pub fn missing_path(name: &str) -> String {
    let path: PathBuf = std::env::temp_dir().join(format!("native-ocr-missing-{}.png", name));
    let _ = std::fs::remove_file(&path);
    path.to_string_lossy().into_owned()
}

/// `{ text: null, confidence: 0, observations: [] }`
pub fn empty_record() -> HostValue {
    HostValue::object([
        ("text", HostValue::Null),
        ("confidence", HostValue::from(0.0)),
        ("observations", HostValue::Array(vec![])),
    ])
}

pub fn observation_record(obs: &TextObservation) -> HostValue {
    HostValue::object([
        ("text", HostValue::from(obs.text.as_str())),
        ("confidence", obs.confidence.into()),
        ("x", obs.x.into()),
        ("y", obs.y.into()),
        ("width", obs.width.into()),
        ("height", obs.height.into()),
    ])
}

pub fn resolved(addon: &OcrAddon, promise: &Promise) -> HostValue {
    addon.env().block_on(promise).unwrap()
}
