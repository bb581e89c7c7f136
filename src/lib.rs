//! native-ocr: asynchronous, batched bridge from a single-threaded host
//! runtime to a blocking native OCR engine.
//!
//! This is the module shell that wires the domains together. No business
//! logic lives here: only module declarations, the export table and
//! module initialization.
//!
//! Entry points are split across:
//!   - commands.rs  : the four host-facing calls (validate, copy, dispatch)
//!   - pipeline.rs  : dispatch, worker and completer
//!   - marshal.rs   : result graph to host values

pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod job;
pub mod marshal;
pub mod ocr;
pub mod pipeline;

pub use config::CoordinatorConfig;
pub use error::OcrError;
pub use pipeline::Services;

use host::{Env, HostError, HostValue, Promise};
use ocr::{ImageCrateDecoder, ImageDecoder, OcrEngine};
use std::sync::Arc;
use std::time::Instant;

/// Names the module exports to the host, in registration order.
pub const EXPORTS: [&str; 4] = [
    "recognize",
    "recognizeBuffer",
    "recognizeBatch",
    "recognizeBatchFromBuffer",
];

/// Install `env_logger` once. Later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// The loaded module: a host event loop plus the native collaborators.
pub struct OcrAddon {
    env: Env,
    services: Services,
}

impl OcrAddon {
    pub fn new(
        engine: Arc<dyn OcrEngine>,
        decoder: Arc<dyn ImageDecoder>,
        config: &CoordinatorConfig,
    ) -> Result<Self, OcrError> {
        let env = Env::new(config)?;
        Ok(Self {
            env,
            services: Services { engine, decoder },
        })
    }

    /// Module initialization: logging, platform engine, image decoder and an
    /// optional engine warm-up.
    pub fn init(config: &CoordinatorConfig) -> Result<Self, OcrError> {
        init_logging();

        let engine = ocr::platform_engine();
        log::info!("[OCR] Using {} engine", engine.name());
        if config.warm_up {
            let warm_start = Instant::now();
            engine.warm_up()?;
            log::info!(
                "[OCR] Engine warm-up complete in {}ms",
                warm_start.elapsed().as_millis()
            );
        }

        Self::new(engine, Arc::new(ImageCrateDecoder), config)
    }

    /// The host event loop driving this module's completions.
    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn recognize(&self, args: &[HostValue]) -> Result<Promise, HostError> {
        commands::recognize(&self.env, &self.services, args)
    }

    pub fn recognize_buffer(&self, args: &[HostValue]) -> Result<Promise, HostError> {
        commands::recognize_buffer(&self.env, &self.services, args)
    }

    pub fn recognize_batch(&self, args: &[HostValue]) -> Result<Promise, HostError> {
        commands::recognize_batch(&self.env, &self.services, args)
    }

    pub fn recognize_batch_from_buffer(&self, args: &[HostValue]) -> Result<Promise, HostError> {
        commands::recognize_batch_from_buffer(&self.env, &self.services, args)
    }

    /// Call an export by its host name.
    pub fn call(&self, name: &str, args: &[HostValue]) -> Result<Promise, HostError> {
        match name {
            "recognize" => self.recognize(args),
            "recognizeBuffer" => self.recognize_buffer(args),
            "recognizeBatch" => self.recognize_batch(args),
            "recognizeBatchFromBuffer" => self.recognize_batch_from_buffer(args),
            other => Err(HostError::type_error(format!("{} is not a function", other))),
        }
    }
}
