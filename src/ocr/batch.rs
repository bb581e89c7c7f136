//! Batch recognition: the engine-side fan-out over many images.
//!
//! Runs on a dedicated rayon pool sized by `max_threads`, capped at the
//! CPU count and the image count. `batch_size` sets the minimum number of
//! images a single split processes. Output order always matches input
//! order.

use super::decoder::{
    decode_failure_message, ImageDecoder, BUFFER_DECODE_FALLBACK, PATH_DECODE_FALLBACK,
};
use super::options::{BatchOptions, OcrOptions};
use super::types::{BatchResult, OcrResult};
use super::OcrEngine;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

/// Borrowed inputs of a batch job.
#[derive(Debug, Clone, Copy)]
pub enum BatchInputs<'a> {
    Paths(&'a [String]),
    Buffers(&'a [Vec<u8>]),
}

impl BatchInputs<'_> {
    pub fn len(&self) -> usize {
        match self {
            BatchInputs::Paths(paths) => paths.len(),
            BatchInputs::Buffers(buffers) => buffers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Recognize every input with `engine`, decoding through `decoder`.
pub fn run_batch<E>(
    engine: &E,
    decoder: &dyn ImageDecoder,
    inputs: BatchInputs<'_>,
    options: &BatchOptions,
) -> BatchResult
where
    E: OcrEngine + ?Sized,
{
    if inputs.is_empty() {
        return BatchResult::failed("No images provided");
    }

    let threads = options.effective_threads(inputs.len());
    let pool = match rayon::ThreadPoolBuilder::new()
        .thread_name(|idx| format!("ocr-batch-{idx}"))
        .num_threads(threads)
        .build()
    {
        Ok(pool) => pool,
        Err(err) => return BatchResult::failed(format!("failed to build worker pool: {err}")),
    };

    let start = Instant::now();
    let min_split = options.batch_size.max(1);
    let results: Vec<Option<OcrResult>> = pool.install(|| {
        (0..inputs.len())
            .into_par_iter()
            .with_min_len(min_split)
            .map(|index| Some(recognize_one(engine, decoder, inputs, index, &options.ocr_options)))
            .collect()
    });

    let batch = BatchResult::new(results);
    log::info!(
        "[BATCH] {} images on {} threads in {}ms ({} failed)",
        batch.count(),
        threads,
        start.elapsed().as_millis(),
        batch.failed_count()
    );
    batch
}

fn recognize_one<E>(
    engine: &E,
    decoder: &dyn ImageDecoder,
    inputs: BatchInputs<'_>,
    index: usize,
    options: &OcrOptions,
) -> OcrResult
where
    E: OcrEngine + ?Sized,
{
    let decoded = match inputs {
        BatchInputs::Paths(paths) => decoder
            .decode_path(Path::new(&paths[index]))
            .map_err(|e| decode_failure_message(&e, PATH_DECODE_FALLBACK)),
        BatchInputs::Buffers(buffers) => decoder
            .decode_bytes(&buffers[index])
            .map_err(|e| decode_failure_message(&e, BUFFER_DECODE_FALLBACK)),
    };

    let image = match decoded {
        Ok(image) => image,
        Err(message) => {
            log::warn!("[BATCH] Image {} could not be decoded: {}", index, message);
            return OcrResult::failure(message);
        }
    };

    let result = engine.recognize(&image, options);
    drop(image);

    match result {
        Ok(recognition) => OcrResult::Success(recognition),
        Err(err) => {
            log::warn!("[BATCH] Image {} failed recognition: {}", index, err);
            OcrResult::failure(err.to_string())
        }
    }
}
