//! Job pipeline: dispatch, off-thread recognition, host-side completion.
//!
//! dispatch: reserve queue slot → create deferred → queue worker + completer
//! worker:   decode → engine → `JobOutcome` (borrows the job, never touches
//!           host values)
//! complete: finish the job → settle the deferred → release result graph,
//!           inputs, options

use crate::error::OcrError;
use crate::host::{create_promise, Deferred, Env, Promise, WorkFailed};
use crate::job::{Done, Job, JobInput, JobKind, JobOutcome, Pending, Running};
use crate::marshal;
use crate::ocr::decoder::{
    decode_failure_message, DecodedImage, BUFFER_DECODE_FALLBACK, PATH_DECODE_FALLBACK,
};
use crate::ocr::{BatchInputs, ImageDecoder, OcrEngine, OcrOptions, OcrResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Native collaborators shared by every worker.
#[derive(Clone)]
pub struct Services {
    pub engine: Arc<dyn OcrEngine>,
    pub decoder: Arc<dyn ImageDecoder>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("engine", &self.engine.name())
            .finish_non_exhaustive()
    }
}

/// Queue `job` and return the promise its completer will settle. A refused
/// job is dropped here and no deferred is created.
pub fn dispatch(env: &Env, services: &Services, job: Job<Pending>) -> Result<Promise, OcrError> {
    let kind = job.kind();
    let images = job.input().len();
    let ticket = env.reserve_work(kind.resource_name())?;
    let id = ticket.id();
    let (deferred, promise) = create_promise();

    let running = job.start();
    let services = services.clone();
    let start = Instant::now();
    ticket.queue(
        running,
        move |job: &Job<Running>| execute(&services, job),
        move |_env: &Env, job, status| complete(id, kind, start, deferred, job, status),
    );

    log::debug!(
        "[JOB] {} #{} dispatched ({} image{})",
        kind.resource_name(),
        id,
        images,
        if images == 1 { "" } else { "s" }
    );
    Ok(promise)
}

/// Worker half. Runs on a background thread and may block. The job itself
/// stays owned by the queue and goes back to the host thread.
pub fn execute(services: &Services, job: &Job<Running>) -> JobOutcome {
    let engine = services.engine.as_ref();
    let decoder = services.decoder.as_ref();

    match job.input() {
        JobInput::Path(path) => recognize_single(
            engine,
            decoder.decode_path(Path::new(path)),
            PATH_DECODE_FALLBACK,
            job.options().ocr_options(),
        ),
        JobInput::Buffer(bytes) => recognize_single(
            engine,
            decoder.decode_bytes(bytes),
            BUFFER_DECODE_FALLBACK,
            job.options().ocr_options(),
        ),
        JobInput::Paths(paths) => JobOutcome::Batch(engine.recognize_batch(
            BatchInputs::Paths(paths),
            &job.options().batch_options(),
            decoder,
        )),
        JobInput::Buffers(buffers) => JobOutcome::Batch(engine.recognize_batch(
            BatchInputs::Buffers(buffers),
            &job.options().batch_options(),
            decoder,
        )),
    }
}

fn recognize_single(
    engine: &dyn OcrEngine,
    decoded: Result<DecodedImage, OcrError>,
    fallback: &str,
    options: &OcrOptions,
) -> JobOutcome {
    let image = match decoded {
        Ok(image) => image,
        Err(err) => {
            let message = decode_failure_message(&err, fallback);
            log::debug!("[OCR] Decode failed: {}", message);
            return JobOutcome::Failed(OcrError::Decode(message));
        }
    };

    let result = engine.recognize(&image, options);
    drop(image);

    match result {
        Ok(recognition) => JobOutcome::Single(OcrResult::Success(recognition)),
        Err(err) => {
            log::debug!("[OCR] {} engine failed: {}", engine.name(), err);
            JobOutcome::Single(OcrResult::failure(err.to_string()))
        }
    }
}

/// Completer half. Runs on the host thread once the worker is done, and
/// releases every allocation the job owns, panicked worker or not.
fn complete(
    id: u64,
    kind: JobKind,
    start: Instant,
    deferred: Deferred,
    job: Job<Running>,
    status: Result<JobOutcome, WorkFailed>,
) {
    let outcome = status.unwrap_or_else(|err| {
        log::warn!("[JOB] {} #{}: {}", kind.resource_name(), id, err);
        JobOutcome::Missing
    });
    let job: Job<Done> = job.finish(outcome);

    marshal::settle(deferred, job.outcome());

    // Release order: result graph, inputs, options strings.
    let (outcome, input, options) = job.into_parts();
    drop(outcome);
    drop(input);
    drop(options);

    log::debug!(
        "[JOB] {} #{} completed in {}ms",
        kind.resource_name(),
        id,
        start.elapsed().as_millis()
    );
}
