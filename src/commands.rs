//! Host-facing entry points.
//!
//! These are thin wrappers: validate and copy the arguments into a Job,
//! then hand it to the pipeline. Each returns a promise immediately or
//! fails synchronously; none of them blocks on recognition.
//!
//! Dispatch, the worker and the completer live in pipeline.rs.

use crate::error::OcrError;
use crate::host::{Env, HostError, HostValue, Promise};
use crate::job::{args, Job, Pending};
use crate::pipeline::{self, Services};

type BuildJob = fn(&[HostValue]) -> Result<Job<Pending>, OcrError>;

/// `recognize(path, options?)`: one image from a filesystem path.
pub fn recognize(env: &Env, services: &Services, argv: &[HostValue]) -> Result<Promise, HostError> {
    submit(env, services, argv, args::path_job)
}

/// `recognizeBuffer(buffer, options?)`: one encoded image held by the host.
/// The bytes are copied before this returns.
pub fn recognize_buffer(
    env: &Env,
    services: &Services,
    argv: &[HostValue],
) -> Result<Promise, HostError> {
    submit(env, services, argv, args::buffer_job)
}

/// `recognizeBatch(paths, options?)`
///
/// Resolves with one record per path, in input order. Images that fail
/// resolve as `{ text: null, confidence: 0, observations: [] }` rather than
/// rejecting the batch.
pub fn recognize_batch(
    env: &Env,
    services: &Services,
    argv: &[HostValue],
) -> Result<Promise, HostError> {
    submit(env, services, argv, args::batch_paths_job)
}

/// `recognizeBatchFromBuffer(buffers, options?)`, same result shape as
/// `recognize_batch`.
pub fn recognize_batch_from_buffer(
    env: &Env,
    services: &Services,
    argv: &[HostValue],
) -> Result<Promise, HostError> {
    submit(env, services, argv, args::batch_buffers_job)
}

fn submit(
    env: &Env,
    services: &Services,
    argv: &[HostValue],
    build: BuildJob,
) -> Result<Promise, HostError> {
    let job = build(argv).map_err(reject_sync)?;
    pipeline::dispatch(env, services, job).map_err(reject_sync)
}

fn reject_sync(err: OcrError) -> HostError {
    log::debug!("[JOB] Rejected synchronously: {}", err);
    err.to_host_error()
}
