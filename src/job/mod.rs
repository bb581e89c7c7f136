//! Job domain: owned request state moving from host thread to worker and back.
//!
//! A `Job` is built on the host thread from deep copies of everything the
//! caller handed in, moved onto a worker as `Job<Running>`, and comes back
//! as `Job<Done>` carrying its outcome. Host memory is never aliased.

pub mod args;

use crate::error::OcrError;
use crate::ocr::{BatchOptions, BatchResult, OcrOptions, OcrResult};

/// Which entry point created the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Path,
    Buffer,
    BatchPaths,
    BatchBuffers,
}

impl JobKind {
    /// Name of the background work resource, as it appears in logs.
    pub fn resource_name(self) -> &'static str {
        match self {
            JobKind::Path => "OCR",
            JobKind::Buffer => "BufferOCR",
            JobKind::BatchPaths => "BatchOCR",
            JobKind::BatchBuffers => "BatchBufferOCR",
        }
    }
}

/// Owned copies of the caller's inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum JobInput {
    Path(String),
    Buffer(Vec<u8>),
    Paths(Vec<String>),
    Buffers(Vec<Vec<u8>>),
}

impl JobInput {
    pub fn kind(&self) -> JobKind {
        match self {
            JobInput::Path(_) => JobKind::Path,
            JobInput::Buffer(_) => JobKind::Buffer,
            JobInput::Paths(_) => JobKind::BatchPaths,
            JobInput::Buffers(_) => JobKind::BatchBuffers,
        }
    }

    /// Number of images this input describes.
    pub fn len(&self) -> usize {
        match self {
            JobInput::Path(_) | JobInput::Buffer(_) => 1,
            JobInput::Paths(paths) => paths.len(),
            JobInput::Buffers(buffers) => buffers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOptions {
    Single(OcrOptions),
    Batch(BatchOptions),
}

impl JobOptions {
    /// Per-image recognition options.
    pub fn ocr_options(&self) -> &OcrOptions {
        match self {
            JobOptions::Single(options) => options,
            JobOptions::Batch(options) => &options.ocr_options,
        }
    }

    /// Batch options; single-image options get batch defaults.
    pub fn batch_options(&self) -> BatchOptions {
        match self {
            JobOptions::Batch(options) => options.clone(),
            JobOptions::Single(options) => BatchOptions {
                ocr_options: options.clone(),
                ..BatchOptions::default()
            },
        }
    }
}

/// What the worker left on the job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Top-level failure recorded before the engine produced anything.
    Failed(OcrError),
    Single(OcrResult),
    Batch(BatchResult),
    /// Neither a result nor an error.
    Missing,
}

/// Built on the host thread, not yet handed to a worker.
#[derive(Debug)]
pub struct Pending;

/// Owned by a worker thread.
#[derive(Debug)]
pub struct Running;

/// Back on the host thread with an outcome.
#[derive(Debug)]
pub struct Done {
    outcome: JobOutcome,
}

#[derive(Debug)]
pub struct Job<S> {
    input: JobInput,
    options: JobOptions,
    state: S,
}

impl Job<Pending> {
    pub fn new(input: JobInput, options: JobOptions) -> Self {
        Self {
            input,
            options,
            state: Pending,
        }
    }

    /// Hand the job to a worker.
    pub fn start(self) -> Job<Running> {
        Job {
            input: self.input,
            options: self.options,
            state: Running,
        }
    }
}

impl Job<Running> {
    pub fn finish(self, outcome: JobOutcome) -> Job<Done> {
        Job {
            input: self.input,
            options: self.options,
            state: Done { outcome },
        }
    }
}

impl Job<Done> {
    pub fn outcome(&self) -> &JobOutcome {
        &self.state.outcome
    }

    /// Split into outcome, inputs and options so each can be released in turn.
    pub fn into_parts(self) -> (JobOutcome, JobInput, JobOptions) {
        (self.state.outcome, self.input, self.options)
    }
}

impl<S> Job<S> {
    pub fn kind(&self) -> JobKind {
        self.input.kind()
    }

    pub fn input(&self) -> &JobInput {
        &self.input
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }
}

/// Deep-copy bytes into a fresh allocation, failing instead of aborting
/// when memory is short.
pub fn copy_bytes(src: &[u8], what: &str) -> Result<Vec<u8>, OcrError> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(src.len())
        .map_err(|_| OcrError::allocation(what))?;
    copy.extend_from_slice(src);
    Ok(copy)
}

pub fn copy_string(src: &str, what: &str) -> Result<String, OcrError> {
    let mut copy = String::new();
    copy.try_reserve_exact(src.len())
        .map_err(|_| OcrError::allocation(what))?;
    copy.push_str(src);
    Ok(copy)
}

/// Copy every element; on the first failure all earlier copies are freed
/// and the error is returned.
pub fn copy_all<T, U, F>(items: &[T], what: &str, mut copy: F) -> Result<Vec<U>, OcrError>
where
    F: FnMut(&T) -> Result<U, OcrError>,
{
    let mut copies = Vec::new();
    copies
        .try_reserve_exact(items.len())
        .map_err(|_| OcrError::allocation(what))?;
    for item in items {
        match copy(item) {
            Ok(owned) => copies.push(owned),
            Err(err) => {
                log::debug!(
                    "[JOB] Copy failed after {} of {} {}; releasing",
                    copies.len(),
                    items.len(),
                    what
                );
                drop(copies);
                return Err(err);
            }
        }
    }
    Ok(copies)
}
