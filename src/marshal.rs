//! Result marshalling: engine result graph to host values.
//!
//! Records are built field by field as `HostValue`s. Every number is the
//! engine's `f64` as is, non-finite values included, so geometry and
//! confidences reach the host exactly as the engine reported them.

use crate::error::UNKNOWN_ERROR;
use crate::host::{Deferred, HostError, HostValue};
use crate::job::JobOutcome;
use crate::ocr::{BatchResult, OcrResult, TextObservation};

/// `{ text, confidence, observations }` as the host sees it.
#[derive(Debug)]
struct OcrRecord<'a> {
    text: Option<&'a str>,
    confidence: f64,
    observations: &'a [TextObservation],
}

impl<'a> OcrRecord<'a> {
    /// Failed or missing entries become `{ text: null, confidence: 0, observations: [] }`.
    fn from_result(result: Option<&'a OcrResult>) -> Self {
        match result.and_then(OcrResult::recognition) {
            Some(recognition) => Self {
                text: Some(recognition.text.as_str()),
                confidence: recognition.confidence,
                observations: &recognition.observations,
            },
            None => Self {
                text: None,
                confidence: 0.0,
                observations: &[],
            },
        }
    }

    fn into_host(self) -> HostValue {
        HostValue::object([
            ("text", self.text.map_or(HostValue::Null, HostValue::from)),
            ("confidence", HostValue::Number(self.confidence)),
            (
                "observations",
                HostValue::Array(self.observations.iter().map(observation).collect()),
            ),
        ])
    }
}

fn observation(obs: &TextObservation) -> HostValue {
    HostValue::object([
        ("text", HostValue::from(obs.text.as_str())),
        ("confidence", HostValue::Number(obs.confidence)),
        ("x", HostValue::Number(obs.x)),
        ("y", HostValue::Number(obs.y)),
        ("width", HostValue::Number(obs.width)),
        ("height", HostValue::Number(obs.height)),
    ])
}

/// Host record for one successful image.
pub fn single_record(result: &OcrResult) -> HostValue {
    OcrRecord::from_result(Some(result)).into_host()
}

/// Host sequence for a batch, aligned with the input order.
pub fn batch_records(batch: &BatchResult) -> HostValue {
    HostValue::Array(
        batch
            .results
            .iter()
            .map(|entry| OcrRecord::from_result(entry.as_ref()).into_host())
            .collect(),
    )
}

/// Terminal value for a finished job: `Ok` to resolve, `Err` to reject.
pub fn settlement(outcome: &JobOutcome) -> Result<HostValue, HostError> {
    match outcome {
        JobOutcome::Failed(err) => Err(err.to_host_error()),
        JobOutcome::Single(OcrResult::Failure { error }) => Err(HostError::error(error.as_str())),
        JobOutcome::Batch(BatchResult {
            error: Some(error), ..
        }) => Err(HostError::error(error.as_str())),
        JobOutcome::Single(result) => Ok(single_record(result)),
        JobOutcome::Batch(batch) => Ok(batch_records(batch)),
        JobOutcome::Missing => Err(HostError::error(UNKNOWN_ERROR)),
    }
}

/// Resolve or reject `deferred` from the job outcome. Consumes the deferred,
/// so exactly one terminal action happens.
pub fn settle(deferred: Deferred, outcome: &JobOutcome) {
    match settlement(outcome) {
        Ok(value) => deferred.resolve(value),
        Err(error) => deferred.reject(error),
    }
}
