//! Result graph produced by the engine.
//!
//! Geometry is normalized to [0, 1] with a bottom-left origin, exactly as
//! the engine reports it. Nothing in this crate rewrites coordinates.

use serde::Deserialize;

/// A single recognized text fragment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextObservation {
    pub text: String,
    pub confidence: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Successful recognition of one image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recognition {
    /// Observation texts in reading order, joined by `\n`.
    pub text: String,
    /// Mean observation confidence, 0 when there are none.
    pub confidence: f64,
    pub observations: Vec<TextObservation>,
}

impl Recognition {
    /// Build from raw engine observations, dropping empty fragments and
    /// those under `min_confidence`.
    pub fn from_observations(observations: Vec<TextObservation>, min_confidence: f64) -> Self {
        let observations: Vec<TextObservation> = observations
            .into_iter()
            .filter(|obs| !obs.text.is_empty() && obs.confidence >= min_confidence)
            .collect();

        let text = observations
            .iter()
            .map(|obs| obs.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let confidence = if observations.is_empty() {
            0.0
        } else {
            observations.iter().map(|obs| obs.confidence).sum::<f64>() / observations.len() as f64
        };

        Self {
            text,
            confidence,
            observations,
        }
    }
}

/// Outcome for one image: recognized text or a failure message.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrResult {
    Success(Recognition),
    Failure { error: String },
}

impl OcrResult {
    pub fn failure(error: impl Into<String>) -> Self {
        OcrResult::Failure {
            error: error.into(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OcrResult::Success(_) => None,
            OcrResult::Failure { error } => Some(error),
        }
    }

    pub fn recognition(&self) -> Option<&Recognition> {
        match self {
            OcrResult::Success(recognition) => Some(recognition),
            OcrResult::Failure { .. } => None,
        }
    }
}

/// Outcome for a batch. `results` is aligned with the input order; a
/// missing entry means the engine produced nothing for that index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResult {
    /// Global failure; when set, per-image results are irrelevant.
    pub error: Option<String>,
    pub results: Vec<Option<OcrResult>>,
}

impl BatchResult {
    pub fn new(results: Vec<Option<OcrResult>>) -> Self {
        Self {
            error: None,
            results,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            results: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.results.len()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|entry| !matches!(entry, Some(OcrResult::Success(_))))
            .count()
    }
}
