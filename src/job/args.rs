//! Argument validation and options parsing for the four entry points.
//!
//! Runs on the host thread. Every failure here is synchronous: the caller
//! gets an `Err` before any deferred exists. On success the returned
//! `Job<Pending>` owns deep copies of all inputs.

use super::{copy_all, copy_bytes, copy_string, Job, JobInput, JobOptions, Pending};
use crate::error::OcrError;
use crate::host::{HostBuffer, HostValue};
use crate::ocr::{BatchOptions, Languages, OcrOptions, RecognitionLevel};

pub const WRONG_ARGUMENT_COUNT: &str = "Wrong number of arguments";
pub const OPTIONS_NOT_OBJECT: &str = "Options argument must be an object";

/// `recognize(path, options?)`
pub fn path_job(args: &[HostValue]) -> Result<Job<Pending>, OcrError> {
    let path = first_arg(args)?
        .as_str()
        .ok_or_else(|| OcrError::argument_type("First argument must be a string"))?;
    let options = single_options(args.get(1))?;
    let path = copy_string(path, "image path")?;

    Ok(Job::new(JobInput::Path(path), JobOptions::Single(options)))
}

/// `recognizeBuffer(buffer, options?)`
pub fn buffer_job(args: &[HostValue]) -> Result<Job<Pending>, OcrError> {
    let buffer = first_arg(args)?
        .as_buffer()
        .ok_or_else(|| OcrError::argument_type("First argument must be a Buffer or Uint8Array"))?;
    let options = single_options(args.get(1))?;
    let bytes = copy_bytes(&buffer.bytes(), "image buffer")?;

    Ok(Job::new(JobInput::Buffer(bytes), JobOptions::Single(options)))
}

/// `recognizeBatch(paths, options?)`
pub fn batch_paths_job(args: &[HostValue]) -> Result<Job<Pending>, OcrError> {
    let items = first_arg(args)?.as_array().ok_or_else(|| {
        OcrError::argument_type("First argument must be an array of image paths")
    })?;
    if items.is_empty() {
        return Err(OcrError::EmptyInput(
            "Image paths array cannot be empty".to_string(),
        ));
    }
    let paths = items
        .iter()
        .map(HostValue::as_str)
        .collect::<Option<Vec<&str>>>()
        .ok_or_else(|| OcrError::argument_type("Array elements must be strings"))?;
    let options = batch_options(args.get(1))?;
    let paths = copy_all(&paths, "image paths", |path| copy_string(path, "image path"))?;

    Ok(Job::new(JobInput::Paths(paths), JobOptions::Batch(options)))
}

/// `recognizeBatchFromBuffer(buffers, options?)`
pub fn batch_buffers_job(args: &[HostValue]) -> Result<Job<Pending>, OcrError> {
    let items = first_arg(args)?
        .as_array()
        .ok_or_else(|| OcrError::argument_type("First argument must be an array of buffers"))?;
    if items.is_empty() {
        return Err(OcrError::EmptyInput("Buffer array cannot be empty".to_string()));
    }
    let buffers = items
        .iter()
        .map(HostValue::as_buffer)
        .collect::<Option<Vec<&HostBuffer>>>()
        .ok_or_else(|| OcrError::argument_type("Array elements must be Buffer or Uint8Array"))?;
    let options = batch_options(args.get(1))?;
    let buffers = copy_all(&buffers, "image buffers", |buffer| {
        copy_bytes(&buffer.bytes(), "image buffer")
    })?;

    Ok(Job::new(JobInput::Buffers(buffers), JobOptions::Batch(options)))
}

fn first_arg(args: &[HostValue]) -> Result<&HostValue, OcrError> {
    args.first()
        .ok_or_else(|| OcrError::argument_type(WRONG_ARGUMENT_COUNT))
}

/// Options for the single-image flows. Anything the host would not call an
/// object (or null/undefined) is a type error.
fn single_options(value: Option<&HostValue>) -> Result<OcrOptions, OcrError> {
    match value {
        None => Ok(OcrOptions::default()),
        Some(value) if value.is_nullish() => Ok(OcrOptions::default()),
        Some(value) if value.type_of() != "object" => {
            Err(OcrError::argument_type(OPTIONS_NOT_OBJECT))
        }
        Some(value) => parse_ocr_options(value),
    }
}

/// Options for the batch flows. Non-record values yield defaults.
fn batch_options(value: Option<&HostValue>) -> Result<BatchOptions, OcrError> {
    match value {
        Some(value) => parse_batch_options(value),
        None => Ok(BatchOptions::default()),
    }
}

/// Read recognized fields of an options record over the defaults. Unknown
/// fields and fields of the wrong type are ignored; only an out-of-range
/// `recognitionLevel` fails.
pub fn parse_ocr_options(value: &HostValue) -> Result<OcrOptions, OcrError> {
    let mut options = OcrOptions::default();

    if let Some(languages) = value.get("languages").and_then(HostValue::as_str) {
        options.languages = Languages::Owned(copy_string(languages, "languages")?);
    }

    if let Some(level) = value.get("recognitionLevel").and_then(int32) {
        options.recognition_level = RecognitionLevel::try_from(level).map_err(|level| {
            log::debug!("[JOB] Rejecting recognitionLevel {}", level);
            OcrError::InvalidOptions
        })?;
    }

    if let Some(min_confidence) = value.get("minConfidence").and_then(HostValue::as_f64) {
        if min_confidence.is_finite() {
            options.min_confidence = min_confidence;
        }
    }

    Ok(options)
}

pub fn parse_batch_options(value: &HostValue) -> Result<BatchOptions, OcrError> {
    let mut options = BatchOptions::default();

    if let Some(ocr_options) = value.get("ocrOptions") {
        options.ocr_options = parse_ocr_options(ocr_options)?;
    }

    if let Some(max_threads) = value.get("maxThreads").and_then(int32) {
        if let Ok(max_threads) = usize::try_from(max_threads) {
            options.max_threads = max_threads;
        }
    }

    if let Some(batch_size) = value.get("batchSize").and_then(int32) {
        if batch_size > 0 {
            options.batch_size = batch_size as usize;
        }
    }

    Ok(options)
}

/// Host number to a 32-bit integer: truncated toward zero, wrapped into
/// range, non-finite values become 0.
fn int32(value: &HostValue) -> Option<i32> {
    let n = value.as_f64()?;
    if !n.is_finite() {
        return Some(0);
    }
    Some(n.trunc() as i64 as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: Vec<(&str, HostValue)>) -> HostValue {
        HostValue::object(fields)
    }

    #[test]
    fn parses_every_recognized_field() {
        let options = parse_ocr_options(&record(vec![
            ("languages", "zh-Hans,en-US".into()),
            ("recognitionLevel", 0.0.into()),
            ("minConfidence", 0.25.into()),
            ("unknown", "ignored".into()),
        ]))
        .unwrap();
        assert_eq!(options.languages, Languages::Owned("zh-Hans,en-US".into()));
        assert_eq!(options.recognition_level, RecognitionLevel::Fast);
        assert_eq!(options.min_confidence, 0.25);
    }

    #[test]
    fn omitted_fields_keep_defaults() {
        let options = parse_ocr_options(&record(vec![])).unwrap();
        assert_eq!(options, OcrOptions::default());
        assert!(options.languages.is_default());
    }

    #[test]
    fn wrong_types_are_silently_ignored() {
        let options = parse_ocr_options(&record(vec![
            ("languages", 42.0.into()),
            ("recognitionLevel", "fast".into()),
            ("minConfidence", HostValue::Null),
        ]))
        .unwrap();
        assert_eq!(options, OcrOptions::default());
    }

    #[test]
    fn out_of_range_level_is_invalid() {
        for level in [2.0, 5.0, -1.0] {
            let err = parse_ocr_options(&record(vec![("recognitionLevel", level.into())]))
                .unwrap_err();
            assert_eq!(err, OcrError::InvalidOptions);
        }
        // Truncated like any host int32 conversion.
        let options =
            parse_ocr_options(&record(vec![("recognitionLevel", 1.9.into())])).unwrap();
        assert_eq!(options.recognition_level, RecognitionLevel::Accurate);
    }

    #[test]
    fn min_confidence_is_not_clamped() {
        let options = parse_ocr_options(&record(vec![("minConfidence", 7.5.into())])).unwrap();
        assert_eq!(options.min_confidence, 7.5);
        let options =
            parse_ocr_options(&record(vec![("minConfidence", f64::NAN.into())])).unwrap();
        assert_eq!(options.min_confidence, 0.0);
    }

    #[test]
    fn batch_fields() {
        let options = parse_batch_options(&record(vec![
            (
                "ocrOptions",
                record(vec![("languages", "fr-FR".into())]),
            ),
            ("maxThreads", 3.0.into()),
            ("batchSize", 8.0.into()),
        ]))
        .unwrap();
        assert_eq!(options.ocr_options.languages.as_str(), "fr-FR");
        assert_eq!(options.max_threads, 3);
        assert_eq!(options.batch_size, 8);
    }

    #[test]
    fn batch_rejects_negative_threads_and_zero_size() {
        let options = parse_batch_options(&record(vec![
            ("maxThreads", (-2.0).into()),
            ("batchSize", 0.0.into()),
        ]))
        .unwrap();
        assert_eq!(options, BatchOptions::default());
    }

    #[test]
    fn batch_invalid_nested_level_fails() {
        let err = parse_batch_options(&record(vec![(
            "ocrOptions",
            record(vec![("recognitionLevel", 2.0.into())]),
        )]))
        .unwrap_err();
        assert_eq!(err, OcrError::InvalidOptions);
    }

    #[test]
    fn batch_options_tolerate_non_records() {
        for value in [HostValue::from(3.0), "fast".into(), HostValue::Null] {
            assert_eq!(parse_batch_options(&value).unwrap(), BatchOptions::default());
        }
    }

    #[test]
    fn arity_and_input_types() {
        assert_eq!(
            path_job(&[]).unwrap_err(),
            OcrError::argument_type(WRONG_ARGUMENT_COUNT)
        );
        assert_eq!(
            path_job(&[42.0.into()]).unwrap_err().to_string(),
            "First argument must be a string"
        );
        assert_eq!(
            buffer_job(&["not a buffer".into()]).unwrap_err().to_string(),
            "First argument must be a Buffer or Uint8Array"
        );
        assert_eq!(
            batch_paths_job(&["/a.png".into()]).unwrap_err().to_string(),
            "First argument must be an array of image paths"
        );
        assert_eq!(
            batch_buffers_job(&[HostValue::Array(vec!["x".into()])])
                .unwrap_err()
                .to_string(),
            "Array elements must be Buffer or Uint8Array"
        );
    }

    #[test]
    fn empty_batches_are_generic_errors() {
        let err = batch_paths_job(&[HostValue::Array(vec![])]).unwrap_err();
        assert_eq!(err.to_string(), "Image paths array cannot be empty");
        assert!(matches!(err, OcrError::EmptyInput(_)));

        let err = batch_buffers_job(&[HostValue::Array(vec![])]).unwrap_err();
        assert_eq!(err.to_string(), "Buffer array cannot be empty");
    }

    #[test]
    fn single_options_must_be_objects() {
        let err = path_job(&["/a.png".into(), "fast".into()]).unwrap_err();
        assert_eq!(err, OcrError::argument_type(OPTIONS_NOT_OBJECT));

        for options in [HostValue::Null, HostValue::Undefined] {
            let job = path_job(&["/a.png".into(), options]).unwrap();
            assert_eq!(job.options(), &JobOptions::Single(OcrOptions::default()));
        }
    }

    #[test]
    fn buffer_job_copies_host_memory() {
        let host = HostBuffer::from_vec(vec![1, 2, 3]);
        let job = buffer_job(&[host.clone().into()]).unwrap();
        host.overwrite(&[9, 9, 9, 9]);
        assert_eq!(job.input(), &JobInput::Buffer(vec![1, 2, 3]));
    }

    #[test]
    fn batch_paths_are_copied_in_order() {
        let job = batch_paths_job(&[HostValue::Array(vec!["/a.png".into(), "/b.png".into()])])
            .unwrap();
        assert_eq!(
            job.input(),
            &JobInput::Paths(vec!["/a.png".to_string(), "/b.png".to_string()])
        );
    }
}
