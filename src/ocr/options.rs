//! Recognition options handed to the engine.

/// Recognition level for text recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognitionLevel {
    Fast = 0,
    #[default]
    Accurate = 1,
}

impl TryFrom<i32> for RecognitionLevel {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RecognitionLevel::Fast),
            1 => Ok(RecognitionLevel::Accurate),
            other => Err(other),
        }
    }
}

/// Comma-separated BCP-47 tags. `Default` means no user string was copied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Languages {
    #[default]
    Default,
    Owned(String),
}

impl Languages {
    pub const DEFAULT: &'static str = "en-US";

    pub fn as_str(&self) -> &str {
        match self {
            Languages::Default => Self::DEFAULT,
            Languages::Owned(s) => s,
        }
    }

    /// Individual tags, trimmed, empties skipped.
    pub fn tags(&self) -> Vec<&str> {
        self.as_str()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Languages::Default)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrOptions {
    pub languages: Languages,
    pub recognition_level: RecognitionLevel,
    /// Observations below this confidence are dropped. Not clamped.
    pub min_confidence: f64,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            languages: Languages::Default,
            recognition_level: RecognitionLevel::Accurate,
            min_confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub ocr_options: OcrOptions,
    /// 0 means one worker per logical CPU. Larger requests are capped at
    /// the CPU count.
    pub max_threads: usize,
    pub batch_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            ocr_options: OcrOptions::default(),
            max_threads: 0,
            batch_size: 1,
        }
    }
}

impl BatchOptions {
    /// Threads to run `images` images on: `max_threads` with `0` resolved
    /// against the machine, never more than the CPU count or the image
    /// count, never less than one.
    pub fn effective_threads(&self, images: usize) -> usize {
        let cpus = logical_cpus();
        let requested = if self.max_threads == 0 {
            cpus
        } else {
            self.max_threads.min(cpus)
        };
        requested.min(images).max(1)
    }
}

fn logical_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(2)
        .max(1)
}
