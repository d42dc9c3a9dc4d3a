//! Directory conversion.
//!
//! Walks an input tree, converts every file whose extension names a
//! supported format, and writes the results into an output tree with the
//! same layout and the destination format's extension:
//!
//! ```text
//! photos/                      out/
//! ├── 001-dawn.png      →      ├── 001-dawn.jpg
//! ├── notes.txt                │  (ignored: not an image)
//! └── travel/                  └── travel/
//!     └── rome.gif      →          └── rome.jpg
//! ```
//!
//! ## Parallel Processing
//!
//! Each file is an independent conversion, so files are processed in
//! parallel using [rayon](https://docs.rs/rayon). The pipeline shares no
//! mutable state, so all workers use the same [`Pipeline`]. One file
//! failing does not stop the others; failures are collected in the
//! [`BatchReport`].
//!
//! Two sources can map to the same output (`a.png` and `a.gif` both become
//! `a.jpg` when converting to JPEG). The first in walk order owns the output
//! path; the others are planned with [`BatchJob::collides_with`] set and fail
//! without touching the disk.
//!
//! Progress is reported through an optional channel of [`BatchEvent`]s so
//! the caller can print lines as files finish.

use crate::imaging::{CodecBackend, Format};
use crate::pipeline::{ConversionError, ConversionRequest, Pipeline};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error("Input is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Output {} is already produced by {}", output.display(), first.display())]
    OutputCollision { output: PathBuf, first: PathBuf },
}

/// Target settings applied to every file in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub destination: Format,
    /// 0 = unset, as in a single conversion.
    pub width: u32,
    pub height: u32,
    pub quality: u32,
}

/// One planned conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub source_format: Format,
    pub source: PathBuf,
    pub output: PathBuf,
    /// Source path relative to the input root, for display.
    pub relative: PathBuf,
    /// Relative path of an earlier job that writes the same output.
    pub collides_with: Option<PathBuf>,
}

/// Progress events sent while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Converted {
        relative: PathBuf,
        output: PathBuf,
        elapsed: Duration,
    },
    Failed {
        relative: PathBuf,
        error: String,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub converted: Vec<ConvertedEntry>,
    pub failed: Vec<FailedEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertedEntry {
    pub source: PathBuf,
    pub output: PathBuf,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedEntry {
    pub source: PathBuf,
    pub error: String,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// List the conversions a batch would perform, sorted by source path.
///
/// Files without a supported extension are skipped. A job whose output path
/// was already claimed by an earlier job is marked with `collides_with`.
pub fn plan_batch(
    input_dir: &Path,
    output_dir: &Path,
    destination: Format,
) -> Result<Vec<BatchJob>, BatchError> {
    if !input_dir.is_dir() {
        return Err(BatchError::NotADirectory(input_dir.to_path_buf()));
    }

    let mut jobs = Vec::new();
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    for entry in walkdir::WalkDir::new(input_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(source_format) = Format::from_path(entry.path()) else {
            continue;
        };
        let relative = entry
            .path()
            .strip_prefix(input_dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        let output = output_dir
            .join(&relative)
            .with_extension(destination.extension());
        let collides_with = match claimed.get(&output) {
            Some(first) => Some(first.clone()),
            None => {
                claimed.insert(output.clone(), relative.clone());
                None
            }
        };
        jobs.push(BatchJob {
            source_format,
            source: entry.path().to_path_buf(),
            output,
            relative,
            collides_with,
        });
    }
    Ok(jobs)
}

/// Run every job, in parallel, and collect the outcome.
///
/// Results in the report keep the order of `jobs`.
pub fn run_batch<B: CodecBackend>(
    pipeline: &Pipeline<B>,
    jobs: &[BatchJob],
    options: &BatchOptions,
    events: Option<Sender<BatchEvent>>,
) -> BatchReport {
    let outcomes: Vec<(&BatchJob, Result<Duration, BatchError>)> = jobs
        .par_iter()
        .map(|job| {
            let outcome = convert_file(pipeline, job, options);
            if let Some(tx) = &events {
                let event = match &outcome {
                    Ok(elapsed) => BatchEvent::Converted {
                        relative: job.relative.clone(),
                        output: job.output.clone(),
                        elapsed: *elapsed,
                    },
                    Err(e) => BatchEvent::Failed {
                        relative: job.relative.clone(),
                        error: e.to_string(),
                    },
                };
                // The receiver may have hung up; progress is best-effort.
                tx.send(event).ok();
            }
            (job, outcome)
        })
        .collect();

    let mut report = BatchReport::default();
    for (job, outcome) in outcomes {
        match outcome {
            Ok(elapsed) => report.converted.push(ConvertedEntry {
                source: job.relative.clone(),
                output: job.output.clone(),
                elapsed_ms: elapsed.as_millis(),
            }),
            Err(e) => report.failed.push(FailedEntry {
                source: job.relative.clone(),
                error: e.to_string(),
            }),
        }
    }
    report
}

/// Convert one file. The output is only created once encoding succeeded.
fn convert_file<B: CodecBackend>(
    pipeline: &Pipeline<B>,
    job: &BatchJob,
    options: &BatchOptions,
) -> Result<Duration, BatchError> {
    if let Some(first) = &job.collides_with {
        return Err(BatchError::OutputCollision {
            output: job.output.clone(),
            first: first.clone(),
        });
    }
    let started = Instant::now();
    let source = BufReader::new(std::fs::File::open(&job.source)?);
    let mut encoded = Vec::new();

    pipeline.execute(ConversionRequest {
        source_format: job.source_format.mime().to_string(),
        source,
        destination_format: options.destination.mime().to_string(),
        width: options.width,
        height: options.height,
        quality: options.quality,
        sink: &mut encoded,
    })?;

    if let Some(parent) = job.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&job.output, &encoded)?;
    Ok(started.elapsed())
}
