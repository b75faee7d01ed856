//! Batch driver: runs the edge pipeline over each input file in turn.
//!
//! ## Per-Image Lifecycle
//!
//! ```text
//! exists? ─▶ decode ─▶ new pool ─▶ gradient rows (parallel) ─▶ join
//!        ─▶ max + normalize ─▶ threshold ─▶ mkdir -p ─▶ encode
//! ```
//!
//! Images are processed strictly one after another. Each image gets a fresh
//! rayon pool sized from [`RunSettings::threads`] and a fresh
//! [`RowProgress`]; both are dropped once the image is written, so nothing
//! leaks between images.
//!
//! ## Failure Policy
//!
//! Anything that goes wrong with one image (missing file, decode failure,
//! output directory or encode failure) is recorded as an [`ImageError`] and
//! the batch moves on. Only a failure to build the worker pool aborts the
//! batch, since every later image would hit it too.
//!
//! ## Progress Events
//!
//! The driver never prints. It sends [`ProcessEvent`]s over an optional
//! channel; the CLI turns them into lines with
//! [`output::format_process_event`](crate::output::format_process_event).
//! While the row pool drains, a scoped reporter thread samples the row
//! counter every [`RunSettings::progress_interval`] and emits
//! [`ProcessEvent::RowsCompleted`]. The reporter stops when the pool's
//! `install` returns; the counter itself is never used to detect completion.

use crate::config::RunSettings;
use crate::edges::{
    EdgeMap, Gradients, NormalizeError, RenderMode, RowProgress, compute_gradients, max_magnitude,
    normalize, render,
};
use crate::imaging::{BackendError, ImageBackend, RustBackend};
use crate::naming::edge_output_path;
use image::RgbImage;
use rayon::ThreadPool;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single image. Recorded, never fatal to the batch.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Source has no file extension to reuse for output: {0}")]
    MissingExtension(PathBuf),
    #[error("Cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Failure of shared setup. Aborts the batch.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Pipeline stage markers, emitted as each stage begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Gradients,
    FindingMaximum,
    Normalizing,
    Writing,
}

/// Progress events emitted during processing for real-time output.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// Emitted once, before the first image.
    BatchStarted { output_dir: PathBuf },
    ImageStarted { path: PathBuf, exists: bool },
    ImageDecoded { width: u32, height: u32 },
    StageStarted(Stage),
    RowsCompleted { completed: usize, total: usize },
    /// The gradient was zero everywhere; a black image is written.
    NoEdges,
    ImageFinished { output: PathBuf },
    ImageFailed { path: PathBuf, error: String },
}

/// Result of one successfully written image.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeReport {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Pre-normalization maximum, `None` when no edges were found.
    pub max_magnitude: Option<f32>,
}

#[derive(Debug)]
pub struct ImageOutcome {
    pub source: PathBuf,
    pub result: Result<EdgeReport, ImageError>,
}

/// Per-image outcomes, in input order.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub outcomes: Vec<ImageOutcome>,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Written images whose gradient was zero everywhere.
    pub fn without_edges(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(r) if r.max_magnitude.is_none()))
            .count()
    }
}

fn emit(events: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Process `inputs` with the pure Rust codec backend.
pub fn process(
    inputs: &[PathBuf],
    settings: &RunSettings,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchResult, BatchError> {
    process_with_backend(&RustBackend::new(), inputs, settings, events.as_ref())
}

/// Process images using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    settings: &RunSettings,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<BatchResult, BatchError> {
    emit(
        events,
        ProcessEvent::BatchStarted {
            output_dir: absolute(&settings.output_dir),
        },
    );

    let mut result = BatchResult::default();
    for input in inputs {
        let outcome = process_image(backend, input, settings, events)?;
        if let Err(e) = &outcome {
            emit(
                events,
                ProcessEvent::ImageFailed {
                    path: input.clone(),
                    error: e.to_string(),
                },
            );
        }
        result.outcomes.push(ImageOutcome {
            source: input.clone(),
            result: outcome,
        });
    }
    Ok(result)
}

/// Run one image end to end. The outer `Result` is batch-fatal, the inner one
/// belongs to this image only.
fn process_image(
    backend: &impl ImageBackend,
    input: &Path,
    settings: &RunSettings,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<Result<EdgeReport, ImageError>, BatchError> {
    let exists = input.exists();
    emit(
        events,
        ProcessEvent::ImageStarted {
            path: absolute(input),
            exists,
        },
    );
    if !exists {
        return Ok(Err(ImageError::SourceNotFound(input.to_path_buf())));
    }
    let Some(output) = edge_output_path(input, &settings.output_dir) else {
        return Ok(Err(ImageError::MissingExtension(input.to_path_buf())));
    };

    let source = match backend.decode(input) {
        Ok(img) => img,
        Err(e) => return Ok(Err(e.into())),
    };
    let (width, height) = source.dimensions();
    emit(events, ProcessEvent::ImageDecoded { width, height });

    let pool = build_pool(settings.threads)?;
    let edges = run_pipeline(&pool, &source, settings.mode, settings.progress_interval, events);
    drop(pool);

    emit(events, ProcessEvent::StageStarted(Stage::Writing));
    Ok(write_output(backend, &edges, &settings.output_dir, &output).map(|()| {
        emit(
            events,
            ProcessEvent::ImageFinished {
                output: output.clone(),
            },
        );
        EdgeReport {
            output,
            width,
            height,
            max_magnitude: edges.max_magnitude,
        }
    }))
}

fn build_pool(threads: usize) -> Result<ThreadPool, BatchError> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("edgemap-row-{i}"))
        .build()?)
}

fn write_output(
    backend: &impl ImageBackend,
    edges: &EdgeMap,
    output_dir: &Path,
    output: &Path,
) -> Result<(), ImageError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ImageError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;
    backend.encode(&edges.image, output)?;
    Ok(())
}

/// Gradient, normalize and threshold `source` on `pool`, emitting stage events.
pub fn run_pipeline(
    pool: &ThreadPool,
    source: &RgbImage,
    mode: RenderMode,
    progress_interval: Duration,
    events: Option<&Sender<ProcessEvent>>,
) -> EdgeMap {
    let progress = RowProgress::for_height(source.height() as usize);

    emit(events, ProcessEvent::StageStarted(Stage::Gradients));
    let Gradients { magnitude, .. } =
        run_row_tasks(pool, source, &progress, progress_interval, events);
    emit(
        events,
        ProcessEvent::RowsCompleted {
            completed: progress.completed(),
            total: progress.total(),
        },
    );

    emit(events, ProcessEvent::StageStarted(Stage::FindingMaximum));
    let max = pool.install(|| max_magnitude(&magnitude));

    emit(events, ProcessEvent::StageStarted(Stage::Normalizing));
    match pool.install(|| normalize(magnitude, max)) {
        Ok(rescaled) => EdgeMap {
            image: pool.install(|| render(&rescaled, mode)),
            max_magnitude: Some(max),
        },
        Err(NormalizeError::NoEdges) => {
            emit(events, ProcessEvent::NoEdges);
            EdgeMap::blank(source.width(), source.height())
        }
    }
}

/// Run the gradient row tasks on `pool` while a reporter thread samples
/// `progress`. Returns after the pool has finished every row.
fn run_row_tasks(
    pool: &ThreadPool,
    source: &RgbImage,
    progress: &RowProgress,
    interval: Duration,
    events: Option<&Sender<ProcessEvent>>,
) -> Gradients {
    let reporter_events = events.cloned();
    std::thread::scope(|scope| {
        let (done_tx, done_rx) = mpsc::channel::<()>();
        scope.spawn(move || {
            report_progress(progress, interval, &done_rx, reporter_events.as_ref())
        });

        let gradients = pool.install(|| compute_gradients(source, progress));
        drop(done_tx);
        gradients
    })
}

fn report_progress(
    progress: &RowProgress,
    interval: Duration,
    done: &mpsc::Receiver<()>,
    events: Option<&Sender<ProcessEvent>>,
) {
    while let Err(RecvTimeoutError::Timeout) = done.recv_timeout(interval) {
        emit(
            events,
            ProcessEvent::RowsCompleted {
                completed: progress.completed(),
                total: progress.total(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use image::Rgb;
    use std::fs;
    use tempfile::TempDir;

    fn settings(output_dir: &Path, mode: RenderMode) -> RunSettings {
        RunSettings {
            output_dir: output_dir.to_path_buf(),
            mode,
            threads: 2,
            progress_interval: Duration::from_millis(5),
            notices: Vec::new(),
        }
    }

    fn spot_image() -> RgbImage {
        RgbImage::from_fn(5, 5, |x, y| {
            if (x, y) == (2, 2) { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        })
    }

    /// Create an empty placeholder so the existence check passes; the mock
    /// backend supplies the pixels.
    fn touch(path: &Path) {
        fs::write(path, "").unwrap();
    }

    fn collect_events(
        f: impl FnOnce(&Sender<ProcessEvent>),
    ) -> Vec<ProcessEvent> {
        let (tx, rx) = mpsc::channel();
        f(&tx);
        drop(tx);
        rx.into_iter().collect()
    }

    #[test]
    fn writes_edge_map_next_to_basename() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("spot.png");
        touch(&input);
        let out_dir = tmp.path().join("out");

        let backend = MockBackend::with_images(vec![(input.clone(), spot_image())]);
        let result = process_with_backend(
            &backend,
            &[input.clone()],
            &settings(&out_dir, RenderMode::Binary { threshold: 50 }),
            None,
        )
        .unwrap();

        assert_eq!(result.succeeded(), 1);
        let report = result.outcomes[0].result.as_ref().unwrap();
        assert_eq!(report.output, out_dir.join("spotedge.png"));
        assert_eq!((report.width, report.height), (5, 5));
        assert!(report.max_magnitude.is_some());
        assert!(out_dir.is_dir());

        let written = backend.written_image(&report.output).unwrap();
        assert_eq!(written.get_pixel(1, 2).0, [255, 255, 255]);
        assert_eq!(written.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn records_decode_then_encode() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("a.jpg");
        touch(&input);

        let backend = MockBackend::with_images(vec![(input.clone(), spot_image())]);
        process_with_backend(
            &backend,
            &[input.clone()],
            &settings(tmp.path(), RenderMode::Intensity),
            None,
        )
        .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Decode(_)));
        assert!(matches!(
            &ops[1],
            RecordedOp::Encode { width: 5, height: 5, output } if output.ends_with("aedge.jpg")
        ));
    }

    #[test]
    fn missing_source_fails_without_decoding() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let result = process_with_backend(
            &backend,
            &[tmp.path().join("ghost.png")],
            &settings(tmp.path(), RenderMode::Intensity),
            None,
        )
        .unwrap();

        assert!(matches!(
            result.outcomes[0].result,
            Err(ImageError::SourceNotFound(_))
        ));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn missing_extension_is_per_image_error() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("noext");
        touch(&input);

        let result = process_with_backend(
            &MockBackend::new(),
            &[input],
            &settings(tmp.path(), RenderMode::Intensity),
            None,
        )
        .unwrap();
        assert!(matches!(
            result.outcomes[0].result,
            Err(ImageError::MissingExtension(_))
        ));
    }

    #[test]
    fn decode_failure_does_not_stop_batch() {
        let tmp = TempDir::new().unwrap();
        let broken = tmp.path().join("broken.png");
        let good = tmp.path().join("good.png");
        touch(&broken);
        touch(&good);

        // Only `good` is known to the mock, so `broken` fails to decode.
        let backend = MockBackend::with_images(vec![(good.clone(), spot_image())]);
        let result = process_with_backend(
            &backend,
            &[broken.clone(), good.clone()],
            &settings(&tmp.path().join("out"), RenderMode::Intensity),
            None,
        )
        .unwrap();

        assert_eq!(result.outcomes.len(), 2);
        assert!(matches!(result.outcomes[0].result, Err(ImageError::Imaging(_))));
        assert!(result.outcomes[1].result.is_ok());
        assert_eq!(result.failed(), 1);
        assert_eq!(result.succeeded(), 1);
    }

    #[test]
    fn uncreatable_output_dir_is_per_image_error() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("spot.png");
        touch(&input);
        // A regular file where the output directory should go.
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let backend = MockBackend::with_images(vec![(input.clone(), spot_image())]);
        let result = process_with_backend(
            &backend,
            &[input.clone(), input.clone()],
            &settings(&blocker.join("out"), RenderMode::Intensity),
            None,
        )
        .unwrap();

        assert_eq!(result.failed(), 2);
        assert!(matches!(
            result.outcomes[0].result,
            Err(ImageError::OutputDir { .. })
        ));
    }

    #[test]
    fn uniform_image_writes_black_and_reports_no_edges() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("flat.png");
        touch(&input);
        let flat = RgbImage::from_pixel(7, 4, Rgb([80, 80, 80]));

        let backend = MockBackend::with_images(vec![(input.clone(), flat)]);
        let events = collect_events(|tx| {
            let result = process_with_backend(
                &backend,
                &[input.clone()],
                &settings(tmp.path(), RenderMode::Stretch { threshold: 10 }),
                Some(tx),
            )
            .unwrap();
            assert_eq!(result.without_edges(), 1);
            assert_eq!(result.failed(), 0);
        });

        // The normalizing stage is announced before its outcome is known.
        let stages: Vec<_> = events
            .iter()
            .filter(|e| {
                matches!(e, ProcessEvent::StageStarted(_) | ProcessEvent::NoEdges)
            })
            .cloned()
            .collect();
        assert_eq!(
            stages,
            vec![
                ProcessEvent::StageStarted(Stage::Gradients),
                ProcessEvent::StageStarted(Stage::FindingMaximum),
                ProcessEvent::StageStarted(Stage::Normalizing),
                ProcessEvent::NoEdges,
                ProcessEvent::StageStarted(Stage::Writing),
            ]
        );
        let written = backend.written_image(&tmp.path().join("flatedge.png")).unwrap();
        assert_eq!(written.dimensions(), (7, 4));
        assert!(written.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn events_follow_pipeline_order() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("spot.png");
        touch(&input);

        let backend = MockBackend::with_images(vec![(input.clone(), spot_image())]);
        let events = collect_events(|tx| {
            process_with_backend(
                &backend,
                &[input.clone()],
                &settings(tmp.path(), RenderMode::Intensity),
                Some(tx),
            )
            .unwrap();
        });

        // Drop the timing-dependent progress samples; keep the final one.
        let rows: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, ProcessEvent::RowsCompleted { .. }))
            .collect();
        assert_eq!(
            rows.last(),
            Some(&&ProcessEvent::RowsCompleted {
                completed: 5,
                total: 5
            })
        );

        let ordered: Vec<_> = events
            .into_iter()
            .filter(|e| !matches!(e, ProcessEvent::RowsCompleted { .. }))
            .collect();
        assert_eq!(
            ordered,
            vec![
                ProcessEvent::BatchStarted {
                    output_dir: absolute(tmp.path())
                },
                ProcessEvent::ImageStarted {
                    path: absolute(&input),
                    exists: true
                },
                ProcessEvent::ImageDecoded {
                    width: 5,
                    height: 5
                },
                ProcessEvent::StageStarted(Stage::Gradients),
                ProcessEvent::StageStarted(Stage::FindingMaximum),
                ProcessEvent::StageStarted(Stage::Normalizing),
                ProcessEvent::StageStarted(Stage::Writing),
                ProcessEvent::ImageFinished {
                    output: tmp.path().join("spotedge.png")
                },
            ]
        );
    }

    #[test]
    fn failure_emits_image_failed() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.png");
        let events = collect_events(|tx| {
            process_with_backend(
                &MockBackend::new(),
                &[missing.clone()],
                &settings(tmp.path(), RenderMode::Intensity),
                Some(tx),
            )
            .unwrap();
        });

        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::ImageStarted { exists: false, .. }
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::ImageFailed { path, .. } if path == &missing
        )));
    }

    #[test]
    fn pipeline_is_independent_of_pool_size() {
        let img = RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (y * 8) as u8, ((x * y) % 256) as u8])
        });
        let run = |threads| {
            let pool = build_pool(threads).unwrap();
            run_pipeline(
                &pool,
                &img,
                RenderMode::Stretch { threshold: 30 },
                Duration::from_millis(50),
                None,
            )
        };
        assert_eq!(run(1), run(4));
    }

    #[test]
    fn run_with_real_backend_writes_file() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("spot.png");
        spot_image().save(&input).unwrap();
        let out_dir = tmp.path().join("nested/out");

        let result = process(
            &[input],
            &settings(&out_dir, RenderMode::Binary { threshold: 50 }),
            None,
        )
        .unwrap();

        assert_eq!(result.succeeded(), 1);
        let written = image::open(out_dir.join("spotedge.png")).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (5, 5));
        assert_eq!(written.get_pixel(2, 1).0, [255, 255, 255]);
        assert_eq!(written.get_pixel(2, 2).0, [0, 0, 0]);
    }
}
