//! Batch Driver
//!
//! Processes many kline files with a fixed pool of worker threads. Workers
//! pull paths from a shared queue until it is empty and report every file on
//! a completion channel; the coordinating thread collects the reports, drives
//! the progress bar and builds the batch summary.
//!
//! Each file is handled start to finish by one worker. A failing or
//! panicking file is recorded and the batch carries on.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::{AppError, Result};
use crate::services::pipeline::FileOutcome;

/// Shared pull-based queue of files to process
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<PathBuf>>,
}

impl TaskQueue {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            tasks: Mutex::new(paths.into()),
        }
    }

    /// Take the next file, `None` once the queue is drained
    pub fn pop(&self) -> Option<PathBuf> {
        // a worker that panicked mid-pop leaves the deque intact
        let mut tasks = match self.tasks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        match self.tasks.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Message from a worker to the coordinator
#[derive(Debug)]
pub enum WorkerMessage {
    /// One file is done, successfully or not
    Finished {
        worker: usize,
        path: PathBuf,
        result: Result<FileOutcome>,
    },
    /// The queue was empty; this worker has exited
    Done { worker: usize },
}

/// A file that could not be processed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Totals over one batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub written: usize,
    pub rejected: usize,
    pub already_processed: usize,
    pub failed: Vec<FailedFile>,
    /// Lowest quality among written files
    pub min_quality: Option<f64>,
    /// Mean quality among written files
    pub mean_quality: Option<f64>,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn record(&mut self, path: PathBuf, result: Result<FileOutcome>) {
        match result {
            Ok(outcome) => {
                match &outcome {
                    FileOutcome::Written { .. } => self.written += 1,
                    FileOutcome::Rejected { .. } => self.rejected += 1,
                    FileOutcome::AlreadyProcessed { .. } => self.already_processed += 1,
                }
                self.outcomes.push(outcome);
            }
            Err(e) => self.failed.push(FailedFile {
                path,
                error: e.to_string(),
            }),
        }
    }

    fn finish(&mut self) {
        self.outcomes.sort_by(|a, b| a.pair().cmp(b.pair()));
        self.failed.sort_by(|a, b| a.path.cmp(&b.path));

        let qualities: Vec<f64> = self.outcomes.iter().filter_map(|o| o.quality()).collect();
        if !qualities.is_empty() {
            self.min_quality = qualities.iter().copied().reduce(f64::min);
            self.mean_quality = Some(qualities.iter().sum::<f64>() / qualities.len() as f64);
        }
    }

    /// Files handled without error
    pub fn succeeded(&self) -> usize {
        self.written + self.rejected + self.already_processed
    }

    pub fn print_summary(&self) {
        println!("\n📊 Batch Summary:");
        println!("  Files: {}", self.total);
        println!("  ✅ Interpolated: {}", self.written);
        println!("  ⏭️  Already processed: {}", self.already_processed);
        println!("  ⚠️  Rejected: {}", self.rejected);

        for outcome in &self.outcomes {
            if let FileOutcome::Rejected { pair, reason } = outcome {
                println!("    {} - {}", pair, reason);
            }
        }

        if let (Some(min), Some(mean)) = (self.min_quality, self.mean_quality) {
            println!("  Quality: min {:.3}, mean {:.3}", min, mean);
        }

        if !self.failed.is_empty() {
            println!("  ❌ Failed: {}", self.failed.len());
            for failed in &self.failed[0..std::cmp::min(5, self.failed.len())] {
                println!("    {} - {}", failed.path.display(), failed.error);
            }
            if self.failed.len() > 5 {
                println!("    ... and {} more errors", self.failed.len() - 5);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn worker_loop<F>(worker: usize, queue: &TaskQueue, process: &F, sender: Sender<WorkerMessage>)
where
    F: Fn(&Path) -> Result<FileOutcome> + Sync,
{
    while let Some(path) = queue.pop() {
        debug!(worker, file = %path.display(), "Worker starts processing");
        // a panic is confined to its file
        let result = panic::catch_unwind(AssertUnwindSafe(|| process(&path))).unwrap_or_else(|payload| {
            Err(AppError::Other(format!(
                "panicked while processing: {}",
                panic_message(&*payload)
            )))
        });
        if sender
            .send(WorkerMessage::Finished {
                worker,
                path,
                result,
            })
            .is_err()
        {
            // coordinator is gone, nobody to report to
            return;
        }
    }
    let _ = sender.send(WorkerMessage::Done { worker });
}

fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible || total == 0 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    match ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(e) => debug!("Falling back to default progress style: {}", e),
    }
    pb
}

/// Process `files` on `workers` threads with `process`
///
/// Blocks until every file has been handled. Per-file errors end up in
/// [`BatchSummary::failed`]; they never stop the batch.
pub fn run_batch<F>(files: Vec<PathBuf>, workers: usize, show_progress: bool, process: F) -> BatchSummary
where
    F: Fn(&Path) -> Result<FileOutcome> + Sync,
{
    let total = files.len();
    let workers = workers.max(1).min(total.max(1));
    let queue = TaskQueue::new(files);
    let mut summary = BatchSummary::new(total);
    let pb = progress_bar(total, show_progress);

    info!(files = total, workers, "Starting batch");

    std::thread::scope(|scope| {
        let (sender, receiver) = mpsc::channel();

        for worker in 0..workers {
            let sender = sender.clone();
            let queue = &queue;
            let process = &process;
            scope.spawn(move || worker_loop(worker, queue, process, sender));
        }
        // only workers hold senders now, so recv fails if they all die
        drop(sender);

        let mut finished = 0;
        let mut processed = 0;
        while finished < workers {
            let message = match receiver.recv() {
                Ok(message) => message,
                Err(_) => {
                    error!(finished, workers, "Workers exited without reporting");
                    break;
                }
            };

            match message {
                WorkerMessage::Finished {
                    worker,
                    path,
                    result,
                } => {
                    processed += 1;
                    match &result {
                        Ok(_) => info!(
                            worker,
                            file = %path.display(),
                            "Worker finished processing. {} / {}",
                            processed,
                            total
                        ),
                        Err(e) => error!(
                            worker,
                            file = %path.display(),
                            error = %e,
                            "Worker failed processing. {} / {}",
                            processed,
                            total
                        ),
                    }
                    pb.inc(1);
                    summary.record(path, result);
                }
                WorkerMessage::Done { worker } => {
                    finished += 1;
                    debug!(worker, finished, "Worker finished");
                }
            }
        }
    });

    pb.finish_and_clear();
    summary.finish();
    info!(
        written = summary.written,
        rejected = summary.rejected,
        failed = summary.failed.len(),
        "Finished processing all files"
    );
    summary
}

/// Error for a batch that cannot start at all
pub fn ensure_input_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(AppError::Io(format!("Input directory not found: {}", dir.display())))
    }
}
