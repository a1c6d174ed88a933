// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch extraction — many images with bounded concurrency. A failed image
// never stops the rest.
//
// OCR is CPU-bound, so each image runs on tokio's blocking pool. A semaphore
// caps how many run at once; every task goes through the same validation and
// auditing as a single extraction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use schriftwerk_core::error::{Result, SchriftwerkError};
use schriftwerk_core::human_errors::humanize_error;
use schriftwerk_core::types::{BatchJob, ExtractionResult, TaskStatus};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use super::ExtractTextUseCase;

pub const DEFAULT_MAX_CONCURRENT: usize = 4;

pub struct ExtractBatchUseCase {
    extract: Arc<ExtractTextUseCase>,
    max_concurrent: usize,
}

impl ExtractBatchUseCase {
    pub fn new(extract: Arc<ExtractTextUseCase>) -> Self {
        Self {
            extract,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// At least one image is always in flight.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// The images directly inside `dir` with an allowed extension, sorted.
    ///
    /// Only the extension is checked here; each file is fully validated when
    /// its task runs.
    pub fn collect_images(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let validator = self.extract.validator();
        let mut images = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && validator.is_allowed_image(&path) {
                images.push(path);
            }
        }
        images.sort();
        Ok(images)
    }

    /// Run every extraction and return the finished job.
    #[instrument(skip_all, fields(images = paths.len(), max_concurrent = self.max_concurrent))]
    pub async fn execute(&self, paths: Vec<PathBuf>) -> BatchJob {
        let mut job = BatchJob::new(paths);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, task) in job.tasks.iter_mut().enumerate() {
            task.status = TaskStatus::Processing;
            let extract = Arc::clone(&self.extract);
            let semaphore = Arc::clone(&semaphore);
            let path = task.image_path.clone();
            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = tokio::task::spawn_blocking(move || extract.execute(&path))
                    .await
                    .unwrap_or_else(|e| {
                        Err(SchriftwerkError::Ocr(format!("extraction task failed: {e}")))
                    });
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => record(&mut job, index, outcome),
                Err(e) => warn!(error = %e, "batch task did not complete"),
            }
        }

        // Anything still marked Processing lost its task.
        for task in job.tasks.iter_mut().filter(|t| t.status == TaskStatus::Processing) {
            task.status = TaskStatus::Failed;
            task.error = Some("The task stopped unexpectedly.".into());
        }

        job.completed_at = Some(Local::now());
        info!(
            id = %job.id,
            completed = job.completed_tasks(),
            failed = job.failed_tasks(),
            progress = job.progress(),
            "Batch finished"
        );
        job
    }
}

fn record(job: &mut BatchJob, index: usize, outcome: Result<ExtractionResult>) {
    let Some(task) = job.tasks.get_mut(index) else {
        return;
    };
    match outcome {
        Ok(result) => {
            task.status = TaskStatus::Completed;
            task.result = Some(result);
        }
        Err(e) => {
            task.status = TaskStatus::Failed;
            task.error = Some(humanize_error(&e).to_string());
        }
    }
}
