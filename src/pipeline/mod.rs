//! Evaluation pipelines for the three task types.
//!
//! Tasks 1 and 2 (and task 3's stage B) share one loop shape: iterate the
//! dataset `iterations` times, generate a response per sample, extract the
//! choice label, append the record durably. The results file is the only
//! run state: on entry the loop loads whatever is already there and skips
//! every flat index below that count, so an interrupted run resumes where
//! it stopped as long as the dataset ordering and size are unchanged.

mod task1;
mod task2;
mod task3;

pub use task1::*;
pub use task2::*;
pub use task3::*;

use crate::client::ChatBackend;
use crate::metrics::extract_last_boxed_answer;
use crate::models::Result;
use crate::store;
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Per-run evaluation parameters from the CLI.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Number of passes over each dataset
    pub iterations: usize,

    /// Generation budget per response
    pub max_new_tokens: u32,
}

pub(crate) fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    pb
}

/// Shared resumable loop for choice-based evaluation.
///
/// Generation failures are not retried here; the error propagates and
/// aborts the loop. Records already appended stay valid and are skipped on
/// the next resume. When every flat index is already covered this returns
/// the loaded records without touching the backend.
pub(crate) fn run_choice_eval<S, R>(
    backend: &dyn ChatBackend,
    samples: &[S],
    results_path: &Path,
    opts: &RunOptions,
    build_prompt: impl Fn(&S) -> (Option<String>, String),
    make_record: impl Fn(&S, String, Option<String>) -> R,
) -> Result<Vec<R>>
where
    R: Serialize + DeserializeOwned,
{
    let mut records: Vec<R> = store::load_jsonl_or_default(results_path)?;
    if records.is_empty() {
        info!("Starting new evaluation run");
    } else {
        info!(
            count = records.len(),
            path = %results_path.display(),
            "Loaded existing results"
        );
    }

    let pending = store::remaining(samples.len(), opts.iterations, records.len());
    if pending == 0 {
        info!("All samples have already been processed, skipping evaluation");
        return Ok(records);
    }

    info!(
        pending = pending,
        iterations = opts.iterations,
        "Processing samples"
    );

    let pb = progress_bar(store::total_workload(samples.len(), opts.iterations) as u64);
    pb.set_position(records.len() as u64);

    for iteration in 0..opts.iterations {
        info!(
            iteration = iteration + 1,
            total = opts.iterations,
            "Starting evaluation iteration"
        );
        pb.set_message(format!("iteration {}/{}", iteration + 1, opts.iterations));

        for (sample_idx, sample) in samples.iter().enumerate() {
            let index = store::flat_index(sample_idx, iteration, samples.len());
            if store::is_done(index, records.len()) {
                continue;
            }

            let (system_prompt, prompt) = build_prompt(sample);
            let response = backend.chat(&prompt, system_prompt.as_deref(), opts.max_new_tokens)?;
            let prediction = extract_last_boxed_answer(&response);

            let record = make_record(sample, response, prediction);
            store::append_jsonl(results_path, &record)?;
            records.push(record);
            pb.inc(1);
        }

        info!(iteration = iteration + 1, "Completed iteration");
    }

    pb.finish_and_clear();
    Ok(records)
}
