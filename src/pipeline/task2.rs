//! Task 2: reading comprehension over shared materials.
//!
//! The dataset groups several questions under one material; evaluation runs
//! over the flattened (question, material) pairs in document order.

use crate::client::ChatBackend;
use crate::metrics::overall_accuracy;
use crate::models::{Result, Task2Document, Task2Record, Task2Sample, TaskScores};
use crate::pipeline::{run_choice_eval, RunOptions};
use crate::prompts::build_task2_prompt;
use crate::store;
use chrono::Utc;
use std::path::Path;
use tracing::info;

fn flatten_documents(documents: Vec<Task2Document>) -> Vec<Task2Sample> {
    documents
        .into_iter()
        .flat_map(|doc| {
            let material = doc.material;
            doc.qas
                .into_iter()
                .map(move |qa| Task2Sample {
                    question: qa.question,
                    answer: qa.answer,
                    material: material.clone(),
                })
        })
        .collect()
}

/// Run the task-2 evaluation and aggregate overall accuracy.
pub fn run_task2(
    backend: &dyn ChatBackend,
    data_dir: &Path,
    results_dir: &Path,
    opts: &RunOptions,
) -> Result<TaskScores> {
    let dataset_path = data_dir.join("datasets").join("task2.jsonl");
    let results_path = results_dir.join("task2.jsonl");

    let documents: Vec<Task2Document> = store::load_jsonl(&dataset_path)?;
    let samples = flatten_documents(documents);
    info!(count = samples.len(), "Loaded task2 evaluation samples");

    let records = run_choice_eval(
        backend,
        &samples,
        &results_path,
        opts,
        |sample| (None, build_task2_prompt(&sample.question, &sample.material)),
        |sample, response, prediction| Task2Record {
            sample: sample.clone(),
            response,
            prediction,
            generated_at: Utc::now(),
        },
    )?;

    info!("Calculating task2 accuracy scores");
    overall_accuracy(&records)
}
