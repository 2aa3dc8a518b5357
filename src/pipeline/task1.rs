//! Task 1: single-choice questions across subject fields.

use crate::client::ChatBackend;
use crate::metrics::field_accuracy;
use crate::models::{Result, Task1Record, Task1Sample, Task1Scores};
use crate::pipeline::{run_choice_eval, RunOptions};
use crate::prompts::build_task1_prompt;
use crate::store;
use chrono::Utc;
use std::path::Path;
use tracing::info;

/// Run the task-1 evaluation and aggregate per-field accuracy.
pub fn run_task1(
    backend: &dyn ChatBackend,
    data_dir: &Path,
    results_dir: &Path,
    opts: &RunOptions,
) -> Result<Task1Scores> {
    let dataset_path = data_dir.join("datasets").join("task1.jsonl");
    let results_path = results_dir.join("task1.jsonl");

    let samples: Vec<Task1Sample> = store::load_jsonl(&dataset_path)?;
    info!(count = samples.len(), "Loaded task1 evaluation samples");

    let records = run_choice_eval(
        backend,
        &samples,
        &results_path,
        opts,
        |sample| (None, build_task1_prompt(&sample.question, &sample.field)),
        |sample, response, prediction| Task1Record {
            sample: sample.clone(),
            response,
            prediction,
            generated_at: Utc::now(),
        },
    )?;

    info!("Calculating task1 accuracy scores");
    field_accuracy(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedBackend;
    use tempfile::TempDir;

    fn write_dataset(data_dir: &Path, rows: &[(&str, &str, &str, &str)]) {
        let datasets = data_dir.join("datasets");
        std::fs::create_dir_all(&datasets).unwrap();
        let lines: String = rows
            .iter()
            .map(|(q, a, f, s)| {
                format!(
                    "{}\n",
                    serde_json::json!({
                        "question": q, "answer": a, "field": f, "sub_field": s
                    })
                )
            })
            .collect();
        std::fs::write(datasets.join("task1.jsonl"), lines).unwrap();
    }

    fn opts() -> RunOptions {
        RunOptions {
            iterations: 1,
            max_new_tokens: 128,
        }
    }

    #[test]
    fn test_full_run_scores_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let results_dir = temp_dir.path().join("results");
        write_dataset(
            &data_dir,
            &[
                ("q1", "A", "语言学", "音韵"),
                ("q2", "B", "语言学", "词汇"),
                ("q3", "C", "文学", "古代"),
            ],
        );

        let backend = ScriptedBackend::new(
            "teacher",
            &["\\boxed{A}", "\\boxed{D}", "答案是 \\boxed{C}"],
        );

        let scores = run_task1(&backend, &data_dir, &results_dir, &opts()).unwrap();

        assert!((scores.overall - 2.0 / 3.0).abs() < 1e-12);
        assert!((scores.fields["语言学"].overall - 0.5).abs() < f64::EPSILON);
        assert!((scores.fields["文学"].overall - 1.0).abs() < f64::EPSILON);
        assert_eq!(backend.calls(), 3);

        let records: Vec<Task1Record> =
            store::load_jsonl(&results_dir.join("task1.jsonl")).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].prediction, Some("D".to_string()));
    }

    #[test]
    fn test_resume_after_truncation_matches_uninterrupted_run() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let results_dir = temp_dir.path().join("results");
        write_dataset(
            &data_dir,
            &[("q1", "A", "f", "s"), ("q2", "B", "f", "s"), ("q3", "C", "f", "s")],
        );

        let responses = ["\\boxed{A}", "\\boxed{B}", "\\boxed{C}"];
        let backend = ScriptedBackend::new("teacher", &responses);
        run_task1(&backend, &data_dir, &results_dir, &opts()).unwrap();

        let results_path = results_dir.join("task1.jsonl");
        let full = std::fs::read_to_string(&results_path).unwrap();

        // Truncate to the first record and re-run: only the missing two
        // samples are generated, and the file converges to the same records.
        let first_line = full.lines().next().unwrap();
        std::fs::write(&results_path, format!("{first_line}\n")).unwrap();

        let resumed = ScriptedBackend::new("teacher", &responses[1..]);
        let scores = run_task1(&resumed, &data_dir, &results_dir, &opts()).unwrap();

        assert_eq!(resumed.calls(), 2);
        assert!((scores.overall - 1.0).abs() < f64::EPSILON);

        let records: Vec<Task1Record> = store::load_jsonl(&results_path).unwrap();
        let predictions: Vec<_> = records.iter().map(|r| r.prediction.clone()).collect();
        assert_eq!(
            predictions,
            vec![Some("A".into()), Some("B".into()), Some("C".into())]
        );
    }

    #[test]
    fn test_fully_resumed_run_is_a_no_op() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let results_dir = temp_dir.path().join("results");
        write_dataset(&data_dir, &[("q1", "A", "f", "s")]);

        let backend = ScriptedBackend::new("teacher", &["\\boxed{A}"]);
        run_task1(&backend, &data_dir, &results_dir, &opts()).unwrap();

        // Second run finds every flat index covered; the backend is unused.
        let idle = ScriptedBackend::new("teacher", &[]);
        let scores = run_task1(&idle, &data_dir, &results_dir, &opts()).unwrap();
        assert_eq!(idle.calls(), 0);
        assert!((scores.overall - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_generation_failure_aborts_and_keeps_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let results_dir = temp_dir.path().join("results");
        write_dataset(&data_dir, &[("q1", "A", "f", "s"), ("q2", "B", "f", "s")]);

        let backend = ScriptedBackend::with_script(
            "teacher",
            vec![Ok("\\boxed{A}".to_string()), Err("device lost".to_string())],
        );

        assert!(run_task1(&backend, &data_dir, &results_dir, &opts()).is_err());

        // The record appended before the failure survives for the resume.
        let records: Vec<Task1Record> =
            store::load_jsonl(&results_dir.join("task1.jsonl")).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_multiple_iterations_cover_dataset_per_pass() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let results_dir = temp_dir.path().join("results");
        write_dataset(&data_dir, &[("q1", "A", "f", "s"), ("q2", "B", "f", "s")]);

        let backend = ScriptedBackend::new(
            "teacher",
            &["\\boxed{A}", "\\boxed{B}", "\\boxed{C}", "\\boxed{B}"],
        );
        let opts = RunOptions {
            iterations: 2,
            max_new_tokens: 128,
        };

        let scores = run_task1(&backend, &data_dir, &results_dir, &opts).unwrap();
        assert_eq!(backend.calls(), 4);
        // 3 of 4 generations match their answers.
        assert!((scores.overall - 0.75).abs() < f64::EPSILON);
    }
}
