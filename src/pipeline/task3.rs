//! Task 3: the two-stage teacher/student pipeline.
//!
//! Stage A runs the teacher once per sample to produce a knowledge payload.
//! Stage B evaluates every student in the roster over stage A's output,
//! each with a guided prompt embedding the teacher's knowledge. Knowledge
//! generation is a long unattended batch job, so stage A tolerates
//! per-sample failures; student evaluation propagates them like the other
//! loops.

use crate::client::ChatBackend;
use crate::metrics::{extract_last_knowledge_object, knowledge_text, overall_accuracy};
use crate::models::{KnowledgeRecord, Result, StudentSpec, Task3Record, Task3Sample, Task3Scores, TaskScores};
use crate::pipeline::{progress_bar, run_choice_eval, RunOptions};
use crate::prompts::{build_guided_student_prompt, build_teacher_prompt};
use crate::store;
use chrono::Utc;
use indexmap::IndexMap;
use std::path::Path;
use tracing::{error, info};

/// Stage A: generate knowledge for every task-3 sample, resuming by record
/// count. A sample that fails is logged and skipped rather than aborting
/// the pass; the resulting count deficit is made up on the next resume.
pub fn generate_knowledge(
    teacher: &dyn ChatBackend,
    data_dir: &Path,
    results_dir: &Path,
    opts: &RunOptions,
) -> Result<Vec<KnowledgeRecord>> {
    let dataset_path = data_dir.join("datasets").join("task3.jsonl");
    let knowledge_path = results_dir.join("task3_knowledge.jsonl");

    let mut records: Vec<KnowledgeRecord> = store::load_jsonl_or_default(&knowledge_path)?;
    if records.is_empty() {
        info!("Starting knowledge generation");
    } else {
        info!(
            count = records.len(),
            path = %knowledge_path.display(),
            "Loaded existing knowledge"
        );
    }

    let samples: Vec<Task3Sample> = store::load_jsonl(&dataset_path)?;
    info!(count = samples.len(), "Loaded task3 evaluation samples");

    let pending = samples.len().saturating_sub(records.len());
    if pending == 0 {
        info!("All samples have already been processed, skipping knowledge generation");
        return Ok(records);
    }
    info!(pending = pending, "Generating knowledge");

    let pb = progress_bar(samples.len() as u64);
    pb.set_position(records.len() as u64);

    for (sample_idx, sample) in samples.iter().enumerate() {
        if sample_idx < records.len() {
            continue;
        }

        let (system_prompt, prompt) = build_teacher_prompt(&sample.guideline, &sample.material);
        match teacher.chat(&prompt, Some(&system_prompt), opts.max_new_tokens) {
            Ok(response) => {
                let knowledge = extract_last_knowledge_object(&response);
                let record = KnowledgeRecord {
                    sample: sample.clone(),
                    response,
                    knowledge,
                    generated_at: Utc::now(),
                };
                store::append_jsonl(&knowledge_path, &record)?;
                records.push(record);
                pb.inc(1);
            }
            Err(e) => {
                // One bad sample must not block knowledge for the rest.
                error!(sample = sample_idx, error = %e, "Knowledge generation failed, skipping sample");
            }
        }
    }

    pb.finish_and_clear();
    info!(count = records.len(), "Completed knowledge generation");
    Ok(records)
}

fn run_student_eval(
    student: &dyn ChatBackend,
    knowledge: &[KnowledgeRecord],
    results_dir: &Path,
    opts: &RunOptions,
) -> Result<TaskScores> {
    let results_path = results_dir.join(format!("task3_student_{}.jsonl", student.name()));

    let records = run_choice_eval(
        student,
        knowledge,
        &results_path,
        opts,
        |source| {
            let (system_prompt, prompt) = build_guided_student_prompt(
                &source.sample.question,
                &source.sample.material,
                &knowledge_text(&source.knowledge),
            );
            (Some(system_prompt), prompt)
        },
        |source, response, prediction| Task3Record::from_knowledge(source, response, prediction),
    )?;

    info!(student = %student.name(), "Calculating accuracy scores");
    overall_accuracy(&records)
}

/// Run the full two-stage pipeline.
///
/// The teacher backend is released as soon as stage A completes; students
/// contend for the same compute budget and each one is built fresh, run,
/// and released before the next, in roster order.
pub fn run_task3(
    teacher: &mut dyn ChatBackend,
    students: &[StudentSpec],
    make_student: impl Fn(&StudentSpec) -> Result<Box<dyn ChatBackend>>,
    data_dir: &Path,
    results_dir: &Path,
    opts: &RunOptions,
) -> Result<Task3Scores> {
    let knowledge = generate_knowledge(teacher, data_dir, results_dir, opts)?;
    info!(count = knowledge.len(), "Knowledge dataset ready");

    teacher.release();

    let mut student_scores = IndexMap::new();
    for spec in students {
        info!(student = %spec.name, "Evaluating student");
        let mut student = make_student(spec)?;
        let scores = run_student_eval(student.as_ref(), &knowledge, results_dir, opts)?;
        student.release();
        student_scores.insert(spec.name.clone(), scores.overall);
    }

    let overall = if student_scores.is_empty() {
        0.0
    } else {
        student_scores.values().sum::<f64>() / student_scores.len() as f64
    };
    info!(accuracy = format!("{overall:.4}"), "Overall accuracy");

    Ok(Task3Scores {
        overall,
        student_scores,
    })
}
