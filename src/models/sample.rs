//! Sample and result-record types for the three evaluation tasks.
//!
//! Samples are immutable as loaded from the dataset; each generation
//! produces a separate record value (sample fields flattened back into the
//! record so the JSONL shape matches the dataset plus `response` /
//! `prediction`). Records are append-only: the results file doubles as the
//! resume checkpoint, one record per (sample, iteration).

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single-choice question with its subject taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task1Sample {
    pub question: String,

    /// Ground-truth label (A-D)
    pub answer: String,

    /// Subject field (e.g. 语言学)
    pub field: String,

    /// Sub-field within the subject
    pub sub_field: String,
}

/// Result record for one task-1 generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task1Record {
    #[serde(flatten)]
    pub sample: Task1Sample,

    /// Raw model output
    pub response: String,

    /// Extracted choice label, if any
    pub prediction: Option<String>,

    pub generated_at: DateTime<Utc>,
}

/// Reading-comprehension document: one material shared by several questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task2Document {
    pub material: String,
    pub qas: Vec<QuestionAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// Flattened (question, material) pair, the unit task 2 evaluates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task2Sample {
    pub question: String,
    pub answer: String,
    pub material: String,
}

/// Result record for one task-2 generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task2Record {
    #[serde(flatten)]
    pub sample: Task2Sample,

    pub response: String,
    pub prediction: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Task-3 sample: teaching material with a guideline for the teacher model
/// and a question the students answer afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task3Sample {
    pub guideline: String,
    pub material: String,
    pub question: String,
    pub answer: String,
}

/// Stage-A output: the teacher's response with the extracted knowledge
/// payload. These records form the dataset stage B evaluates over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    #[serde(flatten)]
    pub sample: Task3Sample,

    /// Raw teacher output
    pub response: String,

    /// Extracted knowledge payload; a string or a nested structure,
    /// empty string when extraction found nothing
    pub knowledge: Value,

    pub generated_at: DateTime<Utc>,
}

/// Stage-B output: one student's answer to a knowledge-guided question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task3Record {
    #[serde(flatten)]
    pub sample: Task3Sample,

    /// Knowledge the student was taught (carried from stage A)
    pub knowledge: Value,

    /// Raw student output
    pub response: String,

    pub prediction: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl Task3Record {
    /// Build a stage-B record from a stage-A record and a student response.
    pub fn from_knowledge(
        source: &KnowledgeRecord,
        response: String,
        prediction: Option<String>,
    ) -> Self {
        Self {
            sample: source.sample.clone(),
            knowledge: source.knowledge.clone(),
            response,
            prediction,
            generated_at: Utc::now(),
        }
    }
}

/// Seam between result records and accuracy aggregation: anything graded
/// exposes its ground truth and its extracted prediction.
pub trait Graded {
    fn answer(&self) -> &str;
    fn prediction(&self) -> Option<&str>;
}

impl Graded for Task1Record {
    fn answer(&self) -> &str {
        &self.sample.answer
    }
    fn prediction(&self) -> Option<&str> {
        self.prediction.as_deref()
    }
}

impl Graded for Task2Record {
    fn answer(&self) -> &str {
        &self.sample.answer
    }
    fn prediction(&self) -> Option<&str> {
        self.prediction.as_deref()
    }
}

impl Graded for Task3Record {
    fn answer(&self) -> &str {
        &self.sample.answer
    }
    fn prediction(&self) -> Option<&str> {
        self.prediction.as_deref()
    }
}

/// Flat accuracy for a task without taxonomy (tasks 2 and 3 per student).
#[derive(Debug, Clone, Serialize)]
pub struct TaskScores {
    pub overall: f64,
}

/// Accuracy for one subject field: the field-wide score plus one entry per
/// sub-field, serialized at the same level as "overall".
#[derive(Debug, Clone, Serialize)]
pub struct FieldScores {
    pub overall: f64,

    #[serde(flatten)]
    pub sub_fields: IndexMap<String, f64>,
}

/// Task-1 accuracy: per-field breakdown plus the score over all records.
/// Field order is first-encounter order in the results.
#[derive(Debug, Clone, Serialize)]
pub struct Task1Scores {
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldScores>,

    pub overall: f64,
}

/// Task-3 accuracy: mean over the roster plus the per-student breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct Task3Scores {
    pub overall: f64,
    pub student_scores: IndexMap<String, f64>,
}

/// The whole-run summary written to score.json.
#[derive(Debug, Serialize)]
pub struct ScoreSummary {
    pub task1: Task1Scores,
    pub task2: TaskScores,
    pub task3: Task3Scores,
}
