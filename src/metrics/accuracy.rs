//! Accuracy aggregation over graded records.

use crate::models::{FieldScores, Graded, HanbenchError, Result, Task1Record, Task1Scores, TaskScores};
use indexmap::IndexMap;
use tracing::info;

/// Match rate between predictions and ground-truth answers.
///
/// A prediction counts as correct iff it is present and equal to its answer
/// ignoring ASCII case; absent predictions are incorrect. Empty input yields
/// 0.0. A length mismatch is a precondition violation and errors out.
pub fn accuracy(predictions: &[Option<&str>], answers: &[&str]) -> Result<f64> {
    if predictions.len() != answers.len() {
        return Err(HanbenchError::LengthMismatch {
            predictions: predictions.len(),
            answers: answers.len(),
        });
    }

    if predictions.is_empty() {
        return Ok(0.0);
    }

    let correct = predictions
        .iter()
        .zip(answers.iter())
        .filter(|(pred, ans)| matches!(pred, Some(p) if p.eq_ignore_ascii_case(ans)))
        .count();

    Ok(correct as f64 / predictions.len() as f64)
}

/// Flat accuracy over any graded record set.
pub fn overall_accuracy<R: Graded>(records: &[R]) -> Result<TaskScores> {
    let predictions: Vec<Option<&str>> = records.iter().map(Graded::prediction).collect();
    let answers: Vec<&str> = records.iter().map(Graded::answer).collect();

    let overall = accuracy(&predictions, &answers)?;
    info!(accuracy = format!("{overall:.4}"), "Overall accuracy");

    Ok(TaskScores { overall })
}

/// Hierarchical accuracy for task 1: per field, per sub-field within each
/// field, and over the flat union of all records. Partitions keep
/// first-encounter order.
pub fn field_accuracy(records: &[Task1Record]) -> Result<Task1Scores> {
    let mut partitions: IndexMap<&str, IndexMap<&str, Vec<&Task1Record>>> = IndexMap::new();

    for record in records {
        partitions
            .entry(record.sample.field.as_str())
            .or_default()
            .entry(record.sample.sub_field.as_str())
            .or_default()
            .push(record);
    }

    let mut fields = IndexMap::new();

    for (field_name, sub_partitions) in &partitions {
        let field_records: Vec<&Task1Record> =
            sub_partitions.values().flatten().copied().collect();
        let field_overall = accuracy_of(&field_records)?;
        info!(
            field = %field_name,
            accuracy = format!("{field_overall:.4}"),
            "Field accuracy"
        );

        let mut sub_fields = IndexMap::new();
        for (sub_field_name, sub_records) in sub_partitions {
            sub_fields.insert((*sub_field_name).to_string(), accuracy_of(sub_records)?);
        }

        fields.insert(
            (*field_name).to_string(),
            FieldScores {
                overall: field_overall,
                sub_fields,
            },
        );
    }

    let all: Vec<&Task1Record> = records.iter().collect();
    let overall = accuracy_of(&all)?;
    info!(accuracy = format!("{overall:.4}"), "Overall accuracy");

    Ok(Task1Scores { fields, overall })
}

fn accuracy_of(records: &[&Task1Record]) -> Result<f64> {
    let predictions: Vec<Option<&str>> = records.iter().map(|r| r.prediction()).collect();
    let answers: Vec<&str> = records.iter().map(|r| r.answer()).collect();
    accuracy(&predictions, &answers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task1Sample;
    use chrono::Utc;

    fn record(field: &str, sub_field: &str, answer: &str, prediction: Option<&str>) -> Task1Record {
        Task1Record {
            sample: Task1Sample {
                question: "q".to_string(),
                answer: answer.to_string(),
                field: field.to_string(),
                sub_field: sub_field.to_string(),
            },
            response: String::new(),
            prediction: prediction.map(str::to_string),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_accuracy_two_thirds() {
        let acc = accuracy(&[Some("a"), None, Some("C")], &["A", "B", "C"]).unwrap();
        assert!((acc - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_accuracy_bounds() {
        let all_right = accuracy(&[Some("A"), Some("b")], &["a", "B"]).unwrap();
        assert!((all_right - 1.0).abs() < f64::EPSILON);

        let all_wrong = accuracy(&[None, Some("D")], &["A", "B"]).unwrap();
        assert!(all_wrong.abs() < f64::EPSILON);
    }

    #[test]
    fn test_accuracy_empty_is_zero() {
        assert!(accuracy(&[], &[]).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_accuracy_length_mismatch() {
        let err = accuracy(&[Some("A")], &["A", "B"]).unwrap_err();
        assert!(matches!(
            err,
            HanbenchError::LengthMismatch {
                predictions: 1,
                answers: 2
            }
        ));
    }

    #[test]
    fn test_field_accuracy_partitions() {
        let records = vec![
            record("语言学", "音韵", "A", Some("A")),
            record("语言学", "音韵", "B", Some("C")),
            record("语言学", "词汇", "C", Some("C")),
            record("文学", "古代", "D", None),
        ];

        let scores = field_accuracy(&records).unwrap();

        // First-encounter order.
        let field_names: Vec<&String> = scores.fields.keys().collect();
        assert_eq!(field_names, vec!["语言学", "文学"]);

        let linguistics = &scores.fields["语言学"];
        assert!((linguistics.overall - 2.0 / 3.0).abs() < 1e-12);
        assert!((linguistics.sub_fields["音韵"] - 0.5).abs() < f64::EPSILON);
        assert!((linguistics.sub_fields["词汇"] - 1.0).abs() < f64::EPSILON);

        assert!(scores.fields["文学"].overall.abs() < f64::EPSILON);
        assert!((scores.overall - 0.5).abs() < f64::EPSILON);
    }
}
