//! Evaluation metrics for binary delay classification.

use crate::error::{DelayError, Result};
use crate::preprocessing::Label;
use serde::Serialize;
use std::fmt;

/// Precision, recall and F1 for one class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true rows of this class.
    pub support: usize,
}

/// Confusion matrix plus per-class scores, in the layout of a classification report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// `confusion[true][predicted]`.
    pub confusion: [[usize; 2]; 2],
    pub accuracy: f64,
    /// Indexed by label: `[on_time, delayed]`.
    pub classes: [ClassMetrics; 2],
}

impl ClassificationReport {
    /// Compares predictions with ground truth.
    ///
    /// # Errors
    /// [`DelayError::InvalidInput`] when lengths differ, the input is empty,
    /// or a label is outside {0, 1}.
    pub fn compute(y_true: &[Label], y_pred: &[Label]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(DelayError::InvalidInput(format!(
                "y_true has {} labels but y_pred has {}",
                y_true.len(),
                y_pred.len()
            )));
        }
        if y_true.is_empty() {
            return Err(DelayError::InvalidInput("no labels to evaluate".into()));
        }

        let mut confusion = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t > 1 || p > 1 {
                return Err(DelayError::InvalidInput(format!(
                    "labels must be 0 or 1, got ({t}, {p})"
                )));
            }
            confusion[t as usize][p as usize] += 1;
        }

        let correct = confusion[0][0] + confusion[1][1];
        let accuracy = correct as f64 / y_true.len() as f64;
        let classes = [
            Self::class_metrics(&confusion, 0),
            Self::class_metrics(&confusion, 1),
        ];

        Ok(Self {
            confusion,
            accuracy,
            classes,
        })
    }

    /// Scores for `label`. Undefined ratios (zero denominators) are 0.
    fn class_metrics(confusion: &[[usize; 2]; 2], label: usize) -> ClassMetrics {
        let other = 1 - label;
        let tp = confusion[label][label] as f64;
        let fp = confusion[other][label] as f64;
        let fn_ = confusion[label][other] as f64;

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = ratio(2.0 * precision * recall, precision + recall);
        ClassMetrics {
            precision,
            recall,
            f1,
            support: confusion[label][0] + confusion[label][1],
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>8} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (label, m) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "{:>8} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f, "accuracy {:.4}", self.accuracy)?;
        write!(
            f,
            "confusion [[{}, {}], [{}, {}]]",
            self.confusion[0][0], self.confusion[0][1], self.confusion[1][0], self.confusion[1][1]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_report_counts_and_scores() {
        let y_true = [0, 0, 0, 1, 1];
        let y_pred = [0, 1, 0, 1, 0];
        let report = ClassificationReport::compute(&y_true, &y_pred).unwrap();

        assert_eq!(report.confusion, [[2, 1], [1, 1]]);
        assert_abs_diff_eq!(report.accuracy, 0.6);

        let delayed = report.classes[1];
        assert_abs_diff_eq!(delayed.precision, 0.5);
        assert_abs_diff_eq!(delayed.recall, 0.5);
        assert_abs_diff_eq!(delayed.f1, 0.5);
        assert_eq!(delayed.support, 2);

        let on_time = report.classes[0];
        assert_abs_diff_eq!(on_time.precision, 2.0 / 3.0);
        assert_abs_diff_eq!(on_time.recall, 2.0 / 3.0);
        assert_eq!(on_time.support, 3);
    }

    #[test]
    fn test_never_predicted_class_scores_zero() {
        let report = ClassificationReport::compute(&[0, 1, 1], &[0, 0, 0]).unwrap();
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].recall, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(ClassificationReport::compute(&[0, 1], &[0]).is_err());
        assert!(ClassificationReport::compute(&[], &[]).is_err());
        assert!(ClassificationReport::compute(&[2], &[0]).is_err());
    }

    #[test]
    fn test_display_contains_accuracy() {
        let report = ClassificationReport::compute(&[0, 1], &[0, 1]).unwrap();
        assert!(report.to_string().contains("accuracy 1.0000"));
    }
}
