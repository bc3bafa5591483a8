//! Percentages, display bands and the consolidated class view.

use super::{format_number, to_fixed};
use crate::model::school::SchoolData;
use crate::model::student::Student;
use serde::Serialize;

/// `marks / total * 100`, or `0` when `total` is not positive.
pub fn percentage(marks: f64, total: f64) -> f64 {
    if total > 0.0 {
        marks / total * 100.0
    } else {
        0.0
    }
}

/// Presentation band for a percentage. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    pub fn from_percentage(percent: f64) -> Self {
        if percent < 40.0 {
            Self::Low
        } else if percent < 60.0 {
            Self::Mid
        } else {
            Self::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsolidatedCell {
    /// Latest daily entry for the subject.
    Recent {
        marks: f64,
        total: f64,
        percent: f64,
        band: Band,
    },
    /// Non-zero final-term mark sheet score; not part of the average.
    Fallback { value: f64 },
    Missing,
}

impl ConsolidatedCell {
    pub fn render(&self) -> String {
        match self {
            Self::Recent {
                marks,
                total,
                percent,
                ..
            } => format!(
                "{}/{} ({}%)",
                format_number(*marks),
                format_number(*total),
                to_fixed(*percent, 1)
            ),
            Self::Fallback { value } => format_number(*value),
            Self::Missing => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedRow {
    pub student_code: String,
    pub student_name: String,
    /// One cell per subject, in `ConsolidatedView::subjects` order.
    pub cells: Vec<ConsolidatedCell>,
    /// Mean of `Recent` percentages; `None` when there are none.
    pub overall: Option<f64>,
}

impl ConsolidatedRow {
    pub fn render_overall(&self) -> String {
        match self.overall {
            Some(value) => format!("{}%", to_fixed(value, 2)),
            None => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedView {
    pub class_name: String,
    pub subjects: Vec<String>,
    pub rows: Vec<ConsolidatedRow>,
}

/// Builds the per-student, per-subject summary for one class.
///
/// Subjects come from the class's assignment list; students in admission
/// order.
pub fn consolidated_view(data: &SchoolData, class_name: &str) -> ConsolidatedView {
    let subjects = data.subjects_for(class_name).to_vec();
    let rows = data
        .students_in_class(class_name)
        .map(|student| consolidated_row(student, &subjects))
        .collect();
    ConsolidatedView {
        class_name: class_name.to_string(),
        subjects,
        rows,
    }
}

fn consolidated_row(student: &Student, subjects: &[String]) -> ConsolidatedRow {
    let mut percent_sum = 0.0;
    let mut percent_count = 0usize;

    let cells = subjects
        .iter()
        .map(|subject| {
            if let Some(entry) = student.latest_daily(subject) {
                let percent = percentage(entry.marks, entry.total);
                percent_sum += percent;
                percent_count += 1;
                return ConsolidatedCell::Recent {
                    marks: entry.marks,
                    total: entry.total,
                    percent,
                    band: Band::from_percentage(percent),
                };
            }
            match student.mark_sheets.final_term.subjects.get(subject) {
                Some(value) if *value != 0.0 && !value.is_nan() => {
                    ConsolidatedCell::Fallback { value: *value }
                }
                _ => ConsolidatedCell::Missing,
            }
        })
        .collect();

    let overall = (percent_count > 0).then(|| percent_sum / percent_count as f64);
    ConsolidatedRow {
        student_code: student.code.clone(),
        student_name: student.name.clone(),
        cells,
        overall,
    }
}
