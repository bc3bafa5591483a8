//! Student record and its nested academic/fee state.
//!
//! # Invariants
//! - `code` is a 6-digit numeric string, unique across students.
//! - Mark sheets never drop a subject once it has an entry; assignment
//!   changes only add zero entries.
//! - `performance.monthly` holds at most one bucket per `(month, subject)`.

use super::class::ClassId;
use crate::report::to_fixed;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub code: String,
    pub name: String,
    pub father: String,
    #[serde(rename = "fatherCNIC")]
    pub father_cnic: String,
    /// Cached display name of `class_id`, refreshed on rename.
    #[serde(rename = "class")]
    pub class_name: String,
    pub class_id: ClassId,
    pub previous_school: String,
    pub address: String,
    pub dob: String,
    /// Self-contained encoded image, or empty.
    pub photo: String,
    pub fees: FeeTotals,
    pub fee_vouchers: Vec<serde_json::Value>,
    pub mark_sheets: MarkSheets,
    pub attendance: Attendance,
    pub daily_diary: Vec<serde_json::Value>,
    pub performance: Performance,
    pub today_test: TodayTest,
}

impl Student {
    /// Builds a freshly admitted student with zeroed academic state.
    pub fn admitted(
        code: impl Into<String>,
        name: impl Into<String>,
        class_id: ClassId,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            father: String::new(),
            father_cnic: String::new(),
            class_name: class_name.into(),
            class_id,
            previous_school: String::new(),
            address: String::new(),
            dob: String::new(),
            photo: String::new(),
            fees: FeeTotals::default(),
            fee_vouchers: Vec::new(),
            mark_sheets: MarkSheets::default(),
            attendance: Attendance::default(),
            daily_diary: Vec::new(),
            performance: Performance::default(),
            today_test: TodayTest::default(),
        }
    }

    /// Latest daily entry for `subject`, if any.
    pub fn latest_daily(&self, subject: &str) -> Option<&DailyEntry> {
        self.performance
            .daily
            .iter()
            .rev()
            .find(|entry| entry.subject == subject)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeTotals {
    pub paid: f64,
    pub due: f64,
    pub fine: f64,
}

impl FeeTotals {
    /// Applies one fee transaction.
    ///
    /// Paid: `paid += amount`, `due = max(0, due - amount)`.
    /// Unpaid: `due += amount`.
    pub fn apply(&mut self, amount: f64, paid: bool) {
        if paid {
            self.paid += amount;
            self.due = (self.due - amount).max(0.0);
        } else {
            self.due += amount;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    First,
    Second,
    Third,
    Final,
}

impl Term {
    pub const ALL: [Term; 4] = [Term::First, Term::Second, Term::Third, Term::Final];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkSheet {
    pub subjects: BTreeMap<String, f64>,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSheets {
    pub first_term: MarkSheet,
    pub second_term: MarkSheet,
    pub third_term: MarkSheet,
    #[serde(rename = "final")]
    pub final_term: MarkSheet,
}

impl MarkSheets {
    pub fn term(&self, term: Term) -> &MarkSheet {
        match term {
            Term::First => &self.first_term,
            Term::Second => &self.second_term,
            Term::Third => &self.third_term,
            Term::Final => &self.final_term,
        }
    }

    pub fn term_mut(&mut self, term: Term) -> &mut MarkSheet {
        match term {
            Term::First => &mut self.first_term,
            Term::Second => &mut self.second_term,
            Term::Third => &mut self.third_term,
            Term::Final => &mut self.final_term,
        }
    }

    /// Adds a zero entry for each subject in every term.
    ///
    /// Existing scores are kept as they are.
    pub fn ensure_subjects<S: AsRef<str>>(&mut self, subjects: &[S]) {
        for term in Term::ALL {
            let sheet = self.term_mut(term);
            for subject in subjects {
                sheet
                    .subjects
                    .entry(subject.as_ref().to_string())
                    .or_insert(0.0);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub total_days: u32,
    pub present: u32,
    pub absent: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub daily: Vec<DailyEntry>,
    pub monthly: Vec<MonthlyBucket>,
}

impl Performance {
    /// Appends one dated score and folds it into its monthly bucket.
    ///
    /// `month` is the `YYYY-MM` prefix of `date`.
    pub fn record(&mut self, subject: &str, total: f64, marks: f64, date: &str) {
        self.daily.push(DailyEntry {
            subject: subject.to_string(),
            total,
            marks,
            date: date.to_string(),
        });

        let month: String = date.chars().take(7).collect();
        let index = match self
            .monthly
            .iter()
            .position(|bucket| bucket.month == month && bucket.subject == subject)
        {
            Some(index) => index,
            None => {
                self.monthly.push(MonthlyBucket {
                    month,
                    subject: subject.to_string(),
                    marks: Vec::new(),
                    average: format_average(&[]),
                });
                self.monthly.len() - 1
            }
        };
        let bucket = &mut self.monthly[index];
        bucket.marks.push(marks);
        bucket.average = format_average(&bucket.marks);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub subject: String,
    pub total: f64,
    pub marks: f64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// `YYYY-MM`.
    pub month: String,
    pub subject: String,
    pub marks: Vec<f64>,
    /// Arithmetic mean of `marks`, two decimals.
    pub average: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayTest {
    pub subject: String,
    pub total_marks: f64,
    pub obtained_marks: f64,
    pub percentage: f64,
}

fn format_average(marks: &[f64]) -> String {
    if marks.is_empty() {
        return to_fixed(0.0, 2);
    }
    let sum: f64 = marks.iter().sum();
    to_fixed(sum / marks.len() as f64, 2)
}
