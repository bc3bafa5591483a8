//! Fee ledger and parent records.

use serde::{Deserialize, Serialize};

/// One fee transaction, denormalized from the student at record time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub id: String,
    pub student_code: String,
    pub name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub amount: f64,
    pub date: String,
    pub paid: bool,
}

impl FeeRecord {
    /// Creates a record with a fresh `F-` id.
    pub fn new(
        student_code: impl Into<String>,
        name: impl Into<String>,
        class_name: impl Into<String>,
        amount: f64,
        date: impl Into<String>,
        paid: bool,
    ) -> Self {
        Self {
            id: super::new_prefixed_id("F"),
            student_code: student_code.into(),
            name: name.into(),
            class_name: class_name.into(),
            amount,
            date: date.into(),
            paid,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.paid {
            "Paid"
        } else {
            "Unpaid"
        }
    }
}

/// Guardian linked to one admitted student. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    #[serde(rename = "fatherName")]
    pub father_name: String,
    #[serde(rename = "fatherCNIC")]
    pub father_cnic: String,
    #[serde(rename = "studentCode")]
    pub student_code: String,
}
