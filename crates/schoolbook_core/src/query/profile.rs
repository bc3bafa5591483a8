//! Profile details, contact cards and the marks entry sheet.

use crate::model::school::SchoolData;
use crate::model::student::{DailyEntry, Student};
use crate::model::teacher::Teacher;
use crate::report::format_number;
use serde::Serialize;

/// Daily entries shown on a profile's recent-activity panel.
pub const RECENT_DAILY_LIMIT: usize = 8;

/// Total offered for a student with no entry yet on the chosen date.
pub const DEFAULT_TEST_TOTAL: f64 = 100.0;

const PHOTO_PLACEHOLDER: &str = "https://via.placeholder.com/84";

/// Last `limit` daily entries, newest first.
pub fn recent_daily(student: &Student, limit: usize) -> Vec<&DailyEntry> {
    student.performance.daily.iter().rev().take(limit).collect()
}

/// Labelled profile fields; blank values print as `N/A`.
pub fn profile_details(student: &Student) -> Vec<(&'static str, String)> {
    let or_na = |value: &str| {
        if value.is_empty() {
            "N/A".to_string()
        } else {
            value.to_string()
        }
    };
    vec![
        ("Father", or_na(&student.father)),
        ("Father CNIC", or_na(&student.father_cnic)),
        ("DOB", or_na(&student.dob)),
        ("Previous School", or_na(&student.previous_school)),
        ("Address", or_na(&student.address)),
        (
            "Fees (Paid/Due/Fine)",
            format!(
                "{}/{}/{}",
                format_number(student.fees.paid),
                format_number(student.fees.due),
                format_number(student.fees.fine)
            ),
        ),
    ]
}

/// Visiting-card summary. `photo` falls back to a placeholder image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactCard {
    pub name: String,
    pub role: String,
    pub extra: String,
    pub photo: String,
}

impl ContactCard {
    pub fn for_student(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            role: format!("Class {}", student.class_name),
            extra: format!("Father: {}", student.father),
            photo: photo_or_placeholder(&student.photo),
        }
    }

    pub fn for_teacher(teacher: &Teacher) -> Self {
        Self {
            name: teacher.name.clone(),
            role: "Teacher".to_string(),
            extra: format!("Classes: {}", teacher.classes_taught.join(", ")),
            photo: photo_or_placeholder(&teacher.photo),
        }
    }

    pub fn has_photo(&self) -> bool {
        self.photo != PHOTO_PLACEHOLDER
    }
}

fn photo_or_placeholder(photo: &str) -> String {
    if photo.is_empty() {
        PHOTO_PLACEHOLDER.to_string()
    } else {
        photo.to_string()
    }
}

/// Prefilled row of the marks entry sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarksSheetRow {
    pub student_code: String,
    pub student_name: String,
    pub total: f64,
    /// Existing score for the subject and date, if one was recorded.
    pub obtained: Option<f64>,
}

/// One row per student in the class, prefilled from the latest entry for
/// `(subject, date)`.
pub fn marks_entry_sheet(
    data: &SchoolData,
    class_name: &str,
    subject: &str,
    date: &str,
) -> Vec<MarksSheetRow> {
    data.students_in_class(class_name)
        .map(|student| {
            let existing = student
                .performance
                .daily
                .iter()
                .rev()
                .find(|entry| entry.subject == subject && entry.date == date);
            MarksSheetRow {
                student_code: student.code.clone(),
                student_name: student.name.clone(),
                total: existing.map_or(DEFAULT_TEST_TOTAL, |entry| entry.total),
                obtained: existing.map(|entry| entry.marks),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{marks_entry_sheet, profile_details, recent_daily, ContactCard};
    use crate::model::school::SchoolData;

    #[test]
    fn marks_sheet_prefills_same_day_entry() {
        let mut data = SchoolData::seeded(1);
        data.students[0]
            .performance
            .record("Math", 50.0, 41.0, "2024-05-02");

        let rows = marks_entry_sheet(&data, "1", "Math", "2024-05-02");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total, 50.0);
        assert_eq!(rows[0].obtained, Some(41.0));

        let rows = marks_entry_sheet(&data, "1", "Math", "2024-05-03");
        assert_eq!(rows[0].total, 100.0);
        assert_eq!(rows[0].obtained, None);
    }

    #[test]
    fn profile_and_card_fall_back_for_blank_fields() {
        let mut student = SchoolData::seeded(1).students.remove(0);
        student.previous_school.clear();
        student.performance.record("Math", 10.0, 5.0, "2024-01-01");
        student.performance.record("Art", 10.0, 7.0, "2024-01-02");

        let details = profile_details(&student);
        assert!(details.contains(&("Previous School", "N/A".to_string())));
        assert!(details.contains(&("Fees (Paid/Due/Fine)", "0/2000/0".to_string())));

        let card = ContactCard::for_student(&student);
        assert!(!card.has_photo());
        assert_eq!(card.role, "Class 1");

        let recent = recent_daily(&student, 8);
        assert_eq!(recent[0].subject, "Art");
    }
}
