//! Export tables for the record sheet, fee ledger and class summary.

use super::performance::{consolidated_view, percentage};
use super::{format_number, to_fixed, ReportTable};
use crate::model::fee::FeeRecord;
use crate::model::school::SchoolData;
use crate::model::student::Student;

/// Newest daily entries included in a student record sheet.
pub const RECORD_SHEET_HISTORY_LIMIT: usize = 30;

/// Single-student performance history, newest first.
///
/// Rows: `[date, subject, "marks/total", "pp.pp%"]`; a zero total prints
/// `0%`.
pub fn student_record_sheet(student: &Student) -> ReportTable {
    let mut table = ReportTable::new(
        format!("{} ({})", student.name, student.code),
        ["Date", "Subject", "Marks", "Percentage"],
    );
    table.rows = student
        .performance
        .daily
        .iter()
        .rev()
        .take(RECORD_SHEET_HISTORY_LIMIT)
        .map(|entry| {
            let percent = if entry.total > 0.0 {
                format!("{}%", to_fixed(percentage(entry.marks, entry.total), 2))
            } else {
                "0%".to_string()
            };
            vec![
                entry.date.clone(),
                entry.subject.clone(),
                format!(
                    "{}/{}",
                    format_number(entry.marks),
                    format_number(entry.total)
                ),
                percent,
            ]
        })
        .collect();
    table
}

/// Fee ledger rows `[name, class, amount, date, Paid|Unpaid]`.
pub fn fee_ledger<'a>(records: impl IntoIterator<Item = &'a FeeRecord>) -> ReportTable {
    let mut table = ReportTable::new("Fees Report", ["Name", "Class", "Amount", "Date", "Status"]);
    table.rows = records
        .into_iter()
        .map(|record| {
            vec![
                record.name.clone(),
                record.class_name.clone(),
                format_number(record.amount),
                record.date.clone(),
                record.status_label().to_string(),
            ]
        })
        .collect();
    table
}

/// Class summary: one row per student, one column per subject, then the
/// overall average.
pub fn class_consolidated_sheet(data: &SchoolData, class_name: &str) -> ReportTable {
    let view = consolidated_view(data, class_name);

    let mut headers = Vec::with_capacity(view.subjects.len() + 2);
    headers.push("Student".to_string());
    headers.extend(view.subjects.iter().cloned());
    headers.push("Overall Avg%".to_string());

    let mut table = ReportTable::new(
        format!("Class {class_name} Consolidated Performance"),
        headers,
    );
    table.rows = view
        .rows
        .iter()
        .map(|row| {
            let mut cells = Vec::with_capacity(row.cells.len() + 2);
            cells.push(format!("{} {}", row.student_name, row.student_code));
            cells.extend(row.cells.iter().map(|cell| cell.render()));
            cells.push(row.render_overall());
            cells
        })
        .collect();
    table
}
