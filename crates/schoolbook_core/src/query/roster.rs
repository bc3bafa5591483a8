//! Student/fee search and form option lists.

use crate::model::fee::FeeRecord;
use crate::model::school::SchoolData;
use crate::model::session::{Role, Session};
use crate::model::student::Student;
use serde::Serialize;
use std::collections::BTreeSet;

/// Students whose name or code contains `text` (case-insensitive), optionally
/// limited to one class by exact display name.
pub fn search_students<'a>(
    data: &'a SchoolData,
    text: &str,
    class_filter: Option<&str>,
) -> Vec<&'a Student> {
    let needle = text.trim().to_lowercase();
    let class_filter = class_filter.filter(|name| !name.is_empty());
    data.students
        .iter()
        .filter(|student| {
            needle.is_empty()
                || student.name.to_lowercase().contains(&needle)
                || student.code.contains(&needle)
        })
        .filter(|student| class_filter.map_or(true, |name| student.class_name == name))
        .collect()
}

/// Fee records whose student name or class contains `text`.
pub fn search_fees<'a>(data: &'a SchoolData, text: &str) -> Vec<&'a FeeRecord> {
    let needle = text.trim().to_lowercase();
    data.fees
        .iter()
        .filter(|record| {
            needle.is_empty()
                || record.name.to_lowercase().contains(&needle)
                || record.class_name.to_lowercase().contains(&needle)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub students: usize,
    pub teachers: usize,
}

pub fn dashboard_counts(data: &SchoolData) -> DashboardCounts {
    DashboardCounts {
        students: data.students.len(),
        teachers: data.teachers.len(),
    }
}

/// Sorted, de-duplicated class display names.
pub fn class_options(data: &SchoolData) -> Vec<String> {
    data.classes
        .iter()
        .map(|class| class.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Class and subject choices for the marks entry panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelOptions {
    pub classes: Vec<String>,
    /// Empty means "no restriction"; the caller lists the class's subjects.
    pub subjects: Vec<String>,
}

/// A teacher session with a matching teacher record (by id card or
/// case-insensitive name) sees only its own classes and subjects. Everyone
/// else sees all classes.
pub fn teacher_panel_options(data: &SchoolData, session: &Session) -> PanelOptions {
    if session.role == Role::Teacher {
        let teacher = data.teachers.iter().find(|teacher| {
            teacher.id_card == session.id || teacher.name.eq_ignore_ascii_case(&session.name)
        });
        if let Some(teacher) = teacher {
            return PanelOptions {
                classes: teacher.classes_taught.clone(),
                subjects: teacher.subjects.clone(),
            };
        }
    }
    PanelOptions {
        classes: class_options(data),
        subjects: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{class_options, search_fees, search_students, teacher_panel_options};
    use crate::model::class::SchoolClass;
    use crate::model::fee::FeeRecord;
    use crate::model::school::SchoolData;
    use crate::model::session::{Role, Session};

    #[test]
    fn search_matches_name_or_code_and_filters_class() {
        let data = SchoolData::seeded(1);
        assert_eq!(search_students(&data, "ali", None).len(), 1);
        assert_eq!(search_students(&data, "0000", None).len(), 1);
        assert_eq!(search_students(&data, "", Some("1")).len(), 1);
        assert!(search_students(&data, "", Some("2")).is_empty());
        assert!(search_students(&data, "zara", None).is_empty());
    }

    #[test]
    fn fee_search_matches_name_or_class() {
        let mut data = SchoolData::seeded(1);
        data.fees
            .push(FeeRecord::new("100001", "Ali Khan", "1-(A)", 10.0, "2024-01-01", true));
        assert_eq!(search_fees(&data, "KHAN").len(), 1);
        assert_eq!(search_fees(&data, "(a)").len(), 1);
        assert!(search_fees(&data, "science").is_empty());
    }

    #[test]
    fn class_options_are_sorted_and_unique() {
        let mut data = SchoolData::seeded(1);
        data.classes.push(SchoolClass::new("10"));
        data.classes.push(SchoolClass::new("1"));
        assert_eq!(class_options(&data), ["1", "10"]);
    }

    #[test]
    fn teacher_panel_is_limited_to_own_classes() {
        let mut data = SchoolData::seeded(1);
        data.classes.push(SchoolClass::new("2"));

        let teacher = Session {
            name: "TEACHER1".to_string(),
            role: Role::Teacher,
            id: "0".to_string(),
        };
        let options = teacher_panel_options(&data, &teacher);
        assert_eq!(options.classes, ["1"]);
        assert_eq!(options.subjects, ["Math", "English"]);

        let principal = Session {
            name: "cpadmin".to_string(),
            role: Role::Principal,
            id: "1111111111111".to_string(),
        };
        let options = teacher_panel_options(&data, &principal);
        assert_eq!(options.classes, ["1", "2"]);
        assert!(options.subjects.is_empty());
    }
}
