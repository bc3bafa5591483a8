//! Top-level school document and its default seed.

use super::class::SchoolClass;
use super::fee::{FeeRecord, Parent};
use super::student::Student;
use super::teacher::Teacher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Subjects given zeroed mark sheets on the seeded demo student.
pub const DEFAULT_SUBJECTS: &[&str] = &[
    "Math",
    "Science",
    "English",
    "Urdu",
    "Social Studies",
    "Islamiyat",
    "Computer",
    "Art",
    "Physical Education",
];

/// The whole persisted record graph.
///
/// Loaded and saved as one JSON document; there is no partial write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolData {
    pub schema_version: u32,
    pub students: Vec<Student>,
    pub teachers: Vec<Teacher>,
    pub parents: Vec<Parent>,
    pub fees: Vec<FeeRecord>,
    pub classes: Vec<SchoolClass>,
    /// Class display name -> ordered subject names.
    pub class_subjects: BTreeMap<String, Vec<String>>,
}

impl SchoolData {
    pub fn empty(schema_version: u32) -> Self {
        Self {
            schema_version,
            students: Vec::new(),
            teachers: Vec::new(),
            parents: Vec::new(),
            fees: Vec::new(),
            classes: Vec::new(),
            class_subjects: BTreeMap::new(),
        }
    }

    /// First-run dataset: one class, one teacher, one student, one parent.
    pub fn seeded(schema_version: u32) -> Self {
        let mut data = Self::empty(schema_version);

        let class = SchoolClass {
            id: "C-1001".to_string(),
            name: "1".to_string(),
        };
        data.class_subjects.insert(
            class.name.clone(),
            vec!["Math".to_string(), "English".to_string()],
        );

        data.teachers.push(Teacher {
            id: "T-2001".to_string(),
            name: "teacher1".to_string(),
            id_card: "2222222222222".to_string(),
            classes_taught: vec![class.name.clone()],
            subjects: vec!["Math".to_string(), "English".to_string()],
            periods: "Math:1-2,English:3-4".to_string(),
            photo: String::new(),
        });

        let mut student = Student::admitted("100001", "Ali Khan", class.id.clone(), &class.name);
        student.father = "Asif Khan".to_string();
        student.father_cnic = "4444444444444".to_string();
        student.address = "Somewhere".to_string();
        student.dob = "2015-01-01".to_string();
        student.fees.due = 2000.0;
        student.mark_sheets.ensure_subjects(DEFAULT_SUBJECTS);

        data.parents.push(Parent {
            father_name: student.father.clone(),
            father_cnic: student.father_cnic.clone(),
            student_code: student.code.clone(),
        });
        data.students.push(student);
        data.classes.push(class);
        data
    }

    pub fn student(&self, code: &str) -> Option<&Student> {
        self.students.iter().find(|student| student.code == code)
    }

    pub fn student_mut(&mut self, code: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|student| student.code == code)
    }

    pub fn class_by_id(&self, id: &str) -> Option<&SchoolClass> {
        self.classes.iter().find(|class| class.id == id)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&SchoolClass> {
        self.classes.iter().find(|class| class.name == name)
    }

    /// Students whose class resolves to `class_name`, in admission order.
    pub fn students_in_class<'a>(
        &'a self,
        class_name: &'a str,
    ) -> impl Iterator<Item = &'a Student> + 'a {
        self.students
            .iter()
            .filter(move |student| student.class_name == class_name)
    }

    /// Subjects assigned to `class_name`, empty when none are assigned.
    pub fn subjects_for(&self, class_name: &str) -> &[String] {
        self.class_subjects
            .get(class_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Restores referential integrity between students, classes and
    /// subject assignments. Returns the number of records touched.
    ///
    /// - A student whose `class_id` resolves gets its cached name refreshed.
    /// - Otherwise the id is resolved from the cached name; an unknown name
    ///   becomes a recovered class so nothing dangles. Recovered ids derive
    ///   from the name, so repeated repairs of the same document agree.
    /// - A student with a blank class name stays unlinked.
    /// - Every class gets a subject list entry, possibly empty.
    pub fn reconcile_class_links(&mut self) -> usize {
        let mut touched = 0;

        for index in 0..self.students.len() {
            let student = &self.students[index];
            if let Some(class) = self.class_by_id(&student.class_id) {
                if class.name != student.class_name {
                    let name = class.name.clone();
                    self.students[index].class_name = name;
                    touched += 1;
                }
                continue;
            }

            let class_name = student.class_name.clone();
            let class_id = if class_name.trim().is_empty() {
                String::new()
            } else {
                match self.class_by_name(&class_name) {
                    Some(class) => class.id.clone(),
                    None => self.recover_class(class_name),
                }
            };
            if self.students[index].class_id != class_id {
                self.students[index].class_id = class_id;
                touched += 1;
            }
        }

        for class in &self.classes {
            if !self.class_subjects.contains_key(&class.name) {
                self.class_subjects.insert(class.name.clone(), Vec::new());
                touched += 1;
            }
        }

        touched
    }

    fn recover_class(&mut self, name: String) -> String {
        let mut class = SchoolClass::recovered(name);
        let base = class.id.clone();
        let mut attempt = 1;
        while self.class_by_id(&class.id).is_some() {
            attempt += 1;
            class.id = format!("{base}-{attempt}");
        }
        let id = class.id.clone();
        self.classes.push(class);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::{SchoolData, DEFAULT_SUBJECTS};
    use crate::model::student::Term;

    #[test]
    fn seed_links_student_to_seeded_class() {
        let data = SchoolData::seeded(1);
        let student = data.student("100001").expect("seeded student");
        let class = data.class_by_id(&student.class_id).expect("seeded class");

        assert_eq!(class.name, student.class_name);
        assert_eq!(data.subjects_for("1"), ["Math", "English"]);
        assert_eq!(data.parents[0].student_code, "100001");
        for term in Term::ALL {
            assert_eq!(
                student.mark_sheets.term(term).subjects.len(),
                DEFAULT_SUBJECTS.len()
            );
        }
    }

    #[test]
    fn reconcile_links_orphans_and_refreshes_names() {
        let mut data = SchoolData::seeded(1);
        data.students[0].class_id = String::new();
        let mut orphan = data.students[0].clone();
        orphan.code = "200002".to_string();
        orphan.class_name = "7".to_string();
        data.students.push(orphan);
        data.class_subjects.clear();

        let touched = data.reconcile_class_links();
        assert!(touched >= 3);
        assert_eq!(data.students[0].class_id, "C-1001");

        let created = data.class_by_name("7").expect("class created for orphan");
        assert_eq!(data.students[1].class_id, created.id);
        assert!(data.class_subjects.contains_key("1"));
        assert!(data.class_subjects.contains_key("7"));

        data.classes[0].name = "1-(A)".to_string();
        data.reconcile_class_links();
        assert_eq!(data.students[0].class_name, "1-(A)");
        assert_eq!(data.reconcile_class_links(), 0);
    }

    #[test]
    fn recovered_classes_get_stable_ids_and_blank_names_stay_unlinked() {
        let mut first = SchoolData::seeded(1);
        first.classes.clear();
        first.students[0].class_id = String::new();
        let mut unplaced = first.students[0].clone();
        unplaced.code = "300003".to_string();
        unplaced.class_name = "  ".to_string();
        first.students.push(unplaced);
        let mut second = first.clone();

        first.reconcile_class_links();
        second.reconcile_class_links();

        assert_eq!(first.classes, second.classes);
        assert_eq!(first.classes.len(), 1);
        assert_eq!(first.classes[0].id, "C-legacy-1");
        assert_eq!(first.students[1].class_id, "");
        assert!(!first.class_subjects.contains_key("  "));
        assert!(!first.class_subjects.contains_key(""));
    }
}
