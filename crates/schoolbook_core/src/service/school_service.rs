//! School record use-case service.
//!
//! # Responsibility
//! - Provide the consistency-preserving mutations: admission, teacher and
//!   class management, subject assignment, fees and marks.
//! - Keep every mutation a single load-modify-save cycle.
//!
//! # Invariants
//! - Role gates run before the document is loaded.
//! - A class rename updates subject assignments, student class names and
//!   teacher class lists in the same write.
//! - Subject assignment only ever adds mark-sheet entries.

use super::guard::{log_outcome, require_principal, require_role};
use crate::error::{required, NotFoundError, SchoolResult, ValidationError};
use crate::model::class::{compose_display_name, SchoolClass};
use crate::model::fee::{FeeRecord, Parent};
use crate::model::school::SchoolData;
use crate::model::session::{Role, Session};
use crate::model::student::{FeeTotals, Student};
use crate::model::teacher::{split_list, Teacher};
use crate::repo::kv_repo::KvRepository;
use crate::repo::school_store::SchoolStore;
use chrono::{Local, NaiveDate};
use log::debug;
use rand::Rng;
use std::collections::HashSet;
use std::time::Instant;

pub const STUDENT_CODE_MIN: u32 = 100_000;
pub const STUDENT_CODE_MAX: u32 = 999_999;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Admission form input. Text fields are trimmed before use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdmitStudentRequest {
    pub name: String,
    pub father: String,
    pub father_cnic: String,
    /// Display name of an existing class.
    pub class_name: String,
    pub previous_school: String,
    pub address: String,
    pub dob: String,
    pub photo: String,
    /// Opening fee balance.
    pub fees_paid: f64,
    pub fees_due: f64,
}

/// Teacher form input. `classes` and `subjects` are comma-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherInput {
    pub name: String,
    pub id_card: String,
    pub classes: String,
    pub subjects: String,
    pub periods: String,
    /// Empty keeps the current photo on update.
    pub photo: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeRequest {
    pub student_code: String,
    pub amount: f64,
    /// `YYYY-MM-DD`; today when absent.
    pub date: Option<String>,
    pub paid: bool,
}

/// One row of the marks entry sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct MarksEntry {
    pub student_code: String,
    pub total: f64,
    /// `None` (blank input) skips the student.
    pub obtained: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarksRequest {
    pub class_name: String,
    pub subject: String,
    /// `YYYY-MM-DD`; today when absent.
    pub date: Option<String>,
    pub entries: Vec<MarksEntry>,
}

/// Use-case service over the school document store.
pub struct SchoolService<R: KvRepository> {
    store: SchoolStore<R>,
}

impl<R: KvRepository> SchoolService<R> {
    pub fn new(store: SchoolStore<R>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SchoolStore<R> {
        &self.store
    }

    /// Loads the current record graph for read-only consumers.
    pub fn load(&self) -> SchoolResult<SchoolData> {
        self.store.load()
    }

    /// Admits a student with a freshly generated 6-digit code.
    ///
    /// # Contract
    /// - Principal only.
    /// - `name`, `father`, `father_cnic`, `class_name` must be non-blank.
    /// - `class_name` must name an existing class.
    /// - Appends a parent record linked to the new code.
    pub fn admit_student(
        &self,
        session: &Session,
        request: &AdmitStudentRequest,
    ) -> SchoolResult<Student> {
        self.admit_student_with_rng(session, request, &mut rand::rng())
    }

    /// Same as `admit_student` with a caller-provided code source.
    pub fn admit_student_with_rng<G: Rng + ?Sized>(
        &self,
        session: &Session,
        request: &AdmitStudentRequest,
        rng: &mut G,
    ) -> SchoolResult<Student> {
        let started_at = Instant::now();
        let result = self.admit(session, request, rng);
        log_outcome("student_admit", session, started_at, result)
    }

    fn admit<G: Rng + ?Sized>(
        &self,
        session: &Session,
        request: &AdmitStudentRequest,
        rng: &mut G,
    ) -> SchoolResult<Student> {
        require_principal(session, "admit students")?;
        let name = required("name", &request.name)?;
        let father = required("father", &request.father)?;
        let father_cnic = required("fatherCNIC", &request.father_cnic)?;
        let class_name = required("class", &request.class_name)?;
        let paid = validate_amount(request.fees_paid)?;
        let due = validate_amount(request.fees_due)?;

        let mut data = self.store.load()?;
        let class_id = data
            .class_by_name(&class_name)
            .map(|class| class.id.clone())
            .ok_or_else(|| NotFoundError::Class(class_name.clone()))?;
        let code = generate_student_code(rng, &data)?;

        let mut student = Student::admitted(code, name, class_id, class_name.as_str());
        student.father = father;
        student.father_cnic = father_cnic;
        student.previous_school = request.previous_school.trim().to_string();
        student.address = request.address.trim().to_string();
        student.dob = request.dob.trim().to_string();
        student.photo = request.photo.clone();
        student.fees = FeeTotals {
            paid,
            due,
            fine: 0.0,
        };
        student
            .mark_sheets
            .ensure_subjects(data.subjects_for(&class_name));

        data.parents.push(Parent {
            father_name: student.father.clone(),
            father_cnic: student.father_cnic.clone(),
            student_code: student.code.clone(),
        });
        data.students.push(student.clone());
        self.store.save(&data)?;
        Ok(student)
    }

    /// Creates a teacher, or updates one in place when `internal_id` is set.
    ///
    /// # Contract
    /// - Principal only; `name` and `id_card` must be non-blank.
    /// - Update of an unknown id fails with `NotFoundError::Teacher`.
    /// - On update the photo changes only when a new one is supplied.
    /// - Create appends a teacher login; update replaces the matching
    ///   teacher login. Either way in the same write.
    pub fn upsert_teacher(
        &self,
        session: &Session,
        internal_id: Option<&str>,
        input: &TeacherInput,
    ) -> SchoolResult<Teacher> {
        let started_at = Instant::now();
        let result = self.upsert_teacher_inner(session, internal_id, input);
        log_outcome("teacher_upsert", session, started_at, result)
    }

    fn upsert_teacher_inner(
        &self,
        session: &Session,
        internal_id: Option<&str>,
        input: &TeacherInput,
    ) -> SchoolResult<Teacher> {
        require_principal(session, "manage teachers")?;
        let name = required("name", &input.name)?;
        let id_card = required("idCard", &input.id_card)?;
        let classes_taught = split_list(&input.classes);
        let subjects = split_list(&input.subjects);
        let periods = input.periods.trim().to_string();

        let mut data = self.store.load()?;
        let mut credentials = self.store.load_credentials()?;

        let teacher = match internal_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                let teacher = data
                    .teachers
                    .iter_mut()
                    .find(|teacher| teacher.id == id)
                    .ok_or_else(|| NotFoundError::Teacher(id.to_string()))?;
                teacher.name = name;
                teacher.id_card = id_card;
                teacher.classes_taught = classes_taught;
                teacher.subjects = subjects;
                teacher.periods = periods;
                if !input.photo.is_empty() {
                    teacher.photo = input.photo.clone();
                }
                credentials.upsert_teacher(&teacher.name, &teacher.id_card);
                teacher.clone()
            }
            None => {
                let mut teacher = Teacher::new(name, id_card);
                teacher.classes_taught = classes_taught;
                teacher.subjects = subjects;
                teacher.periods = periods;
                teacher.photo = input.photo.clone();
                data.teachers.push(teacher.clone());
                credentials.add_teacher(&teacher.name, &teacher.id_card);
                teacher
            }
        };

        self.store.save_with_credentials(&data, &credentials)?;
        Ok(teacher)
    }

    /// Creates a class, or renames one when `internal_id` is set.
    ///
    /// # Contract
    /// - Principal only; `name` must be non-blank.
    /// - Display name is `name-(section)` when a section is given.
    /// - Display names are unique across classes.
    /// - A rename re-keys the subject list and rewrites every student and
    ///   teacher reference in the same write.
    pub fn upsert_class(
        &self,
        session: &Session,
        internal_id: Option<&str>,
        name: &str,
        section: Option<&str>,
    ) -> SchoolResult<SchoolClass> {
        let started_at = Instant::now();
        let result = self.upsert_class_inner(session, internal_id, name, section);
        log_outcome("class_upsert", session, started_at, result)
    }

    fn upsert_class_inner(
        &self,
        session: &Session,
        internal_id: Option<&str>,
        name: &str,
        section: Option<&str>,
    ) -> SchoolResult<SchoolClass> {
        require_principal(session, "manage classes")?;
        let base = required("name", name)?;
        let display = compose_display_name(&base, section);
        let mut data = self.store.load()?;

        let Some(id) = internal_id.map(str::trim).filter(|id| !id.is_empty()) else {
            if data.class_by_name(&display).is_some() {
                return Err(ValidationError::DuplicateClass(display).into());
            }
            let class = SchoolClass::new(display.clone());
            data.classes.push(class.clone());
            data.class_subjects.entry(display).or_default();
            self.store.save(&data)?;
            return Ok(class);
        };

        let index = data
            .classes
            .iter()
            .position(|class| class.id == id)
            .ok_or_else(|| NotFoundError::Class(id.to_string()))?;
        let old_name = data.classes[index].name.clone();
        if old_name != display {
            if data
                .classes
                .iter()
                .any(|class| class.id != id && class.name == display)
            {
                return Err(ValidationError::DuplicateClass(display).into());
            }
            rename_class(&mut data, index, &old_name, &display);
        }

        self.store.save(&data)?;
        Ok(data.classes[index].clone())
    }

    /// Replaces the subject list of a class and backfills mark sheets.
    ///
    /// # Contract
    /// - Principal only.
    /// - Blank entries are dropped; an empty list is rejected.
    /// - Every student in the class gets a zero entry for each assigned
    ///   subject in all four terms. Existing entries are never removed.
    pub fn assign_subjects<S: AsRef<str>>(
        &self,
        session: &Session,
        class_name: &str,
        subjects: &[S],
    ) -> SchoolResult<Vec<String>> {
        let started_at = Instant::now();
        let result = self.assign_subjects_inner(session, class_name, subjects);
        log_outcome("subjects_assign", session, started_at, result)
    }

    fn assign_subjects_inner<S: AsRef<str>>(
        &self,
        session: &Session,
        class_name: &str,
        subjects: &[S],
    ) -> SchoolResult<Vec<String>> {
        require_principal(session, "assign subjects")?;
        let class_name = required("class", class_name)?;
        let subjects: Vec<String> = subjects
            .iter()
            .map(|subject| subject.as_ref().trim())
            .filter(|subject| !subject.is_empty())
            .map(str::to_string)
            .collect();
        if subjects.is_empty() {
            return Err(ValidationError::NoSubjects.into());
        }

        let mut data = self.store.load()?;
        if data.class_by_name(&class_name).is_none() {
            return Err(NotFoundError::Class(class_name).into());
        }

        data.class_subjects
            .insert(class_name.clone(), subjects.clone());
        for student in data
            .students
            .iter_mut()
            .filter(|student| student.class_name == class_name)
        {
            student.mark_sheets.ensure_subjects(&subjects);
        }

        self.store.save(&data)?;
        Ok(subjects)
    }

    /// Records one fee transaction and adjusts the student's totals.
    ///
    /// # Contract
    /// - Any signed-in role.
    /// - The record snapshots the student's current name and class.
    /// - Paid: `paid += amount`, `due = max(0, due - amount)`;
    ///   unpaid: `due += amount`.
    pub fn record_fee(&self, session: &Session, request: &FeeRequest) -> SchoolResult<FeeRecord> {
        let started_at = Instant::now();
        let result = self.record_fee_inner(request);
        log_outcome("fee_record", session, started_at, result)
    }

    fn record_fee_inner(&self, request: &FeeRequest) -> SchoolResult<FeeRecord> {
        let code = required("studentCode", &request.student_code)?;
        let amount = validate_amount(request.amount)?;
        let date = resolve_date(request.date.as_deref())?;

        let mut data = self.store.load()?;
        let student = data
            .student_mut(&code)
            .ok_or_else(|| NotFoundError::Student(code.clone()))?;
        let record = FeeRecord::new(
            code.as_str(),
            student.name.as_str(),
            student.class_name.as_str(),
            amount,
            date,
            request.paid,
        );
        student.fees.apply(amount, request.paid);
        data.fees.push(record.clone());

        self.store.save(&data)?;
        Ok(record)
    }

    /// Records one dated test for a class and subject.
    ///
    /// Returns the number of students that received an entry.
    ///
    /// # Contract
    /// - Teacher or principal.
    /// - Students without a numeric `obtained` value are skipped silently;
    ///   `Some(0.0)` is recorded.
    /// - Entries for students outside the class are ignored.
    /// - Monthly buckets are keyed by `(YYYY-MM, subject)`.
    pub fn record_marks(&self, session: &Session, request: &MarksRequest) -> SchoolResult<usize> {
        let started_at = Instant::now();
        let result = self.record_marks_inner(session, request);
        log_outcome("marks_record", session, started_at, result)
    }

    fn record_marks_inner(&self, session: &Session, request: &MarksRequest) -> SchoolResult<usize> {
        require_role(session, "record marks", &[Role::Principal, Role::Teacher])?;
        let class_name = required("class", &request.class_name)?;
        let subject = required("subject", &request.subject)?;
        let date = resolve_date(request.date.as_deref())?;

        let mut data = self.store.load()?;
        if data.class_by_name(&class_name).is_none() {
            return Err(NotFoundError::Class(class_name).into());
        }

        let mut recorded = 0;
        for student in data
            .students
            .iter_mut()
            .filter(|student| student.class_name == class_name)
        {
            let Some(entry) = request
                .entries
                .iter()
                .find(|entry| entry.student_code == student.code)
            else {
                continue;
            };
            let Some(obtained) = entry.obtained.filter(|value| value.is_finite()) else {
                continue;
            };
            let total = if entry.total.is_finite() {
                entry.total
            } else {
                0.0
            };
            student.performance.record(&subject, total, obtained, &date);
            recorded += 1;
        }

        self.store.save(&data)?;
        debug!("event=marks_record module=service status=ok recorded={recorded}");
        Ok(recorded)
    }
}

/// Draws 6-digit codes until one is not used by any existing student.
pub fn generate_student_code<G: Rng + ?Sized>(
    rng: &mut G,
    data: &SchoolData,
) -> Result<String, ValidationError> {
    let taken: HashSet<&str> = data
        .students
        .iter()
        .map(|student| student.code.as_str())
        .collect();
    let in_range = taken
        .iter()
        .filter_map(|code| code.parse::<u32>().ok())
        .filter(|code| (STUDENT_CODE_MIN..=STUDENT_CODE_MAX).contains(code))
        .count();
    if in_range > (STUDENT_CODE_MAX - STUDENT_CODE_MIN) as usize {
        return Err(ValidationError::StudentCodesExhausted);
    }

    loop {
        let code = rng
            .random_range(STUDENT_CODE_MIN..=STUDENT_CODE_MAX)
            .to_string();
        if !taken.contains(code.as_str()) {
            return Ok(code);
        }
    }
}

fn rename_class(data: &mut SchoolData, index: usize, old_name: &str, new_name: &str) {
    data.classes[index].name = new_name.to_string();

    let subjects = data.class_subjects.remove(old_name).unwrap_or_default();
    data.class_subjects.insert(new_name.to_string(), subjects);

    for teacher in &mut data.teachers {
        for class_name in &mut teacher.classes_taught {
            if class_name == old_name {
                *class_name = new_name.to_string();
            }
        }
    }

    // Students follow their class id; only the cached name changes.
    data.reconcile_class_links();
}

fn validate_amount(value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidAmount(value));
    }
    Ok(value)
}

fn resolve_date(value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim).filter(|date| !date.is_empty()) {
        None => Ok(Local::now().date_naive().format(DATE_FORMAT).to_string()),
        Some(date) => NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map(|_| date.to_string())
            .map_err(|_| ValidationError::InvalidDate(date.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{generate_student_code, resolve_date, validate_amount};
    use crate::error::ValidationError;
    use crate::model::school::SchoolData;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_codes_are_six_digits_and_skip_taken() {
        let data = SchoolData::seeded(1);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let code = generate_student_code(&mut rng, &data).expect("code");
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code, "100001");
        }
    }

    #[test]
    fn resolve_date_validates_format() {
        assert_eq!(resolve_date(Some(" 2024-02-29 ")).unwrap(), "2024-02-29");
        assert_eq!(resolve_date(None).unwrap().len(), 10);
        assert_eq!(
            resolve_date(Some("29/02/2024")).unwrap_err(),
            ValidationError::InvalidDate("29/02/2024".to_string())
        );
    }

    #[test]
    fn amounts_must_be_finite_and_non_negative() {
        assert_eq!(validate_amount(0.0).unwrap(), 0.0);
        assert!(validate_amount(-1.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
    }
}
