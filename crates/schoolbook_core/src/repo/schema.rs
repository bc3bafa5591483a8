//! Versioned upgrade of the persisted school document.
//!
//! # Responsibility
//! - Repair structurally invalid documents written by older builds.
//! - Apply document migrations in strictly increasing version order.
//! - Decode the upgraded JSON into a fully typed `SchoolData`.
//!
//! # Invariants
//! - Repair never fails: wrong-typed containers are reset to empty defaults.
//! - A document newer than `LATEST_DOCUMENT_VERSION` is rejected, not guessed.
//! - Upgrading an already-current document is a no-op.

use crate::model::school::SchoolData;
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Latest school document version written by this build.
pub const LATEST_DOCUMENT_VERSION: u32 = 1;

const VERSION_FIELD: &str = "schemaVersion";
const TERMS: [&str; 4] = ["firstTerm", "secondTerm", "thirdTerm", "final"];

#[derive(Debug)]
pub enum SchemaError {
    /// Stored text is not a JSON object, or does not decode after repair.
    Malformed(String),
    UnsupportedVersion { found: u32, latest: u32 },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed school document: {message}"),
            Self::UnsupportedVersion { found, latest } => write!(
                f,
                "school document version {found} is newer than supported {latest}"
            ),
        }
    }
}

impl Error for SchemaError {}

#[derive(Debug, Clone, Copy)]
struct DocumentMigration {
    version: u32,
    apply: fn(&mut Map<String, Value>),
}

const MIGRATIONS: &[DocumentMigration] = &[DocumentMigration {
    version: 1,
    apply: introduce_class_ids,
}];

/// Outcome of `upgrade_document`, carrying what changed for logging.
#[derive(Debug)]
pub struct Upgraded {
    pub data: SchoolData,
    pub from_version: u32,
}

impl Upgraded {
    pub fn migrated(&self) -> bool {
        self.from_version != self.data.schema_version
    }
}

/// Parses, repairs and migrates stored document text.
pub fn upgrade_document(text: &str) -> Result<Upgraded, SchemaError> {
    let raw: Value =
        serde_json::from_str(text).map_err(|err| SchemaError::Malformed(err.to_string()))?;
    let Value::Object(mut doc) = raw else {
        return Err(SchemaError::Malformed(
            "top-level value is not an object".to_string(),
        ));
    };

    let from_version = document_version(&doc)?;
    if from_version > LATEST_DOCUMENT_VERSION {
        return Err(SchemaError::UnsupportedVersion {
            found: from_version,
            latest: LATEST_DOCUMENT_VERSION,
        });
    }

    repair_structure(&mut doc);
    for migration in MIGRATIONS {
        if migration.version <= from_version {
            continue;
        }
        (migration.apply)(&mut doc);
    }
    doc.insert(VERSION_FIELD.to_string(), json!(LATEST_DOCUMENT_VERSION));

    let data: SchoolData = serde_json::from_value(Value::Object(doc))
        .map_err(|err| SchemaError::Malformed(err.to_string()))?;
    Ok(Upgraded { data, from_version })
}

fn document_version(doc: &Map<String, Value>) -> Result<u32, SchemaError> {
    match doc.get(VERSION_FIELD) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value
            .as_u64()
            .and_then(|version| u32::try_from(version).ok())
            .ok_or_else(|| SchemaError::Malformed(format!("invalid {VERSION_FIELD} `{value}`"))),
    }
}

/// Resets wrong-typed containers and backfills missing record fields.
fn repair_structure(doc: &mut Map<String, Value>) {
    for key in ["students", "teachers", "parents", "fees", "classes"] {
        ensure(doc, key, Value::is_array, || json!([]));
    }
    ensure(doc, "classSubjects", Value::is_object, || json!({}));

    if let Some(Value::Array(students)) = doc.get_mut("students") {
        students.retain(Value::is_object);
        for student in students.iter_mut().filter_map(Value::as_object_mut) {
            repair_student(student);
        }
    }
    if let Some(Value::Array(teachers)) = doc.get_mut("teachers") {
        teachers.retain(Value::is_object);
        for teacher in teachers.iter_mut().filter_map(Value::as_object_mut) {
            for key in ["name", "idCard", "periods", "photo"] {
                ensure(teacher, key, Value::is_string, || json!(""));
            }
            for key in ["classesTaught", "subjects"] {
                ensure(teacher, key, Value::is_array, || json!([]));
            }
        }
    }
    if let Some(Value::Object(class_subjects)) = doc.get_mut("classSubjects") {
        for subjects in class_subjects.values_mut() {
            if !subjects.is_array() {
                *subjects = json!([]);
            }
        }
    }
}

fn repair_student(student: &mut Map<String, Value>) {
    for key in [
        "name",
        "father",
        "fatherCNIC",
        "class",
        "previousSchool",
        "address",
        "dob",
        "photo",
    ] {
        ensure(student, key, Value::is_string, || json!(""));
    }
    for key in ["feeVouchers", "dailyDiary"] {
        ensure(student, key, Value::is_array, || json!([]));
    }

    let fees = ensure_object(student, "fees");
    for key in ["paid", "due", "fine"] {
        ensure(fees, key, Value::is_number, || json!(0));
    }

    let performance = ensure_object(student, "performance");
    for key in ["daily", "monthly"] {
        ensure(performance, key, Value::is_array, || json!([]));
    }

    let sheets = ensure_object(student, "markSheets");
    for term in TERMS {
        let sheet = ensure_object(sheets, term);
        ensure(sheet, "subjects", Value::is_object, || json!({}));
        ensure(sheet, "percentage", Value::is_number, || json!(0));
        if let Some(Value::Object(subjects)) = sheet.get_mut("subjects") {
            for score in subjects.values_mut() {
                if !score.is_number() {
                    *score = json!(0);
                }
            }
        }
    }

    let attendance = ensure_object(student, "attendance");
    for key in ["totalDays", "present", "absent"] {
        ensure(attendance, key, Value::is_u64, || json!(0));
    }

    let today = ensure_object(student, "todayTest");
    ensure(today, "subject", Value::is_string, || json!(""));
    for key in ["totalMarks", "obtainedMarks", "percentage"] {
        ensure(today, key, Value::is_number, || json!(0));
    }
}

/// Version 1 references classes by id. Older students get an empty id that
/// `SchoolData::reconcile_class_links` resolves from the class name.
fn introduce_class_ids(doc: &mut Map<String, Value>) {
    if let Some(Value::Array(students)) = doc.get_mut("students") {
        for student in students.iter_mut().filter_map(Value::as_object_mut) {
            ensure(student, "classId", Value::is_string, || json!(""));
        }
    }
}

fn ensure(
    map: &mut Map<String, Value>,
    key: &str,
    valid: fn(&Value) -> bool,
    default: impl FnOnce() -> Value,
) {
    if !map.get(key).is_some_and(valid) {
        map.insert(key.to_string(), default());
    }
}

fn ensure_object<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    ensure(map, key, Value::is_object, || json!({}));
    match map.get_mut(key) {
        Some(Value::Object(inner)) => inner,
        _ => unreachable!("`ensure` just stored an object under this key"),
    }
}
