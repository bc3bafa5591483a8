use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;
use schoolbook_core::db::open_db_in_memory;
use schoolbook_core::model::student::Term;
use schoolbook_core::{
    AdmitStudentRequest, AuthService, FeeRequest, MarksEntry, MarksRequest, NotFoundError,
    PermissionError, Role, SchoolError, SchoolService, SchoolStore, Session,
    SqliteKvRepository, TeacherInput, ValidationError,
};
use std::collections::HashSet;

fn service(conn: &Connection) -> SchoolService<SqliteKvRepository<'_>> {
    SchoolService::new(SchoolStore::new(SqliteKvRepository::new(conn)))
}

fn session(role: Role) -> Session {
    Session {
        name: "tester".to_string(),
        role,
        id: "0000000000000".to_string(),
    }
}

fn admission(name: &str, class_name: &str) -> AdmitStudentRequest {
    AdmitStudentRequest {
        name: name.to_string(),
        father: "Father".to_string(),
        father_cnic: "4210100000000".to_string(),
        class_name: class_name.to_string(),
        ..AdmitStudentRequest::default()
    }
}

#[test]
fn admitted_students_get_unique_codes_and_class_subjects() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let principal = session(Role::Principal);
    let mut rng = StdRng::seed_from_u64(42);

    for index in 0..40 {
        let request = admission(&format!("Student {index}"), "1");
        service
            .admit_student_with_rng(&principal, &request, &mut rng)
            .unwrap();
    }

    let data = service.load().unwrap();
    assert_eq!(data.students.len(), 41);
    assert_eq!(data.parents.len(), 41);
    let codes: HashSet<&str> = data.students.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes.len(), 41);
    for student in &data.students[1..] {
        assert_eq!(student.code.len(), 6);
        assert_eq!(student.class_id, "C-1001");
        let sheet = student.mark_sheets.term(Term::Final);
        assert_eq!(sheet.subjects.len(), 2);
        assert_eq!(sheet.subjects["Math"], 0.0);
        assert_eq!(sheet.subjects["English"], 0.0);
    }
}

#[test]
fn admission_rejects_bad_input_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let principal = session(Role::Principal);
    let before = service.load().unwrap();

    let err = service
        .admit_student(&principal, &admission("  ", "1"))
        .unwrap_err();
    assert!(matches!(
        err,
        SchoolError::Validation(ValidationError::BlankField("name"))
    ));

    let err = service
        .admit_student(&principal, &admission("Zara", "9"))
        .unwrap_err();
    assert!(matches!(err, SchoolError::NotFound(NotFoundError::Class(ref c)) if c == "9"));

    let err = service
        .admit_student(&session(Role::Teacher), &admission("Zara", "1"))
        .unwrap_err();
    assert!(matches!(
        err,
        SchoolError::Permission(PermissionError::Denied {
            role: Role::Teacher,
            ..
        })
    ));

    assert_eq!(service.load().unwrap(), before);
}

#[test]
fn fee_transactions_adjust_totals_and_snapshot_student() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let parent = session(Role::Parent);

    let fee = |amount: f64, paid: bool| FeeRequest {
        student_code: "100001".to_string(),
        amount,
        date: Some("2024-03-05".to_string()),
        paid,
    };

    let record = service.record_fee(&parent, &fee(500.0, true)).unwrap();
    assert_eq!(record.name, "Ali Khan");
    assert_eq!(record.class_name, "1");
    assert_eq!(record.date, "2024-03-05");
    assert_eq!(record.status_label(), "Paid");

    service.record_fee(&parent, &fee(300.0, false)).unwrap();
    let fees = service.load().unwrap().student("100001").unwrap().fees;
    assert_eq!(fees.paid, 500.0);
    assert_eq!(fees.due, 1800.0);

    service.record_fee(&parent, &fee(5000.0, true)).unwrap();
    let data = service.load().unwrap();
    let fees = data.student("100001").unwrap().fees;
    assert_eq!(fees.paid, 5500.0);
    assert_eq!(fees.due, 0.0);
    assert_eq!(data.fees.len(), 3);
}

#[test]
fn fee_errors_leave_store_untouched() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let principal = session(Role::Principal);
    let before = service.load().unwrap();

    let unknown = FeeRequest {
        student_code: "999999".to_string(),
        amount: 10.0,
        date: None,
        paid: true,
    };
    let err = service.record_fee(&principal, &unknown).unwrap_err();
    assert_eq!(err.code(), "not_found");

    let bad_date = FeeRequest {
        student_code: "100001".to_string(),
        amount: 10.0,
        date: Some("05/03/2024".to_string()),
        paid: true,
    };
    let err = service.record_fee(&principal, &bad_date).unwrap_err();
    assert!(matches!(
        err,
        SchoolError::Validation(ValidationError::InvalidDate(_))
    ));

    let negative = FeeRequest {
        amount: -1.0,
        ..bad_date
    };
    assert_eq!(
        service.record_fee(&principal, &negative).unwrap_err().code(),
        "validation"
    );

    assert_eq!(service.load().unwrap(), before);
}

#[test]
fn class_rename_propagates_to_students_teachers_and_subjects() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let principal = session(Role::Principal);

    let renamed = service
        .upsert_class(&principal, Some("C-1001"), "1", Some("A"))
        .unwrap();
    assert_eq!(renamed.id, "C-1001");
    assert_eq!(renamed.name, "1-(A)");

    let data = service.load().unwrap();
    assert_eq!(data.student("100001").unwrap().class_name, "1-(A)");
    assert_eq!(data.teachers[0].classes_taught, ["1-(A)"]);
    assert_eq!(data.subjects_for("1-(A)"), ["Math", "English"]);
    assert!(!data.class_subjects.contains_key("1"));
}

#[test]
fn class_names_stay_unique() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let principal = session(Role::Principal);

    let second = service.upsert_class(&principal, None, "2", None).unwrap();
    assert!(second.id.starts_with("C-"));
    assert_eq!(service.load().unwrap().subjects_for("2").len(), 0);

    let err = service
        .upsert_class(&principal, None, "2", None)
        .unwrap_err();
    assert!(matches!(
        err,
        SchoolError::Validation(ValidationError::DuplicateClass(ref name)) if name == "2"
    ));

    let err = service
        .upsert_class(&principal, Some(&second.id), "1", None)
        .unwrap_err();
    assert_eq!(err.code(), "validation");

    let err = service
        .upsert_class(&principal, Some("C-missing"), "5", None)
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[test]
fn assigning_subjects_backfills_without_removing() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let principal = session(Role::Principal);

    let assigned = service
        .assign_subjects(&principal, "1", &["Math", " Drawing ", ""])
        .unwrap();
    assert_eq!(assigned, ["Math", "Drawing"]);

    let data = service.load().unwrap();
    assert_eq!(data.subjects_for("1"), ["Math", "Drawing"]);
    let sheets = &data.student("100001").unwrap().mark_sheets;
    for term in Term::ALL {
        let subjects = &sheets.term(term).subjects;
        assert_eq!(subjects["Drawing"], 0.0);
        assert!(subjects.contains_key("English"));
    }

    let err = service
        .assign_subjects(&principal, "1", &[" "])
        .unwrap_err();
    assert!(matches!(
        err,
        SchoolError::Validation(ValidationError::NoSubjects)
    ));
}

#[test]
fn marks_skip_blank_entries_and_average_monthly() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let principal = session(Role::Principal);
    let teacher = session(Role::Teacher);
    let mut rng = StdRng::seed_from_u64(3);
    let second = service
        .admit_student_with_rng(&principal, &admission("Bilal", "1"), &mut rng)
        .unwrap();

    let marks = |date: &str, ali: Option<f64>, bilal: Option<f64>| MarksRequest {
        class_name: "1".to_string(),
        subject: "Math".to_string(),
        date: Some(date.to_string()),
        entries: vec![
            MarksEntry {
                student_code: "100001".to_string(),
                total: 100.0,
                obtained: ali,
            },
            MarksEntry {
                student_code: second.code.clone(),
                total: 100.0,
                obtained: bilal,
            },
        ],
    };

    assert_eq!(
        service
            .record_marks(&teacher, &marks("2024-04-02", Some(80.0), None))
            .unwrap(),
        1
    );
    assert_eq!(
        service
            .record_marks(&teacher, &marks("2024-04-20", Some(90.0), Some(0.0)))
            .unwrap(),
        2
    );

    let data = service.load().unwrap();
    let ali = data.student("100001").unwrap();
    assert_eq!(ali.performance.daily.len(), 2);
    assert_eq!(ali.performance.monthly.len(), 1);
    assert_eq!(ali.performance.monthly[0].month, "2024-04");
    assert_eq!(ali.performance.monthly[0].average, "85.00");

    let bilal = data.student(&second.code).unwrap();
    assert_eq!(bilal.performance.daily.len(), 1);
    assert_eq!(bilal.performance.daily[0].marks, 0.0);

    let err = service
        .record_marks(&session(Role::Parent), &marks("2024-04-21", Some(1.0), None))
        .unwrap_err();
    assert_eq!(err.code(), "permission");
}

#[test]
fn teacher_upsert_updates_record_and_login() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let auth = AuthService::new(SchoolStore::new(SqliteKvRepository::new(&conn)));
    let principal = session(Role::Principal);

    let input = TeacherInput {
        name: "Sana".to_string(),
        id_card: "5555555555555".to_string(),
        classes: "1, 2 ,".to_string(),
        subjects: "Math".to_string(),
        periods: "Math:1".to_string(),
        photo: "data:image/png;base64,AAAA".to_string(),
    };
    let created = service.upsert_teacher(&principal, None, &input).unwrap();
    assert_eq!(created.classes_taught, ["1", "2"]);

    let login = auth.login("SANA", "5555555555555", Role::Teacher).unwrap();
    assert_eq!(login.name, "sana");

    let update = TeacherInput {
        id_card: "6666666666666".to_string(),
        photo: String::new(),
        ..input
    };
    let updated = service
        .upsert_teacher(&principal, Some(&created.id), &update)
        .unwrap();
    assert_eq!(updated.photo, "data:image/png;base64,AAAA");
    assert_eq!(service.load().unwrap().teachers.len(), 2);

    assert!(auth.login("sana", "5555555555555", Role::Teacher).is_err());
    auth.login("sana", "6666666666666", Role::Teacher).unwrap();

    let err = service
        .upsert_teacher(&principal, Some("T-missing"), &update)
        .unwrap_err();
    assert!(matches!(err, SchoolError::NotFound(NotFoundError::Teacher(_))));
}

#[test]
fn creating_a_namesake_teacher_keeps_existing_login() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let auth = AuthService::new(SchoolStore::new(SqliteKvRepository::new(&conn)));

    let input = TeacherInput {
        name: "Teacher1".to_string(),
        id_card: "7777777777777".to_string(),
        ..TeacherInput::default()
    };
    service
        .upsert_teacher(&session(Role::Principal), None, &input)
        .unwrap();

    assert_eq!(service.load().unwrap().teachers.len(), 2);
    auth.login("teacher1", "2222222222222", Role::Teacher).unwrap();
    auth.login("teacher1", "7777777777777", Role::Teacher).unwrap();
}
