use schoolbook_core::db::open_db_in_memory;
use schoolbook_core::report::performance::{consolidated_view, Band, ConsolidatedCell};
use schoolbook_core::report::tables::{class_consolidated_sheet, fee_ledger, student_record_sheet};
use schoolbook_core::{
    FeeRequest, MarksEntry, MarksRequest, Role, SchoolService, SchoolStore, Session,
    SqliteKvRepository,
};

fn principal() -> Session {
    Session {
        name: "cpadmin".to_string(),
        role: Role::Principal,
        id: "1111111111111".to_string(),
    }
}

#[test]
fn consolidated_view_mixes_recent_and_final_term_scores() {
    let conn = open_db_in_memory().unwrap();
    let service = SchoolService::new(SchoolStore::new(SqliteKvRepository::new(&conn)));
    let principal = principal();

    service
        .assign_subjects(&principal, "1", &["Math", "Science"])
        .unwrap();
    service
        .record_marks(
            &principal,
            &MarksRequest {
                class_name: "1".to_string(),
                subject: "Math".to_string(),
                date: Some("2024-05-10".to_string()),
                entries: vec![MarksEntry {
                    student_code: "100001".to_string(),
                    total: 100.0,
                    obtained: Some(45.0),
                }],
            },
        )
        .unwrap();

    let mut data = service.load().unwrap();
    data.student_mut("100001")
        .unwrap()
        .mark_sheets
        .final_term
        .subjects
        .insert("Science".to_string(), 70.0);
    service.store().save(&data).unwrap();

    let data = service.load().unwrap();
    let view = consolidated_view(&data, "1");
    assert_eq!(view.subjects, ["Math", "Science"]);
    let row = &view.rows[0];
    assert!(matches!(
        row.cells[0],
        ConsolidatedCell::Recent {
            band: Band::Mid,
            ..
        }
    ));
    assert_eq!(row.cells[0].render(), "45/100 (45.0%)");
    assert_eq!(row.cells[1].render(), "70");
    assert_eq!(row.render_overall(), "45.00%");

    let sheet = class_consolidated_sheet(&data, "1");
    assert_eq!(sheet.title, "Class 1 Consolidated Performance");
    assert_eq!(sheet.headers, ["Student", "Math", "Science", "Overall Avg%"]);
    assert_eq!(
        sheet.rows[0],
        ["Ali Khan 100001", "45/100 (45.0%)", "70", "45.00%"]
    );

    let record = student_record_sheet(data.student("100001").unwrap());
    assert_eq!(record.rows[0], ["2024-05-10", "Math", "45/100", "45.00%"]);
}

#[test]
fn fee_ledger_lists_every_transaction() {
    let conn = open_db_in_memory().unwrap();
    let service = SchoolService::new(SchoolStore::new(SqliteKvRepository::new(&conn)));

    for (amount, paid) in [(1500.0, true), (250.5, false)] {
        service
            .record_fee(
                &principal(),
                &FeeRequest {
                    student_code: "100001".to_string(),
                    amount,
                    date: Some("2024-01-15".to_string()),
                    paid,
                },
            )
            .unwrap();
    }

    let ledger = fee_ledger(&service.load().unwrap().fees);
    assert_eq!(ledger.title, "Fees Report");
    assert_eq!(ledger.rows.len(), 2);
    assert_eq!(ledger.rows[0], ["Ali Khan", "1", "1500", "2024-01-15", "Paid"]);
    assert_eq!(ledger.rows[1], ["Ali Khan", "1", "250.5", "2024-01-15", "Unpaid"]);
}
