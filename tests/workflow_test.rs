use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use opsclad::error::AppError;
use opsclad::models::*;
use opsclad::services::{LeaveService, TaskEditor, TaskService};
use opsclad::supabase::InMemorySupabase;

const EMAIL: &str = "ana@opsclad.io";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
}

fn user() -> AuthUser {
    AuthUser {
        id: "u-1".to_string(),
        email: EMAIL.to_string(),
    }
}

fn backend() -> Arc<InMemorySupabase> {
    let backend = Arc::new(InMemorySupabase::new());
    backend.add_employee_info(EmployeeInfo {
        employee_id: "E-1".to_string(),
        name: "Ana".to_string(),
        email_id: EMAIL.to_string(),
    });
    backend
}

fn approved_pto(date: &str, hours: f64) -> LeaveRecord {
    LeaveRecord {
        id: date.to_string(),
        date: date.to_string(),
        day: String::new(),
        hours,
        activity: Some("Vacation".to_string()),
        employee_name: "Ana".to_string(),
        employee_id: "E-1".to_string(),
        sender_email: EMAIL.to_string(),
        updated_at: None,
        is_pto: true,
        status: LeaveStatus::Approved,
        request_reason: None,
        pending_changes: None,
    }
}

#[tokio::test]
async fn test_second_request_for_same_day_is_duplicate() {
    let backend = backend();
    let service = LeaveService::new(backend.clone());
    let input = PtoRequestInput {
        date: "2025-06-20".to_string(),
        hours: 8.0,
        reason: "Dentist".to_string(),
    };

    service
        .submit_pto_request(&user(), &input, today())
        .await
        .expect("First request should pass");
    let err = service
        .submit_pto_request(&user(), &input, today())
        .await
        .unwrap_err();

    assert_eq!(err.title(), "Duplicate Request");
    match err {
        AppError::Duplicate(msg) => assert_eq!(msg, "A PTO request for 2025-06-20 already exists."),
        other => panic!("expected duplicate, got {:?}", other),
    }
    assert_eq!(backend.pto_records().len(), 1);
}

#[tokio::test]
async fn test_past_date_never_reaches_backend() {
    let backend = backend();
    let service = LeaveService::new(backend.clone());
    let input = PtoRequestInput {
        date: "2025-06-09".to_string(),
        hours: 8.0,
        reason: String::new(),
    };

    let err = service
        .submit_pto_request(&user(), &input, today())
        .await
        .unwrap_err();

    assert_eq!(err.title(), "Invalid Date");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_carry_forward_beyond_remaining_is_rejected() {
    let backend = backend();
    for day in 1..=10 {
        backend.add_pto_record(approved_pto(&format!("2025-02-{:02}", day), 8.0));
    }
    let service = LeaveService::new(backend.clone());

    let overview = service
        .load_overview(&user(), 2025, &Default::default(), today())
        .await
        .unwrap();
    assert_eq!(overview.summary.total_pto_days, 10.0);
    assert_eq!(overview.summary.remaining_pto_days, 2.0);

    let err = service
        .submit_carry_forward(&user(), 3.0, 2025, today())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("more days than you have remaining"));
    assert!(backend.carry_forward_requests().is_empty());

    let receipt = service
        .submit_carry_forward(&user(), 2.0, 2025, today())
        .await
        .expect("Carry forward within the remaining days should pass");
    assert_eq!(
        receipt.message,
        "Your request to carry forward 2 days to 2026 has been submitted for approval."
    );

    let requests = backend.carry_forward_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].from_year, 2025);
    assert_eq!(requests[0].to_year, 2026);
    assert_eq!(requests[0].status, RequestStatus::Pending);
}

#[tokio::test]
async fn test_zero_day_carry_forward_needs_no_backend() {
    let backend = backend();
    let err = LeaveService::new(backend.clone())
        .submit_carry_forward(&user(), 0.0, 2025, today())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("number of days to carry forward"));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_task_with_pending_changes_is_locked() {
    let backend = Arc::new(InMemorySupabase::new());
    let task = TaskRecord {
        id: "41".to_string(),
        task_id: "OPS-41".to_string(),
        description: "Migrate runners".to_string(),
        owner: EMAIL.to_string(),
        department: "Ops".to_string(),
        start_date: "2025-05-01".to_string(),
        estimated_completion_date: "2025-06-30".to_string(),
        actual_completion_date: String::new(),
        status: TaskStatus::InProgress,
        pending_changes: Some(r#"{"status":"completed","changed_by":"lee"}"#.to_string()),
        created_at: None,
        updated_at: None,
    };
    backend.add_task(task.clone());

    let mut editor = TaskEditor::new();
    assert!(matches!(editor.start_editing(&task), Err(AppError::Conflict(_))));

    let err = TaskService::new(backend.clone())
        .submit_changes(
            "41",
            TaskDraft {
                status: Some(TaskStatus::Blocked),
                ..Default::default()
            },
            EMAIL,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(
        backend.tasks()[0].pending_changes.as_deref(),
        task.pending_changes.as_deref()
    );
}
