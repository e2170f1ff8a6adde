use rowkeep_core::errors::{RkError, RkErrorKind, RowkeepError};
use rowkeep_core::logging_facility::test_capture::init_test_capture;
use rowkeep_core::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use rowkeep_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, table = "Post");

    let events = capture.events_for(op_name, "Post");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(
        end_events[0].fields.get("duration_ms"),
        Some(&"42".to_string())
    );
}

#[test]
fn test_log_op_error_includes_kind_and_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = RkError::new(RkErrorKind::MissingTable).with_table("Post");
    log_op_error!(op_name, err, duration_ms = 10);
    // still usable after logging
    assert!(err.is_missing_table("Post"));

    let errors: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| {
            e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR)
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].fields.get("err_code"),
        Some(&"ERR_MISSING_TABLE".to_string())
    );
    assert_eq!(
        errors[0].fields.get("err_kind"),
        Some(&"MissingTable".to_string())
    );
}

#[test]
fn test_log_op_error_accepts_domain_error() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_4";

    let err = RowkeepError::PrimaryKeyArityMismatch {
        record: "Post".to_string(),
        expected: 1,
        found: 2,
    };
    log_op_error!(op_name, err, duration_ms = 0, table = "Post");

    let events = capture.events_for(op_name, "Post");
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].fields.get("err_code"),
        Some(&"ERR_INVALID_INPUT".to_string())
    );
}
