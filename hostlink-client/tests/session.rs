//! Single sessions against the scripted host.

mod common;

use common::{FakeHost, LONG_NAME, UNDEFINED_REPLY_OP, UNSUPPORTED_CCSID};
use hostlink_client::{
    ClientError, ConnectionCore, CoreState, EntryKind, ExecuteResult, Parameter, ProgramCall,
    ProgramParameter, RequestState, SqlInput, SqlType, SqlValue,
};
use hostlink_protocol::Request;
use std::time::Duration;

#[test]
fn test_connect_exchanges_attributes() {
    let host = FakeHost::start();
    let core = ConnectionCore::connect(&host.config()).unwrap();

    assert_eq!(core.attributes().job_name, "QZDASOINIT");
    assert_eq!(core.attributes().server_version, 7);
    assert_eq!(core.ccsid(), 37);
    assert!(core.is_usable());
    assert_eq!(host.count(&Request::Commit), 0);
}

#[test]
fn test_server_ccsid_selects_codec() {
    let host = FakeHost::with_ccsid(500);
    let mut core = ConnectionCore::connect(&host.config()).unwrap();
    assert_eq!(core.ccsid(), 500);
    assert_eq!(core.preferred_ccsid(), 37);

    // Statements now travel in CCSID 500; the host decodes them the same way
    assert_eq!(core.update("UPDATE PARTS SET QTY = 0 WHERE NAME = '[A]'", &[]).unwrap(), 1);
    assert_eq!(
        host.statements(),
        vec!["UPDATE PARTS SET QTY = 0 WHERE NAME = '[A]'".to_string()]
    );
}

#[test]
fn test_unsupported_server_ccsid() {
    let host = FakeHost::with_ccsid(1234);
    let err = ConnectionCore::connect(&host.config()).unwrap_err();
    assert!(matches!(err, ClientError::UnsupportedCodePage(1234)));
}

#[test]
fn test_query_returns_rows() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let rows = core.query("SELECT ID, NAME FROM PARTS", &[]).unwrap();
    assert_eq!(rows.column_count(), 2);
    assert_eq!(rows.column_index("name"), Some(1));
    assert_eq!(rows.len(), 2);

    let first = rows.row(0).unwrap();
    assert_eq!(first.get_i64(0).unwrap(), 1);
    assert_eq!(first.get_string(1).unwrap().value, "NUT");

    let second = rows.row(1).unwrap();
    let name = second.get_string(1).unwrap();
    assert_eq!(name.value, LONG_NAME);
    assert!(!name.is_truncated());
}

#[test]
fn test_max_field_size_caps_reads() {
    let host = FakeHost::start();
    let config = host.config().with_max_field_size(4);
    let mut core = ConnectionCore::connect(&config).unwrap();

    let rows = core.query("SELECT ID, NAME FROM PARTS", &[]).unwrap();
    let name = rows.row(1).unwrap().get_string(1).unwrap();
    assert_eq!(name.value, "HEXA");
    assert_eq!(name.truncated, LONG_NAME.len() - 4);

    // Short values are untouched
    let name = rows.row(0).unwrap().get_string(1).unwrap();
    assert_eq!(name.value, "NUT");
    assert_eq!(name.truncated, 0);
}

#[test]
fn test_cap_change_applies_to_existing_results() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let rows = core.query("SELECT ID, NAME FROM PARTS", &[]).unwrap();
    assert_eq!(rows.row(1).unwrap().get_string(1).unwrap().value, LONG_NAME);

    core.set_max_field_size(4);
    let name = rows.row(1).unwrap().get_string(1).unwrap();
    assert_eq!(name.value, "HEXA");
    assert_eq!(name.truncated, LONG_NAME.len() - 4);
    assert_eq!(rows.max_field_size(), 4);

    core.set_max_field_size(0);
    assert_eq!(rows.row(1).unwrap().get_string(1).unwrap().value, LONG_NAME);
}

#[test]
fn test_unsupported_column_ccsid_keeps_session() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let err = core.query("UTF8 COLUMNS", &[]).unwrap_err();
    assert!(matches!(err, ClientError::UnsupportedCodePage(UNSUPPORTED_CCSID)));
    assert!(!err.is_fatal());
    assert!(core.is_usable());
    assert_eq!(core.request_state(), RequestState::Completed);

    // Correlation is intact for the next request
    assert!(core.commit().unwrap().is_success());
    let rows = core.query("SELECT ID, NAME FROM PARTS", &[]).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_parameters_reach_host() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let id = SqlValue::set(SqlType::Integer, SqlInput::Int(42), None).unwrap();
    let tag = SqlValue::set(SqlType::CharForBitData(2), SqlInput::Text("0A1B"), None).unwrap();
    let result = core
        .execute(
            "DELETE FROM PARTS WHERE ID = ? AND TAG = ?",
            &[Parameter::from(id), Parameter::from(tag)],
        )
        .unwrap();
    assert!(matches!(result, ExecuteResult::Update(1)));
}

#[test]
fn test_host_error_keeps_session() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let err = core.update("FAIL", &[]).unwrap_err();
    match &err {
        ClientError::Host { code, message, .. } => {
            assert_eq!(*code, -204);
            assert!(message.contains("PARTS"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_fatal());
    assert!(core.is_usable());
    assert!(core.commit().unwrap().is_success());
}

#[test]
fn test_mismatched_reply_id_drops_session() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let err = core.update("WRONG ID", &[]).unwrap_err();
    assert!(matches!(err, ClientError::OutOfSequence { .. }));
    assert!(err.is_fatal());
    assert_eq!(core.state(), CoreState::Dropped);
    assert!(!core.is_usable());

    assert!(matches!(
        core.commit(),
        Err(ClientError::ConnectionDropped(_))
    ));
}

#[test]
fn test_unknown_reply_drops_session() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let err = core.update("UNKNOWN", &[]).unwrap_err();
    assert!(matches!(err, ClientError::UnknownReplyStream(UNDEFINED_REPLY_OP)));
    assert!(!core.is_usable());
}

#[test]
fn test_hangup_drops_session() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let err = core.update("HANGUP", &[]).unwrap_err();
    assert!(matches!(err, ClientError::ConnectionDropped(_)));
    assert_eq!(core.request_state(), RequestState::Dropped);
    assert!(!core.is_usable());
}

#[test]
fn test_read_timeout_drops_session() {
    let host = FakeHost::start();
    let config = host.config().with_read_timeout(Duration::from_millis(100));
    let mut core = ConnectionCore::connect(&config).unwrap();

    let err = core.update("SLEEP", &[]).unwrap_err();
    assert!(matches!(err, ClientError::ConnectionDropped(_)));
    assert!(err.is_retryable());
    assert_eq!(core.request_state(), RequestState::TimedOut);
    assert!(!core.is_usable());
}

#[test]
fn test_chained_requests() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    for n in 0..3 {
        core.submit(&Request::Execute {
            statement: format!("INSERT INTO LOG VALUES({})", n),
            parameters: Vec::new(),
        })
        .unwrap();
    }
    assert_eq!(core.pending_count(), 3);

    // The next exchange drains the chained replies first
    assert!(core.commit().unwrap().is_success());
    assert_eq!(core.pending_count(), 0);
    assert_eq!(host.statements().len(), 3);
    assert_eq!(host.count(&Request::Commit), 1);
}

#[test]
fn test_batch_reports_first_error() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let results = core.execute_batch(&["INSERT A", "INSERT B"]).unwrap();
    assert_eq!(results.len(), 2);

    let err = core
        .execute_batch(&["INSERT C", "FAIL", "INSERT D"])
        .unwrap_err();
    assert!(matches!(err, ClientError::Host { code: -204, .. }));
    assert!(core.is_usable());
    assert_eq!(host.statements().len(), 5);
}

#[test]
fn test_list_directory_follows_batches() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let entries = core.list_directory("/QSYS.LIB", "*").unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["QSYS.LIB", "README.TXT"]);
    assert_eq!(entries[0].kind, EntryKind::Directory);
    assert_eq!(host.count(&Request::ListContinue), 1);
}

#[test]
fn test_call_program() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();

    let call = ProgramCall::new("QGPL", "ORDCHK")
        .parameter(ProgramParameter::input(vec![0xF1, 0xF2]))
        .parameter(ProgramParameter::output(4));
    let output = core.call_program(&call).unwrap();
    assert!(output.succeeded());
    assert_eq!(output.parameters.len(), 2);
    assert_eq!(output.parameters[0], vec![0xF1, 0xF2]);
}

#[test]
fn test_close_ends_session() {
    let host = FakeHost::start();
    let mut core = ConnectionCore::connect(&host.config()).unwrap();
    core.close();
    core.close();

    assert_eq!(core.state(), CoreState::Closed);
    assert!(matches!(
        core.commit(),
        Err(ClientError::ConnectionDropped(_))
    ));

    // EndSession is written before the socket is shut down
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(host.count(&Request::EndSession), 1);
}
