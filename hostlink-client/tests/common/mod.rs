//! Scripted host listening on a local port.
//!
//! Statements sent with `Execute` select the host's answer:
//! - `SELECT ...` returns the two-row `PARTS` result set
//! - `FAIL` returns an error return code
//! - `UTF8 COLUMNS` returns a result set tagged with CCSID 1208
//! - `WRONG ID` answers with the next request id
//! - `UNKNOWN` answers with an undefined reply op code
//! - `SLEEP` never answers
//! - `HANGUP` closes the socket
//! - anything else updates one row

#![allow(dead_code)]

use chrono::DateTime;
use hostlink_client::ClientConfig;
use hostlink_codepage::TextCodec;
use hostlink_protocol::{
    read_stream, write_stream, ColumnDescriptor, DataStream, DirectoryBatch, DirectoryEntry,
    EntryKind, ProgramOutput, Reply, Request, ResultData, ReturnCode, ServerAttributes,
};
use hostlink_types::{SqlInput, SqlType, SqlValue};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const UNDEFINED_REPLY_OP: u16 = 0x9FFF;
pub const UNSUPPORTED_CCSID: u32 = 1208;
pub const LONG_NAME: &str = "HEXAGONAL BOLT";

pub struct FakeHost {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl FakeHost {
    /// Starts a host that reports CCSID 37.
    pub fn start() -> Self {
        Self::with_ccsid(37)
    }

    pub fn with_ccsid(server_ccsid: u32) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        {
            let accepted = accepted.clone();
            let requests = requests.clone();
            std::thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { break };
                    accepted.fetch_add(1, Ordering::SeqCst);
                    let requests = requests.clone();
                    std::thread::spawn(move || serve(stream, server_ccsid, requests));
                }
            });
        }

        Self {
            addr,
            accepted,
            requests,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.addr.ip().to_string(), self.addr.port())
            .with_client_name("integration")
            .with_read_timeout(Duration::from_secs(5))
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn count(&self, wanted: &Request) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.op() == wanted.op())
            .count()
    }

    pub fn statements(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| match r {
                Request::Execute { statement, .. } => Some(statement.clone()),
                _ => None,
            })
            .collect()
    }
}

fn serve(mut stream: TcpStream, server_ccsid: u32, requests: Arc<Mutex<Vec<Request>>>) {
    let mut codec = TextCodec::for_ccsid(37).unwrap();

    while let Ok(frame) = read_stream(&mut stream) {
        let request = match Request::decode(&frame, &codec) {
            Ok(request) => request,
            Err(_) => return,
        };
        requests.lock().unwrap().push(request.clone());
        let id = frame.request_id;

        let reply = match &request {
            Request::ExchangeAttributes { .. } => Reply::Attributes(ServerAttributes {
                server_ccsid,
                datastream_level: 1,
                server_version: 7,
                job_name: "QZDASOINIT".to_string(),
            }),
            Request::Commit | Request::Rollback => Reply::ReturnCode(ReturnCode::success(0)),
            Request::Execute { statement, .. } => match statement.as_str() {
                s if s.starts_with("SELECT") => Reply::ResultSet(parts()),
                "FAIL" => Reply::ReturnCode(ReturnCode::error(-204, "PARTS in QGPL not found")),
                "WRONG ID" => {
                    let reply = Reply::ReturnCode(ReturnCode::success(1));
                    let frame = reply.encode(id.wrapping_add(1), &codec).unwrap();
                    let _ = write_stream(&mut stream, &frame);
                    continue;
                }
                "UNKNOWN" => {
                    let frame = DataStream::new(id, UNDEFINED_REPLY_OP, Vec::new());
                    let _ = write_stream(&mut stream, &frame);
                    continue;
                }
                "UTF8 COLUMNS" => {
                    let frame = DataStream::new(id, 0x9003, unsupported_ccsid_result(&codec));
                    let _ = write_stream(&mut stream, &frame);
                    continue;
                }
                "SLEEP" => continue,
                "HANGUP" => return,
                _ => Reply::ReturnCode(ReturnCode::success(1)),
            },
            Request::ListDirectory { .. } => Reply::DirectoryBatch(DirectoryBatch {
                more: true,
                entries: vec![entry("QSYS.LIB", EntryKind::Directory)],
            }),
            Request::ListContinue => Reply::DirectoryBatch(DirectoryBatch {
                more: false,
                entries: vec![entry("README.TXT", EntryKind::File)],
            }),
            Request::CallProgram(call) => Reply::ProgramOutput(ProgramOutput {
                return_class: 0,
                parameters: call.parameters.iter().map(|p| p.data.clone()).collect(),
                messages: Vec::new(),
            }),
            Request::EndSession => return,
        };

        let frame = reply.encode(id, &codec).unwrap();
        if write_stream(&mut stream, &frame).is_err() {
            return;
        }
        if matches!(request, Request::ExchangeAttributes { .. }) {
            if let Ok(session) = TextCodec::for_ccsid(server_ccsid) {
                codec = session;
            }
        }
    }
}

fn parts() -> ResultData {
    let name = SqlType::VarChar(32);
    let row = |id: i64, text: &str| {
        vec![
            SqlValue::set(SqlType::Integer, SqlInput::Int(id), None).unwrap(),
            SqlValue::set(name, SqlInput::Text(text), None).unwrap(),
        ]
    };
    ResultData {
        columns: vec![
            ColumnDescriptor::new("ID", SqlType::Integer),
            ColumnDescriptor::new("NAME", name).with_ccsid(37),
        ],
        rows: vec![row(1, "NUT"), row(2, LONG_NAME)],
    }
}

/// A one-column result set body no client table can decode.
fn unsupported_ccsid_result(codec: &TextCodec) -> Vec<u8> {
    let name = codec.encode("TITLE");
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&SqlType::VarChar(8).native_type_id().to_be_bytes());
    body.extend_from_slice(&8u16.to_be_bytes());
    body.extend_from_slice(&(UNSUPPORTED_CCSID as u16).to_be_bytes());
    body.extend_from_slice(&(name.len() as u16).to_be_bytes());
    body.extend_from_slice(&name);
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&10u32.to_be_bytes());
    body
}

fn entry(name: &str, kind: EntryKind) -> DirectoryEntry {
    DirectoryEntry {
        name: name.to_string(),
        kind,
        size: 512,
        modified: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        data_ccsid: 37,
    }
}
