//! Physical host sessions.
//!
//! A [`ConnectionCore`] owns one transport and speaks strictly in
//! request/reply order. Requests may be chained with [`ConnectionCore::submit`];
//! their replies must be drained, in send order, before any unrelated request
//! goes out. Any transport failure or correlation error leaves the core
//! permanently unusable.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::result::{ExecuteResult, ResultSet};
use crate::transport::{ClientStream, Transport};
use hostlink_codepage::TextCodec;
use hostlink_protocol::{
    read_stream, write_stream, DirectoryEntry, Parameter, ProgramCall, ProgramOutput,
    ProtocolError, Reply, Request, ReturnCode, ServerAttributes, DATASTREAM_LEVEL,
};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

static NEXT_CORE_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of the most recent request on a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sent,
    AwaitingReply,
    Completed,
    Dropped,
    TimedOut,
}

/// Lifecycle of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Open,
    /// The transport failed or the reply stream desynchronized.
    Dropped,
    Closed,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: u16,
    name: &'static str,
}

/// One physical session with the host.
pub struct ConnectionCore {
    id: u64,
    transport: Box<dyn Transport>,
    codec: TextCodec,
    attributes: ServerAttributes,
    preferred_ccsid: u32,
    next_request_id: u16,
    pending: VecDeque<Pending>,
    state: CoreState,
    request_state: RequestState,
    /// Shared with every result set this core produces.
    max_field_size: Arc<AtomicUsize>,
    default_max_field_size: usize,
    directory_batch_size: u16,
}

impl ConnectionCore {
    /// Opens a transport to the configured host and exchanges attributes.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = ClientStream::open(config)?;
        Self::establish(Box::new(transport), config)
    }

    /// Exchanges attributes over an already-open transport.
    ///
    /// Fails with `UnsupportedCodePage` when neither side's CCSID has a
    /// table; no core is created in that case.
    pub fn establish(
        mut transport: Box<dyn Transport>,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        let preferred = TextCodec::for_ccsid(config.ccsid)?;
        transport.set_read_timeout(config.read_timeout())?;

        let mut core = Self {
            id: NEXT_CORE_ID.fetch_add(1, Ordering::Relaxed),
            transport,
            codec: preferred,
            attributes: ServerAttributes {
                server_ccsid: config.ccsid,
                datastream_level: DATASTREAM_LEVEL,
                server_version: 0,
                job_name: String::new(),
            },
            preferred_ccsid: config.ccsid,
            next_request_id: 1,
            pending: VecDeque::new(),
            state: CoreState::Open,
            request_state: RequestState::Idle,
            max_field_size: Arc::new(AtomicUsize::new(config.max_field_size)),
            default_max_field_size: config.max_field_size,
            directory_batch_size: config.directory_batch_size.max(1),
        };

        let request = Request::ExchangeAttributes {
            preferred_ccsid: config.ccsid,
            datastream_level: DATASTREAM_LEVEL,
            client_name: config.client_name.clone(),
        };
        let attributes = match core.exchange(&request)? {
            Reply::Attributes(attrs) => attrs,
            other => return Err(unexpected(&request, &other)),
        };

        let server_ccsid = match attributes.server_ccsid {
            0 => config.ccsid,
            ccsid => ccsid,
        };
        if server_ccsid != core.codec.ccsid() {
            core.codec = TextCodec::for_ccsid(server_ccsid).map_err(|e| {
                tracing::warn!("Host CCSID {} has no code page table", server_ccsid);
                ClientError::from(e)
            })?;
        }
        tracing::debug!(
            "Session {} established: job={} ccsid={} level={}",
            core.id,
            attributes.job_name,
            server_ccsid,
            attributes.datastream_level
        );
        core.attributes = attributes;
        Ok(core)
    }

    /// Process-unique id of this core.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn attributes(&self) -> &ServerAttributes {
        &self.attributes
    }

    pub fn server_ccsid(&self) -> u32 {
        self.attributes.server_ccsid
    }

    pub fn preferred_ccsid(&self) -> u32 {
        self.preferred_ccsid
    }

    /// CCSID of the codec all session text passes through.
    pub fn ccsid(&self) -> u32 {
        self.codec.ccsid()
    }

    pub fn codec(&self) -> &TextCodec {
        &self.codec
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn request_state(&self) -> RequestState {
        self.request_state
    }

    pub fn is_usable(&self) -> bool {
        self.state == CoreState::Open
    }

    /// Number of submitted requests whose replies have not been read.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Id the next request will carry.
    pub fn next_request_id(&self) -> u16 {
        self.next_request_id
    }

    pub fn max_field_size(&self) -> usize {
        self.max_field_size.load(Ordering::Relaxed)
    }

    /// Sets the session cap; 0 is unbounded.
    ///
    /// Applies to every later read, including reads from result sets this
    /// core produced earlier.
    pub fn set_max_field_size(&mut self, size: usize) {
        self.max_field_size.store(size, Ordering::Relaxed);
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), ClientError> {
        self.ensure_usable()?;
        self.transport.set_read_timeout(timeout)?;
        Ok(())
    }

    fn ensure_usable(&self) -> Result<(), ClientError> {
        match self.state {
            CoreState::Open => Ok(()),
            CoreState::Dropped => Err(ClientError::ConnectionDropped(
                "connection is no longer usable".to_string(),
            )),
            CoreState::Closed => Err(ClientError::ConnectionDropped(
                "connection closed".to_string(),
            )),
        }
    }

    /// Marks the core unusable and tears the transport down.
    fn drop_connection(&mut self, state: RequestState) {
        self.request_state = state;
        if self.state == CoreState::Open {
            self.state = CoreState::Dropped;
            self.pending.clear();
            let _ = self.transport.shutdown();
        }
    }

    fn fail(&mut self, err: ProtocolError) -> ClientError {
        if err.is_timeout() {
            tracing::warn!("Session {}: read timed out, dropping connection", self.id);
            self.drop_connection(RequestState::TimedOut);
            return ClientError::ConnectionDropped("read timed out".to_string());
        }
        tracing::warn!("Session {}: dropping connection: {}", self.id, err);
        self.drop_connection(RequestState::Dropped);
        match err {
            ProtocolError::Io(e) => ClientError::ConnectionDropped(e.to_string()),
            other => other.into(),
        }
    }

    fn send(&mut self, request: &Request) -> Result<u16, ClientError> {
        self.ensure_usable()?;
        let id = self.next_request_id;
        let stream = request.encode(id, &self.codec)?;
        self.next_request_id = self.next_request_id.wrapping_add(1);

        if let Err(e) = write_stream(&mut *self.transport, &stream) {
            return Err(self.fail(e));
        }
        self.request_state = RequestState::Sent;
        tracing::debug!(
            "Session {}: sent {} id={} ({} bytes)",
            self.id,
            request.name(),
            id,
            stream.total_length()
        );
        Ok(id)
    }

    fn receive(&mut self, expected: u16) -> Result<Reply, ClientError> {
        self.request_state = RequestState::AwaitingReply;
        let stream = match read_stream(&mut *self.transport) {
            Ok(stream) => stream,
            Err(e) => return Err(self.fail(e)),
        };

        if stream.request_id != expected {
            tracing::warn!(
                "Session {}: reply id {} does not match request id {}",
                self.id,
                stream.request_id,
                expected
            );
            self.drop_connection(RequestState::Dropped);
            return Err(ClientError::OutOfSequence {
                expected,
                actual: stream.request_id,
            });
        }

        let reply = match Reply::decode(&stream, &self.codec) {
            Ok(reply) => reply,
            // The whole stream was consumed; only its contents are unusable
            Err(e @ (ProtocolError::CodePage(_) | ProtocolError::Type(_))) => {
                self.request_state = RequestState::Completed;
                tracing::debug!("Session {}: reply id={} rejected: {}", self.id, expected, e);
                return Err(e.into());
            }
            Err(e) => return Err(self.fail(e)),
        };
        self.request_state = RequestState::Completed;
        tracing::debug!(
            "Session {}: received {} id={}",
            self.id,
            reply.name(),
            expected
        );
        Ok(reply)
    }

    /// Sends `request` and waits for its reply, draining chained requests first.
    ///
    /// A `ReturnCode` reply of error class is returned as `ClientError::Host`.
    pub fn exchange(&mut self, request: &Request) -> Result<Reply, ClientError> {
        let drained = self.drain()?;
        if !drained.is_empty() {
            tracing::debug!(
                "Session {}: discarded {} chained replies before {}",
                self.id,
                drained.len(),
                request.name()
            );
        }

        let id = self.send(request)?;
        let reply = self.receive(id)?;
        check_return_code(reply)
    }

    /// Sends `request` without waiting; its reply stays pending until [`drain`](Self::drain).
    pub fn submit(&mut self, request: &Request) -> Result<u16, ClientError> {
        let id = self.send(request)?;
        if request.expects_reply() {
            self.pending.push_back(Pending {
                id,
                name: request.name(),
            });
        }
        Ok(id)
    }

    /// Reads every pending reply in send order.
    pub fn drain(&mut self) -> Result<Vec<Reply>, ClientError> {
        let mut replies = Vec::with_capacity(self.pending.len());
        while let Some(pending) = self.pending.pop_front() {
            tracing::debug!(
                "Session {}: draining {} id={}",
                self.id,
                pending.name,
                pending.id
            );
            replies.push(self.receive(pending.id)?);
        }
        Ok(replies)
    }

    pub fn commit(&mut self) -> Result<ReturnCode, ClientError> {
        self.return_code(&Request::Commit)
    }

    pub fn rollback(&mut self) -> Result<ReturnCode, ClientError> {
        self.return_code(&Request::Rollback)
    }

    fn return_code(&mut self, request: &Request) -> Result<ReturnCode, ClientError> {
        match self.exchange(request)? {
            Reply::ReturnCode(rc) => Ok(rc),
            other => Err(unexpected(request, &other)),
        }
    }

    /// Runs one statement with bound parameters.
    pub fn execute(
        &mut self,
        statement: &str,
        parameters: &[Parameter],
    ) -> Result<ExecuteResult, ClientError> {
        let request = Request::Execute {
            statement: statement.to_string(),
            parameters: parameters.to_vec(),
        };
        let reply = self.exchange(&request)?;
        self.execute_result(&request, reply)
    }

    /// Runs a statement that must produce rows.
    pub fn query(
        &mut self,
        statement: &str,
        parameters: &[Parameter],
    ) -> Result<ResultSet, ClientError> {
        match self.execute(statement, parameters)? {
            ExecuteResult::Query(rows) => Ok(rows),
            ExecuteResult::Update(_) => Err(ClientError::UnexpectedReply {
                request: "EXECUTE",
                actual: "RETURN_CODE",
            }),
        }
    }

    /// Runs a statement that must not produce rows; returns the update count.
    pub fn update(
        &mut self,
        statement: &str,
        parameters: &[Parameter],
    ) -> Result<i64, ClientError> {
        match self.execute(statement, parameters)? {
            ExecuteResult::Update(count) => Ok(count),
            ExecuteResult::Query(_) => Err(ClientError::UnexpectedReply {
                request: "EXECUTE",
                actual: "RESULT_SET",
            }),
        }
    }

    /// Sends every statement before reading the first reply.
    ///
    /// All replies are read even when one reports a host error; the first
    /// such error is returned.
    pub fn execute_batch<S: AsRef<str>>(
        &mut self,
        statements: &[S],
    ) -> Result<Vec<ExecuteResult>, ClientError> {
        self.drain()?;
        let requests: Vec<Request> = statements
            .iter()
            .map(|s| Request::Execute {
                statement: s.as_ref().to_string(),
                parameters: Vec::new(),
            })
            .collect();
        for request in &requests {
            self.submit(request)?;
        }

        let replies = self.drain()?;
        let mut results = Vec::with_capacity(replies.len());
        let mut first_error = None;
        for (request, reply) in requests.iter().zip(replies) {
            match check_return_code(reply).and_then(|r| self.execute_result(request, r)) {
                Ok(result) => results.push(result),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }

    fn execute_result(
        &self,
        request: &Request,
        reply: Reply,
    ) -> Result<ExecuteResult, ClientError> {
        match reply {
            Reply::ReturnCode(rc) => {
                if rc.is_warning() {
                    tracing::debug!("Session {}: warning {}: {}", self.id, rc.code, rc.message);
                }
                Ok(ExecuteResult::Update(rc.update_count))
            }
            Reply::ResultSet(data) => Ok(ExecuteResult::Query(ResultSet::new(
                data,
                self.max_field_size.clone(),
            ))),
            other => Err(unexpected(request, &other)),
        }
    }

    /// Lists `path`, following continuation batches until the host is done.
    pub fn list_directory(
        &mut self,
        path: &str,
        pattern: &str,
    ) -> Result<Vec<DirectoryEntry>, ClientError> {
        let mut request = Request::ListDirectory {
            path: path.to_string(),
            pattern: pattern.to_string(),
            batch_size: self.directory_batch_size,
        };
        let mut entries = Vec::new();
        loop {
            let batch = match self.exchange(&request)? {
                Reply::DirectoryBatch(batch) => batch,
                other => return Err(unexpected(&request, &other)),
            };
            entries.extend(batch.entries);
            if !batch.more {
                return Ok(entries);
            }
            request = Request::ListContinue;
        }
    }

    /// Calls a host program and returns its output parameters and messages.
    pub fn call_program(&mut self, call: &ProgramCall) -> Result<ProgramOutput, ClientError> {
        let request = Request::CallProgram(call.clone());
        match self.exchange(&request)? {
            Reply::ProgramOutput(output) => {
                if !output.succeeded() {
                    tracing::debug!(
                        "Session {}: {}/{} ended with class {}",
                        self.id,
                        call.library,
                        call.program,
                        output.return_class
                    );
                }
                Ok(output)
            }
            other => Err(unexpected(&request, &other)),
        }
    }

    /// Restores session settings for the next borrower.
    pub(crate) fn reset_session(&mut self) {
        self.max_field_size
            .store(self.default_max_field_size, Ordering::Relaxed);
    }

    /// Ends the session. Best-effort and idempotent.
    pub fn close(&mut self) {
        if self.state == CoreState::Closed {
            return;
        }
        if self.state == CoreState::Open {
            if let Err(e) = self.send(&Request::EndSession) {
                tracing::debug!("Session {}: end session not sent: {}", self.id, e);
            }
        }
        let _ = self.transport.shutdown();
        self.pending.clear();
        self.state = CoreState::Closed;
        tracing::debug!("Session {} closed", self.id);
    }
}

impl fmt::Debug for ConnectionCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCore")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("ccsid", &self.codec.ccsid())
            .field("next_request_id", &self.next_request_id)
            .field("pending", &self.pending.len())
            .field("tls", &self.transport.is_tls())
            .finish()
    }
}

fn check_return_code(reply: Reply) -> Result<Reply, ClientError> {
    match reply {
        Reply::ReturnCode(rc) if rc.is_error() => Err(ClientError::Host {
            class: rc.class,
            code: rc.code,
            message: rc.message,
        }),
        reply => Ok(reply),
    }
}

fn unexpected(request: &Request, reply: &Reply) -> ClientError {
    ClientError::UnexpectedReply {
        request: request.name(),
        actual: reply.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostlink_protocol::{DataStream, DirectoryBatch, EntryKind};
    use std::io::{self, Cursor, Read, Write};
    use std::sync::{Arc, Mutex};

    fn encode_reply(id: u16, reply: Reply) -> Vec<u8> {
        let codec = TextCodec::for_ccsid(37).unwrap();
        reply.encode(id, &codec).unwrap().encode().unwrap().to_vec()
    }

    fn attributes(ccsid: u32) -> Reply {
        Reply::Attributes(ServerAttributes {
            server_ccsid: ccsid,
            datastream_level: 1,
            server_version: 7,
            job_name: "QZDASOINIT".to_string(),
        })
    }

    /// Replays canned input and records everything written.
    struct ScriptedTransport {
        input: Cursor<Vec<u8>>,
        written: Arc<Mutex<Vec<u8>>>,
        shut_down: Arc<Mutex<bool>>,
    }

    impl Read for ScriptedTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for ScriptedTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for ScriptedTransport {
        fn set_read_timeout(&mut self, _: Option<Duration>) -> io::Result<()> {
            Ok(())
        }

        fn shutdown(&mut self) -> io::Result<()> {
            *self.shut_down.lock().unwrap() = true;
            Ok(())
        }
    }

    struct Script {
        written: Arc<Mutex<Vec<u8>>>,
        shut_down: Arc<Mutex<bool>>,
    }

    impl Script {
        fn sent_requests(&self) -> Vec<(u16, Request)> {
            let codec = TextCodec::for_ccsid(37).unwrap();
            let mut decoder = hostlink_protocol::Decoder::new();
            decoder.extend(&self.written.lock().unwrap());
            let mut out = Vec::new();
            while let Some(entry) = decoder.decode_request(&codec).unwrap() {
                out.push(entry);
            }
            out
        }

        fn is_shut_down(&self) -> bool {
            *self.shut_down.lock().unwrap()
        }
    }

    fn core_with(replies: Vec<Vec<u8>>) -> (Result<ConnectionCore, ClientError>, Script) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let shut_down = Arc::new(Mutex::new(false));
        let transport = ScriptedTransport {
            input: Cursor::new(replies.concat()),
            written: written.clone(),
            shut_down: shut_down.clone(),
        };
        let core = ConnectionCore::establish(Box::new(transport), &ClientConfig::default());
        (core, Script { written, shut_down })
    }

    #[test]
    fn test_establish_selects_server_ccsid() {
        let (core, script) = core_with(vec![encode_reply(1, attributes(500))]);
        let core = core.unwrap();
        assert_eq!(core.ccsid(), 500);
        assert_eq!(core.preferred_ccsid(), 37);
        assert_eq!(core.attributes().job_name, "QZDASOINIT");
        assert_eq!(core.next_request_id(), 2);
        assert!(core.is_usable());

        let sent = script.sent_requests();
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            sent[0],
            (1, Request::ExchangeAttributes {
                preferred_ccsid: 37,
                ..
            })
        ));
    }

    #[test]
    fn test_establish_unsupported_server_ccsid() {
        let (core, _) = core_with(vec![encode_reply(1, attributes(1208))]);
        assert!(matches!(core, Err(ClientError::UnsupportedCodePage(1208))));
    }

    #[test]
    fn test_out_of_sequence_reply_drops_core() {
        let (core, script) = core_with(vec![
            encode_reply(1, attributes(37)),
            encode_reply(7, Reply::ReturnCode(ReturnCode::success(0))),
        ]);
        let mut core = core.unwrap();

        let err = core.commit().unwrap_err();
        assert!(matches!(
            err,
            ClientError::OutOfSequence {
                expected: 2,
                actual: 7
            }
        ));
        assert!(err.is_fatal());
        assert!(!core.is_usable());
        assert_eq!(core.state(), CoreState::Dropped);
        assert!(script.is_shut_down());

        assert!(matches!(
            core.rollback(),
            Err(ClientError::ConnectionDropped(_))
        ));
    }

    #[test]
    fn test_unknown_reply_stream_is_fatal() {
        let unknown = DataStream::new(2, 0x9999, Vec::new()).encode().unwrap().to_vec();
        let (core, _) = core_with(vec![encode_reply(1, attributes(37)), unknown]);
        let mut core = core.unwrap();

        assert!(matches!(
            core.commit(),
            Err(ClientError::UnknownReplyStream(0x9999))
        ));
        assert!(!core.is_usable());
    }

    #[test]
    fn test_eof_mid_reply_drops_core() {
        let mut partial = encode_reply(2, Reply::ReturnCode(ReturnCode::success(0)));
        partial.truncate(9);
        let (core, _) = core_with(vec![encode_reply(1, attributes(37)), partial]);
        let mut core = core.unwrap();

        assert!(matches!(
            core.commit(),
            Err(ClientError::ConnectionDropped(_))
        ));
        assert_eq!(core.request_state(), RequestState::Dropped);
        assert!(!core.is_usable());
    }

    #[test]
    fn test_host_error_keeps_core_usable() {
        let (core, _) = core_with(vec![
            encode_reply(1, attributes(37)),
            encode_reply(2, Reply::ReturnCode(ReturnCode::error(-204, "not found"))),
            encode_reply(3, Reply::ReturnCode(ReturnCode::success(0))),
        ]);
        let mut core = core.unwrap();

        let err = core.update("DELETE FROM T", &[]).unwrap_err();
        assert!(matches!(err, ClientError::Host { code: -204, .. }));
        assert!(core.is_usable());
        assert!(core.commit().unwrap().is_success());
        assert_eq!(core.request_state(), RequestState::Completed);
    }

    #[test]
    fn test_submit_and_drain_in_order() {
        let (core, script) = core_with(vec![
            encode_reply(1, attributes(37)),
            encode_reply(2, Reply::ReturnCode(ReturnCode::success(1))),
            encode_reply(3, Reply::ReturnCode(ReturnCode::success(2))),
            encode_reply(4, Reply::ReturnCode(ReturnCode::success(0))),
        ]);
        let mut core = core.unwrap();

        core.submit(&Request::Execute {
            statement: "A".into(),
            parameters: vec![],
        })
        .unwrap();
        core.submit(&Request::Execute {
            statement: "B".into(),
            parameters: vec![],
        })
        .unwrap();
        assert_eq!(core.pending_count(), 2);
        // Both requests are on the wire before any reply is read
        assert_eq!(script.sent_requests().len(), 3);

        // A fresh request drains the chain first
        core.commit().unwrap();
        assert_eq!(core.pending_count(), 0);

        let ids: Vec<u16> = script.sent_requests().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_execute_batch_collects_update_counts() {
        let (core, _) = core_with(vec![
            encode_reply(1, attributes(37)),
            encode_reply(2, Reply::ReturnCode(ReturnCode::success(3))),
            encode_reply(3, Reply::ReturnCode(ReturnCode::success(5))),
        ]);
        let mut core = core.unwrap();

        let results = core.execute_batch(&["UPDATE A", "UPDATE B"]).unwrap();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], ExecuteResult::Update(3)));
        assert!(matches!(results[1], ExecuteResult::Update(5)));
    }

    #[test]
    fn test_request_id_wraps() {
        let (core, _) = core_with(vec![
            encode_reply(1, attributes(37)),
            encode_reply(0xFFFF, Reply::ReturnCode(ReturnCode::success(0))),
            encode_reply(0, Reply::ReturnCode(ReturnCode::success(0))),
        ]);
        let mut core = core.unwrap();
        core.next_request_id = 0xFFFF;

        core.commit().unwrap();
        assert_eq!(core.next_request_id(), 0);
        core.commit().unwrap();
        assert_eq!(core.next_request_id(), 1);
    }

    #[test]
    fn test_list_directory_follows_continuations() {
        let modified = chrono::DateTime::from_timestamp_millis(0).unwrap();
        let entry = |name: &str| DirectoryEntry {
            name: name.to_string(),
            kind: EntryKind::File,
            size: 1,
            modified,
            data_ccsid: 37,
        };
        let (core, script) = core_with(vec![
            encode_reply(1, attributes(37)),
            encode_reply(
                2,
                Reply::DirectoryBatch(DirectoryBatch {
                    more: true,
                    entries: vec![entry("a"), entry("b")],
                }),
            ),
            encode_reply(
                3,
                Reply::DirectoryBatch(DirectoryBatch {
                    more: false,
                    entries: vec![entry("c")],
                }),
            ),
        ]);
        let mut core = core.unwrap();

        let entries = core.list_directory("/home", "*").unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let sent = script.sent_requests();
        assert!(matches!(sent[1].1, Request::ListDirectory { .. }));
        assert_eq!(sent[2].1, Request::ListContinue);
    }

    #[test]
    fn test_close_sends_end_session_once() {
        let (core, script) = core_with(vec![encode_reply(1, attributes(37))]);
        let mut core = core.unwrap();

        core.close();
        core.close();
        assert_eq!(core.state(), CoreState::Closed);
        assert!(script.is_shut_down());

        let sent = script.sent_requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].1, Request::EndSession);
        assert!(core.commit().is_err());
    }
}
