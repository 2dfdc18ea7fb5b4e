//! In-memory host used by unit tests.

use crate::config::ClientConfig;
use crate::connection::ConnectionCore;
use crate::error::ClientError;
use crate::pool::Connector;
use crate::transport::Transport;
use hostlink_codepage::TextCodec;
use hostlink_protocol::{
    Decoder, DirectoryBatch, ProgramOutput, Reply, Request, ReturnCode, ServerAttributes,
};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Requests seen by every loopback host of one connector.
pub(crate) type RequestLog = Arc<Mutex<Vec<Request>>>;

/// Answers each request as soon as it is written.
pub(crate) struct LoopbackHost {
    inbound: Decoder,
    outbound: VecDeque<u8>,
    codec: TextCodec,
    log: RequestLog,
    fail_rollback: Arc<AtomicBool>,
    closed: bool,
}

impl LoopbackHost {
    fn answer(&self, request: &Request) -> Option<Reply> {
        let reply = match request {
            Request::ExchangeAttributes { .. } => Reply::Attributes(ServerAttributes {
                server_ccsid: 37,
                datastream_level: 1,
                server_version: 1,
                job_name: "LOOPBACK".to_string(),
            }),
            Request::Rollback if self.fail_rollback.load(Ordering::SeqCst) => {
                Reply::ReturnCode(ReturnCode::error(-900, "rollback failed"))
            }
            Request::Commit | Request::Rollback => Reply::ReturnCode(ReturnCode::success(0)),
            Request::Execute { .. } => Reply::ReturnCode(ReturnCode::success(1)),
            Request::ListDirectory { .. } | Request::ListContinue => {
                Reply::DirectoryBatch(DirectoryBatch {
                    more: false,
                    entries: Vec::new(),
                })
            }
            Request::CallProgram(call) => Reply::ProgramOutput(ProgramOutput {
                return_class: 0,
                parameters: call.parameters.iter().map(|p| p.data.clone()).collect(),
                messages: Vec::new(),
            }),
            Request::EndSession => return None,
        };
        Some(reply)
    }
}

impl Read for LoopbackHost {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.outbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.outbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for LoopbackHost {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.inbound.extend(buf);
        while let Some((id, request)) = self
            .inbound
            .decode_request(&self.codec)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?
        {
            if let Some(reply) = self.answer(&request) {
                let stream = reply
                    .encode(id, &self.codec)
                    .and_then(|s| s.encode())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
                self.outbound.extend(stream.iter());
            }
            self.log.lock().unwrap().push(request);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for LoopbackHost {
    fn set_read_timeout(&mut self, _: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Connector producing loopback sessions.
#[derive(Clone, Default)]
pub(crate) struct LoopbackConnector {
    pub log: RequestLog,
    pub connects: Arc<AtomicUsize>,
    pub fail_rollback: Arc<AtomicBool>,
    pub refuse: Arc<AtomicBool>,
}

impl LoopbackConnector {
    pub fn count(&self, wanted: &Request) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.op() == wanted.op())
            .count()
    }
}

impl Connector for LoopbackConnector {
    fn connect(&self) -> Result<ConnectionCore, ClientError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ClientError::Io(io::Error::from(
                io::ErrorKind::ConnectionRefused,
            )));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        let host = LoopbackHost {
            inbound: Decoder::new(),
            outbound: VecDeque::new(),
            codec: TextCodec::for_ccsid(37)?,
            log: self.log.clone(),
            fail_rollback: self.fail_rollback.clone(),
            closed: false,
        };
        ConnectionCore::establish(Box::new(host), &ClientConfig::default())
    }
}
