//! Revocable access to a pooled session.

use crate::connection::ConnectionCore;
use crate::error::ClientError;
use crate::pool::PoolShared;
use crate::result::{ExecuteResult, ResultSet};
use hostlink_protocol::{
    DirectoryEntry, Parameter, ProgramCall, ProgramOutput, Reply, Request, ReturnCode,
    ServerAttributes,
};
use std::fmt;
use std::sync::Arc;

/// A checked-out session.
///
/// The handle holds its core exclusively until [`close`](Self::close) or drop,
/// which give the core back to the pool. After that every operation fails
/// with [`ClientError::HandleInvalid`]; a closed handle never reaches a core
/// again.
pub struct ConnectionHandle {
    core: Option<ConnectionCore>,
    lease: u64,
    pool: Arc<PoolShared>,
}

impl ConnectionHandle {
    pub(crate) fn new(core: ConnectionCore, lease: u64, pool: Arc<PoolShared>) -> Self {
        Self {
            core: Some(core),
            lease,
            pool,
        }
    }

    /// Identifies this checkout; never reused within a pool.
    pub fn lease_id(&self) -> u64 {
        self.lease
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_none()
    }

    fn validate(&mut self) -> Result<&mut ConnectionCore, ClientError> {
        self.core.as_mut().ok_or(ClientError::HandleInvalid)
    }

    fn validate_ref(&self) -> Result<&ConnectionCore, ClientError> {
        self.core.as_ref().ok_or(ClientError::HandleInvalid)
    }

    /// Returns the core to the pool. Later calls do nothing.
    pub fn close(&mut self) {
        if let Some(core) = self.core.take() {
            tracing::debug!("Lease {}: releasing session {}", self.lease, core.id());
            self.pool.release(core);
        }
    }

    pub fn core_id(&self) -> Result<u64, ClientError> {
        Ok(self.validate_ref()?.id())
    }

    pub fn attributes(&self) -> Result<&ServerAttributes, ClientError> {
        Ok(self.validate_ref()?.attributes())
    }

    pub fn ccsid(&self) -> Result<u32, ClientError> {
        Ok(self.validate_ref()?.ccsid())
    }

    pub fn is_usable(&self) -> Result<bool, ClientError> {
        Ok(self.validate_ref()?.is_usable())
    }

    pub fn max_field_size(&self) -> Result<usize, ClientError> {
        Ok(self.validate_ref()?.max_field_size())
    }

    pub fn set_max_field_size(&mut self, size: usize) -> Result<(), ClientError> {
        self.validate()?.set_max_field_size(size);
        Ok(())
    }

    pub fn exchange(&mut self, request: &Request) -> Result<Reply, ClientError> {
        self.validate()?.exchange(request)
    }

    pub fn submit(&mut self, request: &Request) -> Result<u16, ClientError> {
        self.validate()?.submit(request)
    }

    pub fn drain(&mut self) -> Result<Vec<Reply>, ClientError> {
        self.validate()?.drain()
    }

    pub fn commit(&mut self) -> Result<ReturnCode, ClientError> {
        self.validate()?.commit()
    }

    pub fn rollback(&mut self) -> Result<ReturnCode, ClientError> {
        self.validate()?.rollback()
    }

    pub fn execute(
        &mut self,
        statement: &str,
        parameters: &[Parameter],
    ) -> Result<ExecuteResult, ClientError> {
        self.validate()?.execute(statement, parameters)
    }

    pub fn query(
        &mut self,
        statement: &str,
        parameters: &[Parameter],
    ) -> Result<ResultSet, ClientError> {
        self.validate()?.query(statement, parameters)
    }

    pub fn update(
        &mut self,
        statement: &str,
        parameters: &[Parameter],
    ) -> Result<i64, ClientError> {
        self.validate()?.update(statement, parameters)
    }

    pub fn execute_batch<S: AsRef<str>>(
        &mut self,
        statements: &[S],
    ) -> Result<Vec<ExecuteResult>, ClientError> {
        self.validate()?.execute_batch(statements)
    }

    pub fn list_directory(
        &mut self,
        path: &str,
        pattern: &str,
    ) -> Result<Vec<DirectoryEntry>, ClientError> {
        self.validate()?.list_directory(path, pattern)
    }

    pub fn call_program(&mut self, call: &ProgramCall) -> Result<ProgramOutput, ClientError> {
        self.validate()?.call_program(call)
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("lease", &self.lease)
            .field("core", &self.core)
            .finish()
    }
}
