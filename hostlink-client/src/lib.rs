//! # hostlink-client
//!
//! Client library for hostlink.
//!
//! This crate provides:
//! - Blocking sessions over TCP with optional TLS
//! - Request/reply correlation with explicit request chaining
//! - A bounded connection pool handing out revocable handles
//! - Configuration from YAML files and environment variables

pub mod config;
pub mod connection;
pub mod error;
pub mod handle;
pub mod pool;
pub mod result;
pub mod tls;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, ConfigError, ExhaustedPolicy, PoolConfig, TlsClientConfig};
pub use connection::{ConnectionCore, CoreState, RequestState};
pub use error::ClientError;
pub use handle::ConnectionHandle;
pub use pool::{ConnectionPool, Connector, PoolStatus, TcpConnector};
pub use result::{ExecuteResult, ResultSet, Row};
pub use transport::{ClientStream, Transport};

pub use hostlink_protocol::{
    DirectoryEntry, EntryKind, HostMessage, Parameter, ProgramCall, ProgramOutput,
    ProgramParameter, ReturnCode, ServerAttributes,
};
pub use hostlink_types::{Read, SqlInput, SqlType, SqlValue};
