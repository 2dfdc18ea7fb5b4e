//! # hostlink-protocol
//!
//! Wire protocol implementation for hostlink.
//!
//! This crate provides:
//! - DataStream framing (length + request id header, op-code led payload)
//! - Typed request and reply shapes with their body layouts
//! - A buffering decoder and blocking read/write helpers
//! - Protocol error types

pub mod codec;
pub mod error;
pub mod fields;
pub mod frame;
pub mod reply;
pub mod request;

pub use codec::{read_stream, write_stream, Decoder};
pub use error::ProtocolError;
pub use frame::{DataStream, HEADER_SIZE, OP_CODE_SIZE};
pub use reply::{
    ColumnDescriptor, DirectoryBatch, DirectoryEntry, EntryKind, HostMessage, ProgramOutput,
    Reply, ReplyOp, ResultData, ReturnCode, ServerAttributes,
};
pub use request::{Parameter, ParameterUsage, ProgramCall, ProgramParameter, Request, RequestOp};

/// Datastream level spoken by this implementation.
pub const DATASTREAM_LEVEL: u16 = 1;

/// Default host port for the database service.
pub const DEFAULT_PORT: u16 = 8471;

/// Maximum total datastream size (16 MiB).
pub const MAX_STREAM_SIZE: u32 = 16 * 1024 * 1024;
