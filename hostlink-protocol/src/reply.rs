//! Host-to-client replies.
//!
//! The set of reply kinds is closed. A reply op code outside it is
//! [`ProtocolError::UnknownReplyStream`], which the client treats as fatal for
//! the connection.

use crate::error::ProtocolError;
use crate::fields::{codec_for, BodyReader, BodyWriter};
use crate::frame::DataStream;
use chrono::{DateTime, Utc};
use hostlink_codepage::TextCodec;
use hostlink_types::{RowLayout, SqlType, SqlValue};

/// Reply op codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ReplyOp {
    Attributes = 0x9001,
    ReturnCode = 0x9002,
    ResultSet = 0x9003,
    DirectoryBatch = 0x9004,
    ProgramOutput = 0x9005,
}

impl TryFrom<u16> for ReplyOp {
    type Error = ProtocolError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x9001 => Ok(ReplyOp::Attributes),
            0x9002 => Ok(ReplyOp::ReturnCode),
            0x9003 => Ok(ReplyOp::ResultSet),
            0x9004 => Ok(ReplyOp::DirectoryBatch),
            0x9005 => Ok(ReplyOp::ProgramOutput),
            _ => Err(ProtocolError::UnknownReplyStream(value)),
        }
    }
}

/// Server attributes returned by the attribute exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAttributes {
    pub server_ccsid: u32,
    pub datastream_level: u16,
    pub server_version: u32,
    pub job_name: String,
}

/// Completion status of a statement or transaction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnCode {
    /// 0 success, 1 warning, 2 and above error.
    pub class: u16,
    pub code: i32,
    pub update_count: i64,
    pub message: String,
}

impl ReturnCode {
    pub fn success(update_count: i64) -> Self {
        Self {
            class: 0,
            code: 0,
            update_count,
            message: String::new(),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            class: 2,
            code,
            update_count: 0,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.class == 0
    }

    pub fn is_warning(&self) -> bool {
        self.class == 1
    }

    pub fn is_error(&self) -> bool {
        self.class >= 2
    }
}

/// Describes one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: SqlType,
    /// Descriptor CCSID; 0 means the connection CCSID.
    pub ccsid: u32,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            ccsid: sql_type.descriptor_ccsid(0),
        }
    }

    pub fn with_ccsid(mut self, ccsid: u32) -> Self {
        self.ccsid = self.sql_type.descriptor_ccsid(ccsid);
        self
    }
}

/// Column descriptors and decoded rows of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultData {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultData {
    fn layout(columns: &[ColumnDescriptor], codec: &TextCodec) -> Result<RowLayout, ProtocolError> {
        let slots = columns
            .iter()
            .map(|col| Ok((col.sql_type, codec_for(col.ccsid, codec)?)))
            .collect::<Result<Vec<_>, ProtocolError>>()?;
        Ok(RowLayout::new(slots))
    }
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryKind {
    File = 0,
    Directory = 1,
    Symlink = 2,
}

impl TryFrom<u8> for EntryKind {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EntryKind::File),
            1 => Ok(EntryKind::Directory),
            2 => Ok(EntryKind::Symlink),
            _ => Err(ProtocolError::InvalidValue {
                field: "entry kind",
                value: value as u64,
            }),
        }
    }
}

/// One record of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: DateTime<Utc>,
    /// CCSID tag of the file's data.
    pub data_ccsid: u32,
}

/// One batch of a directory listing; `more` asks for a ListContinue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBatch {
    pub more: bool,
    pub entries: Vec<DirectoryEntry>,
}

/// A message the host program left in the job log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMessage {
    pub id: String,
    pub text: String,
}

/// Result of a program call. Parameters come back in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOutput {
    pub return_class: u16,
    pub parameters: Vec<Vec<u8>>,
    pub messages: Vec<HostMessage>,
}

impl ProgramOutput {
    pub fn succeeded(&self) -> bool {
        self.return_class == 0
    }
}

/// A reply stream body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Attributes(ServerAttributes),
    ReturnCode(ReturnCode),
    ResultSet(ResultData),
    DirectoryBatch(DirectoryBatch),
    ProgramOutput(ProgramOutput),
}

impl Reply {
    pub fn op(&self) -> ReplyOp {
        match self {
            Reply::Attributes(_) => ReplyOp::Attributes,
            Reply::ReturnCode(_) => ReplyOp::ReturnCode,
            Reply::ResultSet(_) => ReplyOp::ResultSet,
            Reply::DirectoryBatch(_) => ReplyOp::DirectoryBatch,
            Reply::ProgramOutput(_) => ReplyOp::ProgramOutput,
        }
    }

    pub fn name(&self) -> &'static str {
        match self.op() {
            ReplyOp::Attributes => "ATTRIBUTES",
            ReplyOp::ReturnCode => "RETURN_CODE",
            ReplyOp::ResultSet => "RESULT_SET",
            ReplyOp::DirectoryBatch => "DIRECTORY_BATCH",
            ReplyOp::ProgramOutput => "PROGRAM_OUTPUT",
        }
    }

    /// Decodes a reply stream, converting text with `codec`.
    pub fn decode(stream: &DataStream, codec: &TextCodec) -> Result<Self, ProtocolError> {
        let op = ReplyOp::try_from(stream.op_code)?;
        let mut r = BodyReader::new(stream.op_code, stream.body.clone(), codec);
        let reply = match op {
            ReplyOp::Attributes => Reply::Attributes(ServerAttributes {
                server_ccsid: r.u32("server ccsid")?,
                datastream_level: r.u16("datastream level")?,
                server_version: r.u32("server version")?,
                job_name: r.var_text("job name")?,
            }),
            ReplyOp::ReturnCode => Reply::ReturnCode(ReturnCode {
                class: r.u16("return class")?,
                code: r.i32("return code")?,
                update_count: r.i64("update count")?,
                message: r.var_text("message")?,
            }),
            ReplyOp::ResultSet => Reply::ResultSet(decode_result_set(&mut r)?),
            ReplyOp::DirectoryBatch => {
                let more = r.u8("more flag")? != 0;
                let count = r.u16("entry count")?;
                let mut entries = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let name = r.var_text("entry name")?;
                    let kind = EntryKind::try_from(r.u8("entry kind")?)?;
                    let size = r.u64("entry size")?;
                    let millis = r.i64("modified time")?;
                    let modified = DateTime::from_timestamp_millis(millis).ok_or(
                        ProtocolError::InvalidValue {
                            field: "modified time",
                            value: millis as u64,
                        },
                    )?;
                    entries.push(DirectoryEntry {
                        name,
                        kind,
                        size,
                        modified,
                        data_ccsid: r.u16("data ccsid")? as u32,
                    });
                }
                Reply::DirectoryBatch(DirectoryBatch { more, entries })
            }
            ReplyOp::ProgramOutput => {
                let return_class = r.u16("return class")?;
                let count = r.u16("parameter count")?;
                let mut parameters = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    parameters.push(r.var_bytes("parameter data")?.to_vec());
                }
                let count = r.u16("message count")?;
                let mut messages = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    messages.push(HostMessage {
                        id: r.var_text("message id")?,
                        text: r.var_text("message text")?,
                    });
                }
                Reply::ProgramOutput(ProgramOutput {
                    return_class,
                    parameters,
                    messages,
                })
            }
        };
        r.finish()?;
        Ok(reply)
    }

    /// Encodes the reply as a stream answering `request_id`.
    pub fn encode(&self, request_id: u16, codec: &TextCodec) -> Result<DataStream, ProtocolError> {
        let mut w = BodyWriter::new(codec);
        match self {
            Reply::Attributes(attrs) => {
                w.u32(attrs.server_ccsid)
                    .u16(attrs.datastream_level)
                    .u32(attrs.server_version)
                    .var_text("job name", &attrs.job_name)?;
            }
            Reply::ReturnCode(rc) => {
                w.u16(rc.class)
                    .i32(rc.code)
                    .i64(rc.update_count)
                    .var_text("message", &rc.message)?;
            }
            Reply::ResultSet(data) => encode_result_set(&mut w, data)?,
            Reply::DirectoryBatch(batch) => {
                w.u8(batch.more as u8)
                    .count("entry count", batch.entries.len())?;
                for entry in &batch.entries {
                    w.var_text("entry name", &entry.name)?
                        .u8(entry.kind as u8)
                        .u64(entry.size)
                        .i64(entry.modified.timestamp_millis())
                        .ccsid(entry.data_ccsid)?;
                }
            }
            Reply::ProgramOutput(output) => {
                w.u16(output.return_class)
                    .count("parameter count", output.parameters.len())?;
                for parm in &output.parameters {
                    w.var_bytes("parameter data", parm)?;
                }
                w.count("message count", output.messages.len())?;
                for msg in &output.messages {
                    w.var_text("message id", &msg.id)?
                        .var_text("message text", &msg.text)?;
                }
            }
        }
        Ok(DataStream::new(request_id, self.op() as u16, w.finish()))
    }
}

fn decode_result_set(r: &mut BodyReader<'_>) -> Result<ResultData, ProtocolError> {
    let count = r.u16("column count")?;
    let mut columns = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let type_id = r.u16("column type")?;
        let length = r.u16("column length")?;
        let ccsid = r.u16("column ccsid")? as u32;
        let name = r.var_text("column name")?;
        columns.push(ColumnDescriptor {
            name,
            sql_type: SqlType::from_descriptor(type_id, length, ccsid)?,
            ccsid,
        });
    }
    let layout = ResultData::layout(&columns, r.codec())?;

    let row_count = r.u32("row count")? as usize;
    let row_len = r.u32("row length")? as usize;
    if row_len != layout.row_len() {
        return Err(ProtocolError::RowLength {
            expected: layout.row_len(),
            actual: row_len,
        });
    }
    // Every row occupies row_len bytes of what is left
    if row_count > 0 && (row_len == 0 || row_count > r.remaining() / row_len) {
        return Err(ProtocolError::InvalidValue {
            field: "row count",
            value: row_count as u64,
        });
    }
    let mut rows = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let raw = r.take("result row", row_len)?;
        rows.push(layout.decode_row(&raw)?);
    }
    Ok(ResultData { columns, rows })
}

fn encode_result_set(w: &mut BodyWriter<'_>, data: &ResultData) -> Result<(), ProtocolError> {
    w.count("column count", data.columns.len())?;
    for col in &data.columns {
        w.u16(col.sql_type.native_type_id())
            .count("column length", col.sql_type.max_length())?
            .ccsid(col.ccsid)?
            .var_text("column name", &col.name)?;
    }
    let layout = ResultData::layout(&data.columns, w.codec())?;
    w.u32(data.rows.len() as u32).u32(layout.row_len() as u32);
    for row in &data.rows {
        let raw = layout.encode_row(row)?;
        w.raw(&raw);
    }
    Ok(())
}
