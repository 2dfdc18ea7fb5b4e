//! Client-to-host requests.

use crate::error::ProtocolError;
use crate::fields::{codec_for, BodyReader, BodyWriter};
use crate::frame::DataStream;
use hostlink_codepage::{TextCodec, BIT_DATA_CCSID};
use hostlink_types::{RowLayout, SqlType, SqlValue};

/// Request op codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RequestOp {
    ExchangeAttributes = 0x1001,
    Commit = 0x1002,
    Rollback = 0x1003,
    Execute = 0x1004,
    ListDirectory = 0x1005,
    ListContinue = 0x1006,
    CallProgram = 0x1007,
    EndSession = 0x10FF,
}

impl TryFrom<u16> for RequestOp {
    type Error = ProtocolError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x1001 => Ok(RequestOp::ExchangeAttributes),
            0x1002 => Ok(RequestOp::Commit),
            0x1003 => Ok(RequestOp::Rollback),
            0x1004 => Ok(RequestOp::Execute),
            0x1005 => Ok(RequestOp::ListDirectory),
            0x1006 => Ok(RequestOp::ListContinue),
            0x1007 => Ok(RequestOp::CallProgram),
            0x10FF => Ok(RequestOp::EndSession),
            _ => Err(ProtocolError::UnknownRequestStream(value)),
        }
    }
}

/// A statement parameter with an optional CCSID override for text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub value: SqlValue,
    pub ccsid: Option<u32>,
}

impl Parameter {
    pub fn new(value: SqlValue) -> Self {
        Self { value, ccsid: None }
    }

    pub fn with_ccsid(mut self, ccsid: u32) -> Self {
        self.ccsid = Some(ccsid);
        self
    }
}

impl From<SqlValue> for Parameter {
    fn from(value: SqlValue) -> Self {
        Self::new(value)
    }
}

/// How a program parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ParameterUsage {
    Input = 1,
    Output = 2,
    InputOutput = 3,
}

impl TryFrom<u8> for ParameterUsage {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ParameterUsage::Input),
            2 => Ok(ParameterUsage::Output),
            3 => Ok(ParameterUsage::InputOutput),
            _ => Err(ProtocolError::InvalidValue {
                field: "parameter usage",
                value: value as u64,
            }),
        }
    }
}

/// One parameter of a program call. Data is passed as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramParameter {
    pub usage: ParameterUsage,
    pub output_len: u32,
    pub data: Vec<u8>,
}

impl ProgramParameter {
    pub fn input(data: impl Into<Vec<u8>>) -> Self {
        Self {
            usage: ParameterUsage::Input,
            output_len: 0,
            data: data.into(),
        }
    }

    pub fn output(output_len: u32) -> Self {
        Self {
            usage: ParameterUsage::Output,
            output_len,
            data: Vec::new(),
        }
    }

    pub fn input_output(data: impl Into<Vec<u8>>, output_len: u32) -> Self {
        Self {
            usage: ParameterUsage::InputOutput,
            output_len,
            data: data.into(),
        }
    }
}

/// A host program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramCall {
    pub library: String,
    pub program: String,
    pub parameters: Vec<ProgramParameter>,
}

impl ProgramCall {
    pub fn new(library: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            program: program.into(),
            parameters: Vec::new(),
        }
    }

    pub fn parameter(mut self, parameter: ProgramParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// A request stream body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ExchangeAttributes {
        preferred_ccsid: u32,
        datastream_level: u16,
        client_name: String,
    },
    Commit,
    Rollback,
    Execute {
        statement: String,
        parameters: Vec<Parameter>,
    },
    ListDirectory {
        path: String,
        pattern: String,
        batch_size: u16,
    },
    ListContinue,
    CallProgram(ProgramCall),
    EndSession,
}

impl Request {
    pub fn op(&self) -> RequestOp {
        match self {
            Request::ExchangeAttributes { .. } => RequestOp::ExchangeAttributes,
            Request::Commit => RequestOp::Commit,
            Request::Rollback => RequestOp::Rollback,
            Request::Execute { .. } => RequestOp::Execute,
            Request::ListDirectory { .. } => RequestOp::ListDirectory,
            Request::ListContinue => RequestOp::ListContinue,
            Request::CallProgram(_) => RequestOp::CallProgram,
            Request::EndSession => RequestOp::EndSession,
        }
    }

    /// Whether the host answers this request. `EndSession` is fire-and-forget.
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Request::EndSession)
    }

    pub fn name(&self) -> &'static str {
        match self.op() {
            RequestOp::ExchangeAttributes => "EXCHANGE_ATTRIBUTES",
            RequestOp::Commit => "COMMIT",
            RequestOp::Rollback => "ROLLBACK",
            RequestOp::Execute => "EXECUTE",
            RequestOp::ListDirectory => "LIST_DIRECTORY",
            RequestOp::ListContinue => "LIST_CONTINUE",
            RequestOp::CallProgram => "CALL_PROGRAM",
            RequestOp::EndSession => "END_SESSION",
        }
    }

    /// Encodes the request as a stream tagged with `request_id`.
    pub fn encode(&self, request_id: u16, codec: &TextCodec) -> Result<DataStream, ProtocolError> {
        let mut w = BodyWriter::new(codec);
        match self {
            Request::ExchangeAttributes {
                preferred_ccsid,
                datastream_level,
                client_name,
            } => {
                w.u32(*preferred_ccsid)
                    .u16(*datastream_level)
                    .var_text("client name", client_name)?;
            }
            Request::Commit | Request::Rollback | Request::ListContinue | Request::EndSession => {}
            Request::Execute {
                statement,
                parameters,
            } => encode_execute(&mut w, statement, parameters)?,
            Request::ListDirectory {
                path,
                pattern,
                batch_size,
            } => {
                w.var_text("path", path)?
                    .var_text("pattern", pattern)?
                    .u16(*batch_size);
            }
            Request::CallProgram(call) => {
                w.var_text("library", &call.library)?
                    .var_text("program", &call.program)?
                    .count("parameter count", call.parameters.len())?;
                for parm in &call.parameters {
                    w.u8(parm.usage as u8)
                        .u32(parm.output_len)
                        .var_bytes("parameter data", &parm.data)?;
                }
            }
        }
        Ok(DataStream::new(request_id, self.op() as u16, w.finish()))
    }

    /// Decodes a request stream. Used by host-side tooling and tests.
    pub fn decode(stream: &DataStream, codec: &TextCodec) -> Result<Self, ProtocolError> {
        let op = RequestOp::try_from(stream.op_code)?;
        let mut r = BodyReader::new(stream.op_code, stream.body.clone(), codec);
        let request = match op {
            RequestOp::ExchangeAttributes => Request::ExchangeAttributes {
                preferred_ccsid: r.u32("preferred ccsid")?,
                datastream_level: r.u16("datastream level")?,
                client_name: r.var_text("client name")?,
            },
            RequestOp::Commit => Request::Commit,
            RequestOp::Rollback => Request::Rollback,
            RequestOp::Execute => decode_execute(&mut r)?,
            RequestOp::ListDirectory => Request::ListDirectory {
                path: r.var_text("path")?,
                pattern: r.var_text("pattern")?,
                batch_size: r.u16("batch size")?,
            },
            RequestOp::ListContinue => Request::ListContinue,
            RequestOp::CallProgram => {
                let mut call = ProgramCall::new(r.var_text("library")?, r.var_text("program")?);
                let count = r.u16("parameter count")?;
                for _ in 0..count {
                    call.parameters.push(ProgramParameter {
                        usage: ParameterUsage::try_from(r.u8("parameter usage")?)?,
                        output_len: r.u32("output length")?,
                        data: r.var_bytes("parameter data")?.to_vec(),
                    });
                }
                Request::CallProgram(call)
            }
            RequestOp::EndSession => Request::EndSession,
        };
        r.finish()?;
        Ok(request)
    }
}

fn encode_execute(
    w: &mut BodyWriter<'_>,
    statement: &str,
    parameters: &[Parameter],
) -> Result<(), ProtocolError> {
    w.var_text("statement", statement)?
        .count("parameter count", parameters.len())?;

    let mut row_len = 0;
    let mut codecs = Vec::with_capacity(parameters.len());
    for param in parameters {
        let ty = param.value.sql_type();
        w.u16(ty.native_type_id())
            .count("parameter length", ty.max_length())?
            .ccsid(ty.descriptor_ccsid(param.ccsid.unwrap_or(0)))?;
        codecs.push(codec_for(param.ccsid.unwrap_or(0), w.codec())?);
        row_len += ty.wire_size();
    }

    let mut row = vec![0u8; row_len];
    let mut offset = 0;
    for (param, codec) in parameters.iter().zip(&codecs) {
        param.value.encode(&mut row, offset, codec)?;
        offset += param.value.sql_type().wire_size();
    }

    w.u32(row_len as u32).raw(&row);
    Ok(())
}

fn decode_execute(r: &mut BodyReader<'_>) -> Result<Request, ProtocolError> {
    let statement = r.var_text("statement")?;
    let count = r.u16("parameter count")?;

    let mut columns = Vec::with_capacity(count as usize);
    let mut overrides = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let type_id = r.u16("parameter type")?;
        let length = r.u16("parameter length")?;
        let ccsid = r.u16("parameter ccsid")? as u32;
        let ty = SqlType::from_descriptor(type_id, length, ccsid)?;
        columns.push((ty, codec_for(ccsid, r.codec())?));
        overrides.push((ccsid != 0 && ccsid != BIT_DATA_CCSID).then_some(ccsid));
    }
    let layout = RowLayout::new(columns);

    let row_len = r.u32("row length")? as usize;
    if row_len != layout.row_len() {
        return Err(ProtocolError::RowLength {
            expected: layout.row_len(),
            actual: row_len,
        });
    }
    let row = r.take("parameter row", row_len)?;
    let parameters = layout
        .decode_row(&row)?
        .into_iter()
        .zip(overrides)
        .map(|(value, ccsid)| Parameter { value, ccsid })
        .collect();

    Ok(Request::Execute {
        statement,
        parameters,
    })
}
