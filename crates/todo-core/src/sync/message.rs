//! Sync protocol message types
//!
//! Every message travels as one frame: a 4-byte big-endian body length
//! followed by a CBOR map tagged with a `type` field.
//!
//! Requests:  `{"type": "PUSH_TASKS", "tasks": [...]}`, `{"type": "GET_REPORT_CSV"}`
//! Responses: `{"type": "OK", "message": ..., "csv": ...}`, `{"type": "ERROR", "message": ...}`

use ciborium::Value;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::error::{SyncError, SyncResult};
use crate::models::Task;

/// Largest frame body accepted in either direction
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub const PUSH_TASKS: &str = "PUSH_TASKS";
pub const GET_REPORT_CSV: &str = "GET_REPORT_CSV";

/// Requests sent to the sync server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Replace the server's snapshot with these tasks
    #[serde(rename = "PUSH_TASKS")]
    PushTasks {
        #[serde(default)]
        tasks: Vec<Task>,
    },

    /// Ask for the CSV report of the last pushed snapshot
    #[serde(rename = "GET_REPORT_CSV")]
    GetReportCsv,
}

/// Responses from the sync server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    #[serde(rename = "OK")]
    Ok {
        message: String,
        #[serde(default)]
        csv: Option<String>,
    },

    #[serde(rename = "ERROR")]
    Error { message: String },
}

/// A request body as classified by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Request(Request),
    /// Well-formed body carrying a tag this server does not know
    Unknown(String),
    /// Known tag with a payload of the wrong shape, or no usable tag at all
    Invalid(String),
}

impl Request {
    /// Create a push request
    pub fn push_tasks(tasks: Vec<Task>) -> Self {
        Request::PushTasks { tasks }
    }

    /// Wire tag of this request
    pub fn tag(&self) -> &'static str {
        match self {
            Request::PushTasks { .. } => PUSH_TASKS,
            Request::GetReportCsv => GET_REPORT_CSV,
        }
    }

    /// Encode request to CBOR bytes
    pub fn encode(&self) -> SyncResult<Vec<u8>> {
        encode_cbor(self)
    }

    /// Decode and classify a request body.
    ///
    /// Bytes that are not CBOR at all are a protocol error; anything that
    /// parses is classified so the server can answer it.
    pub fn decode(bytes: &[u8]) -> SyncResult<Decoded> {
        let value: Value = ciborium::from_reader(bytes)
            .map_err(|e| SyncError::protocol(format!("Invalid CBOR body: {}", e)))?;

        let Some(tag) = type_tag(&value) else {
            return Ok(Decoded::Invalid("missing request type".to_string()));
        };

        if tag != PUSH_TASKS && tag != GET_REPORT_CSV {
            return Ok(Decoded::Unknown(tag.to_string()));
        }

        match value.deserialized::<Request>() {
            Ok(request) => Ok(Decoded::Request(request)),
            Err(e) => Ok(Decoded::Invalid(e.to_string())),
        }
    }
}

impl Response {
    /// Successful response with a plain message
    pub fn ok(message: impl Into<String>) -> Self {
        Response::Ok {
            message: message.into(),
            csv: None,
        }
    }

    /// Successful response carrying CSV text
    pub fn ok_with_csv(message: impl Into<String>, csv: impl Into<String>) -> Self {
        Response::Ok {
            message: message.into(),
            csv: Some(csv.into()),
        }
    }

    /// Failed response
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Response::Ok { message, .. } | Response::Error { message } => message,
        }
    }

    pub fn csv(&self) -> Option<&str> {
        match self {
            Response::Ok { csv, .. } => csv.as_deref(),
            Response::Error { .. } => None,
        }
    }

    /// Encode response to CBOR bytes
    pub fn encode(&self) -> SyncResult<Vec<u8>> {
        encode_cbor(self)
    }

    /// Decode response from CBOR bytes
    pub fn decode(bytes: &[u8]) -> SyncResult<Self> {
        ciborium::from_reader(bytes)
            .map_err(|e| SyncError::protocol(format!("Unexpected response from sync server: {}", e)))
    }
}

/// Text value of the `type` key, if the body is a map that has one
fn type_tag(value: &Value) -> Option<&str> {
    value
        .as_map()?
        .iter()
        .find(|(key, _)| key.as_text() == Some("type"))
        .and_then(|(_, tag)| tag.as_text())
}

fn encode_cbor<T: Serialize>(message: &T) -> SyncResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(message, &mut bytes)
        .map_err(|e| SyncError::protocol(format!("CBOR encoding failed: {}", e)))?;
    Ok(bytes)
}

/// Write one length-prefixed frame and flush
pub async fn write_frame<W>(writer: &mut W, body: &[u8]) -> SyncResult<()>
where
    W: AsyncWrite + Unpin,
{
    if body.len() > MAX_FRAME_LEN {
        return Err(SyncError::protocol(format!(
            "Frame of {} bytes exceeds limit of {} bytes",
            body.len(),
            MAX_FRAME_LEN
        )));
    }

    writer.write_u32(body.len() as u32).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame
///
/// A peer that closes the connection before the whole frame arrives
/// produces a protocol error.
pub async fn read_frame<R>(reader: &mut R) -> SyncResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await.map_err(truncated)? as usize;
    if len > MAX_FRAME_LEN {
        return Err(SyncError::protocol(format!(
            "Frame of {} bytes exceeds limit of {} bytes",
            len, MAX_FRAME_LEN
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(truncated)?;
    Ok(body)
}

fn truncated(e: std::io::Error) -> SyncError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        SyncError::protocol("Connection closed before a complete frame was received")
    } else {
        SyncError::Io(e)
    }
}
