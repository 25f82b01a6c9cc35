//! The container header: the file-level signature and metadata, and the
//! per-stream headers that follow it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timestamp::Timestamp;

/// The seven stream kinds a QSH file can multiplex.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamType {
    Quotes,
    Deals,
    OwnOrders,
    OwnTrades,
    Messages,
    AuxInfo,
    OrdLog,
}

impl StreamType {
    pub(crate) fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            16 => Ok(StreamType::Quotes),
            32 => Ok(StreamType::Deals),
            48 => Ok(StreamType::OwnOrders),
            64 => Ok(StreamType::OwnTrades),
            80 => Ok(StreamType::Messages),
            96 => Ok(StreamType::AuxInfo),
            112 => Ok(StreamType::OrdLog),
            _ => Err(Error::UnsupportedFormat),
        }
    }
}

/// File-level metadata, fixed once at [`crate::Decoder::open`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHeader {
    pub version: u8,
    pub application: String,
    pub comment: String,
    pub created_at: Timestamp,
    pub streams_count: u8,
}

/// One entry of the per-stream header table, in file order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamHeader {
    pub stream_type: StreamType,
    /// Absent only when `stream_type` is [`StreamType::Messages`].
    pub instrument_code: Option<String>,
}
