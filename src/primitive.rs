//! The primitive codec: fixed-width little-endian integers, ULEB128 /
//! signed LEB128 variable-length integers, length-prefixed ASCII strings,
//! and the absolute timestamp encoding. Every other layer is built on top
//! of these reads.

use std::io::{Read, Seek, SeekFrom};

use crate::error::Result;
use crate::source::Source;
use crate::timestamp::{self, Timestamp};

/// A cursor-backed reader exposing the QSH primitive value encodings.
///
/// `Reader` owns nothing beyond the position in `Source`; all higher-level
/// decoder state (last-values, masks, book state) lives above this layer.
pub(crate) struct Reader {
    source: Source,
}

impl Reader {
    pub(crate) fn new(source: Source) -> Self {
        Self { source }
    }

    pub(crate) fn tell(&mut self) -> Result<u64> {
        Ok(self.source.stream_position()?)
    }

    pub(crate) fn seek(&mut self, pos: u64) -> Result<()> {
        self.source.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.source.read_exact(buf)?;
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact_into(&mut buf)?;
        Ok(buf[0])
    }

    pub(crate) fn u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact_into(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    #[allow(dead_code)]
    pub(crate) fn u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact_into(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub(crate) fn i64_le(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.read_exact_into(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    pub(crate) fn f64_le(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact_into(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    /// Standard unsigned LEB128.
    pub(crate) fn uleb128(&mut self) -> Result<u64> {
        Ok(leb128::read::unsigned(&mut self.source)?)
    }

    /// Standard signed LEB128 (sign-extended from the terminating byte's
    /// 0x40 bit).
    pub(crate) fn leb128(&mut self) -> Result<i64> {
        Ok(leb128::read::signed(&mut self.source)?)
    }

    /// A ULEB128 length prefix followed by that many ASCII bytes.
    pub(crate) fn string(&mut self) -> Result<String> {
        let len = self.uleb128()? as usize;
        let mut buf = vec![0u8; len];
        self.read_exact_into(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// An i64 count of 100-nanosecond ticks since `0001-01-01`, converted to
    /// a [`Timestamp`].
    pub(crate) fn timestamp_absolute(&mut self) -> Result<Timestamp> {
        let ticks = self.i64_le()?;
        Ok(timestamp::from_ticks_100ns(ticks))
    }
}
