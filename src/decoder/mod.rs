//! The public decoder: opens a QSH source, reads the file and stream
//! headers once, then hands out one frame/record at a time.

mod ord_log;
mod streams;

use std::path::Path;

use crate::delta::growing_millis;
use crate::error::Result;
use crate::header::{FileHeader, StreamHeader, StreamType};
use crate::primitive::Reader;
use crate::records::{
    AuxInfoEntry, DealEntry, Message, OrdLogEntry, OwnOrder, OwnTrade, QuotesSnapshot,
};
use crate::source;
use crate::timestamp::{self, Timestamp};

use ord_log::OrdLogState;
use streams::{AuxInfoState, DealsState, OwnTradesState, QuotesState};

/// Decodes one QSH recording: the file header, the stream header table, and
/// the frames that follow, stream by stream, in file order.
///
/// Per-stream decoder state (last-values, the reconstructed book) is kept
/// one instance per stream type, since a QSH file never multiplexes more
/// than one stream of the same type.
pub struct Decoder {
    reader: Reader,
    file_header: FileHeader,
    stream_headers: Vec<StreamHeader>,
    last_frame_ms: i64,
    ord_log: OrdLogState,
    deals: DealsState,
    aux_info: AuxInfoState,
    quotes: QuotesState,
    own_trades: OwnTradesState,
}

impl Decoder {
    /// Opens `path`, decompressing it first if it is gzip-framed, and reads
    /// the file header and stream header table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let source = source::open(path)?;
        Self::from_source(source)
    }

    /// Builds a decoder directly from already-decompressed bytes.
    pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
        let source = source::from_bytes(raw)?;
        Self::from_source(source)
    }

    fn from_source(source: crate::source::Source) -> Result<Self> {
        let mut reader = Reader::new(source);

        // The signature itself was already validated by `source::open`; skip
        // past it here.
        reader.seek(source::SIGNATURE.len() as u64)?;

        let version = reader.u8()?;
        let application = reader.string()?;
        let comment = reader.string()?;
        let created_at = reader.timestamp_absolute()?;
        let streams_count = reader.u8()?;

        tracing::debug!(version, streams_count, "read QSH file header");

        let file_header = FileHeader {
            version,
            application,
            comment,
            created_at,
            streams_count,
        };

        let mut stream_headers = Vec::with_capacity(streams_count as usize);
        for _ in 0..streams_count {
            let stream_type = StreamType::from_byte(reader.u8()?)?;
            let instrument_code = if matches!(stream_type, StreamType::Messages) {
                None
            } else {
                Some(reader.string()?)
            };
            tracing::debug!(?stream_type, ?instrument_code, "read stream header");
            stream_headers.push(StreamHeader {
                stream_type,
                instrument_code,
            });
        }

        let initial_ms = timestamp::to_millis(created_at);

        Ok(Self {
            reader,
            file_header,
            stream_headers,
            last_frame_ms: initial_ms,
            ord_log: OrdLogState::default(),
            deals: DealsState::default(),
            aux_info: AuxInfoState::default(),
            quotes: QuotesState::default(),
            own_trades: OwnTradesState::default(),
        })
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.file_header
    }

    pub fn stream_headers(&self) -> &[StreamHeader] {
        &self.stream_headers
    }

    /// Reads one frame header: a growing-delta millisecond timestamp
    /// relative to the running frame clock, and the index of the stream
    /// (into [`Decoder::stream_headers`]) the following record belongs to.
    ///
    /// The stream-index byte is only present when the file multiplexes more
    /// than one stream; a single-stream file omits it and every frame
    /// implicitly belongs to stream 0.
    pub fn read_frame_header(&mut self) -> Result<(Timestamp, u8)> {
        self.last_frame_ms = growing_millis(&mut self.reader, self.last_frame_ms)?;
        let stream_index = if self.stream_headers.len() > 1 {
            self.reader.u8()?
        } else {
            0
        };
        tracing::trace!(stream_index, ms = self.last_frame_ms, "read frame header");
        Ok((timestamp::from_millis(self.last_frame_ms), stream_index))
    }

    /// Decodes one order-log record, along with whatever the book
    /// reconstruction derives from it: a defensive snapshot of the book as
    /// of the last end-of-transaction, a synthesized deal if a new
    /// `deal_id` was observed, and an aux-info record if this was an
    /// end-of-transaction frame.
    pub fn read_ord_log_data(
        &mut self,
    ) -> Result<(
        OrdLogEntry,
        QuotesSnapshot,
        Option<DealEntry>,
        Option<AuxInfoEntry>,
    )> {
        let decoded = self.ord_log.decode(&mut self.reader)?;
        Ok((decoded.entry, decoded.quotes, decoded.deal, decoded.aux_info))
    }

    pub fn read_deals_data(&mut self) -> Result<DealEntry> {
        self.deals.decode(&mut self.reader)
    }

    pub fn read_auxinfo_data(&mut self) -> Result<AuxInfoEntry> {
        self.aux_info.decode(&mut self.reader)
    }

    /// Decodes one quotes-stream delta batch and returns a defensive copy of
    /// the accumulated book, consistent with how the order-log stream hands
    /// out its own book snapshots.
    pub fn read_quotes_data(&mut self) -> Result<QuotesSnapshot> {
        self.quotes.decode(&mut self.reader)
    }

    /// Decodes one own-order record, or `None` if this record is a
    /// `DROP_ALL` marker (own orders carry no last-value state, so there is
    /// nothing to reset).
    pub fn read_own_orders_data(&mut self) -> Result<Option<OwnOrder>> {
        streams::decode_own_order(&mut self.reader)
    }

    pub fn read_own_trades_data(&mut self) -> Result<OwnTrade> {
        self.own_trades.decode(&mut self.reader)
    }

    pub fn read_message_data(&mut self) -> Result<Message> {
        streams::decode_message(&mut self.reader)
    }

    pub fn tell(&mut self) -> Result<u64> {
        self.reader.tell()
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.reader.seek(pos)
    }

    /// Releases the underlying buffer. With a fully-buffered [`Source`]
    /// there is no file handle to release explicitly - ordinary `Drop`
    /// glue already frees the decompressed bytes - but `close` is kept as
    /// an explicit, named consuming step so callers don't need to know
    /// that detail.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_header(streams_count: u8) -> Vec<u8> {
        let mut bytes = crate::source::SIGNATURE.to_vec();
        bytes.push(1);
        bytes.push(0);
        bytes.push(0);
        bytes.extend_from_slice(&0i64.to_le_bytes());
        bytes.push(streams_count);
        bytes
    }

    #[test]
    fn single_stream_frame_header_has_no_index_byte() {
        let mut bytes = file_header(1);
        bytes.push(112); // OrdLog
        bytes.push(0); // empty instrument code
        bytes.push(5); // frame growing-delta ms

        let mut decoder = Decoder::from_bytes(bytes).unwrap();
        let (_, stream_index) = decoder.read_frame_header().unwrap();
        assert_eq!(stream_index, 0);
        // Nothing left to read beyond the one delta byte just consumed.
        assert!(matches!(decoder.read_frame_header(), Err(crate::error::Error::EndOfStream)));
    }

    #[test]
    fn multi_stream_frame_header_reads_an_index_byte() {
        let mut bytes = file_header(2);
        bytes.push(112); // OrdLog
        bytes.push(0);
        bytes.push(96); // AuxInfo
        bytes.push(0);
        bytes.push(5); // frame growing-delta ms
        bytes.push(1); // stream_index = 1

        let mut decoder = Decoder::from_bytes(bytes).unwrap();
        let (_, stream_index) = decoder.read_frame_header().unwrap();
        assert_eq!(stream_index, 1);
    }
}
