//! A streaming decoder for the QScalp History (QSH) binary market-data
//! format: the gzip-optional container, the variable-length primitive and
//! delta codecs layered on top of it, and a decoder for each of the seven
//! record streams a QSH file can multiplex.
//!
//! The order-log stream ([`Decoder::read_ord_log_data`]) carries the bulk of
//! the domain logic: besides decoding each record, it reconstructs a live
//! order book, synthesizes [`DealEntry`] events once per unique deal id, and
//! emits an [`AuxInfoEntry`] snapshot at every end-of-transaction boundary.
//!
//! ```no_run
//! use qsh_codec::Decoder;
//!
//! # fn main() -> qsh_codec::Result<()> {
//! let mut decoder = Decoder::open("recording.qsh")?;
//! for header in decoder.stream_headers() {
//!     println!("{:?}", header);
//! }
//! # Ok(())
//! # }
//! ```

mod decoder;
mod delta;
mod error;
mod header;
mod primitive;
mod records;
mod source;
mod timestamp;

pub use decoder::Decoder;
pub use error::{Error, Result};
pub use header::{FileHeader, StreamHeader, StreamType};
pub use records::{
    AuxInfoEntry, DealEntry, DealType, Message, MessageType, OrdLogActionMask, OrdLogEntry,
    OwnOrder, OwnOrderType, OwnTrade, QuotesSnapshot,
};
pub use source::SIGNATURE;
pub use timestamp::Timestamp;
