//! The decoded record types emitted by each stream, and the availability
//! masks that gate their fields on the wire. Field read order inside each
//! decoder is fixed, independent of these bit positions: the masks only
//! say *whether* a field is present.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

bitflags! {
    /// `OrdLog` per-field availability mask (the leading `u8`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct OrdLogDataMask: u8 {
        const DATETIME          = 1;
        const ORDER_ID          = 1 << 1;
        const ORDER_PRICE       = 1 << 2;
        const AMOUNT            = 1 << 3;
        const ORDER_AMOUNT_REST = 1 << 4;
        const DEAL_ID           = 1 << 5;
        const DEAL_PRICE        = 1 << 6;
        const OI_AFTER_DEAL     = 1 << 7;
    }
}

bitflags! {
    /// `OrdLog` action mask (the trailing `u16`); also the state driving
    /// the order-book reconstructor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OrdLogActionMask: u16 {
        const NON_ZERO_REPL_ACT  = 1;
        const FLOW_START         = 1 << 1;
        const ADD                = 1 << 2;
        const FILL               = 1 << 3;
        const BUY                = 1 << 4;
        const SELL               = 1 << 5;
        const SNAPSHOT           = 1 << 6;
        const QUOTE              = 1 << 7;
        const COUNTER            = 1 << 8;
        const NON_SYSTEM         = 1 << 9;
        const END_OF_TRANSACTION = 1 << 10;
        const FILL_OR_KILL       = 1 << 11;
        const MOVED              = 1 << 12;
        const CANCELED           = 1 << 13;
        const CANCELED_GROUP     = 1 << 14;
        const CROSS_TRADE        = 1 << 15;
    }
}

bitflags! {
    /// `Deal` availability mask. Bits 0-1 are a 2-bit value (the deal
    /// type), not independent flags; mask them off separately (see
    /// [`DealType::from_mask`]).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct DealDataMask: u8 {
        const DATETIME = 1 << 2;
        const ID       = 1 << 3;
        const ORDER_ID = 1 << 4;
        const PRICE    = 1 << 5;
        const VOLUME   = 1 << 6;
        const OI       = 1 << 7;
    }
}

bitflags! {
    /// `AuxInfo` availability mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct AuxInfoDataMask: u8 {
        const DATETIME     = 1;
        const ASK_TOTAL    = 1 << 1;
        const BID_TOTAL    = 1 << 2;
        const OI           = 1 << 3;
        const PRICE        = 1 << 4;
        const SESSION_INFO = 1 << 5;
        const RATE         = 1 << 6;
        const MESSAGE      = 1 << 7;
    }
}

bitflags! {
    /// `OwnOrder` availability mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct OwnOrderDataMask: u8 {
        const DROP_ALL = 1;
        const ACTIVE   = 1 << 1;
        const EXTERNAL = 1 << 2;
        const STOP     = 1 << 3;
    }
}

/// A single order-log entry, always emitted regardless of whether it also
/// drives a book update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdLogEntry {
    /// Raw action bits, preserved verbatim for downstream consumers that
    /// care about bits the reconstructor itself does not interpret
    /// (`SNAPSHOT`, `QUOTE`, `COUNTER`, `FILL_OR_KILL`, `MOVED`,
    /// `CANCELED_GROUP`, `CROSS_TRADE`).
    pub actions_mask: u16,
    pub exchange_timestamp: Timestamp,
    pub exchange_order_id: i64,
    pub order_price: i64,
    pub amount: i64,
    pub amount_rest: i64,
    pub deal_id: i64,
    pub deal_price: i64,
    pub oi_after_deal: i64,
}

/// The side or provenance of a [`DealEntry`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DealType {
    Unknown = 0,
    Buy = 1,
    Sell = 2,
    Reserved = 3,
}

impl DealType {
    pub(crate) fn from_mask(mask: u8) -> Self {
        match mask & 0b11 {
            1 => DealType::Buy,
            2 => DealType::Sell,
            3 => DealType::Reserved,
            _ => DealType::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealEntry {
    pub r#type: DealType,
    pub id: i64,
    pub timestamp: Timestamp,
    pub price: i64,
    pub volume: i64,
    pub oi: i64,
    pub order_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxInfoEntry {
    pub timestamp: Timestamp,
    pub price: i64,
    pub ask_total: i64,
    pub bid_total: i64,
    pub oi: i64,
    pub hi_limit: i64,
    pub low_limit: i64,
    pub deposit: f64,
    pub rate: f64,
    pub message: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    Info = 1,
    Warn = 2,
    Error = 3,
    Unknown = 0,
}

impl From<u8> for MessageType {
    fn from(byte: u8) -> Self {
        match byte {
            1 => MessageType::Info,
            2 => MessageType::Warn,
            3 => MessageType::Error,
            _ => MessageType::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: Timestamp,
    pub r#type: MessageType,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnTrade {
    pub timestamp: Timestamp,
    pub trade_id: i64,
    pub order_id: i64,
    pub price: i64,
    pub volume: i64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OwnOrderType {
    None = 0,
    Regular = 1,
    Stop = 2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnOrder {
    pub r#type: OwnOrderType,
    pub id: i64,
    pub price: i64,
    pub amount_rest: i64,
}

/// A price → signed-volume snapshot. Within the ord-log stream, positive is
/// the ask side and negative is the bid side; in the standalone quotes
/// stream, the volume is whatever was last written (never negative).
///
/// Backed by a `BTreeMap` so snapshots iterate in deterministic,
/// price-sorted order.
pub type QuotesSnapshot = std::collections::BTreeMap<i64, i64>;
