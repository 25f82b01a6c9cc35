//! The six stream decoders that are not the order log: mechanical
//! applications of the mask/delta rules in §4.5, each over its own
//! last-value state.

use crate::delta::{growing, growing_millis, relative};
use crate::error::Result;
use crate::primitive::Reader;
use crate::records::{
    AuxInfoDataMask, AuxInfoEntry, DealDataMask, DealEntry, DealType, Message, MessageType,
    OwnOrder, OwnOrderDataMask, OwnOrderType, OwnTrade, QuotesSnapshot,
};
use crate::timestamp;

#[derive(Debug, Default)]
pub(crate) struct DealsState {
    last_ms: i64,
    last_id: i64,
    last_order_id: i64,
    last_price: i64,
    last_volume: i64,
    last_oi: i64,
}

impl DealsState {
    pub(crate) fn decode(&mut self, r: &mut Reader) -> Result<DealEntry> {
        let availability_byte = r.u8()?;
        let availability = DealDataMask::from_bits_truncate(availability_byte);
        let deal_type = DealType::from_mask(availability_byte);

        if availability.contains(DealDataMask::DATETIME) {
            self.last_ms = growing_millis(r, self.last_ms)?;
        }
        if availability.contains(DealDataMask::ID) {
            self.last_id = growing(r, self.last_id)?;
        }
        if availability.contains(DealDataMask::ORDER_ID) {
            self.last_order_id = relative(r, self.last_order_id)?;
        }
        if availability.contains(DealDataMask::PRICE) {
            self.last_price = relative(r, self.last_price)?;
        }
        if availability.contains(DealDataMask::VOLUME) {
            self.last_volume = r.leb128()?;
        }
        if availability.contains(DealDataMask::OI) {
            self.last_oi = relative(r, self.last_oi)?;
        }

        Ok(DealEntry {
            r#type: deal_type,
            id: self.last_id,
            timestamp: timestamp::from_millis(self.last_ms),
            price: self.last_price,
            volume: self.last_volume,
            oi: self.last_oi,
            order_id: self.last_order_id,
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct AuxInfoState {
    last_ms: i64,
    last_ask_total: i64,
    last_bid_total: i64,
    last_oi: i64,
    last_price: i64,
    last_hi_limit: i64,
    last_low_limit: i64,
    last_deposit: f64,
    last_rate: f64,
}

impl AuxInfoState {
    pub(crate) fn decode(&mut self, r: &mut Reader) -> Result<AuxInfoEntry> {
        let availability = AuxInfoDataMask::from_bits_truncate(r.u8()?);

        if availability.contains(AuxInfoDataMask::DATETIME) {
            self.last_ms = growing_millis(r, self.last_ms)?;
        }
        if availability.contains(AuxInfoDataMask::ASK_TOTAL) {
            self.last_ask_total = relative(r, self.last_ask_total)?;
        }
        if availability.contains(AuxInfoDataMask::BID_TOTAL) {
            self.last_bid_total = relative(r, self.last_bid_total)?;
        }
        if availability.contains(AuxInfoDataMask::OI) {
            self.last_oi = relative(r, self.last_oi)?;
        }
        if availability.contains(AuxInfoDataMask::PRICE) {
            self.last_price = relative(r, self.last_price)?;
        }
        if availability.contains(AuxInfoDataMask::SESSION_INFO) {
            self.last_hi_limit = r.leb128()?;
            self.last_low_limit = r.leb128()?;
            self.last_deposit = r.f64_le()?;
        }
        if availability.contains(AuxInfoDataMask::RATE) {
            self.last_rate = r.f64_le()?;
        }
        let message = if availability.contains(AuxInfoDataMask::MESSAGE) {
            r.string()?
        } else {
            String::new()
        };

        Ok(AuxInfoEntry {
            timestamp: timestamp::from_millis(self.last_ms),
            price: self.last_price,
            ask_total: self.last_ask_total,
            bid_total: self.last_bid_total,
            oi: self.last_oi,
            hi_limit: self.last_hi_limit,
            low_limit: self.last_low_limit,
            deposit: self.last_deposit,
            rate: self.last_rate,
            message,
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct QuotesState {
    last_price: i64,
    dict: QuotesSnapshot,
}

impl QuotesState {
    pub(crate) fn decode(&mut self, r: &mut Reader) -> Result<QuotesSnapshot> {
        let count = r.leb128()?;
        for _ in 0..count {
            self.last_price = relative(r, self.last_price)?;
            let volume = r.leb128()?;
            if volume == 0 {
                self.dict.remove(&self.last_price);
            } else {
                self.dict.insert(self.last_price, volume);
            }
        }
        Ok(self.dict.clone())
    }
}

#[derive(Debug, Default)]
pub(crate) struct OwnTradesState {
    last_ms: i64,
    last_trade_id: i64,
    last_order_id: i64,
    last_price: i64,
}

impl OwnTradesState {
    pub(crate) fn decode(&mut self, r: &mut Reader) -> Result<OwnTrade> {
        self.last_ms = growing_millis(r, self.last_ms)?;
        self.last_trade_id = relative(r, self.last_trade_id)?;
        self.last_order_id = relative(r, self.last_order_id)?;
        self.last_price = relative(r, self.last_price)?;
        let volume = r.leb128()?;

        Ok(OwnTrade {
            timestamp: timestamp::from_millis(self.last_ms),
            trade_id: self.last_trade_id,
            order_id: self.last_order_id,
            price: self.last_price,
            volume,
        })
    }
}

/// Own orders carry no last-value state: every field is either absent
/// (`DROP_ALL`) or a plain LEB128 read.
pub(crate) fn decode_own_order(r: &mut Reader) -> Result<Option<OwnOrder>> {
    let availability = OwnOrderDataMask::from_bits_truncate(r.u8()?);

    if availability.contains(OwnOrderDataMask::DROP_ALL) {
        return Ok(None);
    }

    let r#type = if availability.contains(OwnOrderDataMask::ACTIVE) {
        if availability.contains(OwnOrderDataMask::STOP) {
            OwnOrderType::Stop
        } else {
            OwnOrderType::Regular
        }
    } else {
        OwnOrderType::None
    };

    let id = r.leb128()?;
    let price = r.leb128()?;
    let amount_rest = r.leb128()?;

    Ok(Some(OwnOrder {
        r#type,
        id,
        price,
        amount_rest,
    }))
}

/// Messages carry no last-value state either.
pub(crate) fn decode_message(r: &mut Reader) -> Result<Message> {
    let timestamp = r.timestamp_absolute()?;
    let r#type = MessageType::from(r.u8()?);
    let text = r.string()?;
    Ok(Message {
        timestamp,
        r#type,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_over(bytes: Vec<u8>) -> Reader {
        Reader::new(std::io::Cursor::new(bytes))
    }

    #[test]
    fn quotes_stream_delete_then_reinstate_matches_scenario_s6() {
        let mut state = QuotesState::default();

        let mut bytes = vec![];
        leb128::write::signed(&mut bytes, 2).unwrap(); // count = 2
        leb128::write::signed(&mut bytes, 10).unwrap(); // price delta +10
        leb128::write::signed(&mut bytes, 7).unwrap(); // volume 7
        leb128::write::signed(&mut bytes, 5).unwrap(); // price delta +5 -> 15
        leb128::write::signed(&mut bytes, 0).unwrap(); // volume 0 -> delete 15 (never existed, no-op)

        let mut r = reader_over(bytes);
        let snapshot = state.decode(&mut r).unwrap();
        assert_eq!(snapshot.get(&10), Some(&7));
        assert_eq!(snapshot.get(&15), None);
    }

    #[test]
    fn quotes_stream_reinstates_a_deleted_price() {
        let mut state = QuotesState::default();

        let mut first = vec![];
        leb128::write::signed(&mut first, 1).unwrap();
        leb128::write::signed(&mut first, 10).unwrap();
        leb128::write::signed(&mut first, 7).unwrap();
        state.decode(&mut reader_over(first)).unwrap();

        let mut second = vec![];
        leb128::write::signed(&mut second, 1).unwrap();
        leb128::write::signed(&mut second, 0).unwrap(); // same price, delete
        leb128::write::signed(&mut second, 0).unwrap();
        let snapshot = state.decode(&mut reader_over(second)).unwrap();
        assert_eq!(snapshot.get(&10), None);

        let mut third = vec![];
        leb128::write::signed(&mut third, 1).unwrap();
        leb128::write::signed(&mut third, 0).unwrap();
        leb128::write::signed(&mut third, 9).unwrap(); // reinstate at the same price
        let snapshot = state.decode(&mut reader_over(third)).unwrap();
        assert_eq!(snapshot.get(&10), Some(&9));
    }

    #[test]
    fn own_order_drop_all_short_circuits() {
        let mut r = reader_over(vec![OwnOrderDataMask::DROP_ALL.bits()]);
        assert!(decode_own_order(&mut r).unwrap().is_none());
    }

    #[test]
    fn own_order_active_stop_sets_type() {
        let mask = (OwnOrderDataMask::ACTIVE | OwnOrderDataMask::STOP).bits();
        let mut bytes = vec![mask];
        leb128::write::signed(&mut bytes, 1).unwrap();
        leb128::write::signed(&mut bytes, 100).unwrap();
        leb128::write::signed(&mut bytes, 5).unwrap();
        let order = decode_own_order(&mut reader_over(bytes)).unwrap().unwrap();
        assert_eq!(order.r#type, OwnOrderType::Stop);
    }

    #[test]
    fn deal_type_is_the_low_two_bits_not_a_flag() {
        let bytes = vec![DealType::Sell as u8]; // mask = 2, no other fields present
        let deal = DealsState::default().decode(&mut reader_over(bytes)).unwrap();
        assert_eq!(deal.r#type, DealType::Sell);
    }
}
