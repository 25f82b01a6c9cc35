//! The order-log decoder and, as its direct side effect, the order-book
//! reconstructor: the part of this crate with the actual domain logic.
//! Every other stream decoder is a mechanical application of the
//! mask/delta rules; this one additionally derives a book, deal events,
//! and end-of-transaction aux-info snapshots from it.

use crate::delta::{growing, growing_millis, relative};
use crate::error::Result;
use crate::primitive::Reader;
use crate::records::{
    AuxInfoEntry, DealEntry, DealType, OrdLogActionMask, OrdLogDataMask, OrdLogEntry,
    QuotesSnapshot,
};
use crate::timestamp;

/// Per-instance state carried across successive `read_ord_log_data` calls,
/// in strict file order.
#[derive(Debug, Default)]
pub(crate) struct OrdLogState {
    last_exchange_ms: i64,
    last_order_id: i64,
    last_order_price: i64,
    last_amount: i64,
    last_order_amount_rest: i64,
    last_deal_id: i64,
    last_deal_price: i64,
    last_oi_after_deal: i64,
    last_pushed_deal_id: i64,
    /// The live book: price → signed volume (positive = ask, negative =
    /// bid). Never holds a zero-volume entry.
    quotes: QuotesSnapshot,
    /// The last defensive copy handed out; re-exposed unchanged by every
    /// call until a new end-of-transaction snapshot replaces it.
    external_quotes: QuotesSnapshot,
}

/// The full result of decoding one order-log record: the record itself,
/// plus whatever the book reconstruction derived from it.
pub(crate) struct OrdLogDecode {
    pub entry: OrdLogEntry,
    pub aux_info: Option<AuxInfoEntry>,
    pub quotes: QuotesSnapshot,
    pub deal: Option<DealEntry>,
}

impl OrdLogState {
    pub(crate) fn decode(&mut self, r: &mut Reader) -> Result<OrdLogDecode> {
        let availability = OrdLogDataMask::from_bits_truncate(r.u8()?);
        let actions = OrdLogActionMask::from_bits_truncate(r.u16_le()?);

        let is_add = actions.contains(OrdLogActionMask::ADD);
        let is_fill = actions.contains(OrdLogActionMask::FILL);
        let is_buy = actions.contains(OrdLogActionMask::BUY);
        let is_sell = actions.contains(OrdLogActionMask::SELL);

        if availability.contains(OrdLogDataMask::DATETIME) {
            self.last_exchange_ms = growing_millis(r, self.last_exchange_ms)?;
        }
        let exchange_timestamp = timestamp::from_millis(self.last_exchange_ms);

        // ORDER_ID is the one irregular field: a non-add record reads a
        // relative delta but never writes it back into `last_order_id` -
        // the delta is absorbed locally, on top of the running base that
        // only `Add` records ever advance. Consistent across the source's
        // revisions, so treated as intentional rather than a bug.
        let exchange_order_id = if !availability.contains(OrdLogDataMask::ORDER_ID) {
            self.last_order_id
        } else if is_add {
            self.last_order_id = growing(r, self.last_order_id)?;
            self.last_order_id
        } else {
            relative(r, self.last_order_id)?
        };

        if availability.contains(OrdLogDataMask::ORDER_PRICE) {
            self.last_order_price = relative(r, self.last_order_price)?;
        }

        if availability.contains(OrdLogDataMask::AMOUNT) {
            self.last_amount = r.leb128()?;
        }

        let (amount_rest, deal_id, deal_price, oi_after_deal) = if is_fill {
            if availability.contains(OrdLogDataMask::ORDER_AMOUNT_REST) {
                self.last_order_amount_rest = r.leb128()?;
            }
            if availability.contains(OrdLogDataMask::DEAL_ID) {
                self.last_deal_id = growing(r, self.last_deal_id)?;
            }
            if availability.contains(OrdLogDataMask::DEAL_PRICE) {
                self.last_deal_price = relative(r, self.last_deal_price)?;
            }
            if availability.contains(OrdLogDataMask::OI_AFTER_DEAL) {
                self.last_oi_after_deal = relative(r, self.last_oi_after_deal)?;
            }
            (
                self.last_order_amount_rest,
                self.last_deal_id,
                self.last_deal_price,
                self.last_oi_after_deal,
            )
        } else {
            (if is_add { self.last_amount } else { 0 }, 0, 0, 0)
        };

        let entry = OrdLogEntry {
            actions_mask: actions.bits(),
            exchange_timestamp,
            exchange_order_id,
            order_price: self.last_order_price,
            amount: self.last_amount,
            amount_rest,
            deal_id,
            deal_price,
            oi_after_deal,
        };

        let (aux_info, deal) = self.reconstruct_book(
            &entry,
            actions,
            is_add,
            is_buy,
            is_sell,
            deal_id,
            deal_price,
            oi_after_deal,
        );

        Ok(OrdLogDecode {
            entry,
            aux_info,
            quotes: self.external_quotes.clone(),
            deal,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn reconstruct_book(
        &mut self,
        entry: &OrdLogEntry,
        actions: OrdLogActionMask,
        is_add: bool,
        is_buy: bool,
        is_sell: bool,
        deal_id: i64,
        deal_price: i64,
        oi_after_deal: i64,
    ) -> (Option<AuxInfoEntry>, Option<DealEntry>) {
        if actions.contains(OrdLogActionMask::FLOW_START) {
            tracing::debug!("FLOW_START seen, resetting order book");
            self.quotes.clear();
        }

        let mut aux_info = None;

        let side_is_unambiguous = is_buy ^ is_sell;
        let applies_to_book = side_is_unambiguous
            && !actions.contains(OrdLogActionMask::NON_SYSTEM)
            && !actions.contains(OrdLogActionMask::NON_ZERO_REPL_ACT);

        if applies_to_book {
            let price = self.last_order_price;
            let quantity = self.quotes.get(&price).copied().unwrap_or(0);
            // Add on the sell side, or cancel/fill on the buy side,
            // increase the stored quantity; the opposite pairing decreases
            // it. Buy resting volume is stored negative by convention.
            let increases = if is_add { is_sell } else { is_buy };
            let quantity = if increases {
                quantity + self.last_amount
            } else {
                quantity - self.last_amount
            };

            if quantity == 0 {
                self.quotes.remove(&price);
            } else {
                self.quotes.insert(price, quantity);
            }

            if actions.contains(OrdLogActionMask::END_OF_TRANSACTION) {
                self.external_quotes = self.quotes.clone();

                let ask_total: i64 = self.quotes.values().filter(|&&q| q > 0).sum();
                let bid_total: i64 = self.quotes.values().filter(|&&q| q < 0).map(|q| -q).sum();

                tracing::debug!(ask_total, bid_total, "end-of-transaction book snapshot");

                // Deliberately the running `last_deal_price`/`last_oi_after_deal`
                // state, not this record's own (possibly zeroed, non-fill)
                // deal fields: an end-of-transaction snapshot carries
                // forward the most recent deal seen, fill or not.
                aux_info = Some(AuxInfoEntry {
                    timestamp: entry.exchange_timestamp,
                    price: self.last_deal_price,
                    ask_total,
                    bid_total,
                    oi: self.last_oi_after_deal,
                    hi_limit: 0,
                    low_limit: 0,
                    deposit: 0.0,
                    rate: 0.0,
                    message: String::new(),
                });
            }
        }

        let deal = if applies_to_book && deal_id > self.last_pushed_deal_id {
            self.last_pushed_deal_id = deal_id;
            Some(DealEntry {
                r#type: if is_sell { DealType::Sell } else { DealType::Buy },
                id: deal_id,
                timestamp: entry.exchange_timestamp,
                price: deal_price,
                volume: self.last_amount,
                oi: oi_after_deal,
                order_id: 0,
            })
        } else {
            None
        };

        (aux_info, deal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader_over(bytes: Vec<u8>) -> Reader {
        Reader::new(std::io::Cursor::new(bytes))
    }

    fn frame(mask: u8, actions: u16, price: i64, amount: i64) -> Vec<u8> {
        let mut bytes = vec![mask];
        bytes.extend_from_slice(&actions.to_le_bytes());
        // DATETIME
        bytes.push(0); // growing delta of 0
                       // ORDER_ID (growing, add path)
        bytes.push(1);
        // ORDER_PRICE (relative)
        leb128::write::signed(&mut bytes, price).unwrap();
        // AMOUNT (leb128)
        leb128::write::signed(&mut bytes, amount).unwrap();
        bytes
    }

    const ALL_FIELDS: u8 = 0b1111_1111;

    #[test]
    fn add_then_cancel_round_trip_matches_scenario_s4() {
        let mut state = OrdLogState::default();

        // Frame 1: ADD | BUY | END_OF_TRANSACTION, price=100, amount=5.
        let add_actions = (1 << 2) | (1 << 4) | (1 << 10);
        let bytes = frame(ALL_FIELDS, add_actions, 100, 5);
        // FILL not set, so no further fields are read for this mask design
        // beyond what `frame` already wrote (ORDER_AMOUNT_REST etc. only
        // apply when FILL is set).
        let mut r = reader_over(bytes);
        let decoded = state.decode(&mut r).unwrap();
        assert_eq!(decoded.quotes.get(&100), Some(&-5));
        let aux = decoded.aux_info.unwrap();
        assert_eq!(aux.ask_total, 0);
        assert_eq!(aux.bid_total, 5);

        // Frame 2: CANCELED | BUY | END_OF_TRANSACTION, same price/amount.
        let cancel_actions = (1 << 13) | (1 << 4) | (1 << 10);
        let bytes = frame(ALL_FIELDS, cancel_actions, 0, 5); // relative delta 0 keeps price at 100
        let mut r = reader_over(bytes);
        let decoded = state.decode(&mut r).unwrap();
        assert!(decoded.quotes.get(&100).is_none());
        let aux = decoded.aux_info.unwrap();
        assert_eq!(aux.ask_total, 0);
        assert_eq!(aux.bid_total, 0);
    }

    #[test]
    fn flow_start_clears_book_before_update_is_applied() {
        let mut state = OrdLogState::default();
        state.quotes.insert(50, -3);
        state.external_quotes.insert(50, -3);

        let actions = (1 << 1) | (1 << 2) | (1 << 4); // FLOW_START | ADD | BUY
        let bytes = frame(ALL_FIELDS, actions, 0, 1);
        let mut r = reader_over(bytes);
        state.decode(&mut r).unwrap();

        assert!(!state.quotes.contains_key(&50));
    }

    /// Builds one FILL|BUY ord-log frame, with `deal_id_delta` as the
    /// growing-delta offset applied to the running `last_deal_id` counter
    /// (0 keeps the deal_id unchanged from the previous frame).
    fn fill_frame(deal_id_delta: u8) -> Vec<u8> {
        let fill_actions: u16 = (1 << 3) | (1 << 4); // FILL | BUY
        let mut bytes = vec![ALL_FIELDS];
        bytes.extend_from_slice(&fill_actions.to_le_bytes());
        bytes.push(0); // DATETIME growing delta = 0
        leb128::write::signed(&mut bytes, 0).unwrap(); // ORDER_ID relative delta (not add)
        leb128::write::signed(&mut bytes, 100).unwrap(); // ORDER_PRICE relative delta
        leb128::write::signed(&mut bytes, 5).unwrap(); // AMOUNT
        leb128::write::signed(&mut bytes, 3).unwrap(); // ORDER_AMOUNT_REST
        bytes.push(deal_id_delta); // DEAL_ID growing delta
        leb128::write::signed(&mut bytes, 10).unwrap(); // DEAL_PRICE relative
        leb128::write::signed(&mut bytes, 1).unwrap(); // OI_AFTER_DEAL relative
        bytes
    }

    #[test]
    fn end_of_transaction_aux_info_carries_forward_the_last_fill_even_on_a_non_fill_frame() {
        let mut state = OrdLogState::default();

        // A FILL establishes last_deal_price=10, last_oi_after_deal=1, and
        // leaves a resting quantity of 5 at price 100 (no END_OF_TRANSACTION
        // here, so no aux-info is emitted yet).
        let mut r = reader_over(fill_frame(7));
        let filled = state.decode(&mut r).unwrap();
        assert!(filled.aux_info.is_none());

        // A later ADD with no FILL bit at all, but END_OF_TRANSACTION set,
        // must still report the carried-forward deal price/oi rather than
        // zeroing them out.
        let add_actions = (1 << 2) | (1 << 4) | (1 << 10); // ADD | BUY | END_OF_TRANSACTION
        let bytes = frame(ALL_FIELDS, add_actions, 0, 3); // same price, amount=3
        let mut r = reader_over(bytes);
        let decoded = state.decode(&mut r).unwrap();

        let aux = decoded.aux_info.unwrap();
        assert_eq!(aux.price, 10);
        assert_eq!(aux.oi, 1);
        assert_eq!(aux.ask_total, 2);
        assert_eq!(aux.bid_total, 0);
    }

    #[test]
    fn duplicate_deal_id_emits_at_most_one_deal() {
        let mut state = OrdLogState::default();

        let mut r = reader_over(fill_frame(7)); // deal_id: 0 -> 7
        let first = state.decode(&mut r).unwrap();
        assert!(first.deal.is_some());

        let mut r = reader_over(fill_frame(0)); // deal_id stays 7
        let second = state.decode(&mut r).unwrap();
        assert!(second.deal.is_none(), "same deal_id must not re-emit");

        let mut r = reader_over(fill_frame(1)); // deal_id: 7 -> 8
        let third = state.decode(&mut r).unwrap();
        assert!(third.deal.is_some(), "a strictly greater deal_id emits again");
    }
}
