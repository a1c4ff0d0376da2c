//! Order book view built from the most recent `OrderPlaced` events.
//!
//! Logs are requested in ascending, bounded block windows (many RPC
//! providers cap the range of a single `eth_getLogs`), and the scan stops as
//! soon as enough orders are collected. The collected orders are then
//! aggregated by [`aggregate`]:
//!
//! 1. orders are split into buy and sell sides, orders with an unknown side
//!    code are dropped;
//! 2. every row gets the running total of `amount` within its side, in
//!    fetch order;
//! 3. buy rows are followed by sell rows, and every row gets its share of
//!    the summed amount as `progress` (zero when the sum is zero);
//! 4. rows are reversed, so the most recently fetched come first, and
//!    truncated to the cap.

use alloy::{
    providers::Provider,
    rpc::types::{Filter, Log},
};
use alloy_sol_types::SolEvent;
use fastnum::{UD128, udec128};
use itertools::{Either, Itertools};
use tracing::{debug, info};

use crate::{
    Chain,
    abi::orderbook::Orderbook::OrderPlaced,
    error::DexError,
    num,
    types::{self, OrderSide, PlacedOrder},
};

/// Blocks requested by a single `eth_getLogs`.
pub const DEFAULT_CHUNK_SIZE: u64 = 800;

/// Orders shown in the order book view.
pub const DEFAULT_MAX_ORDERS: usize = 5;

/// Placed order along with the transaction context.
pub type Order = types::EventContext<PlacedOrder>;

/// Parameters of the history scan.
#[derive(Clone, Copy, Debug)]
pub struct HistoryConfig {
    chunk_size: u64,
    max_orders: usize,
    from_block: Option<u64>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_orders: DEFAULT_MAX_ORDERS,
            from_block: None,
        }
    }
}

impl HistoryConfig {
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_orders(mut self, max_orders: usize) -> Self {
        self.max_orders = max_orders;
        self
    }

    /// Start the scan at `block` instead of the order book deployment block.
    pub fn with_from_block(mut self, block: u64) -> Self {
        self.from_block = Some(block);
        self
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn max_orders(&self) -> usize {
        self.max_orders
    }

    pub fn from_block(&self) -> Option<u64> {
        self.from_block
    }

    pub fn validate(&self) -> Result<(), DexError> {
        if self.chunk_size == 0 {
            return Err(DexError::InvalidConfig("chunk size must be positive".to_string()));
        }
        if self.max_orders == 0 {
            return Err(DexError::InvalidConfig("max orders must be positive".to_string()));
        }
        Ok(())
    }
}

/// Row of the order book view.
#[derive(Clone, derive_more::Debug)]
pub struct BookRow {
    order: Order,
    side: OrderSide,
    #[debug("{total}")]
    total: UD128,
    #[debug("{progress}")]
    progress: UD128,
}

impl BookRow {
    fn new(order: Order, side: OrderSide, total: UD128) -> Self {
        Self {
            order,
            side,
            total,
            progress: UD128::ZERO,
        }
    }

    pub fn order(&self) -> &PlacedOrder {
        self.order.event()
    }

    /// Placed order with the block/transaction it was emitted in.
    pub fn context(&self) -> &Order {
        &self.order
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    /// Running total of amounts on the row's side, up to and including
    /// this row, in fetch order.
    pub fn total(&self) -> UD128 {
        self.total
    }

    /// Share of the row's amount in the summed amount of all rows, in
    /// percent. Meant for bar widths only.
    pub fn progress(&self) -> UD128 {
        self.progress
    }
}

/// Iterator over inclusive block windows of at most `size` blocks covering
/// `[from, to]` in ascending order.
#[derive(Clone, Debug)]
pub struct BlockWindows {
    next: u64,
    to: u64,
    size: u64,
    done: bool,
}

impl BlockWindows {
    pub fn new(from: u64, to: u64, size: u64) -> Self {
        Self {
            next: from,
            to,
            size: size.max(1),
            done: from > to,
        }
    }
}

impl Iterator for BlockWindows {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.size - 1).min(self.to);
        match end.checked_add(1) {
            Some(next) if next <= self.to => self.next = next,
            _ => self.done = true,
        }
        Some((start, end))
    }
}

/// Loads the most recent placed orders and aggregates them into the order
/// book view.
///
/// Any failed window aborts the whole load, no partial view is returned.
pub async fn fetch<P: Provider>(
    chain: &Chain,
    provider: &P,
    config: &HistoryConfig,
) -> Result<Vec<BookRow>, DexError> {
    config.validate()?;
    let head = provider.get_block_number().await?;
    let from = config.from_block.unwrap_or(chain.deployed_at_block());
    info!(from, head, chunk_size = config.chunk_size, "Loading order history");

    let orders = collect(
        chain,
        provider,
        BlockWindows::new(from, head, config.chunk_size),
        config.max_orders,
    )
    .await?;
    info!(orders = orders.len(), "Order history loaded");

    Ok(aggregate(orders, config.max_orders))
}

/// Collects placed orders window by window until at least `cap` orders are
/// collected or the windows are exhausted.
///
/// The window reaching the cap is kept whole.
pub async fn collect<P: Provider>(
    chain: &Chain,
    provider: &P,
    windows: BlockWindows,
    cap: usize,
) -> Result<Vec<Order>, DexError> {
    let converter = num::Converter::usd();
    let mut orders = Vec::new();
    for (start, end) in windows {
        let filter = Filter::new()
            .address(chain.orderbook())
            .event_signature(OrderPlaced::SIGNATURE_HASH)
            .from_block(start)
            .to_block(end);
        let logs = provider.get_logs(&filter).await?;
        debug!(start, end, logs = logs.len(), "Fetched order logs");

        for log in &logs {
            orders.push(decode_log(log, converter)?);
        }
        if orders.len() >= cap {
            break;
        }
    }
    Ok(orders)
}

/// Decodes an `OrderPlaced` log with its context.
pub fn decode_log(log: &Log, converter: num::Converter) -> Result<Order, DexError> {
    let event = OrderPlaced::decode_log(&log.inner)?.data;
    Ok(types::EventContext::new(
        log.block_number.unwrap_or_default(),
        log.transaction_hash.unwrap_or_default(),
        log.log_index.unwrap_or_default(),
        PlacedOrder::from_event(&event, converter)?,
    ))
}

/// Aggregates orders, given in fetch order, into at most `cap` book rows,
/// most recently fetched first.
pub fn aggregate(orders: Vec<Order>, cap: usize) -> Vec<BookRow> {
    let (buys, sells): (Vec<_>, Vec<_>) = orders
        .into_iter()
        .filter_map(|order| order.event().side().map(|side| (side, order)))
        .partition_map(|(side, order)| match side {
            OrderSide::Buy => Either::Left(order),
            OrderSide::Sell => Either::Right(order),
        });

    let mut rows = itertools::chain(
        running_totals(OrderSide::Buy, buys),
        running_totals(OrderSide::Sell, sells),
    )
    .collect::<Vec<_>>();

    let sum = rows
        .iter()
        .fold(UD128::ZERO, |sum, row| sum + row.order().amount());
    if sum != UD128::ZERO {
        for row in rows.iter_mut() {
            row.progress = row.order().amount() * udec128!(100) / sum;
        }
    }

    rows.reverse();
    rows.truncate(cap);
    rows
}

fn running_totals(side: OrderSide, orders: Vec<Order>) -> impl Iterator<Item = BookRow> {
    orders.into_iter().scan(UD128::ZERO, move |total, order| {
        *total = *total + order.event().amount();
        Some(BookRow::new(order, side, *total))
    })
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, LogData, TxHash, U256, address, b256};
    use fastnum::udec64;

    use super::*;

    fn order(idx: u64, code: u8, amount: UD128) -> Order {
        types::EventContext::new(
            100 + idx,
            TxHash::ZERO,
            0,
            PlacedOrder::new(
                U256::from(idx),
                Address::ZERO,
                code,
                udec64!(3800),
                amount,
                fastnum::UD64::ZERO,
                fastnum::UD64::ZERO,
                0,
                Address::ZERO,
            ),
        )
    }

    fn buy(idx: u64, amount: UD128) -> Order {
        order(idx, OrderSide::Buy.code(), amount)
    }

    fn sell(idx: u64, amount: UD128) -> Order {
        order(idx, OrderSide::Sell.code(), amount)
    }

    fn ids(rows: &[BookRow]) -> Vec<u64> {
        rows.iter().map(|r| r.order().order_id().to()).collect()
    }

    #[test]
    fn test_block_windows() {
        assert_eq!(
            BlockWindows::new(0, 2000, 800).collect::<Vec<_>>(),
            vec![(0, 799), (800, 1599), (1600, 2000)]
        );
        assert_eq!(
            BlockWindows::new(10, 10, 800).collect::<Vec<_>>(),
            vec![(10, 10)]
        );
        assert_eq!(
            BlockWindows::new(0, 1599, 800).collect::<Vec<_>>(),
            vec![(0, 799), (800, 1599)]
        );
        assert_eq!(BlockWindows::new(11, 10, 800).count(), 0);
        assert_eq!(BlockWindows::new(0, 2, 0).count(), 3);
        assert_eq!(
            BlockWindows::new(u64::MAX - 1, u64::MAX, 800).collect::<Vec<_>>(),
            vec![(u64::MAX - 1, u64::MAX)]
        );
    }

    #[test]
    fn test_block_windows_cover_range() {
        let mut expected = 37;
        for (start, end) in BlockWindows::new(37, 5000, 333) {
            assert_eq!(start, expected);
            assert!(end >= start && end - start < 333);
            expected = end + 1;
        }
        assert_eq!(expected, 5001);
    }

    #[test]
    fn test_aggregate_example() {
        let rows = aggregate(
            vec![buy(1, udec128!(2)), buy(2, udec128!(3)), sell(3, udec128!(5))],
            DEFAULT_MAX_ORDERS,
        );

        assert_eq!(ids(&rows), vec![3, 2, 1]);

        assert_eq!(rows[0].side(), OrderSide::Sell);
        assert_eq!(rows[0].total(), udec128!(5));
        assert_eq!(rows[0].progress(), udec128!(50));

        assert_eq!(rows[1].side(), OrderSide::Buy);
        assert_eq!(rows[1].total(), udec128!(5));
        assert_eq!(rows[1].progress(), udec128!(30));

        assert_eq!(rows[2].side(), OrderSide::Buy);
        assert_eq!(rows[2].total(), udec128!(2));
        assert_eq!(rows[2].progress(), udec128!(20));
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(vec![], DEFAULT_MAX_ORDERS).is_empty());
    }

    #[test]
    fn test_aggregate_sides_are_grouped() {
        // Interleaved fetch order, buys still precede sells before reversal
        let rows = aggregate(
            vec![
                sell(1, udec128!(1)),
                buy(2, udec128!(2)),
                sell(3, udec128!(3)),
                buy(4, udec128!(4)),
            ],
            10,
        );
        assert_eq!(ids(&rows), vec![3, 1, 4, 2]);
        assert_eq!(
            rows.iter().map(BookRow::total).collect::<Vec<_>>(),
            vec![udec128!(4), udec128!(1), udec128!(6), udec128!(2)]
        );
    }

    #[test]
    fn test_aggregate_running_totals_non_decreasing() {
        let orders = (0..20)
            .map(|i| {
                if i % 3 == 0 {
                    sell(i, UD128::from(i % 4))
                } else {
                    buy(i, UD128::from(i % 5))
                }
            })
            .collect::<Vec<_>>();
        let mut rows = aggregate(orders, 100);
        rows.reverse();

        for side in [OrderSide::Buy, OrderSide::Sell] {
            let totals = rows
                .iter()
                .filter(|r| r.side() == side)
                .map(BookRow::total)
                .collect::<Vec<_>>();
            assert!(!totals.is_empty());
            assert!(totals.windows(2).all(|w| w[0] <= w[1]), "{side:?}");
        }
    }

    #[test]
    fn test_aggregate_progress_sums_to_hundred() {
        let rows = aggregate(
            vec![buy(1, udec128!(1)), buy(2, udec128!(1)), sell(3, udec128!(1))],
            10,
        );
        let sum = rows
            .iter()
            .fold(UD128::ZERO, |sum, row| sum + row.progress());
        let hundred = udec128!(100);
        let diff = if sum > hundred { sum - hundred } else { hundred - sum };
        assert!(diff < udec128!(0.000001), "progress sum {sum}");
    }

    #[test]
    fn test_aggregate_zero_amounts() {
        let rows = aggregate(vec![buy(1, UD128::ZERO), sell(2, UD128::ZERO)], 10);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.progress() == UD128::ZERO));
        assert!(rows.iter().all(|r| r.total() == UD128::ZERO));
    }

    #[test]
    fn test_aggregate_cap() {
        let orders = (0..8).map(|i| buy(i, udec128!(1))).collect::<Vec<_>>();
        let rows = aggregate(orders, 5);
        assert_eq!(ids(&rows), vec![7, 6, 5, 4, 3]);
        // Totals and progress are computed over all fetched orders
        assert_eq!(rows[0].total(), udec128!(8));
        assert_eq!(rows[0].progress(), udec128!(12.5));
    }

    #[test]
    fn test_aggregate_skips_unknown_sides() {
        let rows = aggregate(
            vec![buy(1, udec128!(1)), order(2, 0, udec128!(5)), sell(3, udec128!(3))],
            10,
        );
        assert_eq!(ids(&rows), vec![3, 1]);
        assert_eq!(rows[0].progress(), udec128!(75));
        assert_eq!(rows[1].progress(), udec128!(25));
    }

    #[test]
    fn test_history_config_validation() {
        assert!(HistoryConfig::default().validate().is_ok());
        assert!(matches!(
            HistoryConfig::default().with_chunk_size(0).validate(),
            Err(DexError::InvalidConfig(_))
        ));
        assert!(matches!(
            HistoryConfig::default().with_max_orders(0).validate(),
            Err(DexError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_decode_log() {
        let event = OrderPlaced {
            orderId: U256::from(7),
            trader: address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"),
            orderType: 1,
            price: U256::from(3_800_000_000u64),
            amount: U256::from(2_500_000u64),
            stoploss: U256::ZERO,
            takeprofit: U256::from(4_000_000_000u64),
            expiration: U256::from(1_760_000_000u64),
            asset: Address::ZERO,
        };
        let tx_hash = b256!("0x47de82c4aa40baa30cabac4a74568488a8c74ded85a4e905f1ceaad4f29945e3");
        let log = Log {
            inner: alloy::primitives::Log {
                address: Chain::local().orderbook(),
                data: event.encode_log_data(),
            },
            block_number: Some(1234),
            transaction_hash: Some(tx_hash),
            log_index: Some(3),
            ..Default::default()
        };

        let order = decode_log(&log, num::Converter::usd()).unwrap();
        assert_eq!(order.block_number(), 1234);
        assert_eq!(order.tx_hash(), tx_hash);
        assert_eq!(order.log_index(), 3);
        assert_eq!(order.event().order_id(), U256::from(7));
        assert_eq!(order.event().side(), Some(OrderSide::Buy));
        assert_eq!(order.event().amount(), udec128!(2.5));
        assert_eq!(order.event().takeprofit(), udec64!(4000));
    }

    #[test]
    fn test_decode_log_foreign_event() {
        let log = Log {
            inner: alloy::primitives::Log {
                address: Chain::local().orderbook(),
                data: LogData::new_unchecked(
                    vec![b256!(
                        "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
                    )],
                    Default::default(),
                ),
            },
            ..Default::default()
        };
        assert!(matches!(
            decode_log(&log, num::Converter::usd()),
            Err(DexError::Fatal(_))
        ));
    }
}
