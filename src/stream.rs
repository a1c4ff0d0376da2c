use std::time::Duration;

use alloy::{providers::Provider, rpc::types::Filter, sol_types::SolEvent};
use futures::{Stream, stream};
use tracing::debug;

use crate::{
    Chain,
    abi::orderbook::Orderbook::OrderPlaced,
    error::DexError,
    history::{self, Order},
    num, types,
};

pub type BlockOrders = types::BlockEvents<Order>;

/// Returns stream of orders placed on the order book, batched per block,
/// starting from the specified block.
///
/// Polls logs via the given [`Provider`] to produce strictly continuous
/// block sequence, with [`Provider`]-configured interval. Blocks without
/// orders are yielded empty.
///
/// On error the failed block is retried on the next poll.
///
/// It is recommended to setup provider with
/// [`alloy::transports::layers::FallbackLayer`]
/// and/or [`alloy::transports::layers::RetryBackoffLayer`].
pub fn order_placed<P, S, SFut>(
    chain: &Chain,
    provider: P,
    from_block: u64,
    sleep: S,
) -> impl Stream<Item = Result<BlockOrders, DexError>>
where
    P: Provider,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    let converter = num::Converter::usd();
    stream::unfold(
        (provider, from_block),
        move |(provider, mut block_num)| async move {
            let filter = Filter::new()
                .address(chain.orderbook())
                .event_signature(OrderPlaced::SIGNATURE_HASH)
                .from_block(block_num)
                .to_block(block_num);
            loop {
                // Anvil node, and maybe some RPC providers, produce empty response instead of
                // error in case the block in the filter does not exist yet, so logs are only
                // requested once the tip of the chain has reached the block
                let result = match provider.get_block_number().await {
                    Ok(head_block_num) if head_block_num < block_num => Err(
                        DexError::InvalidRequest("block is not available yet".to_string()),
                    ),
                    Ok(_) => provider
                        .get_logs(&filter)
                        .await
                        .map_err(DexError::from)
                        .and_then(|logs| {
                            let orders = logs
                                .iter()
                                .map(|log| history::decode_log(log, converter))
                                .collect::<Result<Vec<_>, _>>()?;
                            Ok(BlockOrders::new(block_num, orders))
                        }),
                    Err(e) => Err(DexError::from(e)),
                };
                if let Ok(block) = &result {
                    debug!(block_num, orders = block.events().len(), "Polled block");
                    block_num += 1;
                    return Some((result, (provider, block_num)));
                }
                if matches!(result, Err(DexError::InvalidRequest(_))) {
                    // Block is not available yet
                    sleep(provider.client().poll_interval()).await;
                    continue;
                }
                return Some((result, (provider, block_num)));
            }
        },
    )
}
