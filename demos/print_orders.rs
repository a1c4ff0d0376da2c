//! Example: Print the order book of a local node, then follow new orders.
//!
//! Run with: cargo run --example print_orders

use std::{pin::pin, time::Duration};

use alloy::{
    providers::{Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use futures::StreamExt;
use orderbook_sdk::{
    Chain,
    history::{self, HistoryConfig},
    num, stream,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(10, 100, 200))
        .connect("http://127.0.0.1:8545")
        .await?;
    client.set_poll_interval(Duration::from_millis(500));
    let provider = ProviderBuilder::new().connect_client(client);

    let chain = Chain::local();

    let rows = history::fetch(&chain, &provider, &HistoryConfig::default()).await?;
    println!("Latest {} order(s):", rows.len());
    for row in &rows {
        println!(
            "  #{} {:?} {} @ {} (total {}, {}%)",
            row.order().order_id(),
            row.side(),
            num::format_grouped(row.order().amount()),
            num::format_grouped(row.order().price()),
            num::format_grouped(row.total()),
            num::format_grouped(row.progress()),
        );
    }

    // Start from the next block
    let block_num = provider.get_block_number().await? + 1;
    println!("\nListening for orders from block {block_num}...\n");

    let mut orders = pin!(stream::order_placed(
        &chain,
        &provider,
        block_num,
        tokio::time::sleep
    ));
    while let Some(block) = orders.next().await {
        let block = block?;
        if block.is_empty() {
            continue;
        }
        println!(
            "Block {} - {} order(s):",
            block.block_number(),
            block.events().len()
        );
        for order in block.events() {
            let placed = order.event();
            println!(
                "  #{} by {} side={} {} @ {} (tx {})",
                placed.order_id(),
                placed.trader(),
                placed.order_type(),
                placed.amount(),
                placed.price(),
                order.tx_hash(),
            );
        }
    }

    Ok(())
}
