//! Command execution and output formatting.

use std::pin::pin;

use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::RpcClient,
    signers::local::PrivateKeySigner,
    transports::layers::RetryBackoffLayer,
};
use fastnum::{UD128, udec128};
use futures::StreamExt;
use orderbook_sdk::{
    Chain,
    error::DexError,
    history::{self, BookRow, Order},
    num, stream,
    submit::{OrderSubmitter, Placement},
    types::OrderSide,
};
use tracing::{info, warn};
use url::Url;

use crate::{
    config::{Command, EnvConfig},
    error::{Error, Result},
};

/// Width of the share bar at 100%.
const BAR_WIDTH: u64 = 20;

pub async fn run(command: Command, env: EnvConfig) -> Result<()> {
    let chain = env.chain()?;
    let node_url = Url::parse(&env.node_rpc_url)?;

    match command {
        Command::Book(args) => {
            let config = args.to_history_config()?;
            let rows = history::fetch(&chain, &read_provider(node_url), &config).await?;
            print_book(&rows);
        }
        Command::Market(args) => {
            let request = args.to_market_request()?;
            let placement = submitter(&env, &chain, node_url)?
                .place_market(&request)
                .await?;
            print_placement(&placement);
        }
        Command::Limit(args) => {
            let request = args.to_limit_request()?;
            let placement = submitter(&env, &chain, node_url)?
                .place_limit(&request)
                .await?;
            print_placement(&placement);
        }
        Command::Watch { from_block } => {
            watch(&chain, read_provider(node_url), from_block).await?;
        }
    }
    Ok(())
}

/// Provider for log queries, retried with backoff.
fn read_provider(node_url: Url) -> DynProvider {
    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(10, 100, 200))
        .http(node_url);
    DynProvider::new(ProviderBuilder::new().connect_client(client))
}

/// Submitter signing with the configured key. Transactions are sent once,
/// without a retry layer.
fn submitter(env: &EnvConfig, chain: &Chain, node_url: Url) -> Result<OrderSubmitter<DynProvider>> {
    let private_key: PrivateKeySigner = env
        .private_key
        .as_deref()
        .ok_or(Error::MissingPrivateKey)?
        .parse()?;
    let wallet = EthereumWallet::new(private_key);
    info!(wallet_address = %wallet.default_signer().address(), "Using wallet");

    let provider = DynProvider::new(
        ProviderBuilder::new()
            .wallet(wallet)
            .connect_client(RpcClient::new_http(node_url)),
    );
    Ok(OrderSubmitter::new(chain, provider).with_timeout(env.timeout()))
}

async fn watch(chain: &Chain, provider: DynProvider, from_block: Option<u64>) -> Result<()> {
    let from_block = match from_block {
        Some(block) => block,
        None => provider.get_block_number().await.map_err(DexError::from)? + 1,
    };
    let poll_interval = provider.client().poll_interval();
    info!(from_block, "Watching placed orders");

    let mut orders = pin!(stream::order_placed(
        chain,
        provider,
        from_block,
        tokio::time::sleep,
    ));
    while let Some(block) = orders.next().await {
        match block {
            Ok(block) => {
                for order in block.events() {
                    println!("{}", order_line(order));
                }
            }
            Err(e) => {
                warn!(%e, "Failed to poll placed orders, retrying");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
    Err(Error::StreamClosed)
}

fn side_label(side: Option<OrderSide>) -> &'static str {
    match side {
        Some(OrderSide::Buy) => "BUY",
        Some(OrderSide::Sell) => "SELL",
        None => "?",
    }
}

fn share_bar(progress: UD128) -> String {
    let width = num::Converter::new(0)
        .to_unsigned(progress * UD128::from(BAR_WIDTH) / udec128!(100))
        .saturating_to::<usize>();
    format!(
        "{:<bar$} {}%",
        "█".repeat(width),
        num::format_grouped(progress),
        bar = BAR_WIDTH as usize
    )
}

fn print_book(rows: &[BookRow]) {
    println!("\n{:=^86}", " ORDER BOOK ");
    println!(
        "{:>16} │ {:>14} │ {:>14} │ {:<4} │ {}",
        "Price (USDC)", "Size (USDC)", "Total (USDC)", "Side", "Share"
    );
    println!("{:-^86}", "");

    if rows.is_empty() {
        println!("{:^86}", "no orders placed");
    }
    for row in rows {
        let order = row.order();
        println!(
            "{:>16} │ {:>14} │ {:>14} │ {:<4} │ {}",
            num::format_grouped(order.price()),
            num::format_grouped(order.amount()),
            num::format_grouped(row.total()),
            side_label(Some(row.side())),
            share_bar(row.progress()),
        );
    }
    println!("{:=^86}", "");
}

fn order_line(order: &Order) -> String {
    let o = order.event();
    let expiration = match o.expiration() {
        0 => "never".to_string(),
        ts => ts.to_string(),
    };
    format!(
        "[block {}] #{} {} {} @ {} (trader: {}, tp: {}, sl: {}, expires: {})",
        order.block_number(),
        o.order_id(),
        side_label(o.side()),
        num::format_grouped(o.amount()),
        num::format_grouped(o.price()),
        o.trader(),
        o.takeprofit(),
        o.stoploss(),
        expiration,
    )
}

fn print_placement(placement: &Placement) {
    println!("Order placed in transaction {}", placement.tx_hash());
    if let Some(block) = placement.block_number() {
        println!("  block:    {block}");
    }
    match placement.order_id() {
        Some(order_id) => println!("  order id: {order_id}"),
        None => println!("  order id: not reported by the receipt"),
    }
}
