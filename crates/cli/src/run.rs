use {
    crate::args::{Args, AuctionBidArgs, Command, QueryCommand, TxCommand},
    anyhow::{bail, ensure, Context as _},
    auction::msgs::MsgAuctionBid,
    base64::Engine,
    clap::Parser,
    primitives::{
        codec::{ProtoCodec, TxEncoder},
        tx::{SignerInfo, Tx},
        AccountId, Bytes, Coin,
    },
    serde::Deserialize,
    tracing_subscriber::EnvFilter,
};

pub async fn run(args: impl Iterator<Item = String>) -> anyhow::Result<()> {
    let args = Args::parse_from(args);
    // `try_init` so repeated in-process invocations (tests) don't panic.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log))
        .with_writer(std::io::stderr)
        .try_init();

    match &args.command {
        Command::Tx(TxCommand::AuctionBid(bid_args)) => auction_bid(&args, bid_args).await,
        Command::Query(QueryCommand::Params) => query_params(&args).await,
    }
}

/// Builds, locally validates, and broadcasts an auction bid transaction.
async fn auction_bid(args: &Args, bid_args: &AuctionBidArgs) -> anyhow::Result<()> {
    ensure!(
        bid_args.timeout_height > 0,
        "timeout height must be greater than 0"
    );
    let bidder: AccountId = bid_args
        .bidder
        .parse()
        .context("invalid bidder address")?;
    let bid: Coin = bid_args.bid.parse().context("invalid bid coin")?;

    let mut transactions = Vec::new();
    for (position, token) in bid_args
        .transactions
        .split(',')
        .filter(|token| !token.is_empty())
        .enumerate()
    {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(token)
            .with_context(|| format!("failed to base64 decode bundled transaction {position}"))?;
        transactions.push(Bytes(raw));
    }

    let signature = hex::decode(bid_args.signature.trim_start_matches("0x"))
        .context("signature must be hex encoded")?;
    ensure!(!signature.is_empty(), "signature must not be empty");

    let msg = MsgAuctionBid {
        bidder,
        bid,
        transactions,
    };
    let tx = Tx {
        messages: vec![msg.to_msg()],
        signers: vec![SignerInfo {
            address: bidder,
            sequence: bid_args.sequence,
            signature: Bytes(signature),
        }],
        timeout_height: bid_args.timeout_height,
        gas_limit: 0,
        fee: None,
    };
    let raw = ProtoCodec.encode(&tx).context("failed to encode transaction")?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(raw.as_ref());

    if bid_args.dry_run {
        println!("{encoded}");
        return Ok(());
    }

    #[derive(Deserialize)]
    struct BroadcastResponse {
        code: u32,
        #[serde(default)]
        log: String,
    }

    let url = format!("{}/broadcast", args.node.trim_end_matches('/'));
    tracing::info!(%url, "broadcasting auction bid");
    let response: BroadcastResponse = reqwest::Client::new()
        .post(&url)
        .json(&serde_json::json!({ "tx_bytes": encoded }))
        .send()
        .await
        .context("failed to reach the node")?
        .error_for_status()
        .context("node rejected the broadcast request")?
        .json()
        .await
        .context("malformed broadcast response")?;

    if response.code != 0 {
        bail!("broadcast failed with code {}: {}", response.code, response.log);
    }
    println!("broadcast accepted");
    Ok(())
}

async fn query_params(args: &Args) -> anyhow::Result<()> {
    let url = format!("{}/auction/params", args.node.trim_end_matches('/'));
    let params: serde_json::Value = reqwest::get(&url)
        .await
        .context("failed to reach the node")?
        .error_for_status()
        .context("params query failed")?
        .json()
        .await
        .context("malformed params response")?;
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}
