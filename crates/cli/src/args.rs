//! CLI arguments for the `auction-cli` binary.

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Client for the top-of-block auction module")]
pub struct Args {
    /// The log filter.
    #[arg(long, env, default_value = "warn,auction_cli=info")]
    pub log: String,

    /// Node REST endpoint.
    #[arg(long, env, default_value = "http://127.0.0.1:1317")]
    pub node: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transaction subcommands.
    #[command(subcommand)]
    Tx(TxCommand),
    /// Query subcommands.
    #[command(subcommand)]
    Query(QueryCommand),
}

#[derive(Subcommand, Debug)]
pub enum TxCommand {
    /// Submit an auction bid carrying base64-encoded signed transactions.
    AuctionBid(AuctionBidArgs),
}

#[derive(ClapArgs, Debug)]
pub struct AuctionBidArgs {
    /// Bidder account address.
    pub bidder: String,

    /// The bid, e.g. "1000uatom".
    pub bid: String,

    /// Comma-separated base64-encoded signed transactions, in bundle order.
    pub transactions: String,

    /// Height at which the bid (and its bundle) expires. Must be non-zero.
    #[arg(long)]
    pub timeout_height: u64,

    /// The bidder's account sequence.
    #[arg(long, default_value_t = 0)]
    pub sequence: u64,

    /// Hex-encoded signature over the transaction, produced by the wallet.
    #[arg(long)]
    pub signature: String,

    /// Print the encoded transaction instead of broadcasting it.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// Print the current auction params.
    Params,
}
