//! The top-of-block auction module. Searchers submit sealed bids carrying
//! ordered transaction bundles; the highest valid bid buys the first slots
//! of the next proposal. Proceeds are split between an escrow account and
//! the block proposer.
//!
//! The module plugs into the lane framework through [`lane::AuctionLane`]
//! and into transaction admission through [`ante::AuctionDecorator`].

pub mod ante;
pub mod error;
pub mod genesis;
pub mod hooks;
pub mod keeper;
pub mod lane;
pub mod mempool;
pub mod msg_server;
pub mod msgs;
pub mod params;
pub mod query;

pub use self::{
    ante::AuctionDecorator,
    error::AuctionError,
    hooks::{AuctionHooks, MultiHooks},
    keeper::Keeper,
    lane::AuctionLane,
    mempool::AuctionMempool,
    msgs::{MsgAuctionBid, MsgUpdateParams},
    params::Params,
};
