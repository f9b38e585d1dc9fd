//! The module's messages and their wire forms. Messages travel inside the
//! transaction's `Any` payloads; this module owns the two type URLs below.

use {
    crate::{error::AuctionError, params::Params},
    primitives::{
        codec::{decode_coin, encode_coin, CodecError},
        AccountId, Bytes, Coin, Msg, Tx,
    },
};

pub const MSG_AUCTION_BID: &str = "/pbs.auction.v1.MsgAuctionBid";
pub const MSG_UPDATE_PARAMS: &str = "/pbs.auction.v1.MsgUpdateParams";

/// A sealed bid for the top of the next block: the amount offered and the
/// bundle to place there, as raw signed transactions in execution order.
#[derive(Clone, Debug, PartialEq)]
pub struct MsgAuctionBid {
    pub bidder: AccountId,
    pub bid: Coin,
    pub transactions: Vec<Bytes<Vec<u8>>>,
}

impl MsgAuctionBid {
    pub fn to_msg(&self) -> Msg {
        let pb = proto::MsgAuctionBid {
            bidder: self.bidder.to_string(),
            bid: Some(encode_coin(&self.bid)),
            transactions: self.transactions.iter().map(|tx| tx.0.clone()).collect(),
        };
        Msg::new(MSG_AUCTION_BID, prost::Message::encode_to_vec(&pb))
    }

    pub fn from_msg(msg: &Msg) -> Result<Option<Self>, AuctionError> {
        if msg.type_url != MSG_AUCTION_BID {
            return Ok(None);
        }
        let pb = <proto::MsgAuctionBid as prost::Message>::decode(msg.value.as_ref())
            .map_err(CodecError::from)?;
        Ok(Some(Self {
            bidder: pb
                .bidder
                .parse()
                .map_err(|_| AuctionError::InvalidBid("malformed bidder address".to_owned()))?,
            bid: pb
                .bid
                .as_ref()
                .ok_or_else(|| AuctionError::InvalidBid("missing bid amount".to_owned()))
                .and_then(|coin| decode_coin(coin).map_err(AuctionError::from))?,
            transactions: pb.transactions.into_iter().map(Bytes).collect(),
        }))
    }
}

/// Governance-gated params replacement.
#[derive(Clone, Debug, PartialEq)]
pub struct MsgUpdateParams {
    pub authority: AccountId,
    pub params: Params,
}

impl MsgUpdateParams {
    pub fn to_msg(&self) -> Msg {
        let pb = proto::MsgUpdateParams {
            authority: self.authority.to_string(),
            params: Some(crate::params::proto::Params::from(&self.params)),
        };
        Msg::new(MSG_UPDATE_PARAMS, prost::Message::encode_to_vec(&pb))
    }

    pub fn from_msg(msg: &Msg) -> Result<Option<Self>, AuctionError> {
        if msg.type_url != MSG_UPDATE_PARAMS {
            return Ok(None);
        }
        let pb = <proto::MsgUpdateParams as prost::Message>::decode(msg.value.as_ref())
            .map_err(CodecError::from)?;
        Ok(Some(Self {
            authority: pb
                .authority
                .parse()
                .map_err(|_| AuctionError::InvalidBid("malformed authority address".to_owned()))?,
            params: pb
                .params
                .ok_or_else(|| AuctionError::InvalidParams("missing params".to_owned()))?
                .try_into()?,
        }))
    }
}

/// Extracts the auction bid from a transaction, if it carries one. A bid
/// must be the transaction's only message.
pub fn bid_in_tx(tx: &Tx) -> Result<Option<MsgAuctionBid>, AuctionError> {
    let mut bids = tx
        .messages
        .iter()
        .filter(|msg| msg.type_url == MSG_AUCTION_BID);
    let Some(first) = bids.next() else {
        return Ok(None);
    };
    if bids.next().is_some() || tx.messages.len() != 1 {
        return Err(AuctionError::InvalidBid(
            "an auction bid must be the transaction's only message".to_owned(),
        ));
    }
    MsgAuctionBid::from_msg(first)
}

/// True when the transaction carries a (possibly malformed) bid payload.
pub fn is_bid_tx(tx: &Tx) -> bool {
    tx.messages
        .iter()
        .any(|msg| msg.type_url == MSG_AUCTION_BID)
}

/// The sum a bidder must be able to cover on admission.
pub fn locked_amount(bid: &Coin, params: &Params) -> Result<Coin, AuctionError> {
    bid.checked_add(&params.min_buy_in_fee).map_err(|_| {
        AuctionError::InvalidBidDenom {
            got: bid.denom.clone(),
            expected: params.min_buy_in_fee.denom.clone(),
        }
    })
}

pub mod proto {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MsgAuctionBid {
        #[prost(string, tag = "1")]
        pub bidder: ::prost::alloc::string::String,
        #[prost(message, optional, tag = "2")]
        pub bid: ::core::option::Option<primitives::codec::proto::Coin>,
        #[prost(bytes = "vec", repeated, tag = "3")]
        pub transactions: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MsgUpdateParams {
        #[prost(string, tag = "1")]
        pub authority: ::prost::alloc::string::String,
        #[prost(message, optional, tag = "2")]
        pub params: ::core::option::Option<crate::params::proto::Params>,
    }
}
