use {
    primitives::{
        codec::CodecError,
        coin::{Coin, Denom},
        keepers::BankError,
        AccountId,
    },
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("invalid bid denomination {got}, auctions settle in {expected}")]
    InvalidBidDenom { got: Denom, expected: Denom },
    #[error("bid {bid} is below the reserve fee {reserve}")]
    BidBelowReserve { bid: Coin, reserve: Coin },
    #[error("bid {bid} must be at least {floor} to displace the standing bid")]
    BidIncrementTooSmall { bid: Coin, floor: Coin },
    #[error("insufficient funds: bidder {bidder} needs {needed}, holds {available}")]
    InsufficientFunds {
        bidder: AccountId,
        needed: Coin,
        available: Coin,
    },
    #[error("bundle of {size} transactions exceeds the maximum of {max}")]
    BundleTooLarge { size: usize, max: u32 },
    #[error("bundled transaction timeout {inner} differs from the bid timeout {outer}")]
    TimeoutMismatch { outer: u64, inner: u64 },
    #[error("bundle exhibits a front-running pattern")]
    FrontRunningDetected,
    #[error("proposal carries an auction bid outside the top-of-block slot")]
    MultipleBidsInBlock,
    #[error("malformed bid: {0}")]
    InvalidBid(String),
    #[error("bid is not signed by bidder {0}")]
    UnsignedBid(AccountId),
    #[error("{signer} is not authorized to update auction params")]
    Unauthorized { signer: AccountId },
    #[error(transparent)]
    DecodeFailure(#[from] CodecError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error("auction state is unavailable: {0}")]
    Internal(String),
}
