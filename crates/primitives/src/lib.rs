//! Chain primitives shared by the block-building pipeline and the auction
//! module: coin and account types, the transaction model and its wire codec,
//! branched state access, and the contracts the host node fulfills (bank,
//! accounts, distribution, ante handling).

pub mod account;
pub mod ante;
pub mod bytes;
pub mod codec;
pub mod coin;
pub mod context;
pub mod keepers;
pub mod num;
pub mod ratio;
pub mod store;
pub mod tx;

#[cfg(any(feature = "test-util", test))]
pub mod test_util;

pub use self::{
    account::AccountId,
    bytes::Bytes,
    coin::{Coin, Denom},
    context::{Context, ExecMode},
    tx::{Msg, SignerInfo, Tx, TxHash},
};
