//! Contracts the host state machine fulfills. The auction keeper and the
//! lanes only ever touch balances, accounts, and rewards through these
//! traits, always against an explicit store handle so callers choose
//! whether effects land on a branch or on the live state.

use {
    crate::{
        account::AccountId,
        coin::{Coin, Denom},
        store::StateStore,
    },
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: AccountId,
    pub sequence: u64,
}

pub trait BankKeeper: Send + Sync {
    fn balance(&self, store: &dyn StateStore, address: &AccountId, denom: &Denom) -> Coin;

    fn send(
        &self,
        store: &mut dyn StateStore,
        from: &AccountId,
        to: &AccountId,
        amount: &Coin,
    ) -> Result<(), BankError>;
}

pub trait AccountKeeper: Send + Sync {
    fn account(&self, store: &dyn StateStore, address: &AccountId) -> Option<Account>;

    fn set_account(&self, store: &mut dyn StateStore, account: &Account);
}

/// Routes block rewards. The auction keeper hands the proposer's share of
/// the winning bid through this seam at finalization: `amount` is debited
/// from `from` and credited to the proposer's reward pool.
pub trait DistributionKeeper: Send + Sync {
    fn allocate_proposer_reward(
        &self,
        store: &mut dyn StateStore,
        from: &AccountId,
        proposer: &AccountId,
        amount: &Coin,
    ) -> Result<(), BankError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum BankError {
    #[error("insufficient funds: account {address} holds {available}, needs {needed}")]
    InsufficientFunds {
        address: AccountId,
        available: Coin,
        needed: Coin,
    },
    #[error("amount overflow crediting {0}")]
    Overflow(AccountId),
}
