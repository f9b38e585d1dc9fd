//! In-memory store and reference keepers for tests. These are complete
//! keeper implementations layered on [`StateStore`] keys, so branched
//! execution behaves exactly as it does against a real backend.

use {
    crate::{
        account::AccountId,
        bytes::Bytes,
        coin::{Coin, Denom},
        keepers::{Account, AccountKeeper, BankKeeper, BankError, DistributionKeeper},
        store::StateStore,
        tx::{Msg, SignerInfo, Tx},
    },
    primitive_types::U256,
    std::collections::BTreeMap,
};

#[derive(Default, Clone)]
pub struct MemStore(BTreeMap<Vec<u8>, Vec<u8>>);

impl StateStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.0.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.0.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.0.remove(key);
    }
}

fn balance_key(address: &AccountId, denom: &Denom) -> Vec<u8> {
    format!("bank/{address}/{denom}").into_bytes()
}

fn account_key(address: &AccountId) -> Vec<u8> {
    format!("acct/{address}").into_bytes()
}

fn reward_key(address: &AccountId, denom: &Denom) -> Vec<u8> {
    format!("dist/{address}/{denom}").into_bytes()
}

fn read_amount(store: &dyn StateStore, key: &[u8]) -> U256 {
    store
        .get(key)
        .and_then(|raw| String::from_utf8(raw).ok())
        .and_then(|s| U256::from_dec_str(&s).ok())
        .unwrap_or_default()
}

/// Bank keeper storing balances under `bank/{address}/{denom}`.
#[derive(Clone, Copy, Default)]
pub struct StoreBank;

impl BankKeeper for StoreBank {
    fn balance(&self, store: &dyn StateStore, address: &AccountId, denom: &Denom) -> Coin {
        Coin::new(denom.clone(), read_amount(store, &balance_key(address, denom)))
    }

    fn send(
        &self,
        store: &mut dyn StateStore,
        from: &AccountId,
        to: &AccountId,
        amount: &Coin,
    ) -> Result<(), BankError> {
        let from_balance = self.balance(store, from, &amount.denom);
        let remaining =
            from_balance
                .checked_sub(amount)
                .map_err(|_| BankError::InsufficientFunds {
                    address: *from,
                    available: from_balance.clone(),
                    needed: amount.clone(),
                })?;
        let to_balance = self
            .balance(store, to, &amount.denom)
            .checked_add(amount)
            .map_err(|_| BankError::Overflow(*to))?;
        store.set(
            balance_key(from, &amount.denom),
            remaining.amount.to_string().into_bytes(),
        );
        store.set(
            balance_key(to, &amount.denom),
            to_balance.amount.to_string().into_bytes(),
        );
        Ok(())
    }
}

/// Account keeper storing accounts as JSON under `acct/{address}`.
#[derive(Clone, Copy, Default)]
pub struct StoreAccounts;

impl AccountKeeper for StoreAccounts {
    fn account(&self, store: &dyn StateStore, address: &AccountId) -> Option<Account> {
        let raw = store.get(&account_key(address))?;
        serde_json::from_slice(&raw).ok()
    }

    fn set_account(&self, store: &mut dyn StateStore, account: &Account) {
        let raw = serde_json::to_vec(account).expect("account serializes");
        store.set(account_key(&account.address), raw);
    }
}

/// Distribution keeper accruing rewards under `dist/{address}/{denom}`.
#[derive(Clone, Copy, Default)]
pub struct StoreDistribution;

impl DistributionKeeper for StoreDistribution {
    fn allocate_proposer_reward(
        &self,
        store: &mut dyn StateStore,
        from: &AccountId,
        proposer: &AccountId,
        amount: &Coin,
    ) -> Result<(), BankError> {
        let from_balance = StoreBank.balance(store, from, &amount.denom);
        let remaining =
            from_balance
                .checked_sub(amount)
                .map_err(|_| BankError::InsufficientFunds {
                    address: *from,
                    available: from_balance.clone(),
                    needed: amount.clone(),
                })?;
        let key = reward_key(proposer, &amount.denom);
        let accrued = read_amount(store, &key)
            .checked_add(amount.amount)
            .ok_or(BankError::Overflow(*proposer))?;
        store.set(
            balance_key(from, &amount.denom),
            remaining.amount.to_string().into_bytes(),
        );
        store.set(key, accrued.to_string().into_bytes());
        Ok(())
    }
}

impl StoreDistribution {
    pub fn accrued(&self, store: &dyn StateStore, proposer: &AccountId, denom: &Denom) -> Coin {
        Coin::new(denom.clone(), read_amount(store, &reward_key(proposer, denom)))
    }
}

pub fn acct(tag: u8) -> AccountId {
    AccountId::from([tag; 20])
}

pub fn seed_account(store: &mut dyn StateStore, address: &AccountId, sequence: u64) {
    StoreAccounts.set_account(
        store,
        &Account {
            address: *address,
            sequence,
        },
    );
}

pub fn fund(store: &mut dyn StateStore, address: &AccountId, coin: &Coin) {
    store.set(
        balance_key(address, &coin.denom),
        coin.amount.to_string().into_bytes(),
    );
}

/// Transaction factory for tests.
pub struct TxBuilder {
    messages: Vec<Msg>,
    signers: Vec<SignerInfo>,
    timeout_height: u64,
    gas_limit: u64,
    fee: Option<Coin>,
}

impl TxBuilder {
    pub fn new() -> Self {
        Self {
            messages: vec![Msg::new("/test.MsgSend", vec![1])],
            signers: Vec::new(),
            timeout_height: 0,
            gas_limit: 100_000,
            fee: None,
        }
    }

    pub fn message(mut self, msg: Msg) -> Self {
        self.messages = vec![msg];
        self
    }

    pub fn messages(mut self, msgs: Vec<Msg>) -> Self {
        self.messages = msgs;
        self
    }

    pub fn signer(mut self, address: AccountId, sequence: u64) -> Self {
        self.signers.push(SignerInfo {
            address,
            sequence,
            signature: Bytes(vec![1; 64]),
        });
        self
    }

    pub fn unsigned_signer(mut self, address: AccountId, sequence: u64) -> Self {
        self.signers.push(SignerInfo {
            address,
            sequence,
            signature: Bytes(Vec::new()),
        });
        self
    }

    pub fn timeout_height(mut self, height: u64) -> Self {
        self.timeout_height = height;
        self
    }

    pub fn gas_limit(mut self, gas: u64) -> Self {
        self.gas_limit = gas;
        self
    }

    pub fn fee(mut self, fee: Coin) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn build(self) -> Tx {
        Tx {
            messages: self.messages,
            signers: self.signers,
            timeout_height: self.timeout_height,
            gas_limit: self.gas_limit,
            fee: self.fee,
        }
    }
}

impl Default for TxBuilder {
    fn default() -> Self {
        Self::new()
    }
}
