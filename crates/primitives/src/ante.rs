//! The transaction-admission pipeline contract. Decorators run in order and
//! short-circuit on the first rejection; the host composes its own chain and
//! lanes run theirs against branched state during proposal work.

use {
    crate::{
        context::{Context, ExecMode},
        keepers::AccountKeeper,
        store::StateStore,
        tx::Tx,
    },
    std::sync::Arc,
    thiserror::Error,
};

pub trait AnteDecorator: Send + Sync {
    fn ante_handle(
        &self,
        ctx: &Context,
        store: &mut dyn StateStore,
        tx: &Tx,
    ) -> Result<(), AnteError>;
}

#[derive(Debug, Error)]
pub enum AnteError {
    #[error("transaction has no signers")]
    Unsigned,
    #[error("missing signature for {0}")]
    MissingSignature(crate::account::AccountId),
    #[error("unknown account {0}")]
    UnknownAccount(crate::account::AccountId),
    #[error("account sequence mismatch for {address}: expected {expected}, got {got}")]
    SequenceMismatch {
        address: crate::account::AccountId,
        expected: u64,
        got: u64,
    },
    #[error("out of gas: wanted {wanted}, remaining {remaining}")]
    OutOfGas { wanted: u64, remaining: u64 },
    /// A module decorator rejected the transaction.
    #[error("{0}")]
    Module(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AnteError {
    pub fn module(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Module(Box::new(err))
    }
}

/// An ordered decorator chain; itself a decorator so chains compose.
#[derive(Clone)]
pub struct AnteChain(Vec<Arc<dyn AnteDecorator>>);

impl AnteChain {
    pub fn new(decorators: Vec<Arc<dyn AnteDecorator>>) -> Self {
        Self(decorators)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }
}

impl AnteDecorator for AnteChain {
    fn ante_handle(
        &self,
        ctx: &Context,
        store: &mut dyn StateStore,
        tx: &Tx,
    ) -> Result<(), AnteError> {
        for decorator in &self.0 {
            decorator.ante_handle(ctx, store, tx)?;
        }
        Ok(())
    }
}

/// Reference chain head: every signer must carry a signature, the principal
/// signer's sequence must match the account state, and the sequence is bumped
/// so several transactions from one sender can be admitted into the same
/// proposal simulation.
pub struct SigVerificationDecorator<A> {
    accounts: A,
}

impl<A> SigVerificationDecorator<A> {
    pub fn new(accounts: A) -> Self {
        Self { accounts }
    }
}

impl<A: AccountKeeper> AnteDecorator for SigVerificationDecorator<A> {
    fn ante_handle(
        &self,
        ctx: &Context,
        store: &mut dyn StateStore,
        tx: &Tx,
    ) -> Result<(), AnteError> {
        let principal = tx.principal().ok_or(AnteError::Unsigned)?;
        for signer in &tx.signers {
            if signer.signature.is_empty() {
                return Err(AnteError::MissingSignature(signer.address));
            }
        }

        let mut account = self
            .accounts
            .account(store, &principal.address)
            .ok_or(AnteError::UnknownAccount(principal.address))?;
        if account.sequence != principal.sequence {
            return Err(AnteError::SequenceMismatch {
                address: principal.address,
                expected: account.sequence,
                got: principal.sequence,
            });
        }

        // ReCheckTx re-evaluates txs that already bumped the sequence once.
        if ctx.mode != ExecMode::ReCheckTx {
            account.sequence += 1;
            self.accounts.set_account(store, &account);
        }
        Ok(())
    }
}
