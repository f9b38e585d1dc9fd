//! The lane abstraction: admission predicate, ordering rule, block-space
//! quota, and the prepare/process hooks the proposal handlers drive.

pub mod base;
pub mod default;
pub mod free;

pub use self::base::{BaseLane, LaneBuilder};

use {
    crate::{mempool::InsertError, pool_tx::PoolTx, proposal::Proposal},
    num::BigRational,
    primitives::{ante::AnteError, codec::CodecError, store::StateStore, Context, Tx, TxHash},
    thiserror::Error,
};

/// Storage behind a lane: priority-ordered, keyed by tx hash, snapshot reads.
pub trait LaneMempool: Send + Sync {
    fn insert(&self, tx: PoolTx) -> Result<(), InsertError>;
    fn remove(&self, hash: &TxHash);
    fn contains(&self, hash: &TxHash) -> bool;
    fn count_txs(&self) -> usize;
    /// A snapshot in priority order, insulated from concurrent inserts.
    fn select(&self) -> Vec<PoolTx>;
}

/// Byte budget a lane may spend on one proposal. The global byte and gas
/// ceilings are enforced by the [`Proposal`] itself.
#[derive(Clone, Copy, Debug)]
pub struct LaneLimits {
    pub max_bytes: u64,
}

pub trait Lane: Send + Sync {
    fn name(&self) -> &str;

    /// Fraction of the block's bytes this lane may claim; zero means the
    /// lane shares whatever budget is left once quota'd lanes are funded.
    fn max_block_space(&self) -> &BigRational;

    fn matches(&self, ctx: &Context, tx: &Tx) -> bool;

    fn mempool(&self) -> &dyn LaneMempool;

    /// Fills the lane's share of the proposal from its mempool.
    fn prepare(
        &self,
        ctx: &Context,
        store: &dyn StateStore,
        proposal: &mut Proposal,
        limits: LaneLimits,
    ) -> Result<(), PrepareError>;

    /// Verifies and consumes this lane's prefix of the remaining proposal
    /// transactions, returning how many it consumed.
    fn process(
        &self,
        ctx: &Context,
        store: &dyn StateStore,
        txs: &[PoolTx],
    ) -> Result<usize, ProcessError>;

    /// Lane-local ordering invariant over a slice of proposal transactions;
    /// also forbids transactions that do not match the lane.
    fn check_order(&self, ctx: &Context, txs: &[PoolTx]) -> Result<(), ProcessError>;
}

/// Decides whether a transaction belongs to a lane.
pub trait MatchHandler: Send + Sync {
    fn matches(&self, ctx: &Context, tx: &Tx) -> bool;
}

impl<F> MatchHandler for F
where
    F: Fn(&Context, &Tx) -> bool + Send + Sync,
{
    fn matches(&self, ctx: &Context, tx: &Tx) -> bool {
        self(ctx, tx)
    }
}

/// Lane-local ordering invariant.
pub trait OrderRule: Send + Sync {
    fn check(&self, ctx: &Context, txs: &[PoolTx]) -> Result<(), OrderViolation>;
}

impl<F> OrderRule for F
where
    F: Fn(&Context, &[PoolTx]) -> Result<(), OrderViolation> + Send + Sync,
{
    fn check(&self, ctx: &Context, txs: &[PoolTx]) -> Result<(), OrderViolation> {
        self(ctx, txs)
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct OrderViolation(pub String);

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("{0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PrepareError {
    pub fn failed(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Failed(Box::new(err))
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to decode proposal transaction: {0}")]
    Decode(#[from] CodecError),
    #[error("lane {lane} rejected transaction {hash}: {source}")]
    Rejected {
        lane: String,
        hash: TxHash,
        #[source]
        source: AnteError,
    },
    #[error("ordering violated in lane {lane}: {source}")]
    Order {
        lane: String,
        #[source]
        source: OrderViolation,
    },
    #[error("lane {lane}: {source}")]
    Lane {
        lane: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{0} proposal transactions matched no lane")]
    Unmatched(usize),
}

impl ProcessError {
    pub fn lane(name: impl Into<String>, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Lane {
            lane: name.into(),
            source: Box::new(err),
        }
    }
}

/// Errors constructing a lane. Surfaced at module wiring, the only place a
/// caller may abort on them.
#[derive(Debug, Error)]
pub enum LaneInitError {
    #[error("lane name cannot be empty")]
    EmptyName,
    #[error("lane {0} has no mempool")]
    MissingMempool(String),
    #[error("lane {0} has no match handler")]
    MissingMatchHandler(String),
    #[error("lane {0}: max block space must be within [0, 1]")]
    QuotaOutOfRange(String),
}
