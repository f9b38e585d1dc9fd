//! The meta-mempool: lanes composed in priority order. Routing gives each
//! transaction to the first lane that claims it, so a transaction lives in
//! exactly one lane at a time.

use {
    crate::{
        lane::Lane,
        mempool::InsertError,
        pool_tx::PoolTx,
    },
    num::BigRational,
    primitives::{Context, TxHash},
    std::{collections::HashSet, sync::Arc},
    thiserror::Error,
};

pub struct Blockbuster {
    lanes: Vec<Arc<dyn Lane>>,
}

impl Blockbuster {
    /// Composes lanes in priority order. Names must be unique and the fixed
    /// block-space quotas must not oversubscribe the block.
    pub fn new(lanes: Vec<Arc<dyn Lane>>) -> Result<Self, ComposeError> {
        if lanes.is_empty() {
            return Err(ComposeError::NoLanes);
        }
        let mut names = HashSet::new();
        for lane in &lanes {
            if !names.insert(lane.name().to_owned()) {
                return Err(ComposeError::DuplicateLane(lane.name().to_owned()));
            }
        }
        let total: BigRational = lanes
            .iter()
            .map(|lane| lane.max_block_space().clone())
            .sum();
        if total > BigRational::from_integer(1.into()) {
            return Err(ComposeError::Oversubscribed);
        }
        Ok(Self { lanes })
    }

    pub fn lanes(&self) -> &[Arc<dyn Lane>] {
        &self.lanes
    }

    pub fn insert(&self, ctx: &Context, tx: PoolTx) -> Result<(), InsertError> {
        let lane = self
            .lanes
            .iter()
            .find(|lane| lane.matches(ctx, &tx.tx))
            .ok_or(InsertError::NoMatchingLane)?;
        lane.mempool().insert(tx)
    }

    /// Removal consults every lane: the routing predicate may have changed
    /// since insertion (e.g. a params update), so the owner is unknown.
    pub fn remove(&self, hash: &TxHash) {
        for lane in &self.lanes {
            lane.mempool().remove(hash);
        }
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.lanes.iter().any(|lane| lane.mempool().contains(hash))
    }

    pub fn count_txs(&self) -> usize {
        self.lanes.iter().map(|lane| lane.mempool().count_txs()).sum()
    }

    /// Drains lane snapshots in priority order.
    pub fn select(&self) -> impl Iterator<Item = PoolTx> + '_ {
        self.lanes
            .iter()
            .flat_map(|lane| lane.mempool().select().into_iter())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ComposeError {
    #[error("at least one lane is required")]
    NoLanes,
    #[error("duplicate lane name {0:?}")]
    DuplicateLane(String),
    #[error("lane block-space quotas exceed the whole block")]
    Oversubscribed,
}
