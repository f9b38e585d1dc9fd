//! The free lane: transactions that carry no fee. Kept ahead of the default
//! lane so fee-less traffic gets its own (usually small) slice of the block
//! instead of competing on a fee it does not have.

use {
    super::{base::LaneBuilder, BaseLane, Lane, LaneInitError, OrderViolation},
    crate::{
        mempool::{PriorityMempool, TxPriority},
        pool_tx::PoolTx,
    },
    num::BigRational,
    primitives::{ante::AnteChain, Context, Tx},
    std::sync::Arc,
};

pub const LANE_NAME: &str = "free";

pub fn is_free(_ctx: &Context, tx: &Tx) -> bool {
    tx.fee.is_none()
}

/// Free transactions have no fee to order by; arrival order is the only
/// ordering, so any slice is acceptable.
fn arrival_ordering(_ctx: &Context, _txs: &[PoolTx]) -> Result<(), OrderViolation> {
    Ok(())
}

struct ArrivalPriority;

impl TxPriority for ArrivalPriority {
    type Key = ();

    fn key(&self, _tx: &Tx) {}
}

pub fn lane(
    max_block_space: BigRational,
    ante: AnteChain,
    ignore: Vec<Arc<dyn Lane>>,
) -> Result<BaseLane, LaneInitError> {
    LaneBuilder::new(LANE_NAME)
        .max_block_space(max_block_space)
        .mempool(Arc::new(PriorityMempool::new(ArrivalPriority)))
        .match_handler(is_free)
        .order_rule(arrival_ordering)
        .ante(ante)
        .ignore(ignore)
        .build()
}
