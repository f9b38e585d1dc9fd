//! The catch-all lane: accepts every transaction not claimed by a more
//! specific lane, ordered by fee.

use {
    super::{base::LaneBuilder, BaseLane, Lane, LaneInitError},
    crate::mempool::{FeePriority, PriorityMempool},
    num::BigRational,
    primitives::{ante::AnteChain, Context, Tx},
    std::sync::Arc,
};

pub const LANE_NAME: &str = "default";

pub fn match_all(_ctx: &Context, _tx: &Tx) -> bool {
    true
}

/// Builds the default lane. `ignore` should list every specialized lane so
/// their transactions are refused here during proposal verification.
pub fn lane(
    max_block_space: BigRational,
    ante: AnteChain,
    ignore: Vec<Arc<dyn Lane>>,
) -> Result<BaseLane, LaneInitError> {
    LaneBuilder::new(LANE_NAME)
        .max_block_space(max_block_space)
        .mempool(Arc::new(PriorityMempool::new(FeePriority)))
        .match_handler(match_all)
        .ante(ante)
        .ignore(ignore)
        .build()
}
