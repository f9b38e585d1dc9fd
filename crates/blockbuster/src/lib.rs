//! Lane-based block building. A [`lane::Lane`] is a sub-mempool with its own
//! admission predicate, ordering rule, and share of block space. The
//! [`Blockbuster`] meta-mempool composes lanes in priority order, and the
//! [`proposals::ProposalHandler`] turns them into consensus proposals and
//! verifies proposals back, lane by lane.

pub mod compose;
pub mod lane;
pub mod mempool;
pub mod pool_tx;
pub mod proposal;
pub mod proposals;

pub use self::{
    compose::Blockbuster,
    lane::{Lane, LaneLimits, LaneMempool},
    pool_tx::PoolTx,
    proposal::Proposal,
    proposals::ProposalHandler,
};
