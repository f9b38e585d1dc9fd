//! The top-of-block lane. Prepares the highest valid bid plus its bundle as
//! the head of the proposal and verifies exactly that shape back.

use {
    crate::{
        error::AuctionError,
        keeper::Keeper,
        mempool::AuctionMempool,
        msgs::{self, MsgAuctionBid},
    },
    blockbuster::{
        lane::{Lane, LaneLimits, LaneMempool, OrderViolation, PrepareError, ProcessError},
        PoolTx, Proposal,
    },
    num::BigRational,
    primitives::{
        keepers::{BankKeeper, DistributionKeeper},
        store::StateStore,
        Context, Tx,
    },
    std::sync::Arc,
    tracing::{debug, warn},
};

pub const LANE_NAME: &str = "auction";

pub struct AuctionLane<B, D> {
    max_block_space: BigRational,
    mempool: Arc<AuctionMempool>,
    keeper: Arc<Keeper<B, D>>,
}

impl<B, D> AuctionLane<B, D>
where
    B: BankKeeper,
    D: DistributionKeeper,
{
    pub fn new(
        max_block_space: BigRational,
        mempool: Arc<AuctionMempool>,
        keeper: Arc<Keeper<B, D>>,
    ) -> Self {
        Self {
            max_block_space,
            mempool,
            keeper,
        }
    }

    /// The bid transaction followed by its bundle, in bundle order.
    fn bid_batch(&self, pool_tx: &PoolTx, bid: &MsgAuctionBid, bundle: Vec<Tx>) -> Vec<PoolTx> {
        let mut batch = Vec::with_capacity(1 + bundle.len());
        batch.push(pool_tx.clone());
        for (tx, raw) in bundle.into_iter().zip(&bid.transactions) {
            batch.push(PoolTx::new(tx, raw.clone()));
        }
        batch
    }

    /// Verifies that `txs` starts with the bid's bundle, byte for byte and
    /// in order.
    fn check_bundle_prefix(
        &self,
        bid: &MsgAuctionBid,
        txs: &[PoolTx],
    ) -> Result<(), ProcessError> {
        if txs.len() < bid.transactions.len() {
            return Err(order_violation(format!(
                "proposal truncates the bundle: {} of {} transactions present",
                txs.len(),
                bid.transactions.len()
            )));
        }
        for (position, (expected, got)) in bid.transactions.iter().zip(txs).enumerate() {
            if expected != &got.raw {
                return Err(order_violation(format!(
                    "bundle transaction {position} is out of place"
                )));
            }
        }
        Ok(())
    }
}

fn order_violation(reason: String) -> ProcessError {
    ProcessError::Order {
        lane: LANE_NAME.to_owned(),
        source: OrderViolation(reason),
    }
}

impl<B, D> Lane for AuctionLane<B, D>
where
    B: BankKeeper + Send + Sync,
    D: DistributionKeeper + Send + Sync,
{
    fn name(&self) -> &str {
        LANE_NAME
    }

    fn max_block_space(&self) -> &BigRational {
        &self.max_block_space
    }

    fn matches(&self, _ctx: &Context, tx: &Tx) -> bool {
        msgs::is_bid_tx(tx)
    }

    fn mempool(&self) -> &dyn LaneMempool {
        self.mempool.as_ref()
    }

    /// Walks bids best-first. The first bid that validates against current
    /// state and fits the budgets wins the top of the block; invalid bids
    /// are evicted so they stop shadowing lower, valid ones.
    fn prepare(
        &self,
        ctx: &Context,
        store: &dyn StateStore,
        proposal: &mut Proposal,
        limits: LaneLimits,
    ) -> Result<(), PrepareError> {
        for pool_tx in self.mempool.select() {
            if ctx.deadline_exceeded() {
                break;
            }
            let bid = match msgs::bid_in_tx(&pool_tx.tx) {
                Ok(Some(bid)) => bid,
                Ok(None) | Err(_) => {
                    warn!(hash = %pool_tx.hash, "evicting malformed bid");
                    self.mempool.remove(&pool_tx.hash);
                    continue;
                }
            };
            if pool_tx.tx.timeout_height < ctx.height {
                debug!(hash = %pool_tx.hash, "evicting expired bid");
                self.mempool.remove(&pool_tx.hash);
                continue;
            }
            let bundle = match self.keeper.validate_bid(ctx, store, &pool_tx.tx, &bid) {
                Ok(bundle) => bundle,
                Err(err) => {
                    warn!(hash = %pool_tx.hash, %err, "evicting invalid bid");
                    self.mempool.remove(&pool_tx.hash);
                    continue;
                }
            };

            let batch = self.bid_batch(&pool_tx, &bid, bundle);
            let batch_bytes: u64 = batch.iter().map(PoolTx::size).sum();
            if batch_bytes > limits.max_bytes {
                debug!(
                    hash = %pool_tx.hash,
                    batch_bytes,
                    budget = limits.max_bytes,
                    "bid does not fit the lane budget, trying the next one"
                );
                continue;
            }
            match proposal.try_push_all(&batch) {
                Ok(()) => {
                    debug!(hash = %pool_tx.hash, bid = %bid.bid, "auction winner selected");
                    break;
                }
                Err(err) => {
                    debug!(hash = %pool_tx.hash, %err, "bid does not fit the proposal");
                    continue;
                }
            }
        }
        Ok(())
    }

    /// Consumes the winning bid and its bundle, if the proposal has one.
    /// Any bid appearing after the top-of-block slot rejects the proposal.
    fn process(
        &self,
        ctx: &Context,
        store: &dyn StateStore,
        txs: &[PoolTx],
    ) -> Result<usize, ProcessError> {
        let mut consumed = 0;
        if let Some(first) = txs.first() {
            if let Some(bid) = msgs::bid_in_tx(&first.tx)
                .map_err(|err| ProcessError::lane(LANE_NAME, err))?
            {
                self.keeper
                    .validate_bid(ctx, store, &first.tx, &bid)
                    .map_err(|err| ProcessError::lane(LANE_NAME, err))?;
                self.check_bundle_prefix(&bid, &txs[1..])?;
                consumed = 1 + bid.transactions.len();
            }
        }

        // The top-of-block slot is the only place a bid may appear.
        if txs[consumed..]
            .iter()
            .any(|pool_tx| msgs::is_bid_tx(&pool_tx.tx))
        {
            return Err(ProcessError::lane(
                LANE_NAME,
                AuctionError::MultipleBidsInBlock,
            ));
        }
        Ok(consumed)
    }

    /// Zero or one bid; if one, it leads and its bundle follows it exactly.
    fn check_order(&self, _ctx: &Context, txs: &[PoolTx]) -> Result<(), ProcessError> {
        let bids: Vec<usize> = txs
            .iter()
            .enumerate()
            .filter(|(_, tx)| msgs::is_bid_tx(&tx.tx))
            .map(|(position, _)| position)
            .collect();
        match bids.as_slice() {
            [] => Ok(()),
            [0] => match msgs::bid_in_tx(&txs[0].tx)
                .map_err(|err| ProcessError::lane(LANE_NAME, err))?
            {
                Some(bid) => self.check_bundle_prefix(&bid, &txs[1..]),
                None => Err(order_violation("malformed bid payload".to_owned())),
            },
            _ => Err(ProcessError::lane(
                LANE_NAME,
                AuctionError::MultipleBidsInBlock,
            )),
        }
    }
}
