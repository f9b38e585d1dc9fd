//! The auction ante decorator. On admission it runs the full bid validation
//! and, for valid bids, debits the buy-in atomically with insertion into the
//! auction mempool. During proposal verification the lane re-validates; the
//! decorator's job there is already done.

use {
    crate::{
        error::AuctionError,
        keeper::Keeper,
        mempool::AuctionMempool,
        msgs,
    },
    blockbuster::{lane::LaneMempool, mempool::InsertError, PoolTx},
    primitives::{
        ante::{AnteDecorator, AnteError},
        keepers::{BankKeeper, DistributionKeeper},
        store::{Branch, StateStore},
        Context, ExecMode, Tx,
    },
    std::sync::Arc,
};

pub struct AuctionDecorator<B, D> {
    keeper: Arc<Keeper<B, D>>,
    mempool: Arc<AuctionMempool>,
}

impl<B, D> AuctionDecorator<B, D>
where
    B: BankKeeper,
    D: DistributionKeeper,
{
    pub fn new(keeper: Arc<Keeper<B, D>>, mempool: Arc<AuctionMempool>) -> Self {
        Self { keeper, mempool }
    }

    fn admit_bid(
        &self,
        ctx: &Context,
        store: &mut dyn StateStore,
        tx: &Tx,
    ) -> Result<(), AuctionError> {
        let Some(bid) = msgs::bid_in_tx(tx)? else {
            return self.guard_pending_bidders(ctx, store, tx);
        };
        self.keeper.validate_bid(ctx, store, tx, &bid)?;

        if ctx.mode == ExecMode::CheckTx {
            // Debit the buy-in and insert in one step: the debit only lands
            // if the mempool accepts the bid.
            let params = self.keeper.params(store)?;
            let mut branch = Branch::new(&*store);
            self.keeper.bank().send(
                &mut branch,
                &bid.bidder,
                &params.escrow_address,
                &params.min_buy_in_fee,
            )?;

            let raw = self.keeper.codec().encode(tx)?;
            let pool_tx = PoolTx::new(tx.clone(), raw);
            LaneMempool::insert(self.mempool.as_ref(), pool_tx).map_err(|err| match err {
                InsertError::Rejected(inner) => match inner.downcast::<AuctionError>() {
                    Ok(auction_err) => *auction_err,
                    Err(other) => AuctionError::InvalidBid(other.to_string()),
                },
                other => AuctionError::InvalidBid(other.to_string()),
            })?;
            branch.into_writes().apply(store);
        }
        Ok(())
    }

    /// With front-running protection on, an address with a live bid may not
    /// slip ordinary transactions into the same height around its bundle.
    fn guard_pending_bidders(
        &self,
        ctx: &Context,
        store: &dyn StateStore,
        tx: &Tx,
    ) -> Result<(), AuctionError> {
        if !matches!(ctx.mode, ExecMode::CheckTx | ExecMode::ReCheckTx) {
            return Ok(());
        }
        let params = self.keeper.params(store)?;
        if !params.front_running_protection {
            return Ok(());
        }
        if tx
            .signers
            .iter()
            .any(|signer| self.mempool.has_pending_bid(&signer.address, ctx.height))
        {
            return Err(AuctionError::FrontRunningDetected);
        }
        Ok(())
    }
}

impl<B, D> AnteDecorator for AuctionDecorator<B, D>
where
    B: BankKeeper + Send + Sync,
    D: DistributionKeeper + Send + Sync,
{
    fn ante_handle(
        &self,
        ctx: &Context,
        store: &mut dyn StateStore,
        tx: &Tx,
    ) -> Result<(), AnteError> {
        self.admit_bid(ctx, store, tx).map_err(AnteError::module)
    }
}
