//! Message execution at finalization. The host's state machine routes the
//! module's messages here after a block is accepted.

use {
    crate::{
        error::AuctionError,
        keeper::Keeper,
        msgs::{MsgAuctionBid, MsgUpdateParams},
    },
    primitives::{
        keepers::{BankKeeper, DistributionKeeper},
        store::StateStore,
        Context, Msg, Tx,
    },
    std::sync::Arc,
};

pub struct MsgServer<B, D> {
    keeper: Arc<Keeper<B, D>>,
}

impl<B, D> MsgServer<B, D>
where
    B: BankKeeper,
    D: DistributionKeeper,
{
    pub fn new(keeper: Arc<Keeper<B, D>>) -> Self {
        Self { keeper }
    }

    /// Executes one of the module's messages; `Ok(false)` means the message
    /// belongs to another module.
    pub fn handle(
        &self,
        ctx: &Context,
        store: &mut dyn StateStore,
        tx: &Tx,
        msg: &Msg,
    ) -> Result<bool, AuctionError> {
        if let Some(bid) = MsgAuctionBid::from_msg(msg)? {
            self.keeper.execute_auction_bid(ctx, store, &bid)?;
            return Ok(true);
        }
        if let Some(update) = MsgUpdateParams::from_msg(msg)? {
            if !tx.is_signed_by(&update.authority) {
                return Err(AuctionError::Unauthorized {
                    signer: update.authority,
                });
            }
            self.keeper.update_params(store, &update)?;
            return Ok(true);
        }
        Ok(false)
    }
}
