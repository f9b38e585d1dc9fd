//! The auction keeper: stateful bid validation, escrow movements, proceeds
//! distribution, and hook notification.

use {
    crate::{
        error::AuctionError,
        hooks::MultiHooks,
        msgs::{self, MsgAuctionBid, MsgUpdateParams},
        params::{Params, ParamsStore},
    },
    primitives::{
        codec::TxCodec,
        keepers::{BankKeeper, DistributionKeeper},
        store::StateStore,
        AccountId, Context, Tx, TxHash,
    },
    std::sync::Arc,
    tracing::info,
};

pub struct Keeper<B, D> {
    bank: B,
    distribution: D,
    codec: Arc<dyn TxCodec>,
    authority: AccountId,
    hooks: MultiHooks,
}

impl<B, D> Keeper<B, D>
where
    B: BankKeeper,
    D: DistributionKeeper,
{
    pub fn new(
        bank: B,
        distribution: D,
        codec: Arc<dyn TxCodec>,
        authority: AccountId,
        hooks: MultiHooks,
    ) -> Self {
        Self {
            bank,
            distribution,
            codec,
            authority,
            hooks,
        }
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn params(&self, store: &dyn StateStore) -> Result<Params, AuctionError> {
        ParamsStore::get(store)
    }

    pub fn set_params(
        &self,
        store: &mut dyn StateStore,
        params: &Params,
    ) -> Result<(), AuctionError> {
        ParamsStore::set(store, params)
    }

    /// Handles the authority-gated params replacement message.
    pub fn update_params(
        &self,
        store: &mut dyn StateStore,
        msg: &MsgUpdateParams,
    ) -> Result<(), AuctionError> {
        if msg.authority != self.authority {
            return Err(AuctionError::Unauthorized {
                signer: msg.authority,
            });
        }
        self.set_params(store, &msg.params)
    }

    pub fn codec(&self) -> &Arc<dyn TxCodec> {
        &self.codec
    }

    /// Validates a bid against state and params. The checks run in a fixed
    /// order and stop at the first failure. Returns the decoded bundle so
    /// callers don't decode twice.
    pub fn validate_bid(
        &self,
        _ctx: &Context,
        store: &dyn StateStore,
        tx: &Tx,
        bid: &MsgAuctionBid,
    ) -> Result<Vec<Tx>, AuctionError> {
        let params = self.params(store)?;

        // 1. The bidder signed the outer transaction.
        let signed = tx
            .signers
            .iter()
            .any(|signer| signer.address == bid.bidder && !signer.signature.is_empty());
        if !signed {
            return Err(AuctionError::UnsignedBid(bid.bidder));
        }

        // 2. Reserve floor, same denomination.
        if bid.bid.denom != params.reserve_fee.denom {
            return Err(AuctionError::InvalidBidDenom {
                got: bid.bid.denom.clone(),
                expected: params.reserve_fee.denom.clone(),
            });
        }
        if bid.bid.amount < params.reserve_fee.amount {
            return Err(AuctionError::BidBelowReserve {
                bid: bid.bid.clone(),
                reserve: params.reserve_fee.clone(),
            });
        }

        // 3. The bidder can cover the bid plus the buy-in.
        let needed = msgs::locked_amount(&bid.bid, &params)?;
        let available = self.bank.balance(store, &bid.bidder, &needed.denom);
        if available.amount < needed.amount {
            return Err(AuctionError::InsufficientFunds {
                bidder: bid.bidder,
                needed,
                available,
            });
        }

        // 4. Bundle size.
        if bid.transactions.len() > params.max_bundle_size as usize {
            return Err(AuctionError::BundleTooLarge {
                size: bid.transactions.len(),
                max: params.max_bundle_size,
            });
        }

        // 5. Bundled transactions decode and share the bid's timeout, so a
        // bundle can never outlive its bid.
        let bundle = bid
            .transactions
            .iter()
            .map(|raw| self.codec.decode(raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        for inner in &bundle {
            if inner.timeout_height != tx.timeout_height {
                return Err(AuctionError::TimeoutMismatch {
                    outer: tx.timeout_height,
                    inner: inner.timeout_height,
                });
            }
        }

        // 6. Front-running protection.
        if params.front_running_protection {
            check_front_running(&bid.bidder, &bundle)?;
        }

        Ok(bundle)
    }

    /// Settles a winning bid at finalization: the buy-in and the non-proposer
    /// share move to escrow, the proposer share goes through distribution,
    /// then subscribers are notified.
    pub fn execute_auction_bid(
        &self,
        ctx: &Context,
        store: &mut dyn StateStore,
        bid: &MsgAuctionBid,
    ) -> Result<(), AuctionError> {
        let params = self.params(store)?;

        let proposer_share = bid.bid.mul_floor(&params.proposer_fee);
        let escrow_share = bid.bid.checked_sub(&proposer_share).map_err(|_| {
            AuctionError::Internal("proposer share exceeds the bid".to_owned())
        })?;

        self.bank.send(
            store,
            &bid.bidder,
            &params.escrow_address,
            &params.min_buy_in_fee,
        )?;
        if !escrow_share.is_zero() {
            self.bank
                .send(store, &bid.bidder, &params.escrow_address, &escrow_share)?;
        }
        if !proposer_share.is_zero() {
            self.distribution.allocate_proposer_reward(
                store,
                &bid.bidder,
                &ctx.proposer,
                &proposer_share,
            )?;
        }

        let bundle_hash = bundle_hash(bid);
        info!(
            bidder = %bid.bidder,
            bid = %bid.bid,
            %bundle_hash,
            proposer = %ctx.proposer,
            "auction settled"
        );
        self.hooks.after_auction(&bid.bidder, &bid.bid, &bundle_hash);
        Ok(())
    }
}

/// Content hash of a bundle: the digest over its raw transactions in order.
pub fn bundle_hash(bid: &MsgAuctionBid) -> TxHash {
    let concatenated: Vec<u8> = bid
        .transactions
        .iter()
        .flat_map(|raw| raw.0.iter().copied())
        .collect();
    TxHash::digest(&concatenated)
}

/// Rejects bundles whose signer sequence allows sandwiching. Each signer
/// must own exactly one contiguous run of transactions, and sequences within
/// a run must increase by exactly one. A pattern like
/// `{attacker, victim, attacker}` splits the attacker into two runs and is
/// rejected.
pub fn check_front_running(
    _bidder: &AccountId,
    bundle: &[Tx],
) -> Result<(), AuctionError> {
    let mut seen: Vec<AccountId> = Vec::new();
    let mut previous: Option<(AccountId, u64)> = None;
    for tx in bundle {
        let signer = tx
            .principal()
            .ok_or_else(|| AuctionError::InvalidBid("unsigned bundled transaction".to_owned()))?;
        match previous {
            Some((address, sequence)) if address == signer.address => {
                if signer.sequence != sequence + 1 {
                    return Err(AuctionError::FrontRunningDetected);
                }
            }
            _ => {
                if seen.contains(&signer.address) {
                    // The signer already closed a run earlier in the bundle.
                    return Err(AuctionError::FrontRunningDetected);
                }
                seen.push(signer.address);
            }
        }
        previous = Some((signer.address, signer.sequence));
    }
    Ok(())
}
