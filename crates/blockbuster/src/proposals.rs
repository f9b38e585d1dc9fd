//! The consensus-facing handlers. `prepare_proposal` is infallible by
//! contract: a failing lane contributes nothing and the block goes on.
//! `process_proposal` is strict: any violation rejects the whole proposal.

use {
    crate::{
        compose::Blockbuster,
        lane::{LaneLimits, ProcessError},
        pool_tx::PoolTx,
        proposal::Proposal,
    },
    num::Zero,
    primitives::{
        codec::TxDecoder,
        num::mul_ratio_floor,
        store::StateStore,
        Bytes, Context,
    },
    std::sync::Arc,
    tracing::{debug, warn},
};

#[derive(Clone, Debug)]
pub struct PrepareRequest {
    pub max_tx_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrepareResponse {
    pub txs: Vec<Bytes<Vec<u8>>>,
}

#[derive(Clone, Debug)]
pub struct ProcessRequest {
    pub txs: Vec<Bytes<Vec<u8>>>,
}

pub struct ProposalHandler {
    mempool: Arc<Blockbuster>,
    decoder: Arc<dyn TxDecoder>,
}

impl ProposalHandler {
    pub fn new(mempool: Arc<Blockbuster>, decoder: Arc<dyn TxDecoder>) -> Self {
        Self { mempool, decoder }
    }

    /// Fills a proposal lane by lane in priority order. Lanes with a fixed
    /// quota get `floor(max_tx_bytes · quota)`; zero-quota lanes split the
    /// budget still unused when they are reached, equally among themselves.
    pub fn prepare_proposal(
        &self,
        ctx: &Context,
        store: &dyn StateStore,
        req: &PrepareRequest,
    ) -> PrepareResponse {
        let mut proposal = Proposal::new(req.max_tx_bytes, ctx.consensus_max_gas);
        let mut unconstrained_left = self
            .mempool
            .lanes()
            .iter()
            .filter(|lane| lane.max_block_space().is_zero())
            .count() as u64;

        for lane in self.mempool.lanes() {
            if ctx.deadline_exceeded() {
                debug!("proposal deadline reached, returning partial proposal");
                break;
            }
            let quota = lane.max_block_space();
            let max_bytes = if quota.is_zero() {
                let share = proposal.remaining_bytes() / unconstrained_left.max(1);
                unconstrained_left = unconstrained_left.saturating_sub(1);
                share
            } else {
                mul_ratio_floor(req.max_tx_bytes, quota)
            };

            let before = proposal.len();
            if let Err(err) = lane.prepare(ctx, store, &mut proposal, LaneLimits { max_bytes }) {
                warn!(lane = %lane.name(), %err, "lane failed to prepare, skipping");
                continue;
            }
            debug!(
                lane = %lane.name(),
                selected = proposal.len() - before,
                total_bytes = proposal.total_bytes(),
                "lane prepared"
            );
        }

        PrepareResponse {
            txs: proposal.into_txs(),
        }
    }

    /// Walks the proposed transactions through the lanes in priority order.
    /// Each lane consumes its prefix; whatever survives every lane means the
    /// proposer included transactions no lane admits.
    pub fn process_proposal(
        &self,
        ctx: &Context,
        store: &dyn StateStore,
        req: &ProcessRequest,
    ) -> Result<(), ProcessError> {
        let txs = req
            .txs
            .iter()
            .map(|raw| {
                let tx = self.decoder.decode(raw.as_ref())?;
                Ok(PoolTx::new(tx, raw.clone()))
            })
            .collect::<Result<Vec<_>, ProcessError>>()?;

        let mut rest = txs.as_slice();
        for lane in self.mempool.lanes() {
            let consumed = lane.process(ctx, store, rest)?;
            debug!(lane = %lane.name(), consumed, "lane processed");
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            return Err(ProcessError::Unmatched(rest.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::lane::{default, free, Lane},
        num::BigRational,
        primitives::{
            ante::AnteChain,
            codec::{ProtoCodec, TxEncoder},
            coin::{Coin, Denom},
            test_util::TxBuilder,
            ExecMode, Tx,
        },
        std::time::{Duration, Instant},
    };

    fn encode(tx: &Tx) -> PoolTx {
        let raw = ProtoCodec.encode(tx).unwrap();
        PoolTx::new(tx.clone(), raw)
    }

    fn paid_tx(tag: u8, fee: u64) -> PoolTx {
        let denom = Denom::new("uatom").unwrap();
        encode(
            &TxBuilder::new()
                .message(primitives::Msg::new("/test.MsgSend", vec![tag]))
                .fee(Coin::new(denom, fee))
                .build(),
        )
    }

    fn free_tx(tag: u8) -> PoolTx {
        encode(
            &TxBuilder::new()
                .message(primitives::Msg::new("/test.MsgSend", vec![tag, tag]))
                .build(),
        )
    }

    fn handler_with_quotas(
        free_quota: BigRational,
        default_quota: BigRational,
    ) -> ProposalHandler {
        let free: Arc<dyn Lane> =
            Arc::new(free::lane(free_quota, AnteChain::empty(), vec![]).unwrap());
        let default: Arc<dyn Lane> = Arc::new(
            default::lane(default_quota, AnteChain::empty(), vec![free.clone()]).unwrap(),
        );
        ProposalHandler::new(
            Arc::new(Blockbuster::new(vec![free, default]).unwrap()),
            Arc::new(ProtoCodec),
        )
    }

    fn ctx() -> Context {
        Context::new(5, ExecMode::PrepareProposal).with_block_limits(10_000, None)
    }

    #[test]
    fn round_trip_accepts_own_proposal() {
        let handler = handler_with_quotas(BigRational::zero(), BigRational::zero());
        let store = primitives::test_util::MemStore::default();
        let insert_ctx = Context::new(5, ExecMode::CheckTx);

        for tx in [paid_tx(1, 30), paid_tx(2, 10), paid_tx(3, 20)] {
            handler.mempool.insert(&insert_ctx, tx).unwrap();
        }
        handler.mempool.insert(&insert_ctx, free_tx(4)).unwrap();

        let response = handler.prepare_proposal(
            &ctx(),
            &store,
            &PrepareRequest {
                max_tx_bytes: 10_000,
            },
        );
        assert_eq!(response.txs.len(), 4);

        handler
            .process_proposal(
                &ctx().with_mode(ExecMode::ProcessProposal),
                &store,
                &ProcessRequest { txs: response.txs },
            )
            .unwrap();
    }

    #[test]
    fn proposal_respects_max_tx_bytes() {
        let handler = handler_with_quotas(BigRational::zero(), BigRational::zero());
        let store = primitives::test_util::MemStore::default();
        let insert_ctx = Context::new(5, ExecMode::CheckTx);

        for tag in 0..50 {
            handler.mempool.insert(&insert_ctx, paid_tx(tag, 10)).unwrap();
        }

        let max_tx_bytes = 200;
        let response = handler.prepare_proposal(&ctx(), &store, &PrepareRequest { max_tx_bytes });
        let total: u64 = response.txs.iter().map(|raw| raw.len() as u64).sum();
        assert!(total <= max_tx_bytes);
        assert!(!response.txs.is_empty());
    }

    #[test]
    fn unmatched_transactions_reject_the_proposal() {
        // Only a free lane: paid transactions have nowhere to go.
        let free: Arc<dyn Lane> = Arc::new(
            free::lane(BigRational::zero(), AnteChain::empty(), vec![]).unwrap(),
        );
        let handler = ProposalHandler::new(
            Arc::new(Blockbuster::new(vec![free]).unwrap()),
            Arc::new(ProtoCodec),
        );
        let store = primitives::test_util::MemStore::default();

        let result = handler.process_proposal(
            &ctx().with_mode(ExecMode::ProcessProposal),
            &store,
            &ProcessRequest {
                txs: vec![paid_tx(1, 10).raw],
            },
        );
        assert!(matches!(result, Err(ProcessError::Unmatched(1))));
    }

    #[test]
    fn malformed_bytes_reject_the_proposal() {
        let handler = handler_with_quotas(BigRational::zero(), BigRational::zero());
        let store = primitives::test_util::MemStore::default();
        let result = handler.process_proposal(
            &ctx().with_mode(ExecMode::ProcessProposal),
            &store,
            &ProcessRequest {
                txs: vec![Bytes(vec![0xff; 4])],
            },
        );
        assert!(matches!(result, Err(ProcessError::Decode(_))));
    }

    fn url_lane(name: &str, url: &'static str, quota: BigRational) -> Arc<dyn Lane> {
        use crate::{
            lane::LaneBuilder,
            mempool::{FeePriority, PriorityMempool},
        };
        Arc::new(
            LaneBuilder::new(name)
                .max_block_space(quota)
                .mempool(Arc::new(PriorityMempool::new(FeePriority)))
                .match_handler(move |_: &Context, tx: &Tx| {
                    tx.messages.first().is_some_and(|msg| msg.type_url == url)
                })
                .build()
                .unwrap(),
        )
    }

    fn sized_tx(url: &str, tag: u8, size: usize) -> PoolTx {
        // The raw bytes only matter for size accounting here.
        PoolTx::new(
            TxBuilder::new()
                .message(primitives::Msg::new(url, vec![tag]))
                .build(),
            primitives::Bytes(vec![tag; size]),
        )
    }

    #[test]
    fn fixed_quotas_cap_lanes_and_leftover_falls_to_unconstrained() {
        let lane_a = url_lane("alpha", "/a", BigRational::new(3.into(), 10.into()));
        let lane_b = url_lane("beta", "/b", BigRational::new(3.into(), 10.into()));
        let lane_c = url_lane("gamma", "/c", BigRational::zero());
        let handler = ProposalHandler::new(
            Arc::new(Blockbuster::new(vec![lane_a, lane_b, lane_c]).unwrap()),
            Arc::new(ProtoCodec),
        );
        let store = primitives::test_util::MemStore::default();
        let insert_ctx = Context::new(5, ExecMode::CheckTx);

        for tag in 0..4 {
            handler
                .mempool
                .insert(&insert_ctx, sized_tx("/a", tag, 100))
                .unwrap();
            handler
                .mempool
                .insert(&insert_ctx, sized_tx("/b", 10 + tag, 100))
                .unwrap();
        }
        for tag in 0..6 {
            handler
                .mempool
                .insert(&insert_ctx, sized_tx("/c", 20 + tag, 100))
                .unwrap();
        }

        let response =
            handler.prepare_proposal(&ctx(), &store, &PrepareRequest { max_tx_bytes: 1000 });

        let count_from = |range: std::ops::Range<u8>| {
            response
                .txs
                .iter()
                .filter(|raw| range.contains(&raw.as_ref()[0]))
                .count()
        };
        // 300 bytes per quota'd lane, the remaining 400 go to the
        // unconstrained lane.
        assert_eq!(count_from(0..10), 3);
        assert_eq!(count_from(10..20), 3);
        assert_eq!(count_from(20..30), 4);
    }

    #[test]
    fn unconstrained_lanes_split_the_remainder_equally() {
        let lane_a = url_lane("alpha", "/a", BigRational::new(1.into(), 2.into()));
        let lane_b = url_lane("beta", "/b", BigRational::zero());
        let lane_c = url_lane("gamma", "/c", BigRational::zero());
        let handler = ProposalHandler::new(
            Arc::new(Blockbuster::new(vec![lane_a, lane_b, lane_c]).unwrap()),
            Arc::new(ProtoCodec),
        );
        let store = primitives::test_util::MemStore::default();
        let insert_ctx = Context::new(5, ExecMode::CheckTx);

        for tag in 0..10 {
            handler
                .mempool
                .insert(&insert_ctx, sized_tx("/a", tag, 50))
                .unwrap();
            handler
                .mempool
                .insert(&insert_ctx, sized_tx("/b", 10 + tag, 50))
                .unwrap();
            handler
                .mempool
                .insert(&insert_ctx, sized_tx("/c", 20 + tag, 50))
                .unwrap();
        }

        let response =
            handler.prepare_proposal(&ctx(), &store, &PrepareRequest { max_tx_bytes: 1000 });

        let count_from = |range: std::ops::Range<u8>| {
            response
                .txs
                .iter()
                .filter(|raw| range.contains(&raw.as_ref()[0]))
                .count()
        };
        // Lane alpha uses its full 500; beta and gamma get 250 each.
        assert_eq!(count_from(0..10), 10);
        assert_eq!(count_from(10..20), 5);
        assert_eq!(count_from(20..30), 5);
    }

    #[test]
    fn elapsed_deadline_returns_partial_proposal() {
        let handler = handler_with_quotas(BigRational::zero(), BigRational::zero());
        let store = primitives::test_util::MemStore::default();
        let insert_ctx = Context::new(5, ExecMode::CheckTx);
        handler.mempool.insert(&insert_ctx, paid_tx(1, 10)).unwrap();

        let expired = ctx().with_deadline(Instant::now() - Duration::from_millis(1));
        let response = handler.prepare_proposal(
            &expired,
            &store,
            &PrepareRequest {
                max_tx_bytes: 10_000,
            },
        );
        assert!(response.txs.is_empty());
    }
}
