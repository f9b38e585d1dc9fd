//! End-to-end proposal scenarios: admission through the ante decorator,
//! block construction through the composed lanes, verification back, and
//! settlement of the winner.

use {
    auction::{
        ante::AuctionDecorator,
        hooks::MultiHooks,
        keeper::Keeper,
        lane::AuctionLane,
        mempool::AuctionMempool,
        msg_server::MsgServer,
        msgs::MsgAuctionBid,
        params::{reference_params, ParamsStore},
    },
    blockbuster::{
        lane::{default, free, Lane, LaneMempool},
        proposals::{PrepareRequest, ProcessRequest},
        Blockbuster, PoolTx, ProposalHandler,
    },
    num::{BigRational, Zero},
    primitives::{
        ante::{AnteChain, AnteDecorator, SigVerificationDecorator},
        codec::{ProtoCodec, TxEncoder},
        coin::{Coin, Denom},
        keepers::BankKeeper,
        test_util::{self, MemStore, StoreAccounts, StoreBank, StoreDistribution, TxBuilder},
        AccountId, Bytes, Context, ExecMode, Tx,
    },
    std::sync::Arc,
};

const HEIGHT: u64 = 10;
const TIMEOUT: u64 = 12;

fn denom() -> Denom {
    Denom::new("uatom").unwrap()
}

fn uatom(amount: u64) -> Coin {
    Coin::new(denom(), amount)
}

fn escrow() -> AccountId {
    test_util::acct(0xee)
}

struct Fixture {
    handler: ProposalHandler,
    decorator: AuctionDecorator<StoreBank, StoreDistribution>,
    mempool: Arc<Blockbuster>,
    auction_mempool: Arc<AuctionMempool>,
    keeper: Arc<Keeper<StoreBank, StoreDistribution>>,
    store: MemStore,
}

fn fixture() -> Fixture {
    let keeper = Arc::new(Keeper::new(
        StoreBank,
        StoreDistribution,
        Arc::new(ProtoCodec),
        test_util::acct(0xaa),
        MultiHooks::default(),
    ));
    let auction_mempool = Arc::new(AuctionMempool::new(uatom(10)));
    let auction_lane: Arc<dyn Lane> = Arc::new(AuctionLane::new(
        BigRational::new(1.into(), 2.into()),
        auction_mempool.clone(),
        keeper.clone(),
    ));
    let sig_ante = AnteChain::new(vec![Arc::new(SigVerificationDecorator::new(StoreAccounts))]);
    let free_lane: Arc<dyn Lane> = Arc::new(
        free::lane(BigRational::zero(), sig_ante.clone(), vec![auction_lane.clone()]).unwrap(),
    );
    let default_lane: Arc<dyn Lane> = Arc::new(
        default::lane(
            BigRational::zero(),
            sig_ante,
            vec![auction_lane.clone(), free_lane.clone()],
        )
        .unwrap(),
    );
    let mempool = Arc::new(
        Blockbuster::new(vec![auction_lane, free_lane, default_lane]).unwrap(),
    );

    let mut store = MemStore::default();
    ParamsStore::set(&mut store, &reference_params(denom(), escrow())).unwrap();

    Fixture {
        handler: ProposalHandler::new(mempool.clone(), Arc::new(ProtoCodec)),
        decorator: AuctionDecorator::new(keeper.clone(), auction_mempool.clone()),
        mempool,
        auction_mempool,
        keeper,
        store,
    }
}

fn check_ctx() -> Context {
    Context::new(HEIGHT, ExecMode::CheckTx)
}

fn prepare_ctx() -> Context {
    Context::new(HEIGHT, ExecMode::PrepareProposal)
        .with_block_limits(100_000, None)
        .with_proposer(test_util::acct(0xbb))
}

fn encoded(tx: &Tx) -> Bytes<Vec<u8>> {
    ProtoCodec.encode(tx).unwrap()
}

fn bundled_tx(signer: AccountId, sequence: u64) -> Bytes<Vec<u8>> {
    encoded(
        &TxBuilder::new()
            .signer(signer, sequence)
            .timeout_height(TIMEOUT)
            .build(),
    )
}

fn bid_tx(bidder: AccountId, amount: u64, bundle: Vec<Bytes<Vec<u8>>>) -> Tx {
    let msg = MsgAuctionBid {
        bidder,
        bid: uatom(amount),
        transactions: bundle,
    };
    TxBuilder::new()
        .message(msg.to_msg())
        .signer(bidder, 0)
        .timeout_height(TIMEOUT)
        .build()
}

fn ordinary_tx(fixture: &mut Fixture, tag: u8, fee: u64) -> PoolTx {
    let sender = test_util::acct(tag);
    test_util::seed_account(&mut fixture.store, &sender, 0);
    test_util::fund(&mut fixture.store, &sender, &uatom(1_000));
    let tx = TxBuilder::new()
        .message(primitives::Msg::new("/test.MsgSend", vec![tag]))
        .signer(sender, 0)
        .fee(uatom(fee))
        .build();
    PoolTx::new(tx.clone(), encoded(&tx))
}

/// Admits a bid the way the host would: the ante chain runs against the
/// ephemeral CheckTx state, so only the mempool insertion survives here.
fn admit_bid(fixture: &mut Fixture, tx: &Tx) {
    let mut checktx_state = fixture.store.clone();
    fixture
        .decorator
        .ante_handle(&check_ctx(), &mut checktx_state, tx)
        .unwrap();
}

#[test]
fn winning_bid_and_bundle_lead_the_proposal() {
    let mut fixture = fixture();
    let alice = test_util::acct(1);
    test_util::fund(&mut fixture.store, &alice, &uatom(5_000));

    let bundle = vec![bundled_tx(alice, 1), bundled_tx(alice, 2)];
    let bid = bid_tx(alice, 1_000, bundle.clone());
    admit_bid(&mut fixture, &bid);

    let low = bid_tx(test_util::acct(2), 500, vec![]);
    test_util::fund(&mut fixture.store, &test_util::acct(2), &uatom(5_000));
    admit_bid(&mut fixture, &low);

    let ordinary = ordinary_tx(&mut fixture, 3, 25);
    fixture.mempool.insert(&check_ctx(), ordinary.clone()).unwrap();

    let response = fixture.handler.prepare_proposal(
        &prepare_ctx(),
        &fixture.store,
        &PrepareRequest {
            max_tx_bytes: 100_000,
        },
    );

    // Winner first, bundle in order, then everything else.
    assert_eq!(response.txs[0], encoded(&bid));
    assert_eq!(response.txs[1], bundle[0]);
    assert_eq!(response.txs[2], bundle[1]);
    assert!(response.txs.contains(&ordinary.raw));
    assert!(!response.txs.contains(&encoded(&low)));

    // What we propose, we accept.
    fixture
        .handler
        .process_proposal(
            &prepare_ctx().with_mode(ExecMode::ProcessProposal),
            &fixture.store,
            &ProcessRequest { txs: response.txs },
        )
        .unwrap();
}

#[test]
fn settlement_splits_proceeds_between_escrow_and_proposer() {
    let mut fixture = fixture();
    let alice = test_util::acct(1);
    test_util::fund(&mut fixture.store, &alice, &uatom(5_000));

    let bid = bid_tx(alice, 1_000, vec![]);
    admit_bid(&mut fixture, &bid);
    // The admission debit only touched the CheckTx state.
    assert_eq!(
        StoreBank.balance(&fixture.store, &escrow(), &denom()),
        uatom(0)
    );

    let server = MsgServer::new(fixture.keeper.clone());
    let ctx = prepare_ctx().with_mode(ExecMode::Finalize);
    server
        .handle(&ctx, &mut fixture.store, &bid, &bid.messages[0])
        .unwrap();

    // proposer_fee = 1/4 of 1000: escrow ends with 750 plus the buy-in,
    // the proposer accrues 250, and the bidder paid 1010 in total.
    assert_eq!(
        StoreBank.balance(&fixture.store, &escrow(), &denom()),
        uatom(750 + 10)
    );
    assert_eq!(
        StoreDistribution.accrued(&fixture.store, &ctx.proposer, &denom()),
        uatom(250)
    );
    assert_eq!(
        StoreBank.balance(&fixture.store, &alice, &denom()),
        uatom(5_000 - 1_010)
    );
}

#[test]
fn second_bid_in_a_proposal_is_rejected() {
    let mut fixture = fixture();
    for tag in [1u8, 2] {
        test_util::fund(&mut fixture.store, &test_util::acct(tag), &uatom(5_000));
    }
    let first = bid_tx(test_util::acct(1), 1_000, vec![]);
    let second = bid_tx(test_util::acct(2), 900, vec![]);

    let result = fixture.handler.process_proposal(
        &prepare_ctx().with_mode(ExecMode::ProcessProposal),
        &fixture.store,
        &ProcessRequest {
            txs: vec![encoded(&first), encoded(&second)],
        },
    );
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("outside the top-of-block slot"));
}

#[test]
fn tampered_bundle_order_is_rejected() {
    let mut fixture = fixture();
    let alice = test_util::acct(1);
    test_util::fund(&mut fixture.store, &alice, &uatom(5_000));

    let bundle = vec![bundled_tx(alice, 1), bundled_tx(alice, 2)];
    let bid = bid_tx(alice, 1_000, bundle.clone());

    let result = fixture.handler.process_proposal(
        &prepare_ctx().with_mode(ExecMode::ProcessProposal),
        &fixture.store,
        &ProcessRequest {
            // Bundle transactions swapped by the proposer.
            txs: vec![encoded(&bid), bundle[1].clone(), bundle[0].clone()],
        },
    );
    assert!(result.unwrap_err().to_string().contains("out of place"));
}

#[test]
fn sandwich_bundle_is_stopped_at_admission_and_at_proposal_time() {
    let mut fixture = fixture();
    let alice = test_util::acct(1);
    let bob = test_util::acct(2);
    test_util::fund(&mut fixture.store, &alice, &uatom(5_000));

    let sandwich = vec![
        bundled_tx(alice, 1),
        bundled_tx(bob, 7),
        bundled_tx(alice, 2),
    ];
    let bid = bid_tx(alice, 1_000, sandwich);

    // Admission rejects it outright.
    let err = fixture
        .decorator
        .ante_handle(&check_ctx(), &mut fixture.store, &bid)
        .unwrap_err();
    assert!(err.to_string().contains("front-running"));

    // A proposer who includes it anyway gets the proposal voted down.
    let result = fixture.handler.process_proposal(
        &prepare_ctx().with_mode(ExecMode::ProcessProposal),
        &fixture.store,
        &ProcessRequest {
            txs: vec![encoded(&bid)],
        },
    );
    assert!(result.unwrap_err().to_string().contains("front-running"));
}

#[test]
fn invalid_bids_are_evicted_during_prepare() {
    let mut fixture = fixture();
    let alice = test_util::acct(1);
    let broke = test_util::acct(2);
    test_util::fund(&mut fixture.store, &alice, &uatom(5_000));
    // `broke` got its bid in while funded, then spent the balance.
    test_util::fund(&mut fixture.store, &broke, &uatom(5_000));
    let rich_bid = bid_tx(alice, 1_000, vec![]);
    let broke_bid = bid_tx(broke, 2_000, vec![]);
    admit_bid(&mut fixture, &rich_bid);
    admit_bid(&mut fixture, &broke_bid);
    test_util::fund(&mut fixture.store, &broke, &uatom(1));

    let response = fixture.handler.prepare_proposal(
        &prepare_ctx(),
        &fixture.store,
        &PrepareRequest {
            max_tx_bytes: 100_000,
        },
    );

    // The underfunded high bid is gone; the funded bid wins.
    assert_eq!(response.txs, vec![encoded(&rich_bid)]);
    assert!(!fixture.auction_mempool.contains(&PoolTx::new(
        broke_bid.clone(),
        encoded(&broke_bid)
    )
    .hash));
}

#[test]
fn expired_bids_are_evicted_during_prepare() {
    let mut fixture = fixture();
    let alice = test_util::acct(1);
    test_util::fund(&mut fixture.store, &alice, &uatom(5_000));

    let msg = MsgAuctionBid {
        bidder: alice,
        bid: uatom(1_000),
        transactions: vec![],
    };
    let stale = TxBuilder::new()
        .message(msg.to_msg())
        .signer(alice, 0)
        .timeout_height(HEIGHT - 1)
        .build();
    // Inserted directly: it was admitted at an earlier height.
    blockbuster::lane::LaneMempool::insert(
        fixture.auction_mempool.as_ref(),
        PoolTx::new(stale.clone(), encoded(&stale)),
    )
    .unwrap();

    let response = fixture.handler.prepare_proposal(
        &prepare_ctx(),
        &fixture.store,
        &PrepareRequest {
            max_tx_bytes: 100_000,
        },
    );
    assert!(response.txs.is_empty());
    assert_eq!(fixture.auction_mempool.count_txs(), 0);
}

#[test]
fn prepare_is_deterministic_across_nodes() {
    let build = || {
        let mut fixture = fixture();
        let alice = test_util::acct(1);
        test_util::fund(&mut fixture.store, &alice, &uatom(5_000));
        let bid = bid_tx(alice, 1_000, vec![bundled_tx(alice, 1)]);
        admit_bid(&mut fixture, &bid);
        for (tag, fee) in [(3u8, 40u64), (4, 20), (5, 30)] {
            let tx = ordinary_tx(&mut fixture, tag, fee);
            fixture.mempool.insert(&check_ctx(), tx).unwrap();
        }
        fixture.handler.prepare_proposal(
            &prepare_ctx(),
            &fixture.store,
            &PrepareRequest {
                max_tx_bytes: 100_000,
            },
        )
    };
    assert_eq!(build(), build());
}

#[test]
fn losing_bid_wins_the_next_height_after_removal() {
    let mut fixture = fixture();
    for tag in [1u8, 2] {
        test_util::fund(&mut fixture.store, &test_util::acct(tag), &uatom(5_000));
    }
    let high = bid_tx(test_util::acct(1), 1_000, vec![]);
    let low = bid_tx(test_util::acct(2), 500, vec![]);
    admit_bid(&mut fixture, &high);
    admit_bid(&mut fixture, &low);

    let request = PrepareRequest {
        max_tx_bytes: 100_000,
    };
    let response = fixture
        .handler
        .prepare_proposal(&prepare_ctx(), &fixture.store, &request);
    assert_eq!(response.txs, vec![encoded(&high)]);

    // The host removes included transactions on commit; the runner-up is
    // still around to win the next block.
    fixture
        .mempool
        .remove(&PoolTx::new(high.clone(), encoded(&high)).hash);
    let response = fixture
        .handler
        .prepare_proposal(&prepare_ctx(), &fixture.store, &request);
    assert_eq!(response.txs, vec![encoded(&low)]);
}
