//! The auction lane's mempool: bids ordered by amount, at most one standing
//! bid per `(bidder, timeout)` key, displacement only for a meaningfully
//! higher offer.

use {
    crate::{
        error::AuctionError,
        msgs::{self, MsgAuctionBid},
    },
    blockbuster::{
        lane::LaneMempool,
        mempool::InsertError,
        PoolTx,
    },
    primitive_types::U256,
    primitives::{AccountId, Coin, TxHash},
    std::{
        cmp::Reverse,
        collections::{BTreeMap, HashMap},
        sync::RwLock,
    },
};

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone)]
struct QueueKey {
    bid: Reverse<U256>,
    arrival: u64,
}

struct Entry {
    tx: PoolTx,
    key: QueueKey,
    bidder: AccountId,
    timeout_height: u64,
    bid: Coin,
}

#[derive(Default)]
struct Inner {
    queue: BTreeMap<QueueKey, TxHash>,
    entries: HashMap<TxHash, Entry>,
    /// `(bidder, timeout_height)` to the standing bid's hash.
    index: HashMap<(AccountId, u64), TxHash>,
    next_arrival: u64,
}

pub struct AuctionMempool {
    min_bid_increment: Coin,
    inner: RwLock<Inner>,
}

impl AuctionMempool {
    /// The increment is fixed at wiring time; a governance change to it
    /// applies to this in-memory pool from the next node start.
    pub fn new(min_bid_increment: Coin) -> Self {
        Self {
            min_bid_increment,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Whether an address has a standing bid that is still live at `height`.
    pub fn has_pending_bid(&self, bidder: &AccountId, height: u64) -> bool {
        let inner = self.inner.read().expect("auction mempool lock poisoned");
        inner
            .index
            .keys()
            .any(|(address, timeout)| address == bidder && *timeout >= height)
    }

    /// Drops bids whose timeout has passed. Called by the host when a new
    /// height begins.
    pub fn purge_expired(&self, height: u64) -> usize {
        let mut inner = self.inner.write().expect("auction mempool lock poisoned");
        let expired: Vec<TxHash> = inner
            .entries
            .values()
            .filter(|entry| entry.timeout_height < height)
            .map(|entry| entry.tx.hash)
            .collect();
        for hash in &expired {
            Self::remove_locked(&mut inner, hash);
        }
        expired.len()
    }

    fn remove_locked(inner: &mut Inner, hash: &TxHash) {
        if let Some(entry) = inner.entries.remove(hash) {
            inner.queue.remove(&entry.key);
            inner.index.remove(&(entry.bidder, entry.timeout_height));
        }
    }

    fn parse(tx: &PoolTx) -> Result<MsgAuctionBid, InsertError> {
        msgs::bid_in_tx(&tx.tx)
            .map_err(InsertError::rejected)?
            .ok_or_else(|| {
                InsertError::rejected(AuctionError::InvalidBid(
                    "transaction carries no auction bid".to_owned(),
                ))
            })
    }
}

impl LaneMempool for AuctionMempool {
    /// Inserts a bid, enforcing the one-bid-per-`(bidder, timeout)` rule: a
    /// standing bid is displaced only by `standing + min_bid_increment` or
    /// more, otherwise the newcomer is rejected and the standing bid stays.
    fn insert(&self, tx: PoolTx) -> Result<(), InsertError> {
        let bid = Self::parse(&tx)?;
        let mut inner = self.inner.write().expect("auction mempool lock poisoned");

        // The ante decorator already placed this bid at admission; routing
        // the same transaction here again is a no-op.
        if inner.entries.contains_key(&tx.hash) {
            return Ok(());
        }

        let index_key = (bid.bidder, tx.tx.timeout_height);
        if let Some(standing_hash) = inner.index.get(&index_key).copied() {
            let standing = &inner.entries[&standing_hash];
            let floor = standing
                .bid
                .checked_add(&self.min_bid_increment)
                .map_err(InsertError::rejected)?;
            if bid
                .bid
                .cmp_amount(&floor)
                .map_err(InsertError::rejected)?
                .is_lt()
            {
                return Err(InsertError::rejected(AuctionError::BidIncrementTooSmall {
                    bid: bid.bid,
                    floor,
                }));
            }
            Self::remove_locked(&mut inner, &standing_hash);
        }

        let key = QueueKey {
            bid: Reverse(bid.bid.amount),
            arrival: inner.next_arrival,
        };
        inner.next_arrival += 1;
        inner.queue.insert(key.clone(), tx.hash);
        inner.index.insert(index_key, tx.hash);
        inner.entries.insert(
            tx.hash,
            Entry {
                tx,
                key,
                bidder: bid.bidder,
                timeout_height: index_key.1,
                bid: bid.bid,
            },
        );
        Ok(())
    }

    fn remove(&self, hash: &TxHash) {
        let mut inner = self.inner.write().expect("auction mempool lock poisoned");
        Self::remove_locked(&mut inner, hash);
    }

    fn contains(&self, hash: &TxHash) -> bool {
        self.inner
            .read()
            .expect("auction mempool lock poisoned")
            .entries
            .contains_key(hash)
    }

    fn count_txs(&self) -> usize {
        self.inner
            .read()
            .expect("auction mempool lock poisoned")
            .entries
            .len()
    }

    fn select(&self) -> Vec<PoolTx> {
        let inner = self.inner.read().expect("auction mempool lock poisoned");
        inner
            .queue
            .values()
            .filter_map(|hash| inner.entries.get(hash).map(|entry| entry.tx.clone()))
            .collect()
    }
}
