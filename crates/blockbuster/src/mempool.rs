//! The generic lane mempool: a priority structure whose ordering comes from
//! a pluggable key extractor, with FIFO tie-breaking and snapshot reads.

use {
    crate::{lane::LaneMempool, pool_tx::PoolTx},
    primitive_types::U256,
    primitives::{Tx, TxHash},
    std::{
        cmp::Reverse,
        collections::{BTreeMap, HashMap},
        sync::RwLock,
    },
    thiserror::Error,
};

/// Extracts the comparable ordering key for a lane's transactions. Higher
/// keys are drawn first; equal keys fall back to arrival order.
pub trait TxPriority: Send + Sync + 'static {
    type Key: Ord + Clone + Send + Sync;

    fn key(&self, tx: &Tx) -> Self::Key;
}

/// Orders by the fee amount, zero for fee-less transactions.
pub struct FeePriority;

impl TxPriority for FeePriority {
    type Key = U256;

    fn key(&self, tx: &Tx) -> U256 {
        tx.fee.as_ref().map(|fee| fee.amount).unwrap_or_default()
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone)]
struct QueueKey<K: Ord> {
    priority: Reverse<K>,
    arrival: u64,
}

struct Inner<K: Ord> {
    queue: BTreeMap<QueueKey<K>, TxHash>,
    txs: HashMap<TxHash, (PoolTx, QueueKey<K>)>,
    next_arrival: u64,
}

pub struct PriorityMempool<P: TxPriority> {
    priority: P,
    inner: RwLock<Inner<P::Key>>,
}

impl<P: TxPriority> PriorityMempool<P> {
    pub fn new(priority: P) -> Self {
        Self {
            priority,
            inner: RwLock::new(Inner {
                queue: BTreeMap::new(),
                txs: HashMap::new(),
                next_arrival: 0,
            }),
        }
    }
}

impl<P: TxPriority> LaneMempool for PriorityMempool<P> {
    fn insert(&self, tx: PoolTx) -> Result<(), InsertError> {
        let mut inner = self.inner.write().expect("mempool lock poisoned");
        if inner.txs.contains_key(&tx.hash) {
            return Err(InsertError::Duplicate(tx.hash));
        }
        let key = QueueKey {
            priority: Reverse(self.priority.key(&tx.tx)),
            arrival: inner.next_arrival,
        };
        inner.next_arrival += 1;
        inner.queue.insert(key.clone(), tx.hash);
        inner.txs.insert(tx.hash, (tx, key));
        Ok(())
    }

    fn remove(&self, hash: &TxHash) {
        let mut inner = self.inner.write().expect("mempool lock poisoned");
        if let Some((_, key)) = inner.txs.remove(hash) {
            inner.queue.remove(&key);
        }
    }

    fn contains(&self, hash: &TxHash) -> bool {
        self.inner
            .read()
            .expect("mempool lock poisoned")
            .txs
            .contains_key(hash)
    }

    fn count_txs(&self) -> usize {
        self.inner.read().expect("mempool lock poisoned").txs.len()
    }

    fn select(&self) -> Vec<PoolTx> {
        let inner = self.inner.read().expect("mempool lock poisoned");
        inner
            .queue
            .values()
            .filter_map(|hash| inner.txs.get(hash).map(|(tx, _)| tx.clone()))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("no lane accepts this transaction")]
    NoMatchingLane,
    #[error("transaction {0} is already in the mempool")]
    Duplicate(TxHash),
    #[error("{0}")]
    Rejected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl InsertError {
    pub fn rejected(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Rejected(Box::new(err))
    }
}
