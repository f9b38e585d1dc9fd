use {
    crate::pool_tx::PoolTx,
    primitives::{Bytes, TxHash},
    std::collections::HashSet,
    thiserror::Error,
};

/// A proposal under construction. Tracks the global byte and gas budgets so
/// lanes can only ever shrink the remaining space, never exceed it.
#[derive(Debug)]
pub struct Proposal {
    txs: Vec<Bytes<Vec<u8>>>,
    included: HashSet<TxHash>,
    total_bytes: u64,
    total_gas: u64,
    max_bytes: u64,
    max_gas: Option<u64>,
}

impl Proposal {
    pub fn new(max_bytes: u64, max_gas: Option<u64>) -> Self {
        Self {
            txs: Vec::new(),
            included: HashSet::new(),
            total_bytes: 0,
            total_gas: 0,
            max_bytes,
            max_gas,
        }
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.included.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.max_bytes.saturating_sub(self.total_bytes)
    }

    pub fn try_push(&mut self, tx: &PoolTx) -> Result<(), NoSpace> {
        self.try_push_all(std::slice::from_ref(tx))
    }

    /// Appends a batch atomically: either every transaction fits within the
    /// remaining byte and gas budgets or the proposal is left untouched.
    pub fn try_push_all(&mut self, txs: &[PoolTx]) -> Result<(), NoSpace> {
        let bytes: u64 = txs.iter().map(PoolTx::size).sum();
        let gas: u64 = txs.iter().map(|tx| tx.tx.gas_limit).sum();
        if self.total_bytes + bytes > self.max_bytes {
            return Err(NoSpace::Bytes {
                wanted: bytes,
                remaining: self.remaining_bytes(),
            });
        }
        if let Some(max_gas) = self.max_gas {
            if self.total_gas + gas > max_gas {
                return Err(NoSpace::Gas {
                    wanted: gas,
                    remaining: max_gas.saturating_sub(self.total_gas),
                });
            }
        }
        for tx in txs {
            if self.included.contains(&tx.hash) {
                return Err(NoSpace::Duplicate(tx.hash));
            }
        }
        for tx in txs {
            self.included.insert(tx.hash);
            self.txs.push(tx.raw.clone());
        }
        self.total_bytes += bytes;
        self.total_gas += gas;
        Ok(())
    }

    pub fn into_txs(self) -> Vec<Bytes<Vec<u8>>> {
        self.txs
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum NoSpace {
    #[error("batch of {wanted} bytes exceeds the remaining {remaining} bytes")]
    Bytes { wanted: u64, remaining: u64 },
    #[error("batch of {wanted} gas exceeds the remaining {remaining} gas")]
    Gas { wanted: u64, remaining: u64 },
    #[error("transaction {0} is already in the proposal")]
    Duplicate(TxHash),
}

#[cfg(test)]
mod tests {
    use {super::*, primitives::test_util::TxBuilder};

    fn pool_tx(payload: u8, size: usize, gas: u64) -> PoolTx {
        PoolTx::new(
            TxBuilder::new().gas_limit(gas).build(),
            Bytes(vec![payload; size]),
        )
    }

    #[test]
    fn enforces_byte_budget() {
        let mut proposal = Proposal::new(100, None);
        proposal.try_push(&pool_tx(1, 60, 0)).unwrap();
        assert!(matches!(
            proposal.try_push(&pool_tx(2, 50, 0)),
            Err(NoSpace::Bytes { .. })
        ));
        proposal.try_push(&pool_tx(3, 40, 0)).unwrap();
        assert_eq!(proposal.total_bytes(), 100);
    }

    #[test]
    fn batch_push_is_atomic() {
        let mut proposal = Proposal::new(100, Some(50));
        let batch = [pool_tx(1, 10, 30), pool_tx(2, 10, 30)];
        assert!(matches!(
            proposal.try_push_all(&batch),
            Err(NoSpace::Gas { .. })
        ));
        assert!(proposal.is_empty());
        assert_eq!(proposal.total_bytes(), 0);
    }

    #[test]
    fn rejects_duplicates() {
        let mut proposal = Proposal::new(100, None);
        let tx = pool_tx(1, 10, 0);
        proposal.try_push(&tx).unwrap();
        assert_eq!(proposal.try_push(&tx), Err(NoSpace::Duplicate(tx.hash)));
    }
}
