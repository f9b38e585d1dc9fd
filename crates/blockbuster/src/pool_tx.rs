use primitives::{Bytes, Tx, TxHash};

/// A transaction as the lanes carry it: the decoded form for predicates and
/// validation, the raw encoding for byte accounting and proposal assembly,
/// and the content hash keying both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolTx {
    pub tx: Tx,
    pub raw: Bytes<Vec<u8>>,
    pub hash: TxHash,
}

impl PoolTx {
    pub fn new(tx: Tx, raw: Bytes<Vec<u8>>) -> Self {
        let hash = TxHash::digest(raw.as_ref());
        Self { tx, raw, hash }
    }

    /// Encoded size in bytes, the unit all block-space budgets use.
    pub fn size(&self) -> u64 {
        self.raw.len() as u64
    }
}
