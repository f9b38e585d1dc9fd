//! Key-value state access. The host provides the durable store; proposal
//! simulation and admission checks run against a [`Branch`] so side effects
//! stay contained until explicitly applied.

use std::collections::BTreeMap;

pub trait StateStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);
    fn delete(&mut self, key: &[u8]);
}

/// A write-buffering overlay on a parent store. Reads fall through to the
/// parent; writes stay in the overlay until turned into a [`WriteSet`].
pub struct Branch<'a> {
    parent: &'a dyn StateStore,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> Branch<'a> {
    pub fn new(parent: &'a dyn StateStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Consumes the branch, producing the buffered writes. Dropping the
    /// branch instead discards them.
    pub fn into_writes(self) -> WriteSet {
        WriteSet(self.writes)
    }
}

impl StateStore for Branch<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(write) => write.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }
}

/// Writes captured from a branch, applied to a store as one unit.
#[derive(Default)]
pub struct WriteSet(BTreeMap<Vec<u8>, Option<Vec<u8>>>);

impl WriteSet {
    pub fn apply(self, store: &mut dyn StateStore) {
        for (key, write) in self.0 {
            match write {
                Some(value) => store.set(key, value),
                None => store.delete(&key),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::test_util::MemStore};

    #[test]
    fn branch_isolates_writes() {
        let mut store = MemStore::default();
        store.set(b"a".to_vec(), b"1".to_vec());

        let mut branch = Branch::new(&store);
        branch.set(b"a".to_vec(), b"2".to_vec());
        branch.set(b"b".to_vec(), b"3".to_vec());
        assert_eq!(branch.get(b"a"), Some(b"2".to_vec()));
        assert_eq!(store.get(b"a"), Some(b"1".to_vec()));

        branch.into_writes().apply(&mut store);
        assert_eq!(store.get(b"a"), Some(b"2".to_vec()));
        assert_eq!(store.get(b"b"), Some(b"3".to_vec()));
    }

    #[test]
    fn branch_deletes_shadow_parent() {
        let mut store = MemStore::default();
        store.set(b"a".to_vec(), b"1".to_vec());

        let mut branch = Branch::new(&store);
        branch.delete(b"a");
        assert_eq!(branch.get(b"a"), None);

        // Dropping without materializing discards the delete.
        drop(branch);
        assert_eq!(store.get(b"a"), Some(b"1".to_vec()));
    }
}
