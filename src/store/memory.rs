use super::{LedgerRecord, LedgerStore};
use anyhow::{Result, anyhow};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Keeps the record in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Option<LedgerRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Option<LedgerRecord>> {
        let record = self
            .inner
            .read()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        Ok(record.clone())
    }

    fn save(&self, record: &LedgerRecord) -> Result<()> {
        let mut stored = self
            .inner
            .write()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        *stored = Some(record.clone());
        debug!("Ledger record saved in memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let record = LedgerRecord::new("0xowner".parse().unwrap());
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap(), Some(record));
    }
}
