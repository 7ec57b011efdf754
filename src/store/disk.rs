use super::{LedgerRecord, LedgerStore};
use anyhow::{Context, Result};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "ledger";
const RECORD_KEY: &str = "record";

/// Stores the record in a fjall keyspace under the data directory.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(data_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_path)
            .with_context(|| format!("Failed to create directory: {}", data_path.display()))?;

        let keyspace = Config::new(data_path.join("ledger"))
            .open()
            .with_context(|| format!("Failed to open ledger store in {}", data_path.display()))?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        debug!(path = %data_path.display(), "Opened ledger store");

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl LedgerStore for DiskStore {
    fn load(&self) -> Result<Option<LedgerRecord>> {
        match self.partition.get(RECORD_KEY)? {
            Some(bytes) => {
                let record: LedgerRecord = serde_json::from_slice(&bytes)
                    .context("Failed to decode stored ledger record")?;
                debug!(funders = record.ledger.funders.len(), "Loaded ledger record");
                Ok(Some(record))
            }
            None => {
                debug!("No ledger record stored yet");
                Ok(None)
            }
        }
    }

    fn save(&self, record: &LedgerRecord) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        self.partition.insert(RECORD_KEY, bytes)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!(funders = record.ledger.funders.len(), "Saved ledger record");
        Ok(())
    }
}
