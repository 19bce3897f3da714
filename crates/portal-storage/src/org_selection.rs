use crate::{SecureStorage, StorageKeys, StorageResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

/// Currently selected organization id, cached in memory after the first read.
pub struct OrgSelection {
    storage: Arc<dyn SecureStorage>,
    cached: Mutex<Option<Option<String>>>,
}

impl OrgSelection {
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self {
            storage,
            cached: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<String> {
        let mut cached = self.cached.lock();
        if let Some(value) = cached.as_ref() {
            return value.clone();
        }
        let value = match self.storage.get(StorageKeys::CURRENT_ORG_ID) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read current organization");
                return None;
            }
        };
        *cached = Some(value.clone());
        value
    }

    pub fn set(&self, org_id: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::CURRENT_ORG_ID, org_id)?;
        *self.cached.lock() = Some(Some(org_id.to_string()));
        Ok(())
    }

    pub fn clear(&self) -> StorageResult<()> {
        *self.cached.lock() = Some(None);
        self.storage.delete(StorageKeys::CURRENT_ORG_ID)?;
        Ok(())
    }
}
