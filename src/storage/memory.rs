use crate::{error::RosterResult, storage::KeyValueStorage};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    #[cfg(test)]
    pub fn with_entry(key: &str, value: &str) -> Self {
        Self {
            entries: RwLock::new(HashMap::from([(key.to_string(), value.to_string())])),
        }
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> RosterResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> RosterResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Test double whose writes fail with a pool timeout while `failing` is set.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl FlakyStorage {
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    fn check(&self) -> RosterResult<()> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(crate::error::RosterError::MakeQuery {
                source: sqlx::Error::PoolTimedOut,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl KeyValueStorage for FlakyStorage {
    async fn get(&self, key: &str) -> RosterResult<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> RosterResult<()> {
        self.check()?;
        self.inner.set(key, value).await
    }
}
