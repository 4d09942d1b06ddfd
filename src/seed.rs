use crate::{
    config::SeedConfig,
    data::student::StudentRecord,
    error::{RosterResult, SeedParseSnafu, SeedReadSnafu, SerialiseRecordsSnafu},
    storage::KeyValueStorage,
};
use snafu::ResultExt;
use std::{path::PathBuf, str::FromStr};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SeedPolicy {
    ///only seed when nothing is stored under the key yet
    #[default]
    IfEmpty,
    ///replace whatever is stored on every start, discarding local edits
    Overwrite,
}

impl FromStr for SeedPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "if_empty" => Ok(Self::IfEmpty),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { count: usize },
    AlreadySeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SeedLoader {
    path: PathBuf,
    key: String,
    policy: SeedPolicy,
}

impl SeedLoader {
    pub fn new(config: &SeedConfig, key: impl Into<String>) -> Self {
        Self {
            path: config.path.clone(),
            key: key.into(),
            policy: config.policy,
        }
    }

    /// Writes the seed asset into storage according to the policy.
    ///
    /// Failures are logged and leave storage as it was.
    pub async fn run(&self, storage: &dyn KeyValueStorage) -> SeedOutcome {
        match self.try_run(storage).await {
            Ok(outcome) => {
                info!(?outcome, path = %self.path.display(), "Seeding finished");
                outcome
            }
            Err(e) => {
                error!(?e, path = %self.path.display(), "Error fetching or storing seed data");
                SeedOutcome::Failed
            }
        }
    }

    async fn try_run(&self, storage: &dyn KeyValueStorage) -> RosterResult<SeedOutcome> {
        if self.policy == SeedPolicy::IfEmpty && storage.get(&self.key).await?.is_some() {
            return Ok(SeedOutcome::AlreadySeeded);
        }

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .context(SeedReadSnafu {
                path: self.path.clone(),
            })?;
        let records: Vec<StudentRecord> = serde_json::from_str(&raw).context(SeedParseSnafu {
            path: self.path.clone(),
        })?;

        let serialised = serde_json::to_string(&records).context(SerialiseRecordsSnafu)?;
        storage.set(&self.key, &serialised).await?;

        Ok(SeedOutcome::Seeded {
            count: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::MemoryStorage, store::RecordStore};
    use std::sync::Arc;
    use uuid::Uuid;

    const KEY: &str = "students";
    const SEED: &str = r#"[{"firstName":"A","lastName":"B","idNumber":"1234567","phone":"0500000000","email":"a@b.com"}]"#;

    struct SeedFile(PathBuf);

    impl SeedFile {
        fn new(contents: &str) -> Self {
            let path = std::env::temp_dir().join(format!("roster-seed-{}.json", Uuid::new_v4()));
            std::fs::write(&path, contents).expect("unable to write seed file");
            Self(path)
        }

        fn loader(&self, policy: SeedPolicy) -> SeedLoader {
            SeedLoader::new(
                &SeedConfig {
                    path: self.0.clone(),
                    policy,
                },
                KEY,
            )
        }
    }

    impl Drop for SeedFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn policies_parse() {
        assert_eq!("if_empty".parse::<SeedPolicy>(), Ok(SeedPolicy::IfEmpty));
        assert_eq!("overwrite".parse::<SeedPolicy>(), Ok(SeedPolicy::Overwrite));
        assert_eq!("always".parse::<SeedPolicy>(), Err(()));
    }

    #[tokio::test]
    async fn seeds_empty_storage_and_loads() {
        let seed = SeedFile::new(SEED);
        let storage = Arc::new(MemoryStorage::default());

        let outcome = seed.loader(SeedPolicy::IfEmpty).run(&*storage).await;
        assert_eq!(outcome, SeedOutcome::Seeded { count: 1 });

        let mut store = RecordStore::new(storage, KEY);
        store.load().await.unwrap();
        assert_eq!(store.filtered().len(), 1);

        store.search("999");
        assert_eq!(store.filtered().len(), 0);

        store.search("123");
        assert_eq!(store.filtered().len(), 1);
    }

    #[tokio::test]
    async fn if_empty_keeps_existing_data() {
        let seed = SeedFile::new(SEED);
        let storage = MemoryStorage::with_entry(KEY, "[]");

        let outcome = seed.loader(SeedPolicy::IfEmpty).run(&storage).await;
        assert_eq!(outcome, SeedOutcome::AlreadySeeded);
        assert_eq!(storage.get(KEY).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn overwrite_replaces_existing_data() {
        let seed = SeedFile::new(SEED);
        let storage = MemoryStorage::with_entry(KEY, "[]");

        let outcome = seed.loader(SeedPolicy::Overwrite).run(&storage).await;
        assert_eq!(outcome, SeedOutcome::Seeded { count: 1 });

        let stored = storage.get(KEY).await.unwrap().unwrap();
        let records: Vec<StudentRecord> = serde_json::from_str(&stored).unwrap();
        assert_eq!(records[0].fields.id_number, "1234567");
    }

    #[tokio::test]
    async fn seeded_ids_are_stable_across_loads() {
        let seed = SeedFile::new(SEED);
        let storage = Arc::new(MemoryStorage::default());
        seed.loader(SeedPolicy::IfEmpty).run(&*storage).await;

        let mut first = RecordStore::new(storage.clone(), KEY);
        first.load().await.unwrap();
        let mut second = RecordStore::new(storage, KEY);
        second.load().await.unwrap();

        assert_eq!(first.records()[0].id, second.records()[0].id);
    }

    #[tokio::test]
    async fn missing_asset_leaves_storage_untouched() {
        let storage = MemoryStorage::with_entry(KEY, "[]");
        let loader = SeedLoader::new(
            &SeedConfig {
                path: std::env::temp_dir().join(format!("missing-{}.json", Uuid::new_v4())),
                policy: SeedPolicy::Overwrite,
            },
            KEY,
        );

        assert_eq!(loader.run(&storage).await, SeedOutcome::Failed);
        assert_eq!(storage.get(KEY).await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn malformed_asset_leaves_storage_untouched() {
        let seed = SeedFile::new("[{\"firstName\": ");
        let storage = MemoryStorage::default();

        assert_eq!(
            seed.loader(SeedPolicy::IfEmpty).run(&storage).await,
            SeedOutcome::Failed
        );
        assert_eq!(storage.get(KEY).await.unwrap(), None);
    }
}
