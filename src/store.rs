use crate::{
    data::student::{StudentFields, StudentId, StudentRecord},
    error::{
        DuplicateIdentifierSnafu, RecordNotFoundSnafu, RosterResult, SerialiseRecordsSnafu,
        StorageCorruptSnafu,
    },
    storage::KeyValueStorage,
};
use snafu::{OptionExt, ResultExt};
use std::{collections::HashSet, sync::Arc};

/// The in-memory roster, mirrored to durable storage after every mutation.
///
/// Also owns the search term, so the filtered view is recomputed whenever the
/// underlying list changes.
#[derive(Debug)]
pub struct RecordStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    records: Vec<StudentRecord>,
    search_term: String,
    filtered: Vec<StudentRecord>,
}

impl RecordStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            records: vec![],
            search_term: String::new(),
            filtered: vec![],
        }
    }

    /// Replaces the in-memory list with whatever is stored under the key.
    ///
    /// A missing key leaves the list empty. Unparseable data also leaves it
    /// empty and is reported as `StorageCorrupt`; the stored payload is not touched.
    pub async fn load(&mut self) -> RosterResult<()> {
        let Some(stored) = self.storage.get(&self.key).await? else {
            debug!(key = ?self.key, "Nothing stored yet");
            self.records.clear();
            self.update_filtered();
            return Ok(());
        };

        match serde_json::from_str::<Vec<StudentRecord>>(&stored) {
            Ok(records) => {
                let mut seen = HashSet::new();
                for record in &records {
                    if !seen.insert(record.fields.id_number.as_str()) {
                        warn!(id_number = ?record.fields.id_number, "Stored roster contains a duplicate ID number");
                    }
                }

                info!(count = records.len(), "Loaded students from storage");
                self.records = records;
                self.update_filtered();
                Ok(())
            }
            Err(e) => {
                warn!(?e, key = ?self.key, "Stored roster is corrupt, starting empty");
                self.records.clear();
                self.update_filtered();
                Err(e).context(StorageCorruptSnafu { key: self.key.clone() })
            }
        }
    }

    pub async fn persist(&self) -> RosterResult<()> {
        self.write(&self.records).await
    }

    pub async fn add(&mut self, fields: StudentFields) -> RosterResult<StudentId> {
        self.ensure_unique_id_number(&fields.id_number, None)?;

        let record = StudentRecord::new(fields);
        let id = record.id;
        info!(%id, id_number = ?record.fields.id_number, "Adding student");

        let mut candidate = self.records.clone();
        candidate.push(record);
        self.commit(candidate).await?;
        Ok(id)
    }

    pub async fn update(&mut self, id: StudentId, fields: StudentFields) -> RosterResult<()> {
        let index = self.index_of(id)?;
        self.ensure_unique_id_number(&fields.id_number, Some(id))?;

        info!(%id, "Updating student");
        let mut candidate = self.records.clone();
        candidate[index].fields = fields;
        self.commit(candidate).await
    }

    pub async fn delete(&mut self, id: StudentId) -> RosterResult<()> {
        let index = self.index_of(id)?;

        info!(%id, "Deleting student");
        let mut candidate = self.records.clone();
        candidate.remove(index);
        self.commit(candidate).await
    }

    pub fn search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.update_filtered();
    }

    pub fn get(&self, id: StudentId) -> Option<&StudentRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn filtered(&self) -> &[StudentRecord] {
        &self.filtered
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Writes `records` first. Memory only changes once the write succeeded.
    async fn commit(&mut self, records: Vec<StudentRecord>) -> RosterResult<()> {
        self.write(&records).await?;
        self.records = records;
        self.update_filtered();
        Ok(())
    }

    async fn write(&self, records: &[StudentRecord]) -> RosterResult<()> {
        let serialised = serde_json::to_string(records).context(SerialiseRecordsSnafu)?;
        self.storage.set(&self.key, &serialised).await
    }

    fn update_filtered(&mut self) {
        self.filtered = self
            .records
            .iter()
            .filter(|record| record.fields.id_number.contains(self.search_term.as_str()))
            .cloned()
            .collect();
    }

    fn index_of(&self, id: StudentId) -> RosterResult<usize> {
        self.records
            .iter()
            .position(|record| record.id == id)
            .context(RecordNotFoundSnafu { id })
    }

    fn ensure_unique_id_number(&self, id_number: &str, ignoring: Option<StudentId>) -> RosterResult<()> {
        let clash = self
            .records
            .iter()
            .any(|record| Some(record.id) != ignoring && record.fields.id_number == id_number);
        snafu::ensure!(!clash, DuplicateIdentifierSnafu { id_number });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::RosterError,
        storage::{FlakyStorage, MemoryStorage},
    };

    const KEY: &str = "students";

    fn fields(first_name: &str, id_number: &str) -> StudentFields {
        StudentFields {
            first_name: first_name.into(),
            last_name: "Levi".into(),
            id_number: id_number.into(),
            phone: "0501234567".into(),
            email: format!("{}@example.com", first_name.to_lowercase()),
        }
    }

    async fn store_with(ids: &[&str]) -> (Arc<MemoryStorage>, RecordStore) {
        let storage = Arc::new(MemoryStorage::default());
        let mut store = RecordStore::new(storage.clone(), KEY);
        for (i, id_number) in ids.iter().enumerate() {
            store.add(fields(&format!("Student{i}"), id_number)).await.unwrap();
        }
        (storage, store)
    }

    fn id_numbers(records: &[StudentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.fields.id_number.as_str()).collect()
    }

    #[tokio::test]
    async fn search_is_an_ordered_substring_filter() {
        let (_, mut store) = store_with(&["1234567", "7654321", "9912345", "5555555"]).await;

        store.search("123");
        assert_eq!(id_numbers(store.filtered()), vec!["1234567", "9912345"]);

        store.search("999");
        assert!(store.filtered().is_empty());

        store.search("");
        assert_eq!(id_numbers(store.filtered()), id_numbers(store.records()));
    }

    #[tokio::test]
    async fn search_term_is_reapplied_after_mutation() {
        let (_, mut store) = store_with(&["1234567"]).await;
        store.search("88");
        assert!(store.filtered().is_empty());

        store.add(fields("Dana", "8812345")).await.unwrap();
        assert_eq!(id_numbers(store.filtered()), vec!["8812345"]);
        assert_eq!(store.search_term(), "88");
    }

    #[tokio::test]
    async fn add_persist_load_round_trips() {
        let (storage, store) = store_with(&["1234567", "7654321"]).await;
        store.persist().await.unwrap();

        let mut reloaded = RecordStore::new(storage, KEY);
        reloaded.load().await.unwrap();

        assert_eq!(reloaded.records(), store.records());
        assert_eq!(reloaded.filtered(), store.records());
    }

    #[tokio::test]
    async fn load_without_stored_data_is_empty() {
        let mut store = RecordStore::new(Arc::new(MemoryStorage::default()), KEY);
        store.load().await.unwrap();
        assert!(store.records().is_empty());
        assert!(store.filtered().is_empty());
    }

    #[tokio::test]
    async fn load_corrupt_data_falls_back_to_empty() {
        let storage = Arc::new(MemoryStorage::with_entry(KEY, "{not json"));
        let mut store = RecordStore::new(storage.clone(), KEY);

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, RosterError::StorageCorrupt { .. }));
        assert!(store.records().is_empty());
        assert_eq!(
            storage.get(KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn add_rejects_duplicate_id_number() {
        let (_, mut store) = store_with(&["1234567"]).await;

        let err = store.add(fields("Copy", "1234567")).await.unwrap_err();
        assert!(matches!(err, RosterError::DuplicateIdentifier { .. }));
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_only_the_target() {
        let (storage, mut store) = store_with(&["1111111", "2222222", "3333333"]).await;
        let before = store.records().to_vec();
        let target = before[1].id;

        store.update(target, fields("Renamed", "2222222")).await.unwrap();

        assert_eq!(store.records()[0], before[0]);
        assert_eq!(store.records()[2], before[2]);
        assert_eq!(store.records()[1].id, target);
        assert_eq!(store.records()[1].fields.first_name, "Renamed");

        let mut reloaded = RecordStore::new(storage, KEY);
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.records()[1].fields.first_name, "Renamed");
    }

    #[tokio::test]
    async fn update_can_keep_own_id_number_but_not_take_another() {
        let (_, mut store) = store_with(&["1111111", "2222222"]).await;
        let first = store.records()[0].id;

        let err = store.update(first, fields("Clash", "2222222")).await.unwrap_err();
        assert!(matches!(err, RosterError::DuplicateIdentifier { .. }));
        assert_eq!(store.records()[0].fields.id_number, "1111111");

        store.update(first, fields("Same", "1111111")).await.unwrap();
        assert_eq!(store.records()[0].fields.first_name, "Same");
    }

    #[tokio::test]
    async fn update_missing_is_reported() {
        let (_, mut store) = store_with(&["1111111"]).await;
        let before = store.records().to_vec();

        let err = store
            .update(uuid::Uuid::new_v4(), fields("Ghost", "9999999"))
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::RecordNotFound { .. }));
        assert_eq!(store.records(), before.as_slice());
    }

    #[tokio::test]
    async fn delete_removes_exactly_one() {
        let (_, mut store) = store_with(&["1111111", "2222222", "3333333"]).await;
        let target = store.records()[0].id;

        store.delete(target).await.unwrap();
        assert_eq!(id_numbers(store.records()), vec!["2222222", "3333333"]);

        let err = store.delete(target).await.unwrap_err();
        assert!(matches!(err, RosterError::RecordNotFound { .. }));
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn identical_records_stay_distinguishable() {
        let storage = Arc::new(MemoryStorage::default());
        let twin = StudentRecord::new(fields("Twin", "1234567"));
        let other_twin = StudentRecord {
            id: uuid::Uuid::new_v4(),
            fields: twin.fields.clone(),
        };
        storage
            .set(KEY, &serde_json::to_string(&[&twin, &other_twin]).unwrap())
            .await
            .unwrap();

        let mut store = RecordStore::new(storage, KEY);
        store.load().await.unwrap();
        store.delete(other_twin.id).await.unwrap();

        assert_eq!(store.records(), [twin].as_slice());
    }

    async fn flaky_store_with(ids: &[&str]) -> (Arc<FlakyStorage>, RecordStore) {
        let storage = Arc::new(FlakyStorage::default());
        let mut store = RecordStore::new(storage.clone(), KEY);
        for (i, id_number) in ids.iter().enumerate() {
            store.add(fields(&format!("Student{i}"), id_number)).await.unwrap();
        }
        (storage, store)
    }

    #[tokio::test]
    async fn failed_add_changes_nothing_and_can_be_retried() {
        let (storage, mut store) = flaky_store_with(&["1111111"]).await;
        let stored_before = storage.get(KEY).await.unwrap();
        let before = store.records().to_vec();

        storage.set_failing(true);
        let err = store.add(fields("Dana", "1234567")).await.unwrap_err();
        assert!(matches!(err, RosterError::MakeQuery { .. }));
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(store.filtered(), before.as_slice());

        storage.set_failing(false);
        assert_eq!(storage.get(KEY).await.unwrap(), stored_before);

        store.add(fields("Dana", "1234567")).await.unwrap();
        assert_eq!(store.records().len(), 2);

        let mut reloaded = RecordStore::new(storage, KEY);
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.records(), store.records());
    }

    #[tokio::test]
    async fn failed_update_changes_nothing() {
        let (storage, mut store) = flaky_store_with(&["1111111", "2222222"]).await;
        let stored_before = storage.get(KEY).await.unwrap();
        let before = store.records().to_vec();

        storage.set_failing(true);
        let err = store
            .update(before[0].id, fields("Renamed", "1111111"))
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::MakeQuery { .. }));
        assert_eq!(store.records(), before.as_slice());

        storage.set_failing(false);
        assert_eq!(storage.get(KEY).await.unwrap(), stored_before);

        store.update(before[0].id, fields("Renamed", "1111111")).await.unwrap();
        assert_eq!(store.records()[0].fields.first_name, "Renamed");
    }

    #[tokio::test]
    async fn failed_delete_changes_nothing() {
        let (storage, mut store) = flaky_store_with(&["1111111", "2222222"]).await;
        let stored_before = storage.get(KEY).await.unwrap();
        let target = store.records()[1].id;

        storage.set_failing(true);
        let err = store.delete(target).await.unwrap_err();
        assert!(matches!(err, RosterError::MakeQuery { .. }));
        assert!(store.get(target).is_some());
        assert_eq!(store.filtered().len(), 2);

        storage.set_failing(false);
        assert_eq!(storage.get(KEY).await.unwrap(), stored_before);

        store.delete(target).await.unwrap();
        assert!(store.get(target).is_none());
    }
}
