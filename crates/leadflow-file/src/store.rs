//! Filesystem storage for the file-backed document store.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use leadflow_core::Result;
use leadflow_core::error::{BackendError, Error, PermissionError};
use leadflow_core::record::{Document, Record, RecordPatch, check_payload};
use leadflow_core::types::{CollectionName, RecordId};

pub(crate) const CHANGES_FILE: &str = "changes.jsonl";
const LOCK_FILE: &str = "changes.lock";

fn map_io(operation: &'static str) -> impl Fn(io::Error) -> Error {
    move |err| match err.kind() {
        io::ErrorKind::PermissionDenied => PermissionError::Store {
            operation,
            message: err.to_string(),
        }
        .into(),
        _ => BackendError::new(operation, format!("IO error: {}", err)).into(),
    }
}

fn map_json(operation: &'static str) -> impl Fn(serde_json::Error) -> Error {
    move |err| BackendError::new(operation, format!("malformed document: {}", err)).into()
}

/// The kind of mutation recorded in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Create,
    Update,
    Delete,
}

/// One line of the change log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: CollectionName,
    pub id: RecordId,
    pub op: ChangeOp,
    pub time: DateTime<Utc>,
}

/// Holds the exclusive write lock until dropped.
struct WriteLock(File);

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.0) {
            warn!(error = %e, "Failed to release change log lock");
        }
    }
}

/// Filesystem-backed record storage.
///
/// Writers serialise on an advisory lock next to the change log, so two
/// processes sharing a root never interleave a read-modify-write. Last
/// write wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new file store at the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &CollectionName) -> PathBuf {
        self.root.join("collections").join(collection.as_str())
    }

    fn record_path(&self, collection: &CollectionName, id: &RecordId) -> PathBuf {
        self.collection_dir(collection)
            .join(format!("{}.json", id.as_str()))
    }

    /// Get the change log path.
    pub(crate) fn changes_path(&self) -> PathBuf {
        self.root.join(CHANGES_FILE)
    }

    /// Current store revision: the size of the change log in bytes.
    ///
    /// Grows with every mutation, so a subscription only needs to compare
    /// it with the last value it saw.
    pub fn revision(&self) -> u64 {
        fs::metadata(self.changes_path())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    fn lock(&self, operation: &'static str) -> Result<WriteLock> {
        fs::create_dir_all(&self.root).map_err(map_io(operation))?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.root.join(LOCK_FILE))
            .map_err(map_io(operation))?;

        file.lock_exclusive().map_err(map_io(operation))?;
        Ok(WriteLock(file))
    }

    /// Append an event to the change log. Caller must hold the write lock.
    fn append_change(
        &self,
        operation: &'static str,
        collection: &CollectionName,
        id: &RecordId,
        op: ChangeOp,
    ) -> Result<()> {
        let event = ChangeEvent {
            collection: collection.clone(),
            id: id.clone(),
            op,
            time: Utc::now(),
        };
        let line = serde_json::to_string(&event).map_err(map_json(operation))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.changes_path())
            .map_err(map_io(operation))?;

        writeln!(file, "{}", line).map_err(map_io(operation))?;
        file.sync_data().map_err(map_io(operation))?;
        Ok(())
    }

    /// Write a record atomically via a temp file and rename.
    fn place(
        &self,
        operation: &'static str,
        collection: &CollectionName,
        record: &Record,
    ) -> Result<()> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir).map_err(map_io(operation))?;

        let path = self.record_path(collection, &record.id);
        let content = serde_json::to_string_pretty(record).map_err(map_json(operation))?;

        // Temp name does not end in .json so listings never pick it up.
        let temp_path = dir.join(format!(".{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, &content).map_err(map_io(operation))?;
        fs::rename(&temp_path, &path).map_err(map_io(operation))?;
        Ok(())
    }

    fn read_record(&self, operation: &'static str, path: &Path) -> Result<Record> {
        let content = fs::read_to_string(path).map_err(map_io(operation))?;
        serde_json::from_str(&content).map_err(map_json(operation))
    }

    fn not_found(collection: &CollectionName, id: &RecordId) -> Error {
        Error::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    // ========================================================================
    // Record Operations
    // ========================================================================

    pub fn create_record(
        &self,
        collection: &CollectionName,
        document: &Document,
    ) -> Result<RecordId> {
        const OP: &str = "add_document";
        check_payload(&document.fields)?;
        let _lock = self.lock(OP)?;

        let id = RecordId::generate();
        let record = document.clone().into_record(id.clone());
        self.place(OP, collection, &record)?;
        self.append_change(OP, collection, &id, ChangeOp::Create)?;

        debug!(%id, "Created record");
        Ok(id)
    }

    pub fn get_record(&self, collection: &CollectionName, id: &RecordId) -> Result<Record> {
        let path = self.record_path(collection, id);

        if !path.exists() {
            return Err(Self::not_found(collection, id));
        }

        self.read_record("get_document", &path)
    }

    /// Read every record in a collection, ordered by id.
    ///
    /// Files that fail to parse are skipped with a warning rather than
    /// failing the whole listing.
    pub fn list_records(&self, collection: &CollectionName) -> Result<Vec<Record>> {
        const OP: &str = "subscribe_collection";
        let dir = self.collection_dir(collection);

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(map_io(OP))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        entries.sort();

        let mut records = Vec::with_capacity(entries.len());
        for path in entries {
            match self.read_record(OP, &path) {
                Ok(record) => records.push(record),
                // Deleted between read_dir and read: not an error.
                Err(_) if !path.exists() => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
            }
        }

        Ok(records)
    }

    pub fn update_record(
        &self,
        collection: &CollectionName,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<()> {
        const OP: &str = "update_document";
        check_payload(&patch.fields)?;
        let _lock = self.lock(OP)?;

        let path = self.record_path(collection, id);
        if !path.exists() {
            return Err(Self::not_found(collection, id));
        }

        let mut record = self.read_record(OP, &path)?;
        record.apply_patch(patch);
        self.place(OP, collection, &record)?;
        self.append_change(OP, collection, id, ChangeOp::Update)?;

        debug!("Updated record");
        Ok(())
    }

    pub fn delete_record(&self, collection: &CollectionName, id: &RecordId) -> Result<()> {
        const OP: &str = "delete_document";
        let _lock = self.lock(OP)?;

        let path = self.record_path(collection, id);
        if !path.exists() {
            return Err(Self::not_found(collection, id));
        }

        fs::remove_file(&path).map_err(map_io(OP))?;
        self.append_change(OP, collection, id, ChangeOp::Delete)?;

        debug!("Deleted record");
        Ok(())
    }

    /// Read the full change log.
    pub fn changes(&self) -> Result<Vec<ChangeEvent>> {
        const OP: &str = "read_changes";
        let path = self.changes_path();

        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path).map_err(map_io(OP))?;
        let mut events = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(map_io(OP))?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line).map_err(map_json(OP))?);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::record::Status;
    use serde_json::{Map, json};
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileStore) {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        (tmp, store)
    }

    fn leads() -> CollectionName {
        CollectionName::new("leads").unwrap()
    }

    fn doc(title: &str) -> Document {
        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("title".into(), json!(title));
        Document {
            status: Status::new("new").unwrap(),
            created_by: None,
            assigned_to: None,
            assigned_by: None,
            created_at: now,
            updated_at: now,
            fields,
        }
    }

    #[test]
    fn test_create_and_get_record() {
        let (tmp, store) = create_test_store();

        let id = store.create_record(&leads(), &doc("Alice")).unwrap();
        let record = store.get_record(&leads(), &id).unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.text_field("title").as_deref(), Some("Alice"));
        assert!(
            tmp.path()
                .join("collections/leads")
                .join(format!("{}.json", id))
                .exists()
        );
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let (_tmp, store) = create_test_store();
        let id = RecordId::new("nope").unwrap();

        let err = store.get_record(&leads(), &id).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let err = store.delete_record(&leads(), &id).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_list_records_skips_temp_files() {
        let (tmp, store) = create_test_store();

        store.create_record(&leads(), &doc("a")).unwrap();
        store.create_record(&leads(), &doc("b")).unwrap();
        fs::write(tmp.path().join("collections/leads/.stray.tmp"), "{").unwrap();

        assert_eq!(store.list_records(&leads()).unwrap().len(), 2);
        let other = CollectionName::new("tickets").unwrap();
        assert!(store.list_records(&other).unwrap().is_empty());
    }

    #[test]
    fn test_update_applies_patch() {
        let (_tmp, store) = create_test_store();
        let id = store.create_record(&leads(), &doc("Alice")).unwrap();

        let mut patch = RecordPatch::touch(Utc::now());
        patch.status = Some(Status::new("contacted").unwrap());
        store.update_record(&leads(), &id, &patch).unwrap();

        let record = store.get_record(&leads(), &id).unwrap();
        assert_eq!(record.status.as_str(), "contacted");
        assert_eq!(record.text_field("title").as_deref(), Some("Alice"));
    }

    #[test]
    fn test_reserved_payload_keys_are_refused() {
        let (_tmp, store) = create_test_store();

        let mut document = doc("Alice");
        document.fields.insert("status".into(), json!("hot"));
        let err = store.create_record(&leads(), &document).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.list_records(&leads()).unwrap().is_empty());

        let id = store.create_record(&leads(), &doc("Alice")).unwrap();
        let revision = store.revision();
        let mut patch = RecordPatch::touch(Utc::now());
        patch.fields.insert("id".into(), json!("other"));
        let err = store.update_record(&leads(), &id, &patch).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.revision(), revision);
        assert_eq!(store.get_record(&leads(), &id).unwrap().id, id);
    }

    #[test]
    fn test_every_mutation_is_logged() {
        let (_tmp, store) = create_test_store();
        assert_eq!(store.revision(), 0);

        let id = store.create_record(&leads(), &doc("Alice")).unwrap();
        let after_create = store.revision();
        assert!(after_create > 0);

        store
            .update_record(&leads(), &id, &RecordPatch::touch(Utc::now()))
            .unwrap();
        assert!(store.revision() > after_create);

        store.delete_record(&leads(), &id).unwrap();

        let ops: Vec<ChangeOp> = store.changes().unwrap().into_iter().map(|e| e.op).collect();
        assert_eq!(ops, vec![ChangeOp::Create, ChangeOp::Update, ChangeOp::Delete]);
    }

    #[test]
    fn test_change_log_format() {
        let (_tmp, store) = create_test_store();
        let id = store.create_record(&leads(), &doc("Alice")).unwrap();

        let content = fs::read_to_string(store.changes_path()).unwrap();
        let line: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(line["collection"], "leads");
        assert_eq!(line["id"], id.as_str());
        assert_eq!(line["op"], "create");
        assert!(line["time"].is_string());
    }
}
