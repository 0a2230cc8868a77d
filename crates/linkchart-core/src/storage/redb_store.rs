use crate::error::{LinkchartError, Result};
use crate::storage::notify::Subscribers;
use crate::storage::traits::GraphStateStore;
use crate::types::{GraphState, StateChange};
use crossbeam_channel::Receiver;
use log::info;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// Graph state is stored whole, as one bincode blob
const STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("graph_state");
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Current schema version.
/// v1 = single bincode `GraphState` blob under `current`
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";
const REVISION_KEY: &str = "revision";
const CURRENT_STATE_KEY: &str = "current";

/// Redb-backed state store. Survives restarts; the write counter is
/// persisted so versions keep increasing across reopen.
pub struct RedbStateStore {
    db: Arc<Database>,
    path: PathBuf,
    version: AtomicU64,
    writer: Mutex<()>,
    subscribers: Subscribers,
}

impl RedbStateStore {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LinkchartError::Validation(format!("Failed to create directory: {}", e))
            })?;
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        if is_new {
            let write_txn = db.begin_write()?;
            {
                let _ = write_txn.open_table(STATE)?;
                let mut meta = write_txn.open_table(META)?;
                meta.insert(SCHEMA_VERSION_KEY, CURRENT_SCHEMA_VERSION.to_string().as_bytes())?;
            }
            write_txn.commit()?;
            info!("Created state store at {}", path.display());
        } else {
            Self::check_schema_version(&db)?;
        }

        let revision = Self::read_revision(&db)?;

        Ok(Self {
            db: Arc::new(db),
            path,
            version: AtomicU64::new(revision),
            writer: Mutex::new(()),
            subscribers: Subscribers::default(),
        })
    }

    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let version = read_txn
            .open_table(META)
            .ok()
            .and_then(|t| {
                t.get(SCHEMA_VERSION_KEY).ok().flatten().and_then(|v| {
                    std::str::from_utf8(v.value())
                        .ok()
                        .and_then(|s| s.parse::<u32>().ok())
                })
            })
            .ok_or_else(|| {
                LinkchartError::Validation("Database has no schema version".to_string())
            })?;

        match version.cmp(&CURRENT_SCHEMA_VERSION) {
            std::cmp::Ordering::Equal => Ok(()),
            std::cmp::Ordering::Less => Err(LinkchartError::Validation(format!(
                "Database schema v{} is older than current v{}.",
                version, CURRENT_SCHEMA_VERSION
            ))),
            std::cmp::Ordering::Greater => Err(LinkchartError::Validation(format!(
                "Database schema v{} is newer than this binary v{}. Upgrade linkchart.",
                version, CURRENT_SCHEMA_VERSION
            ))),
        }
    }

    fn read_revision(db: &Database) -> Result<u64> {
        let read_txn = db.begin_read()?;
        let meta = read_txn.open_table(META)?;
        let revision = meta.get(REVISION_KEY)?.and_then(|v| {
            <[u8; 8]>::try_from(v.value()).ok().map(u64::from_le_bytes)
        });
        Ok(revision.unwrap_or(0))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphStateStore for RedbStateStore {
    fn get(&self) -> Result<GraphState> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STATE)?;
        match table.get(CURRENT_STATE_KEY)? {
            Some(value) => Ok(bincode::deserialize(value.value())?),
            None => Ok(GraphState::default()),
        }
    }

    fn update<T, F>(&self, f: F) -> Result<(T, Option<StateChange>)>
    where
        F: FnOnce(&mut GraphState) -> (T, bool),
    {
        // redb serializes write transactions; the lock also orders notifications.
        let _writer = self.writer.lock().map_err(|_| LinkchartError::LockPoisoned)?;

        let write_txn = self.db.begin_write()?;
        let (value, next) = {
            let mut table = write_txn.open_table(STATE)?;
            let mut state: GraphState = match table.get(CURRENT_STATE_KEY)? {
                Some(value) => bincode::deserialize(value.value())?,
                None => GraphState::default(),
            };

            let (value, commit) = f(&mut state);
            if commit {
                table.insert(CURRENT_STATE_KEY, bincode::serialize(&state)?.as_slice())?;

                let mut meta = write_txn.open_table(META)?;
                let revision = meta
                    .get(REVISION_KEY)?
                    .and_then(|v| <[u8; 8]>::try_from(v.value()).ok().map(u64::from_le_bytes))
                    .unwrap_or(0);
                let next = revision + 1;
                meta.insert(REVISION_KEY, next.to_le_bytes().as_slice())?;
                (value, Some(next))
            } else {
                (value, None)
            }
        };

        let Some(next) = next else {
            write_txn.abort()?;
            return Ok((value, None));
        };
        write_txn.commit()?;

        self.version.store(next, Ordering::SeqCst);
        let change = StateChange { version: next };
        self.subscribers.notify(change);
        Ok((value, Some(change)))
    }

    fn subscribe(&self) -> Receiver<StateChange> {
        self.subscribers.subscribe()
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityType, ManualNode, NodeKind};
    use tempfile::TempDir;

    fn create_test_store() -> (RedbStateStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("state.redb");
        let store = RedbStateStore::open(&db_path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_empty_store_reads_default() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.get().unwrap(), GraphState::default());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("state.redb");

        let node = ManualNode::new(NodeKind::Entity, "Tipster", Some(EntityType::Person));
        {
            let store = RedbStateStore::open(&db_path).unwrap();
            let mut aliases = store.get().unwrap().aliases;
            aliases.insert("Atlas Holdings".into(), "Atlas Holdings Inc.".into());
            store.replace_aliases(aliases).unwrap();
            store.append_manual_node(node.clone()).unwrap();
            store.set_hidden("entity-shadowcorp", true).unwrap();
        }

        let store = RedbStateStore::open(&db_path).unwrap();
        let state = store.get().unwrap();
        assert_eq!(
            state.aliases.get("Atlas Holdings").map(String::as_str),
            Some("Atlas Holdings Inc.")
        );
        assert_eq!(state.manual_nodes, vec![node]);
        assert!(state.hidden.contains("entity-shadowcorp"));
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn test_replace_notifies() {
        let (store, _dir) = create_test_store();
        let rx = store.subscribe();

        store.set_flagged("entity-janeroe", true).unwrap();
        assert_eq!(rx.try_recv().unwrap(), StateChange { version: 1 });
    }

    #[test]
    fn test_rejects_newer_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("state.redb");
        {
            let db = Database::create(&db_path).unwrap();
            let txn = db.begin_write().unwrap();
            {
                let mut meta = txn.open_table(META).unwrap();
                meta.insert(SCHEMA_VERSION_KEY, "99".as_bytes()).unwrap();
            }
            txn.commit().unwrap();
        }

        let err = RedbStateStore::open(&db_path).err().unwrap();
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn test_concurrent_updates_keep_every_write() {
        let (store, _dir) = create_test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.set_flagged(&format!("entity-{}-{}", t, i), true).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get().unwrap().flagged.len(), 100);
        assert_eq!(store.version(), 100);
        assert_eq!(RedbStateStore::read_revision(&store.db).unwrap(), 100);
    }

    #[test]
    fn test_discarded_update_keeps_revision() {
        let (store, _dir) = create_test_store();
        store.set_hidden("entity-shadowcorp", true).unwrap();

        let (_, change) = store
            .update(|state| {
                state.hidden.clear();
                ((), false)
            })
            .unwrap();

        assert!(change.is_none());
        assert!(store.get().unwrap().hidden.contains("entity-shadowcorp"));
        assert_eq!(store.version(), 1);
    }
}
