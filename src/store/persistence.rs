//! Sled-backed implementation of the brief store.

use crate::error::StorageError;
use crate::store::{BriefRecord, BriefStore, NewBrief};
use crate::types::{BriefId, MapId, TopicId};
use async_trait::async_trait;
use sled::{Db, Tree};
use std::path::Path;

const TREE_BRIEFS: &str = "briefs";
const TREE_TOPIC_INDEX: &str = "brief_topic_index";

/// Sled-based implementation of BriefStore.
///
/// Records live in one tree keyed by the big-endian assigned id; a second
/// tree maps `"{map}:{topic}"` to that id for (map, topic) lookups.
pub struct SledBriefStore {
    db: Db,
    briefs: Tree,
    topic_index: Tree,
}

impl SledBriefStore {
    /// Open (or create) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(to_storage_io)?;
        Self::new(db)
    }

    pub fn new(db: Db) -> Result<Self, StorageError> {
        let briefs = db.open_tree(TREE_BRIEFS).map_err(to_storage_io)?;
        let topic_index = db.open_tree(TREE_TOPIC_INDEX).map_err(to_storage_io)?;
        Ok(Self {
            db,
            briefs,
            topic_index,
        })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }

    fn get_sync(&self, id: BriefId) -> Result<Option<BriefRecord>, StorageError> {
        match self.briefs.get(id.to_be_bytes()).map_err(to_storage_io)? {
            Some(raw) => {
                let record: BriefRecord = bincode::deserialize(&raw).map_err(to_storage_data)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn encode_topic_key(map_id: &MapId, topic_id: &TopicId) -> String {
        format!("{}:{}", map_id, topic_id)
    }
}

#[async_trait]
impl BriefStore for SledBriefStore {
    async fn insert(&self, brief: &NewBrief) -> Result<BriefId, StorageError> {
        let id = self.db.generate_id().map_err(to_storage_io)?;
        let record = BriefRecord::assemble(id, brief.clone());
        let value = bincode::serialize(&record).map_err(to_storage_data)?;
        self.briefs
            .insert(id.to_be_bytes(), value)
            .map_err(to_storage_io)?;

        let topic_key = Self::encode_topic_key(&record.map_id, &record.topic_id);
        self.topic_index
            .insert(topic_key.as_bytes(), id.to_be_bytes().to_vec())
            .map_err(to_storage_io)?;

        self.flush()?;
        Ok(id)
    }

    async fn get(&self, id: BriefId) -> Result<Option<BriefRecord>, StorageError> {
        self.get_sync(id)
    }

    async fn find(
        &self,
        map_id: &MapId,
        topic_id: &TopicId,
    ) -> Result<Option<BriefRecord>, StorageError> {
        let topic_key = Self::encode_topic_key(map_id, topic_id);
        let Some(raw_id) = self
            .topic_index
            .get(topic_key.as_bytes())
            .map_err(to_storage_io)?
        else {
            return Ok(None);
        };
        let id = decode_id(&raw_id)?;
        self.get_sync(id)
    }

    async fn list_for_map(&self, map_id: &MapId) -> Result<Vec<BriefRecord>, StorageError> {
        let prefix = format!("{}:", map_id);
        let mut ids = Vec::new();
        for item in self.topic_index.scan_prefix(prefix.as_bytes()) {
            let (_, raw_id) = item.map_err(to_storage_io)?;
            ids.push(decode_id(&raw_id)?);
        }
        ids.sort_unstable();

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get_sync(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

fn decode_id(raw: &[u8]) -> Result<BriefId, StorageError> {
    let bytes: [u8; 8] = raw
        .try_into()
        .map_err(|_| StorageError::InvalidKey(format!("id must be 8 bytes, got {}", raw.len())))?;
    Ok(BriefId::from_be_bytes(bytes))
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        err.to_string(),
    ))
}

fn to_storage_data(err: Box<bincode::ErrorKind>) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        err.to_string(),
    ))
}
