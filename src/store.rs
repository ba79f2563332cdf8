//! Brief record store.
//!
//! Durable storage for generated briefs. Insert assigns a monotonic
//! identity; a secondary index keyed by (map, topic) supports the
//! eligibility check that skips topics which already have a brief.

pub mod persistence;

pub use persistence::SledBriefStore;

use crate::error::StorageError;
use crate::images::ImageMeta;
use crate::types::{BriefId, FaqEntry, GeneratedBrief, MapId, TopicId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Brief content ready for persistence. Field normalization has already
/// been applied: `key_points` is a uniform list of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBrief {
    pub map_id: MapId,
    pub topic_id: TopicId,
    pub created_at_ms: u64,
    pub title: String,
    pub slug: String,
    pub meta_description: String,
    pub headings: Vec<String>,
    pub key_points: Vec<String>,
    pub keywords: Vec<String>,
    pub faq: Vec<FaqEntry>,
    pub images: Vec<ImageMeta>,
    pub provider: String,
    pub model: String,
}

impl NewBrief {
    /// Build a persistable brief from raw provider output, applying the
    /// key-point normalization invariant.
    pub fn from_generated(
        map_id: MapId,
        topic_id: TopicId,
        generated: GeneratedBrief,
        created_at_ms: u64,
    ) -> Self {
        let key_points = crate::types::normalize_string_list(&generated.key_points);
        Self {
            map_id,
            topic_id,
            created_at_ms,
            title: generated.title,
            slug: generated.slug,
            meta_description: generated.meta_description,
            headings: generated.headings,
            key_points,
            keywords: generated.keywords,
            faq: generated.faq,
            images: Vec::new(),
            provider: generated.provider,
            model: generated.model,
        }
    }
}

/// A brief with its store-assigned identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefRecord {
    pub id: BriefId,
    pub map_id: MapId,
    pub topic_id: TopicId,
    pub created_at_ms: u64,
    pub title: String,
    pub slug: String,
    pub meta_description: String,
    pub headings: Vec<String>,
    pub key_points: Vec<String>,
    pub keywords: Vec<String>,
    pub faq: Vec<FaqEntry>,
    pub images: Vec<ImageMeta>,
    pub provider: String,
    pub model: String,
}

impl BriefRecord {
    pub fn assemble(id: BriefId, new: NewBrief) -> Self {
        Self {
            id,
            map_id: new.map_id,
            topic_id: new.topic_id,
            created_at_ms: new.created_at_ms,
            title: new.title,
            slug: new.slug,
            meta_description: new.meta_description,
            headings: new.headings,
            key_points: new.key_points,
            keywords: new.keywords,
            faq: new.faq,
            images: new.images,
            provider: new.provider,
            model: new.model,
        }
    }
}

/// Brief store interface
#[async_trait]
pub trait BriefStore: Send + Sync {
    /// Durably insert one brief and return the assigned identity.
    async fn insert(&self, brief: &NewBrief) -> Result<BriefId, StorageError>;

    async fn get(&self, id: BriefId) -> Result<Option<BriefRecord>, StorageError>;

    /// Find the brief for a (map, topic) pair, if one exists.
    async fn find(&self, map_id: &MapId, topic_id: &TopicId)
        -> Result<Option<BriefRecord>, StorageError>;

    /// All briefs for a map, ordered by assigned identity.
    async fn list_for_map(&self, map_id: &MapId) -> Result<Vec<BriefRecord>, StorageError>;
}
