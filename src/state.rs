//! Shared application state and the event sink that mutates it.
//!
//! The batch runner never touches `AppState` directly. It emits
//! [`StateEvent`]s through an [`EventSink`]; an in-process bus plus a
//! sequence-assigning applier folds them into the state in emit order.
//! Reads (active map, cancellation flag, existing briefs) go straight to
//! the live state.

pub mod apply;
pub mod bus;

pub use apply::{EventApplier, SharedApplier, StateRuntime};
pub use bus::EventBus;

use crate::store::BriefRecord;
use crate::types::{BatchState, MapId, TopicId};
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

const LOG_CAPACITY: usize = 512;

/// Loading-flag key for the brief generation batch.
pub const LOADING_GENERATE: &str = "generate_briefs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Info,
    Success,
    Failure,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Info => "info",
            LogStatus::Success => "success",
            LogStatus::Failure => "failure",
        }
    }
}

/// One entry in the application log panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub service: String,
    pub message: String,
    pub status: LogStatus,
    pub ts: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl LogEvent {
    pub fn new(service: impl Into<String>, message: impl Into<String>, status: LogStatus) -> Self {
        Self {
            service: service.into(),
            message: message.into(),
            status,
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// State-mutation events. Applied in emit order by the applier.
#[derive(Debug, Clone)]
pub enum StateEvent {
    SetLoading {
        key: String,
        value: bool,
    },
    ResetBatchState,
    SetError {
        message: String,
    },
    SetNotification {
        message: String,
    },
    SetProgress {
        current: usize,
        total: usize,
        status: String,
    },
    Log(LogEvent),
    AddBrief {
        map_id: MapId,
        topic_id: TopicId,
        record: BriefRecord,
    },
}

/// Ordered sink for state-mutation events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: StateEvent);
}

#[derive(Debug, Default)]
struct StateInner {
    active_map: Option<MapId>,
    briefs: HashMap<MapId, BTreeMap<TopicId, BriefRecord>>,
    loading: HashMap<String, bool>,
    error: Option<String>,
    notification: Option<String>,
    batch: BatchState,
    log: VecDeque<LogEvent>,
    applied_seq: u64,
}

/// Live caller state. Mutated only through [`AppState::apply`]; the cancel
/// flag is the one exception so a cancel request takes effect without
/// waiting on the event queue.
#[derive(Default)]
pub struct AppState {
    inner: RwLock<StateInner>,
    cancel: AtomicBool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active_map(&self, map_id: Option<MapId>) {
        self.inner.write().active_map = map_id;
    }

    pub fn active_map(&self) -> Option<MapId> {
        self.inner.read().active_map.clone()
    }

    /// Request cooperative cancellation of the running batch. Observed at
    /// the next iteration boundary.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Release);
        self.inner.write().batch.cancelled = true;
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Seed the per-map brief index from persisted records.
    pub fn hydrate(&self, records: Vec<BriefRecord>) {
        let mut inner = self.inner.write();
        for record in records {
            inner
                .briefs
                .entry(record.map_id.clone())
                .or_default()
                .insert(record.topic_id.clone(), record);
        }
    }

    pub fn has_brief(&self, map_id: &MapId, topic_id: &TopicId) -> bool {
        self.inner
            .read()
            .briefs
            .get(map_id)
            .map(|topics| topics.contains_key(topic_id))
            .unwrap_or(false)
    }

    pub fn briefs_for(&self, map_id: &MapId) -> Vec<BriefRecord> {
        self.inner
            .read()
            .briefs
            .get(map_id)
            .map(|topics| topics.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn loading(&self, key: &str) -> bool {
        self.inner.read().loading.get(key).copied().unwrap_or(false)
    }

    pub fn error(&self) -> Option<String> {
        self.inner.read().error.clone()
    }

    pub fn notification(&self) -> Option<String> {
        self.inner.read().notification.clone()
    }

    pub fn batch(&self) -> BatchState {
        self.inner.read().batch.clone()
    }

    pub fn log_events(&self) -> Vec<LogEvent> {
        self.inner.read().log.iter().cloned().collect()
    }

    pub fn applied_seq(&self) -> u64 {
        self.inner.read().applied_seq
    }

    /// Fold one event into the state. Called by the applier only, with
    /// monotonically increasing sequence numbers.
    pub(crate) fn apply(&self, seq: u64, event: StateEvent) {
        let mut inner = self.inner.write();
        inner.applied_seq = seq;
        match event {
            StateEvent::SetLoading { key, value } => {
                inner.loading.insert(key, value);
            }
            StateEvent::ResetBatchState => {
                inner.batch = BatchState::default();
                self.cancel.store(false, Ordering::Release);
            }
            StateEvent::SetError { message } => {
                inner.error = Some(message);
            }
            StateEvent::SetNotification { message } => {
                inner.notification = Some(message);
            }
            StateEvent::SetProgress {
                current,
                total,
                status,
            } => {
                inner.batch.current = current;
                inner.batch.total = total;
                inner.batch.status = status;
            }
            StateEvent::Log(log_event) => {
                if inner.log.len() == LOG_CAPACITY {
                    inner.log.pop_front();
                }
                inner.log.push_back(log_event);
            }
            StateEvent::AddBrief {
                map_id,
                topic_id,
                record,
            } => {
                inner
                    .briefs
                    .entry(map_id)
                    .or_default()
                    .insert(topic_id, record);
            }
        }
    }
}
