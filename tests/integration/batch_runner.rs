//! End-to-end batch runner behavior against the real store and state
//! runtime, with a scripted provider.

use async_trait::async_trait;
use briefsmith::batch::{BatchRunner, StopReason};
use briefsmith::config::business::BusinessContext;
use briefsmith::error::BriefError;
use briefsmith::provider::{BriefProvider, BriefRequest};
use briefsmith::state::{AppState, EventSink, LogStatus, StateEvent, StateRuntime};
use briefsmith::store::{BriefStore, NewBrief, SledBriefStore};
use briefsmith::types::{GeneratedBrief, MapId, Topic, TopicId};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Scripted provider: per-topic failures, optional hook fired after the
/// n-th call (used to trigger cancellation or a map switch mid-batch),
/// and a call log for ordering assertions.
struct ScriptedProvider {
    failures: HashMap<String, String>,
    key_points: Value,
    calls: Mutex<Vec<String>>,
    after_call: Option<(usize, Box<dyn Fn() + Send + Sync>)>,
}

impl ScriptedProvider {
    fn ok() -> Self {
        Self {
            failures: HashMap::new(),
            key_points: json!(["point one", "point two"]),
            calls: Mutex::new(Vec::new()),
            after_call: None,
        }
    }

    fn failing_on(topic_ids: &[&str]) -> Self {
        let mut provider = Self::ok();
        for id in topic_ids {
            provider
                .failures
                .insert(id.to_string(), "model returned garbage".to_string());
        }
        provider
    }

    fn with_key_points(mut self, key_points: Value) -> Self {
        self.key_points = key_points;
        self
    }

    fn with_hook(mut self, call: usize, hook: Box<dyn Fn() + Send + Sync>) -> Self {
        self.after_call = Some((call, hook));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl BriefProvider for ScriptedProvider {
    async fn generate(&self, request: BriefRequest<'_>) -> Result<GeneratedBrief, BriefError> {
        let call_count = {
            let mut calls = self.calls.lock();
            calls.push(request.topic.id.as_str().to_string());
            calls.len()
        };
        let outcome = match self.failures.get(request.topic.id.as_str()) {
            Some(message) => Err(BriefError::InvalidBriefPayload(message.clone())),
            None => Ok(GeneratedBrief {
                title: request.topic.title.clone(),
                slug: String::new(),
                meta_description: "meta".to_string(),
                headings: vec!["Intro".to_string(), "Detail".to_string()],
                key_points: self.key_points.clone(),
                keywords: vec!["kw".to_string()],
                faq: vec![],
                provider: "scripted".to_string(),
                model: "scripted-1".to_string(),
            }),
        };
        if let Some((at, hook)) = &self.after_call {
            if call_count == *at {
                hook();
            }
        }
        outcome
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

/// Applies events through the real state runtime while recording a
/// compact trace for ordering assertions.
struct RecordingSink {
    inner: StateRuntime,
    trace: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn new(state: Arc<AppState>) -> Self {
        Self {
            inner: StateRuntime::new(state),
            trace: Mutex::new(Vec::new()),
        }
    }

    fn trace(&self) -> Vec<String> {
        self.trace.lock().clone()
    }

    fn add_brief_order(&self) -> Vec<String> {
        self.trace()
            .iter()
            .filter_map(|entry| entry.strip_prefix("add_brief:").map(str::to_string))
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: StateEvent) {
        let entry = match &event {
            StateEvent::SetLoading { key, value } => format!("set_loading:{}:{}", key, value),
            StateEvent::ResetBatchState => "reset_batch".to_string(),
            StateEvent::SetError { .. } => "set_error".to_string(),
            StateEvent::SetNotification { .. } => "notification".to_string(),
            StateEvent::SetProgress { current, total, .. } => {
                format!("set_progress:{}/{}", current, total)
            }
            StateEvent::Log(log) => format!("log:{}", log.status.as_str()),
            StateEvent::AddBrief { topic_id, .. } => format!("add_brief:{}", topic_id),
        };
        self.trace.lock().push(entry);
        self.inner.emit(event);
    }
}

struct Harness {
    _dir: TempDir,
    state: Arc<AppState>,
    store: Arc<SledBriefStore>,
    sink: Arc<RecordingSink>,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SledBriefStore::open(dir.path().join("store")).unwrap());
        let state = Arc::new(AppState::new());
        state.set_active_map(Some(MapId::new("tyres")));
        let sink = Arc::new(RecordingSink::new(Arc::clone(&state)));
        Self {
            _dir: dir,
            state,
            store,
            sink,
        }
    }

    fn runner(&self, provider: ScriptedProvider) -> (BatchRunner, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let runner = BatchRunner::new(
            Arc::clone(&provider) as Arc<dyn BriefProvider>,
            Arc::clone(&self.store) as Arc<dyn BriefStore>,
            Arc::clone(&self.sink) as Arc<dyn EventSink>,
            Arc::clone(&self.state),
            BusinessContext {
                domain: "example.com".to_string(),
                ..BusinessContext::default()
            },
        );
        (runner, provider)
    }
}

fn topics(ids: &[&str]) -> Vec<Topic> {
    ids.iter()
        .map(|id| Topic::new(*id, format!("Topic {}", id)))
        .collect()
}

#[tokio::test]
async fn clean_run_emits_one_add_brief_per_topic_in_order() {
    let harness = Harness::new();
    let (runner, provider) = harness.runner(ScriptedProvider::ok());

    let summary = runner.run(&topics(&["a", "b", "c"])).await.unwrap();

    assert_eq!(summary.completed, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.stop, StopReason::Exhausted);
    assert_eq!(provider.calls(), vec!["a", "b", "c"]);
    assert_eq!(harness.sink.add_brief_order(), vec!["a", "b", "c"]);

    // run state is reset to initial values afterward
    let batch = harness.state.batch();
    assert_eq!(batch.current, 0);
    assert_eq!(batch.total, 0);
    assert!(batch.status.is_empty());
    assert!(!harness.state.loading(briefsmith::state::LOADING_GENERATE));

    // briefs are durably persisted
    let stored = harness
        .store
        .list_for_map(&MapId::new("tyres"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn cancellation_after_k_items_keeps_partials() {
    let harness = Harness::new();
    let cancel_state = Arc::clone(&harness.state);
    let provider =
        ScriptedProvider::ok().with_hook(2, Box::new(move || cancel_state.request_cancel()));
    let (runner, provider) = harness.runner(provider);

    let summary = runner.run(&topics(&["a", "b", "c", "d"])).await.unwrap();

    assert_eq!(summary.stop, StopReason::Cancelled);
    assert_eq!(summary.completed, 2);
    assert_eq!(harness.sink.add_brief_order(), vec!["a", "b"]);
    assert_eq!(provider.calls(), vec!["a", "b"]);

    let cancelled_log = harness
        .state
        .log_events()
        .iter()
        .find(|e| e.message.contains("cancelled"))
        .cloned()
        .expect("cancellation log line");
    assert!(cancelled_log.message.contains("2 of 4"));

    // persisted partials survive
    let stored = harness
        .store
        .list_for_map(&MapId::new("tyres"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn map_switch_after_k_items_aborts() {
    let harness = Harness::new();
    let switch_state = Arc::clone(&harness.state);
    let provider = ScriptedProvider::ok().with_hook(
        1,
        Box::new(move || switch_state.set_active_map(Some(MapId::new("other")))),
    );
    let (runner, _) = harness.runner(provider);

    let summary = runner.run(&topics(&["a", "b", "c"])).await.unwrap();

    assert_eq!(summary.stop, StopReason::ContextChanged);
    assert_eq!(summary.completed, 1);
    assert_eq!(harness.sink.add_brief_order(), vec!["a"]);
    assert!(harness
        .state
        .log_events()
        .iter()
        .any(|e| e.status == LogStatus::Failure && e.message.contains("aborted")));
}

#[tokio::test]
async fn failed_item_is_skipped_and_batch_continues() {
    let harness = Harness::new();
    let (runner, provider) = harness.runner(ScriptedProvider::failing_on(&["b"]));

    let summary = runner.run(&topics(&["a", "b", "c"])).await.unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.stop, StopReason::Exhausted);
    // all three were attempted, in order
    assert_eq!(provider.calls(), vec!["a", "b", "c"]);
    assert_eq!(harness.sink.add_brief_order(), vec!["a", "c"]);

    let failure_log = harness
        .state
        .log_events()
        .iter()
        .find(|e| e.status == LogStatus::Failure)
        .cloned()
        .expect("failure log line");
    assert!(failure_log.message.contains("Topic b"));
    assert!(failure_log.message.contains("model returned garbage"));
}

#[tokio::test]
async fn rerun_processes_only_topics_without_existing_briefs() {
    let harness = Harness::new();

    // B already has a persisted brief in this map
    let existing = NewBrief {
        map_id: MapId::new("tyres"),
        topic_id: TopicId::new("b"),
        created_at_ms: 1,
        title: "Topic b".to_string(),
        slug: "topic-b".to_string(),
        meta_description: String::new(),
        headings: vec![],
        key_points: vec![],
        keywords: vec![],
        faq: vec![],
        images: vec![],
        provider: "scripted".to_string(),
        model: "scripted-1".to_string(),
    };
    harness.store.insert(&existing).await.unwrap();
    harness.state.hydrate(
        harness
            .store
            .list_for_map(&MapId::new("tyres"))
            .await
            .unwrap(),
    );

    let (runner, provider) = harness.runner(ScriptedProvider::ok());
    let summary = runner.run(&topics(&["a", "b", "c"])).await.unwrap();

    assert_eq!(summary.requested, 3);
    assert_eq!(summary.eligible, 2);
    assert_eq!(summary.completed, 2);
    assert_eq!(provider.calls(), vec!["a", "c"]);
    assert_eq!(harness.sink.add_brief_order(), vec!["a", "c"]);
}

#[tokio::test]
async fn zero_eligible_topics_emits_single_notification_and_no_calls() {
    let harness = Harness::new();

    // every topic already has a brief
    for id in ["a", "b"] {
        let existing = NewBrief {
            map_id: MapId::new("tyres"),
            topic_id: TopicId::new(id),
            created_at_ms: 1,
            title: format!("Topic {}", id),
            slug: format!("topic-{}", id),
            meta_description: String::new(),
            headings: vec![],
            key_points: vec![],
            keywords: vec![],
            faq: vec![],
            images: vec![],
            provider: "scripted".to_string(),
            model: "scripted-1".to_string(),
        };
        harness.store.insert(&existing).await.unwrap();
    }
    harness.state.hydrate(
        harness
            .store
            .list_for_map(&MapId::new("tyres"))
            .await
            .unwrap(),
    );

    let (runner, provider) = harness.runner(ScriptedProvider::ok());
    let summary = runner.run(&topics(&["a", "b"])).await.unwrap();

    assert_eq!(summary.stop, StopReason::NothingToDo);
    assert!(provider.calls().is_empty());
    let trace = harness.sink.trace();
    assert_eq!(trace, vec!["notification"]);
}

#[tokio::test]
async fn progress_is_emitted_before_generation() {
    let harness = Harness::new();
    let (runner, _) = harness.runner(ScriptedProvider::failing_on(&["a"]));

    runner.run(&topics(&["a"])).await.unwrap();

    let trace = harness.sink.trace();
    let progress_pos = trace
        .iter()
        .position(|e| e == "set_progress:1/1")
        .expect("progress event");
    let failure_pos = trace
        .iter()
        .position(|e| e == "log:failure")
        .expect("failure event");
    // progress for the item precedes its outcome even when it fails
    assert!(progress_pos < failure_pos);
}

#[tokio::test]
async fn mixed_key_points_are_persisted_as_strings() {
    let harness = Harness::new();
    let provider = ScriptedProvider::ok().with_key_points(json!([
        "plain point",
        { "point": "structured", "weight": 2 },
        7
    ]));
    let (runner, _) = harness.runner(provider);

    runner.run(&topics(&["a"])).await.unwrap();

    let stored = harness
        .store
        .list_for_map(&MapId::new("tyres"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    let key_points = &stored[0].key_points;
    assert_eq!(key_points.len(), 3);
    assert_eq!(key_points[0], "plain point");
    assert!(key_points[1].contains("structured"));
    assert_eq!(key_points[2], "7");

    // the announced record matches the persisted shape
    let announced = harness.state.briefs_for(&MapId::new("tyres"));
    assert_eq!(announced[0].key_points, *key_points);
}

#[tokio::test]
async fn missing_map_fails_fast_without_work() {
    let harness = Harness::new();
    harness.state.set_active_map(None);
    let (runner, provider) = harness.runner(ScriptedProvider::ok());

    let err = runner.run(&topics(&["a"])).await.unwrap_err();
    assert!(matches!(err, BriefError::MissingContext(_)));
    assert!(provider.calls().is_empty());
    assert_eq!(
        harness.sink.trace(),
        vec!["set_error", "set_loading:generate_briefs:false"]
    );
}
