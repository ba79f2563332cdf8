//! Ordered event application into shared state.

use briefsmith::state::{
    AppState, EventSink, LogEvent, LogStatus, StateEvent, StateRuntime, LOADING_GENERATE,
};
use briefsmith::store::{BriefRecord, NewBrief};
use briefsmith::types::{MapId, TopicId};
use std::sync::Arc;

fn record(map: &str, topic: &str, id: u64) -> BriefRecord {
    BriefRecord::assemble(
        id,
        NewBrief {
            map_id: MapId::new(map),
            topic_id: TopicId::new(topic),
            created_at_ms: 1,
            title: topic.to_string(),
            slug: topic.to_string(),
            meta_description: String::new(),
            headings: vec![],
            key_points: vec![],
            keywords: vec![],
            faq: vec![],
            images: vec![],
            provider: "p".to_string(),
            model: "m".to_string(),
        },
    )
}

#[test]
fn events_apply_in_emit_order_with_monotonic_sequence() {
    let state = Arc::new(AppState::new());
    let runtime = StateRuntime::new(Arc::clone(&state));

    runtime.emit(StateEvent::SetLoading {
        key: LOADING_GENERATE.to_string(),
        value: true,
    });
    runtime.emit(StateEvent::SetProgress {
        current: 1,
        total: 2,
        status: "first".to_string(),
    });
    runtime.emit(StateEvent::SetProgress {
        current: 2,
        total: 2,
        status: "second".to_string(),
    });
    runtime.emit(StateEvent::Log(LogEvent::new(
        "briefs",
        "done",
        LogStatus::Success,
    )));

    assert_eq!(state.applied_seq(), 4);
    assert!(state.loading(LOADING_GENERATE));
    let batch = state.batch();
    assert_eq!(batch.current, 2);
    assert_eq!(batch.status, "second");
}

#[test]
fn add_brief_updates_the_per_map_index() {
    let state = Arc::new(AppState::new());
    let runtime = StateRuntime::new(Arc::clone(&state));

    let map = MapId::new("m1");
    let topic = TopicId::new("t1");
    assert!(!state.has_brief(&map, &topic));

    runtime.emit(StateEvent::AddBrief {
        map_id: map.clone(),
        topic_id: topic.clone(),
        record: record("m1", "t1", 7),
    });

    assert!(state.has_brief(&map, &topic));
    assert!(!state.has_brief(&MapId::new("m2"), &topic));
    let briefs = state.briefs_for(&map);
    assert_eq!(briefs.len(), 1);
    assert_eq!(briefs[0].id, 7);
}

#[test]
fn reset_batch_state_clears_counters_and_cancel_flag() {
    let state = Arc::new(AppState::new());
    let runtime = StateRuntime::new(Arc::clone(&state));

    runtime.emit(StateEvent::SetProgress {
        current: 3,
        total: 5,
        status: "mid-run".to_string(),
    });
    state.request_cancel();
    assert!(state.cancel_requested());

    runtime.emit(StateEvent::ResetBatchState);

    let batch = state.batch();
    assert_eq!(batch.current, 0);
    assert_eq!(batch.total, 0);
    assert!(batch.status.is_empty());
    assert!(!batch.cancelled);
    assert!(!state.cancel_requested());
}

#[test]
fn hydrate_seeds_eligibility_reads() {
    let state = AppState::new();
    state.hydrate(vec![record("m1", "a", 1), record("m1", "b", 2), record("m2", "a", 3)]);

    assert!(state.has_brief(&MapId::new("m1"), &TopicId::new("a")));
    assert!(state.has_brief(&MapId::new("m2"), &TopicId::new("a")));
    assert!(!state.has_brief(&MapId::new("m2"), &TopicId::new("b")));
    assert_eq!(state.briefs_for(&MapId::new("m1")).len(), 2);
}

#[test]
fn notifications_and_errors_are_last_writer_wins() {
    let state = Arc::new(AppState::new());
    let runtime = StateRuntime::new(Arc::clone(&state));

    runtime.emit(StateEvent::SetNotification {
        message: "first".to_string(),
    });
    runtime.emit(StateEvent::SetError {
        message: "bad".to_string(),
    });
    runtime.emit(StateEvent::SetNotification {
        message: "second".to_string(),
    });

    assert_eq!(state.notification().as_deref(), Some("second"));
    assert_eq!(state.error().as_deref(), Some("bad"));
}
