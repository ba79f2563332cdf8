//! Batch runner: the per-topic generation loop.
//!
//! Owns eligibility filtering, cooperative cancellation, staleness
//! detection, and per-item failure isolation. Provider and store behavior
//! stay in their domains; state is mutated only through the event sink.

use crate::batch::{BatchSummary, StopReason, SERVICE};
use crate::config::business::BusinessContext;
use crate::error::BriefError;
use crate::provider::{BriefProvider, BriefRequest};
use crate::sanitize;
use crate::state::{AppState, EventSink, LogEvent, LogStatus, StateEvent, LOADING_GENERATE};
use crate::store::{BriefRecord, BriefStore, NewBrief};
use crate::types::{now_millis, BatchContext, Topic};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Drives one batch of brief generation over an ordered topic list.
pub struct BatchRunner {
    provider: Arc<dyn BriefProvider>,
    store: Arc<dyn BriefStore>,
    sink: Arc<dyn EventSink>,
    state: Arc<AppState>,
    business: BusinessContext,
}

impl BatchRunner {
    pub fn new(
        provider: Arc<dyn BriefProvider>,
        store: Arc<dyn BriefStore>,
        sink: Arc<dyn EventSink>,
        state: Arc<AppState>,
        business: BusinessContext,
    ) -> Self {
        Self {
            provider,
            store,
            sink,
            state,
            business,
        }
    }

    /// Run one batch. Topics are processed strictly in order, one at a
    /// time. Per-topic failures are logged and skipped; only a missing
    /// context escapes as an error.
    pub async fn run(&self, topics: &[Topic]) -> Result<BatchSummary, BriefError> {
        let Some(map_id) = self.state.active_map() else {
            let message = "Select a map before generating briefs".to_string();
            self.sink.emit(StateEvent::SetError {
                message: message.clone(),
            });
            self.sink.emit(StateEvent::SetLoading {
                key: LOADING_GENERATE.to_string(),
                value: false,
            });
            return Err(BriefError::MissingContext(message));
        };
        if !self.business.is_complete() {
            let message = "Business context has no domain; configure one before generating".to_string();
            self.sink.emit(StateEvent::SetError {
                message: message.clone(),
            });
            self.sink.emit(StateEvent::SetLoading {
                key: LOADING_GENERATE.to_string(),
                value: false,
            });
            return Err(BriefError::MissingContext(message));
        }

        let context = BatchContext {
            map_id: map_id.clone(),
        };
        let eligible: Vec<&Topic> = topics
            .iter()
            .filter(|topic| !self.state.has_brief(&context.map_id, &topic.id))
            .collect();

        if eligible.is_empty() {
            self.sink.emit(StateEvent::SetNotification {
                message: "All topics already have briefs; nothing to generate".to_string(),
            });
            return Ok(BatchSummary {
                requested: topics.len(),
                eligible: 0,
                completed: 0,
                failed: 0,
                stop: StopReason::NothingToDo,
            });
        }

        let total = eligible.len();
        let mut completed = 0usize;
        let mut failed = 0usize;
        let mut stop = StopReason::Exhausted;

        self.sink.emit(StateEvent::SetLoading {
            key: LOADING_GENERATE.to_string(),
            value: true,
        });
        info!(map = %context.map_id, total, "starting brief batch");

        for (index, topic) in eligible.into_iter().enumerate() {
            // Cancellation and the active map are re-read from live state
            // every iteration; both can change while the previous
            // provider call was in flight.
            if self.state.cancel_requested() {
                self.log(
                    format!("Brief generation cancelled: {} of {} completed", completed, total),
                    LogStatus::Info,
                );
                self.sink.emit(StateEvent::SetNotification {
                    message: format!("Cancelled after {} of {} briefs", completed, total),
                });
                stop = StopReason::Cancelled;
                break;
            }
            match self.state.active_map() {
                Some(current) if current == context.map_id => {}
                _ => {
                    self.log(
                        format!(
                            "Brief batch aborted: active map changed away from '{}'",
                            context.map_id
                        ),
                        LogStatus::Failure,
                    );
                    stop = StopReason::ContextChanged;
                    break;
                }
            }

            // Progress goes out before generation so observers see the
            // in-flight topic even when the provider is slow or fails.
            self.sink.emit(StateEvent::SetProgress {
                current: index + 1,
                total,
                status: topic.title.clone(),
            });
            self.log(
                format!("Generating brief {}/{}: {}", index + 1, total, topic.title),
                LogStatus::Info,
            );

            match self.process_topic(&context, topic).await {
                Ok(record) => {
                    completed += 1;
                    self.sink.emit(StateEvent::AddBrief {
                        map_id: context.map_id.clone(),
                        topic_id: topic.id.clone(),
                        record,
                    });
                }
                Err(err) => {
                    failed += 1;
                    warn!(topic = %topic.id, error = %err, "brief generation failed");
                    self.sink.emit(StateEvent::Log(
                        LogEvent::new(
                            SERVICE,
                            format!("Brief generation failed for '{}': {}", topic.title, err),
                            LogStatus::Failure,
                        )
                        .with_data(json!({ "topic": topic.id.as_str() })),
                    ));
                }
            }
        }

        // Always runs, however the loop ended: counters and the loading
        // flag must never be left dangling for the next run.
        self.sink.emit(StateEvent::ResetBatchState);
        self.log(
            format!(
                "Brief batch complete: {} generated, {} failed",
                completed, failed
            ),
            LogStatus::Success,
        );
        self.sink.emit(StateEvent::SetLoading {
            key: LOADING_GENERATE.to_string(),
            value: false,
        });
        info!(map = %context.map_id, completed, failed, "brief batch finished");

        Ok(BatchSummary {
            requested: topics.len(),
            eligible: total,
            completed,
            failed,
            stop,
        })
    }

    /// One topic's pipeline: generate, normalize, persist, sanitize.
    /// Failures surface as `Err`; the loop turns them into log events.
    async fn process_topic(
        &self,
        context: &BatchContext,
        topic: &Topic,
    ) -> Result<BriefRecord, BriefError> {
        let request = BriefRequest {
            map_id: &context.map_id,
            topic,
            business: &self.business,
        };
        let generated = self.provider.generate(request).await?;

        let new_brief = NewBrief::from_generated(
            context.map_id.clone(),
            topic.id.clone(),
            generated,
            now_millis(),
        );
        let id = self.store.insert(&new_brief).await?;
        let record = BriefRecord::assemble(id, new_brief);
        Ok(sanitize::finalize_brief(record))
    }

    fn log(&self, message: String, status: LogStatus) {
        self.sink
            .emit(StateEvent::Log(LogEvent::new(SERVICE, message, status)));
    }
}
