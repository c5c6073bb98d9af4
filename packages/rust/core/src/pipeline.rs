//! Enrichment run: snapshot → per-record classify and update → summary.

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, instrument, warn};

use linkenrich_classifier::Classify;
use linkenrich_shared::{ClassificationSource, ContentType, RecordUpdate};
use linkenrich_store::RecordStore;

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Pause between consecutive records.
    pub delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
        }
    }
}

/// What happened to one record of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordStatus {
    /// Classified and written back.
    Updated {
        title: String,
        content_type: ContentType,
        source: ClassificationSource,
    },
    /// No usable URL; the classifier was not called.
    MissingUrl,
    /// The store rejected the write.
    UpdateFailed { error: String },
}

impl RecordStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

/// Per-record event handed to the observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    /// 1-based position in the snapshot.
    pub index: usize,
    pub total: usize,
    pub record_id: String,
    #[serde(flatten)]
    pub status: RecordStatus,
}

/// Final counts of a run. `succeeded + failed == total` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successful updates that carried the fallback classification.
    pub fallbacks: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

/// Receives structured progress events from [`run`].
pub trait PipelineObserver: Send + Sync {
    fn run_started(&self, total: usize);
    fn record_started(&self, index: usize, total: usize, record_id: &str, url: Option<&str>);
    fn record_finished(&self, outcome: &RecordOutcome);
    fn run_finished(&self, summary: &RunSummary);
}

/// No-op observer for headless/test usage.
pub struct SilentObserver;

impl PipelineObserver for SilentObserver {
    fn run_started(&self, _total: usize) {}
    fn record_started(&self, _index: usize, _total: usize, _record_id: &str, _url: Option<&str>) {}
    fn record_finished(&self, _outcome: &RecordOutcome) {}
    fn run_finished(&self, _summary: &RunSummary) {}
}

/// Process every currently unprocessed record, one at a time.
///
/// The record list is fetched once up front and never refreshed during the
/// run. Per-record failures are counted and never abort the batch; nothing
/// is retried.
#[instrument(skip_all, fields(delay_ms = settings.delay.as_millis() as u64))]
pub async fn run(
    store: &dyn RecordStore,
    classifier: &dyn Classify,
    settings: &PipelineSettings,
    observer: &dyn PipelineObserver,
) -> RunSummary {
    let started_at = Local::now();
    let records = store.list_unprocessed().await;
    let total = records.len();

    info!(total, "starting enrichment run");
    observer.run_started(total);

    let mut succeeded = 0;
    let mut failed = 0;
    let mut fallbacks = 0;

    for (i, record) in records.iter().enumerate() {
        let index = i + 1;
        let url = store.extract_url(record);
        observer.record_started(index, total, &record.id, url.as_deref());

        let status = match url {
            None => {
                warn!(record_id = %record.id, "record has no usable URL, skipping");
                RecordStatus::MissingUrl
            }
            Some(url) => {
                let classification = classifier.classify(&url).await;
                let update =
                    RecordUpdate::from_classification(&classification, Local::now().date_naive());

                match store.apply_update(&record.id, &update).await {
                    Ok(()) => {
                        info!(
                            record_id = %record.id,
                            title = %classification.title,
                            category = %classification.category,
                            content_type = %classification.content_type,
                            "record updated"
                        );
                        RecordStatus::Updated {
                            title: classification.title,
                            content_type: classification.content_type,
                            source: classification.source,
                        }
                    }
                    Err(e) => {
                        warn!(record_id = %record.id, error = %e, "record update failed");
                        RecordStatus::UpdateFailed {
                            error: e.to_string(),
                        }
                    }
                }
            }
        };

        match &status {
            RecordStatus::Updated { source, .. } => {
                succeeded += 1;
                if *source == ClassificationSource::Fallback {
                    fallbacks += 1;
                }
            }
            RecordStatus::MissingUrl | RecordStatus::UpdateFailed { .. } => failed += 1,
        }

        observer.record_finished(&RecordOutcome {
            index,
            total,
            record_id: record.id.clone(),
            status,
        });

        if index < total && !settings.delay.is_zero() {
            tokio::time::sleep(settings.delay).await;
        }
    }

    let summary = RunSummary {
        total,
        succeeded,
        failed,
        fallbacks,
        started_at,
        finished_at: Local::now(),
    };

    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        fallbacks = summary.fallbacks,
        "enrichment run complete"
    );
    observer.run_finished(&summary);

    summary
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Instant;

    use async_trait::async_trait;
    use linkenrich_classifier::fallback;
    use linkenrich_shared::{
        Category, Classification, LinkEnrichError, Record, Result,
    };

    use super::*;

    /// In-memory store applying the same "title or notes empty" predicate.
    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<Vec<Record>>,
        reject: HashSet<String>,
        updates: Mutex<Vec<(String, RecordUpdate)>>,
    }

    impl MemoryStore {
        fn with(records: Vec<Record>) -> Self {
            Self {
                records: Mutex::new(records),
                ..Default::default()
            }
        }

        fn rejecting(mut self, id: &str) -> Self {
            self.reject.insert(id.to_string());
            self
        }

        fn updates(&self) -> Vec<(String, RecordUpdate)> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn list_unprocessed(&self) -> Vec<Record> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.is_unprocessed())
                .cloned()
                .collect()
        }

        async fn apply_update(&self, id: &str, update: &RecordUpdate) -> Result<()> {
            self.updates
                .lock()
                .unwrap()
                .push((id.to_string(), update.clone()));
            if self.reject.contains(id) {
                return Err(LinkEnrichError::api("memory", 400, "validation failed"));
            }
            let mut records = self.records.lock().unwrap();
            if let Some(r) = records.iter_mut().find(|r| r.id == id) {
                r.title = update.title.clone();
                r.category = Some(update.category.as_str().to_string());
                r.content_type = Some(update.content_type);
                r.notes = update.notes.clone();
                r.date_classified = Some(update.date);
            }
            Ok(())
        }
    }

    /// Classifier that either answers like a model or degrades to fallback.
    struct FakeClassifier {
        degrade: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeClassifier {
        fn model() -> Self {
            Self {
                degrade: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn degraded() -> Self {
            Self {
                degrade: true,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Classify for FakeClassifier {
        async fn classify(&self, url: &str) -> Classification {
            self.calls.lock().unwrap().push(url.to_string());
            if self.degrade {
                return fallback(url);
            }
            Classification {
                title: format!("About {url}"),
                category: Category::Development,
                content_type: linkenrich_classifier::url_type(url),
                notes: "A short summary.".into(),
                source: ClassificationSource::Model,
            }
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
        outcomes: Mutex<Vec<RecordOutcome>>,
    }

    impl PipelineObserver for RecordingObserver {
        fn run_started(&self, total: usize) {
            self.events.lock().unwrap().push(format!("start {total}"));
        }

        fn record_started(&self, index: usize, total: usize, record_id: &str, _url: Option<&str>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("record {index}/{total} {record_id}"));
        }

        fn record_finished(&self, outcome: &RecordOutcome) {
            self.outcomes.lock().unwrap().push(outcome.clone());
        }

        fn run_finished(&self, summary: &RunSummary) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {}/{}", summary.succeeded, summary.total));
        }
    }

    fn record(id: &str, url: Option<&str>) -> Record {
        Record {
            id: id.into(),
            url: url.map(String::from),
            title: String::new(),
            category: None,
            content_type: None,
            notes: String::new(),
            date_classified: None,
        }
    }

    fn no_delay() -> PipelineSettings {
        PipelineSettings {
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn single_youtube_record_with_fallback() {
        let store = MemoryStore::with(vec![record("r1", Some("https://youtu.be/abc123"))]);
        let classifier = FakeClassifier::degraded();
        let today = Local::now().date_naive();

        let summary = run(&store, &classifier, &no_delay(), &SilentObserver).await;

        assert_eq!(summary.total, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.fallbacks, 1);

        let updates = store.updates();
        assert_eq!(updates.len(), 1);
        let (id, update) = &updates[0];
        assert_eq!(id, "r1");
        assert_eq!(update.title, "abc123");
        assert_eq!(update.category, Category::Other);
        assert_eq!(update.content_type, ContentType::Video);
        assert_eq!(update.notes, linkenrich_classifier::FALLBACK_NOTES);
        assert!(update.date >= today);
    }

    #[tokio::test]
    async fn missing_urls_skip_classifier_and_count_as_failures() {
        let store = MemoryStore::with(vec![
            record("a", Some("https://example.com/a")),
            record("b", None),
            record("c", Some("https://example.com/c")),
            record("d", Some("   ")),
            record("e", Some("https://example.com/e")),
        ]);
        let classifier = FakeClassifier::model();

        let summary = run(&store, &classifier, &no_delay(), &SilentObserver).await;

        // N = 5, M = 2
        assert_eq!(classifier.calls().len(), 3);
        assert_eq!(store.updates().len(), 3);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.succeeded + summary.failed, summary.total);
        assert!(!classifier.calls().iter().any(|u| u.trim().is_empty()));
    }

    #[tokio::test]
    async fn update_failure_is_isolated() {
        let store = MemoryStore::with(vec![
            record("ok-1", Some("https://example.com/1")),
            record("bad", Some("https://example.com/2")),
            record("ok-2", Some("https://example.com/3")),
        ])
        .rejecting("bad");
        let classifier = FakeClassifier::model();
        let observer = RecordingObserver::default();

        let summary = run(&store, &classifier, &no_delay(), &observer).await;

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(classifier.calls().len(), 3);

        let outcomes = observer.outcomes.lock().unwrap();
        assert!(outcomes[0].status.is_success());
        assert!(matches!(
            &outcomes[1].status,
            RecordStatus::UpdateFailed { error } if error.contains("validation failed")
        ));
        assert!(outcomes[2].status.is_success());

        // The rejected record is still eligible next time.
        let remaining = store.list_unprocessed().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "bad");
    }

    #[tokio::test]
    async fn processed_records_leave_the_unprocessed_set() {
        let store = MemoryStore::with(vec![
            record("r1", Some("https://youtu.be/abc123")),
            record("r2", Some("https://medium.com/@a/post")),
            record("r3", None),
        ]);

        run(&store, &FakeClassifier::degraded(), &no_delay(), &SilentObserver).await;

        let remaining: Vec<String> = store
            .list_unprocessed()
            .await
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(remaining, vec!["r3"]);
    }

    #[tokio::test]
    async fn snapshot_order_and_events() {
        let store = MemoryStore::with(vec![
            record("first", Some("https://example.com/1")),
            record("second", None),
        ]);
        let observer = RecordingObserver::default();

        run(&store, &FakeClassifier::model(), &no_delay(), &observer).await;

        let events = observer.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["start 2", "record 1/2 first", "record 2/2 second", "done 1/2"]
        );
        let outcomes = observer.outcomes.lock().unwrap();
        assert_eq!(outcomes[1].status, RecordStatus::MissingUrl);
        assert_eq!(outcomes[1].index, 2);
        assert_eq!(outcomes[1].total, 2);
    }

    #[tokio::test]
    async fn empty_snapshot_reports_zero() {
        let store = MemoryStore::default();
        let classifier = FakeClassifier::model();
        let observer = RecordingObserver::default();

        let summary = run(&store, &classifier, &no_delay(), &observer).await;

        assert_eq!(summary.total, 0);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
        assert!(classifier.calls().is_empty());
        assert_eq!(
            observer.events.lock().unwrap().clone(),
            vec!["start 0", "done 0/0"]
        );
    }

    #[tokio::test]
    async fn pacing_separates_records() {
        let delay = Duration::from_millis(250);
        let store = MemoryStore::with(vec![
            record("a", Some("https://example.com/a")),
            record("b", None),
            record("c", Some("https://example.com/c")),
        ]);
        let settings = PipelineSettings { delay };

        let start = Instant::now();
        let summary = run(&store, &FakeClassifier::model(), &settings, &SilentObserver).await;
        let elapsed = start.elapsed();

        assert_eq!(summary.total, 3);
        // Two gaps between three records; none after the last one.
        assert!(elapsed >= delay * 2, "elapsed {elapsed:?}");
        assert!(elapsed < delay * 3, "elapsed {elapsed:?}");
        assert!(summary.finished_at >= summary.started_at);
    }

    #[tokio::test]
    async fn model_results_are_not_counted_as_fallbacks() {
        let store = MemoryStore::with(vec![record("r1", Some("https://example.com/news/1"))]);

        let summary = run(&store, &FakeClassifier::model(), &no_delay(), &SilentObserver).await;

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.fallbacks, 0);
        let (_, update) = &store.updates()[0];
        assert_eq!(update.content_type, ContentType::News);
        assert_eq!(update.category, Category::Development);
    }

    #[test]
    fn outcome_serializes_flat() {
        let outcome = RecordOutcome {
            index: 1,
            total: 2,
            record_id: "r1".into(),
            status: RecordStatus::MissingUrl,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "missing_url");
        assert_eq!(value["record_id"], "r1");
    }
}
