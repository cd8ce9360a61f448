//! Fan-out/fan-in conversion of candidates into records.
//!
//! Every candidate gets its own task. Outcomes flow through one bounded
//! channel into a collector that runs alongside the workers. Two timeouts
//! apply: the collector gives up if a single outcome takes longer than
//! `item_timeout`, and once every worker has finished the collector gets at
//! most `collection_timeout` to wrap up.

use crate::constants::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_COLLECTION_TIMEOUT_SECS, DEFAULT_ITEM_TIMEOUT_SECS,
};
use crate::error::FightError;
use crate::metrics::ParserMetrics;
use crate::parser::id_generator::IdGenerator;
use crate::parser::normalize::{fighter_name_from_markup, format_date, result_from_markup};
use crate::types::{FightCandidate, FightRecord, MonthContext, ProcessingOutcome};
use chrono::{SecondsFormat, Utc};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Turns one candidate into a record. Implementations run inside worker
/// tasks, one call per candidate.
pub trait CandidateConverter: Send + Sync {
    fn convert(&self, candidate: &FightCandidate) -> Result<FightRecord, FightError>;
}

/// Normalizes the candidate's cells, resolves the date against the page's
/// month and assigns an id.
pub struct RecordConverter {
    ids: Arc<IdGenerator>,
    context: MonthContext,
}

impl RecordConverter {
    pub fn new(ids: Arc<IdGenerator>, context: MonthContext) -> Self {
        Self { ids, context }
    }
}

impl CandidateConverter for RecordConverter {
    fn convert(&self, candidate: &FightCandidate) -> Result<FightRecord, FightError> {
        let (fighter1, fighter2) = match (
            fighter_name_from_markup(&candidate.fighter1),
            fighter_name_from_markup(&candidate.fighter2),
        ) {
            (Some(first), Some(second)) => (first, second),
            (fighter1, fighter2) => return Err(FightError::MissingField { fighter1, fighter2 }),
        };

        Ok(FightRecord {
            id: self.ids.next_id(),
            date: format_date(&candidate.date_token, self.context.year, self.context.month),
            fighter1,
            fighter2,
            result: result_from_markup(&candidate.result),
            location: candidate.location.clone(),
            parsed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessorSettings {
    pub channel_capacity: usize,
    pub item_timeout: Duration,
    pub collection_timeout: Duration,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            item_timeout: Duration::from_secs(DEFAULT_ITEM_TIMEOUT_SECS),
            collection_timeout: Duration::from_secs(DEFAULT_COLLECTION_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectorExit {
    Drained,
    TimedOut,
    Closed,
}

#[derive(Debug, Clone, Default)]
pub struct FightProcessor {
    settings: ProcessorSettings,
}

impl FightProcessor {
    pub fn new(settings: ProcessorSettings) -> Self {
        Self { settings }
    }

    /// Convert all candidates concurrently. Failed candidates are logged and
    /// left out, so the result may be shorter than the input. Order is not
    /// preserved.
    pub async fn process_all(
        &self,
        candidates: Vec<FightCandidate>,
        converter: Arc<dyn CandidateConverter>,
    ) -> Vec<FightRecord> {
        let expected = candidates.len();
        if expected == 0 {
            return Vec::new();
        }

        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        let mut workers = JoinSet::new();

        for (index, candidate) in candidates.into_iter().enumerate() {
            let tx = tx.clone();
            let converter = converter.clone();
            workers.spawn(async move {
                let outcome = convert_isolated(index, &candidate, converter.as_ref());
                if tx.send(outcome).await.is_err() {
                    debug!(index, "Collector stopped listening, outcome dropped");
                }
            });
        }
        drop(tx);

        let mut records = Vec::with_capacity(expected);
        {
            let collector =
                collect_outcomes(rx, expected, self.settings.item_timeout, &mut records);
            tokio::pin!(collector);
            let mut collector_exit = None;

            // Wait for every worker while the collector drains alongside.
            loop {
                tokio::select! {
                    exit = &mut collector, if collector_exit.is_none() => {
                        if exit == CollectorExit::TimedOut {
                            // Stragglers keep running; their sends fail now that
                            // the receiver is gone.
                            workers.detach_all();
                        }
                        collector_exit = Some(exit);
                    }
                    joined = workers.join_next() => match joined {
                        Some(Ok(())) => {}
                        Some(Err(e)) => warn!("Fight worker did not complete: {}", e),
                        None => break,
                    },
                }
            }

            // Last-resort bound. Every sender is gone once the workers are
            // joined, so only outcomes already buffered in the channel remain.
            if collector_exit.is_none() {
                match timeout(self.settings.collection_timeout, &mut collector).await {
                    Ok(exit) => debug!(?exit, "Collector finished after workers"),
                    Err(_) => {
                        warn!("Timeout waiting for result collection");
                        ParserMetrics::record_collector_timeout();
                    }
                }
            }
        }

        info!("Collected {} of {} fights", records.len(), expected);
        records
    }
}

/// Runs the converter behind a panic boundary so one bad row can't take the
/// batch down with it.
fn convert_isolated(
    index: usize,
    candidate: &FightCandidate,
    converter: &dyn CandidateConverter,
) -> ProcessingOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| converter.convert(candidate))).unwrap_or_else(
        |payload| {
            warn!(index, "Panic while converting fight candidate");
            Err(FightError::Panicked {
                index,
                message: panic_message(payload.as_ref()),
            })
        },
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Drains up to `expected` outcomes. Returns early when a single receive
/// waits longer than `item_timeout`; the receiver is dropped on return.
async fn collect_outcomes(
    mut rx: mpsc::Receiver<ProcessingOutcome>,
    expected: usize,
    item_timeout: Duration,
    records: &mut Vec<FightRecord>,
) -> CollectorExit {
    for received in 0..expected {
        match timeout(item_timeout, rx.recv()).await {
            Ok(Some(Ok(record))) => records.push(record),
            Ok(Some(Err(e))) => {
                warn!("Error parsing fight: {}", e);
                ParserMetrics::record_candidate_failure();
            }
            Ok(None) => {
                warn!(received, expected, "Result channel closed before all outcomes arrived");
                return CollectorExit::Closed;
            }
            Err(_) => {
                warn!("Timeout waiting for fight result {}", received);
                ParserMetrics::record_collector_timeout();
                return CollectorExit::TimedOut;
            }
        }
    }
    CollectorExit::Drained
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn candidate(day: &str, first: &str, second: &str) -> FightCandidate {
        FightCandidate {
            location: "Las Vegas, NV".to_string(),
            date_token: day.to_string(),
            fighter1: first.to_string(),
            fighter2: second.to_string(),
            result: "KO".to_string(),
            row_html: String::new(),
        }
    }

    fn converter() -> Arc<dyn CandidateConverter> {
        Arc::new(RecordConverter::new(
            Arc::new(IdGenerator::with_timestamp(7)),
            MonthContext::new(2025, 3),
        ))
    }

    /// Panics on a marker fighter, sleeps on another, and counts every call.
    struct ScriptedConverter {
        inner: Arc<dyn CandidateConverter>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CandidateConverter for ScriptedConverter {
        fn convert(&self, candidate: &FightCandidate) -> Result<FightRecord, FightError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match candidate.fighter1.as_str() {
                "panic" => panic!("boom in row"),
                "slow" => std::thread::sleep(self.delay),
                _ => {}
            }
            self.inner.convert(candidate)
        }
    }

    #[tokio::test]
    async fn test_converts_every_candidate() {
        let candidates = vec![
            candidate("1", "John Doe", "Jane Smith"),
            candidate("2", "<a href=\"/b\">Mike Johnson</a>", "Sarah Connor (3-0)"),
            candidate("3", "Ann Lee", "Bo Kim"),
        ];

        let mut records = FightProcessor::default()
            .process_all(candidates, converter())
            .await;
        records.sort_by(|a, b| a.date.cmp(&b.date));

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].date, "2025-03-01");
        assert_eq!(records[1].fighter1, "Mike Johnson");
        assert_eq!(records[1].fighter2, "Sarah Connor");
        assert_eq!(records[2].location, "Las Vegas, NV");
        assert!(records.iter().all(|r| r.id.starts_with("fight_7_")));
        assert!(records.iter().all(|r| chrono::DateTime::parse_from_rfc3339(&r.parsed_at).is_ok()));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let records = FightProcessor::default()
            .process_all(Vec::new(), converter())
            .await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_missing_fighter_is_dropped() {
        let candidates = vec![
            candidate("1", "", "Jane Smith"),
            candidate("2", "John Doe", "Jane Smith"),
        ];

        let records = FightProcessor::default()
            .process_all(candidates, converter())
            .await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fighter1, "John Doe");
    }

    #[test]
    fn test_record_converter_reports_missing_field() {
        let err = converter()
            .convert(&candidate("1", "(2-0)", "Jane Smith"))
            .unwrap_err();
        assert_eq!(
            err,
            FightError::MissingField {
                fighter1: None,
                fighter2: Some("Jane Smith".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let scripted = Arc::new(ScriptedConverter {
            inner: converter(),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        });
        let candidates = vec![
            candidate("1", "John Doe", "Jane Smith"),
            candidate("2", "panic", "Jane Smith"),
            candidate("3", "Ann Lee", "Bo Kim"),
        ];

        let records = FightProcessor::default()
            .process_all(candidates, scripted.clone())
            .await;

        assert_eq!(scripted.calls.load(Ordering::SeqCst), 3);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.fighter1 != "panic"));
    }

    #[test]
    fn test_convert_isolated_wraps_panic() {
        let scripted = ScriptedConverter {
            inner: converter(),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        };
        let outcome = convert_isolated(4, &candidate("1", "panic", "x"), &scripted);
        assert_eq!(
            outcome,
            Err(FightError::Panicked {
                index: 4,
                message: "boom in row".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_small_channel_does_not_block_producers() {
        let candidates: Vec<_> = (0..50)
            .map(|i| candidate(&(i % 28 + 1).to_string(), &format!("Fighter {i}"), "Opponent"))
            .collect();
        let processor = FightProcessor::new(ProcessorSettings {
            channel_capacity: 2,
            ..ProcessorSettings::default()
        });

        let records = processor.process_all(candidates, converter()).await;
        assert_eq!(records.len(), 50);

        let mut ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_item_timeout_returns_partial_results() {
        let scripted = Arc::new(ScriptedConverter {
            inner: converter(),
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(600),
        });
        let candidates = vec![
            candidate("1", "John Doe", "Jane Smith"),
            candidate("2", "slow", "Jane Smith"),
            candidate("3", "Ann Lee", "Bo Kim"),
        ];
        let processor = FightProcessor::new(ProcessorSettings {
            channel_capacity: 10,
            item_timeout: Duration::from_millis(100),
            collection_timeout: Duration::from_secs(5),
        });

        let started = Instant::now();
        let records = processor.process_all(candidates, scripted).await;

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.fighter1 != "slow"));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_buffered_outcomes_drain_within_collection_timeout() {
        let processor = FightProcessor::new(ProcessorSettings {
            channel_capacity: 64,
            item_timeout: Duration::from_secs(30),
            collection_timeout: Duration::from_millis(200),
        });
        let candidates: Vec<_> = (1..=40)
            .map(|day| candidate(&(day % 28 + 1).to_string(), "John Doe", "Jane Smith"))
            .collect();

        let started = Instant::now();
        let records = processor.process_all(candidates, converter()).await;

        assert_eq!(records.len(), 40);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_panic_message_variants() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(5_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
