//! End-to-end pipeline tests over in-memory feeds.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::dedup::DedupSet;
use crate::domain::NormalizedEvent;
use crate::publish::{EventPublisher, PublishError};
use crate::stations::{Station, StationDirectory};

use super::{Pipeline, RunOptions, RunStatus};

/// Publisher that records every event and can be told to fail.
#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<NormalizedEvent>>,
    fail: AtomicBool,
}

impl RecordingPublisher {
    fn events(&self) -> Vec<NormalizedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &NormalizedEvent) -> Result<(), PublishError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Rejected("transport down".to_string()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn directory() -> Arc<StationDirectory> {
    let station = |code: &str, name: &str| Station {
        code: code.to_string(),
        name: name.to_string(),
        border_connection: false,
    };
    Arc::new(StationDirectory::from_entries([
        ("ASDM".to_string(), station("ASD", "Amsterdam Centraal")),
        ("RTDM".to_string(), station("RTD", "Rotterdam Centraal")),
        ("UTRC".to_string(), station("UT", "Utrecht Centraal")),
    ]))
}

fn pipeline() -> (Pipeline, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::default());
    let pipeline = Pipeline::new(directory(), DedupSet::new(), publisher.clone());
    (pipeline, publisher)
}

fn header_line() -> String {
    json!({
        "recordType": "timetableHeader",
        "classification": "full",
        "extractedAt": "2026-01-04T02:00:00Z",
        "owner": "NETWORK"
    })
    .to_string()
}

fn schedule_line(train_id: &str, stp: &str, start_date: &str, locations: &[&str]) -> String {
    let waypoints: Vec<_> = locations
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let arrival: Option<&str> = (i > 0).then_some("0824");
            let departure: Option<&str> = (i < locations.len() - 1).then_some("0743");
            json!({
                "locationId": id,
                "arrivalTime": arrival,
                "departureTime": departure,
            })
        })
        .collect();

    json!({
        "recordType": "schedule",
        "trainId": train_id,
        "stpIndicator": stp,
        "validityStartDate": start_date,
        "waypoints": waypoints,
    })
    .to_string()
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// Reader that yields its data and then faults.
struct BrokenReader {
    data: std::io::Cursor<Vec<u8>>,
    faulted: bool,
}

impl BrokenReader {
    fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: std::io::Cursor::new(data.into()),
            faulted: false,
        }
    }
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.data.read(buf)?;
        if n > 0 {
            return Ok(n);
        }
        if self.faulted {
            return Ok(0);
        }
        self.faulted = true;
        Err(std::io::Error::other("connection reset"))
    }
}

#[tokio::test]
async fn gzip_feed_with_header_and_one_schedule() {
    let feed = format!(
        "{}\n{}\n",
        header_line(),
        schedule_line("C10234", "N", "2026-01-05", &["ASDM", "RTDM"])
    );
    let (pipeline, publisher) = pipeline();

    let result = pipeline
        .run_stream(gzip(&feed).as_slice(), RunOptions::new("run-1"))
        .await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.statistics.total_lines, 2);
    assert_eq!(result.statistics.schedules_processed, 1);
    assert_eq!(result.statistics.events_published, 1);
    assert_eq!(result.statistics.parse_errors, 0);
    assert!(result.errors.is_empty());

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].origin, "ASD");
    assert_eq!(events[0].destination, "RTD");
    assert_eq!(events[0].passage_points[0].departure.as_deref(), Some("07:43"));
    assert_eq!(events[0].metadata.correlation_id, "run-1");
}

#[tokio::test]
async fn plain_stream_is_read_without_decompression() {
    let feed = schedule_line("C1", "N", "2026-01-05", &["ASDM"]);
    let (pipeline, _) = pipeline();

    let result = pipeline
        .run_stream(feed.as_bytes(), RunOptions::new("run-1"))
        .await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.statistics.events_published, 1);
}

#[tokio::test]
async fn text_input_skips_decompression_entirely() {
    let feed = format!(
        "{}\n\n   \n{}\n",
        header_line(),
        schedule_line("C1", "N", "2026-01-05", &["ASDM"])
    );
    let (pipeline, _) = pipeline();

    let result = pipeline.run_text(&feed, RunOptions::new("run-1")).await;

    // Blank and whitespace-only lines touch no counter.
    assert_eq!(result.statistics.total_lines, 2);
    assert_eq!(result.statistics.events_published, 1);
}

#[tokio::test]
async fn malformed_lines_are_counted_and_skipped() {
    let feed = format!(
        "not json at all\n{}\n{{\"recordType\": \"schedule\"}}\n{}\n",
        schedule_line("C1", "N", "2026-01-05", &["ASDM"]),
        schedule_line("C2", "N", "2026-01-05", &["RTDM"])
    );
    let (pipeline, publisher) = pipeline();

    let result = pipeline.run_text(&feed, RunOptions::new("run-1")).await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.statistics.total_lines, 4);
    assert_eq!(result.statistics.parse_errors, 2);
    assert_eq!(result.statistics.events_published, 2);
    assert_eq!(publisher.events().len(), 2);
}

#[tokio::test]
async fn non_planning_schedules_are_filtered_not_published() {
    let feed = [
        schedule_line("C1", "O", "2026-01-05", &["ASDM"]),
        schedule_line("C2", "C", "2026-01-05", &["ASDM"]),
        schedule_line("C3", "P", "2026-01-05", &["ASDM"]),
    ]
    .join("\n");
    let (pipeline, publisher) = pipeline();

    let result = pipeline.run_text(&feed, RunOptions::new("run-1")).await;

    assert_eq!(result.statistics.schedules_filtered, 3);
    assert_eq!(result.statistics.schedules_processed, 0);
    assert_eq!(result.statistics.events_published, 0);
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn schedules_without_usable_locations_are_filtered() {
    let no_waypoints = json!({
        "recordType": "schedule",
        "trainId": "C1",
        "stpIndicator": "N",
        "validityStartDate": "2026-01-05"
    })
    .to_string();
    let feed = format!(
        "{}\n{}\n",
        no_waypoints,
        schedule_line("C2", "N", "2026-01-05", &["XXXX", "YYYY"])
    );
    let (pipeline, publisher) = pipeline();

    let result = pipeline.run_text(&feed, RunOptions::new("run-1")).await;

    assert_eq!(result.statistics.schedules_filtered, 2);
    assert_eq!(result.statistics.events_published, 0);
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn unknown_record_types_touch_only_total_lines() {
    let feed = r#"{"recordType": "association", "base": "C1"}"#;
    let (pipeline, _) = pipeline();

    let result = pipeline.run_text(feed, RunOptions::new("run-1")).await;

    assert_eq!(result.statistics.total_lines, 1);
    assert_eq!(result.statistics.parse_errors, 0);
    assert_eq!(result.statistics.schedules_filtered, 0);
    assert_eq!(result.statistics.schedules_processed, 0);
}

#[tokio::test]
async fn duplicate_within_one_run_is_skipped() {
    let feed = format!(
        "{}\n{}\n",
        schedule_line("C1", "N", "2026-01-05", &["ASDM"]),
        schedule_line("C1", "N", "2026-01-05", &["RTDM"])
    );
    let (pipeline, publisher) = pipeline();

    let result = pipeline.run_text(&feed, RunOptions::new("run-1")).await;

    assert_eq!(result.statistics.schedules_processed, 2);
    assert_eq!(result.statistics.events_published, 1);
    assert_eq!(result.statistics.duplicates_skipped, 1);
    assert_eq!(publisher.events().len(), 1);
}

#[tokio::test]
async fn second_run_only_skips_duplicates() {
    let feed = format!(
        "{}\n{}\n",
        schedule_line("C1", "N", "2026-01-05", &["ASDM"]),
        schedule_line("C2", "N", "2026-01-06", &["RTDM"])
    );
    let (pipeline, publisher) = pipeline();

    let first = pipeline.run_text(&feed, RunOptions::new("run-1")).await;
    let second = pipeline.run_text(&feed, RunOptions::new("run-2")).await;

    assert_eq!(first.statistics.events_published, 2);
    assert_eq!(second.statistics.schedules_processed, 2);
    assert_eq!(second.statistics.events_published, 0);
    assert_eq!(
        second.statistics.duplicates_skipped,
        first.statistics.events_published
    );
    assert_eq!(publisher.events().len(), 2);
}

#[tokio::test]
async fn force_refresh_republishes_on_every_run() {
    let feed = schedule_line("C1", "N", "2026-01-05", &["ASDM"]);
    let (pipeline, publisher) = pipeline();

    let first = pipeline
        .run_text(&feed, RunOptions::new("run-1").force_refresh(true))
        .await;
    let second = pipeline
        .run_text(&feed, RunOptions::new("run-2").force_refresh(true))
        .await;

    assert_eq!(first.statistics.events_published, 1);
    assert_eq!(second.statistics.events_published, 1);
    assert_eq!(second.statistics.duplicates_skipped, 0);
    assert_eq!(publisher.events().len(), 2);
}

#[tokio::test]
async fn forced_publish_commits_key_for_later_runs() {
    let feed = schedule_line("C1", "N", "2026-01-05", &["ASDM"]);
    let (pipeline, _) = pipeline();

    pipeline
        .run_text(&feed, RunOptions::new("run-1").force_refresh(true))
        .await;
    // The key was committed after the forced publish, so an ordinary run
    // sees it as a duplicate.
    let second = pipeline.run_text(&feed, RunOptions::new("run-2")).await;

    assert_eq!(second.statistics.duplicates_skipped, 1);
    assert_eq!(second.statistics.events_published, 0);
}

#[tokio::test]
async fn unmapped_waypoints_do_not_become_endpoints() {
    let feed = schedule_line("C1", "N", "2026-01-05", &["XXXX", "RTDM", "UTRC"]);
    let (pipeline, publisher) = pipeline();

    pipeline.run_text(&feed, RunOptions::new("run-1")).await;

    let events = publisher.events();
    assert_eq!(events[0].origin, "RTD");
    assert_eq!(events[0].destination, "UT");
    assert_eq!(events[0].passage_points.len(), 2);
}

#[tokio::test]
async fn publish_failure_is_recorded_and_retryable() {
    let feed = format!(
        "{}\n{}\n",
        schedule_line("C1", "N", "2026-01-05", &["ASDM"]),
        schedule_line("C2", "N", "2026-01-05", &["RTDM"])
    );
    let (pipeline, publisher) = pipeline();

    publisher.set_failing(true);
    let failed = pipeline.run_text(&feed, RunOptions::new("run-1")).await;

    // The run keeps going past the failed publishes and still completes.
    assert_eq!(failed.status, RunStatus::Completed);
    assert_eq!(failed.statistics.schedules_processed, 2);
    assert_eq!(failed.statistics.events_published, 0);
    assert_eq!(failed.errors.len(), 2);
    assert!(failed.errors[0].contains("C1_2026-01-05"));

    // Keys were not committed, so the next run publishes both.
    publisher.set_failing(false);
    let retried = pipeline.run_text(&feed, RunOptions::new("run-2")).await;

    assert_eq!(retried.statistics.events_published, 2);
    assert_eq!(retried.statistics.duplicates_skipped, 0);
}

#[tokio::test]
async fn cancelled_run_returns_partial_statistics() {
    let feed = format!(
        "{}\n{}\n",
        schedule_line("C1", "N", "2026-01-05", &["ASDM"]),
        schedule_line("C2", "N", "2026-01-05", &["RTDM"])
    );
    let cancel = CancellationToken::new();
    cancel.cancel();
    let (pipeline, publisher) = pipeline();

    let result = pipeline
        .run_text(&feed, RunOptions::new("run-1").with_cancel(cancel))
        .await;

    // Cancellation is not a failure.
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.statistics.total_lines, 0);
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn stream_fault_fails_the_run_with_partial_statistics() {
    let good = format!("{}\n", schedule_line("C1", "N", "2026-01-05", &["ASDM"]));
    let (pipeline, _) = pipeline();

    let result = pipeline
        .run_stream(BrokenReader::new(good.into_bytes()), RunOptions::new("run-1"))
        .await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("stream fault"));
    // The line read before the fault was still processed.
    assert_eq!(result.statistics.total_lines, 1);
    assert_eq!(result.statistics.events_published, 1);
}

#[tokio::test]
async fn immediate_stream_fault_still_returns_a_result() {
    struct FailingReader;
    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("boom"))
        }
    }

    let (pipeline, _) = pipeline();
    let result = pipeline
        .run_stream(FailingReader, RunOptions::new("run-1"))
        .await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.statistics.total_lines, 0);
    assert_eq!(result.errors.len(), 1);
}

#[tokio::test]
async fn concurrent_runs_share_the_dedup_set() {
    let feed = Arc::new(schedule_line("C1", "N", "2026-01-05", &["ASDM"]));
    let (pipeline, publisher) = pipeline();

    let mut handles = Vec::new();
    for i in 0..8 {
        let pipeline = pipeline.clone();
        let feed = feed.clone();
        handles.push(tokio::spawn(async move {
            pipeline
                .run_text(&feed, RunOptions::new(format!("run-{i}")))
                .await
        }));
    }

    let mut published = 0;
    let mut skipped = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        published += result.statistics.events_published;
        skipped += result.statistics.duplicates_skipped;
    }

    assert_eq!(published, 1);
    assert_eq!(skipped, 7);
    assert_eq!(publisher.events().len(), 1);
}

#[tokio::test]
async fn processing_time_is_always_recorded() {
    let (pipeline, _) = pipeline();
    let result = pipeline.run_text("", RunOptions::new("run-1")).await;

    assert_eq!(result.status, RunStatus::Completed);
    // Zero lines is a legitimate (if empty) run.
    assert_eq!(result.statistics.total_lines, 0);
    assert!(result.statistics.processing_time_ms < 60_000);
    assert!(!result.process_id.is_empty());
}
