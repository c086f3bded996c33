//! Pipeline orchestration.

use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;
use std::time::Instant;

use flate2::read::GzDecoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cif::{EnvelopeRecord, classify};
use crate::dedup::{DedupDecision, DedupSet};
use crate::mapper::map_schedule;
use crate::publish::EventPublisher;
use crate::stations::StationDirectory;

use super::result::{RunResult, RunStats, RunStatus};

/// Gzip stream magic number.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Caller-supplied parameters for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Free-form correlation id, carried into event metadata. Never used as
    /// a dedup key.
    pub run_id: String,
    /// Bypass duplicate suppression for this run.
    pub force_refresh: bool,
    /// Checked at each line boundary; a cancelled run returns partial
    /// statistics with `completed` status.
    pub cancel: CancellationToken,
}

impl RunOptions {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            force_refresh: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// The schedule ingestion pipeline.
///
/// The station directory, dedup set and publisher are injected: concurrent
/// runs share one dedup set, and tests substitute all three. Cloning is
/// cheap and clones share the same collaborators.
#[derive(Clone)]
pub struct Pipeline {
    directory: Arc<StationDirectory>,
    dedup: DedupSet,
    publisher: Arc<dyn EventPublisher>,
}

impl Pipeline {
    pub fn new(
        directory: Arc<StationDirectory>,
        dedup: DedupSet,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            directory,
            dedup,
            publisher,
        }
    }

    /// Run over a raw byte stream, decompressing if it is gzip.
    ///
    /// The first two bytes are sniffed for the gzip magic number; anything
    /// else is read as plain newline-delimited text.
    pub async fn run_stream<R>(&self, mut reader: R, opts: RunOptions) -> RunResult
    where
        R: Read + Send,
    {
        // Sniff the magic before committing to a decoder.
        let mut magic = [0u8; 2];
        let mut sniffed = 0;
        while sniffed < magic.len() {
            match reader.read(&mut magic[sniffed..]) {
                Ok(0) => break,
                Ok(n) => sniffed += n,
                Err(e) => {
                    // The stream faulted before a single line was read.
                    return self.process(std::iter::once(Err(e)), opts).await;
                }
            }
        }

        let rest = (&magic[..sniffed]).chain(reader);
        if magic[..sniffed] == GZIP_MAGIC {
            let lines = BufReader::new(GzDecoder::new(rest)).lines();
            self.process(lines, opts).await
        } else {
            let lines = BufReader::new(rest).lines();
            self.process(lines, opts).await
        }
    }

    /// Run over already-decoded text. No decompression step applies.
    pub async fn run_text(&self, text: &str, opts: RunOptions) -> RunResult {
        let lines = text.lines().map(|line| Ok(line.to_string()));
        self.process(lines, opts).await
    }

    async fn process<I>(&self, lines: I, opts: RunOptions) -> RunResult
    where
        I: Iterator<Item = std::io::Result<String>> + Send,
    {
        let started = Instant::now();
        let process_id = Uuid::new_v4().to_string();
        let mut stats = RunStats::default();
        let mut errors = Vec::new();
        let mut status = RunStatus::Completed;

        info!(
            run_id = %opts.run_id,
            process_id = %process_id,
            force_refresh = opts.force_refresh,
            "starting ingestion run"
        );

        for line in lines {
            if opts.cancel.is_cancelled() {
                warn!(run_id = %opts.run_id, "run cancelled; returning partial statistics");
                break;
            }

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!(run_id = %opts.run_id, "stream fault: {e}");
                    errors.push(format!("stream fault: {e}"));
                    status = RunStatus::Failed;
                    break;
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            stats.total_lines += 1;

            let record = match EnvelopeRecord::decode(line) {
                Ok(record) => record,
                Err(e) => {
                    debug!(run_id = %opts.run_id, line = stats.total_lines, "undecodable line: {e}");
                    stats.parse_errors += 1;
                    continue;
                }
            };

            let schedule = match record {
                EnvelopeRecord::Schedule(schedule) => schedule,
                EnvelopeRecord::Header(header) => {
                    debug!(run_id = %opts.run_id, owner = ?header.owner, "timetable header");
                    continue;
                }
                EnvelopeRecord::Unknown => continue,
            };

            if let Err(reason) = classify(&schedule, &self.directory) {
                debug!(run_id = %opts.run_id, train = %schedule.train_id, %reason, "schedule filtered");
                stats.schedules_filtered += 1;
                continue;
            }
            stats.schedules_processed += 1;

            let key = schedule.dedup_key();
            if self.dedup.begin(&key, opts.force_refresh) == DedupDecision::Duplicate {
                debug!(run_id = %opts.run_id, %key, "duplicate schedule skipped");
                stats.duplicates_skipped += 1;
                continue;
            }

            let event = map_schedule(&schedule, &self.directory, &opts.run_id);
            match self.publisher.publish(&event).await {
                Ok(()) => {
                    stats.events_published += 1;
                    self.dedup.commit(&key);
                }
                Err(e) => {
                    // Leave the key uncommitted so a later run can retry it.
                    warn!(run_id = %opts.run_id, %key, "publish failed: {e}");
                    errors.push(format!("failed to publish {key}: {e}"));
                    self.dedup.release(&key);
                }
            }
        }

        stats.processing_time_ms = started.elapsed().as_millis() as u64;

        info!(
            run_id = %opts.run_id,
            process_id = %process_id,
            status = ?status,
            total_lines = stats.total_lines,
            published = stats.events_published,
            filtered = stats.schedules_filtered,
            duplicates = stats.duplicates_skipped,
            parse_errors = stats.parse_errors,
            elapsed_ms = stats.processing_time_ms,
            "ingestion run finished"
        );

        RunResult {
            process_id,
            status,
            statistics: stats,
            errors,
        }
    }
}
