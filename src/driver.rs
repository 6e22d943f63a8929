//! Aggregation driver
//!
//! Orchestrates one run: scan the record store, then for each record in
//! canonical order parse-or-skip, budget-check, flush when a ceiling is
//! hit, and flush the remainder at the end. Processing is strictly
//! sequential over the sorted sequence; the in-progress batch is never
//! touched concurrently.
//!
//! Failure semantics: a missing store root or a write failure aborts the
//! remaining sequence immediately. Artifacts already flushed stay on disk;
//! partial output is accepted. A record that fails to parse is skipped
//! with a warning and shows up in the summary; it never aborts the run
//! and never half-populates a batch.
//!
//! All run state (page counter, artifact counter, batch) is owned by the
//! invocation; nothing is shared process-wide.

use std::path::{Path, PathBuf};

use crate::batch::Batch;
use crate::budget::Budgeter;
use crate::config::BundleConfig;
use crate::error::BundleError;
use crate::record::{read_record, RecordOutcome};
use crate::scanner::scan_records;
use crate::writer::{BatchWriter, OutputArtifact};

/// A record file the run skipped, with the reason
#[derive(Debug, Clone)]
pub struct SkippedRecord {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of one aggregation run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Written artifacts, in write order
    pub artifacts: Vec<OutputArtifact>,
    /// Records that made it into an artifact
    pub records_written: usize,
    /// Records skipped for parse failures
    pub records_skipped: Vec<SkippedRecord>,
}

/// Drives scan -> normalize/budget -> flush over a record store
pub struct AggregationDriver<'a> {
    config: &'a BundleConfig,
    records_root: PathBuf,
}

impl<'a> AggregationDriver<'a> {
    pub fn new(config: &'a BundleConfig, records_root: &Path) -> Self {
        Self {
            config,
            records_root: records_root.to_path_buf(),
        }
    }

    /// Run the full aggregation to completion
    pub fn run(&self) -> Result<RunSummary, BundleError> {
        let locations = scan_records(&self.records_root)?;
        tracing::info!(
            root = %self.records_root.display(),
            files = locations.len(),
            "scanned record store"
        );

        let budgeter = Budgeter::new(self.config.max_file_size_bytes(), self.config.max_tokens);
        let writer = BatchWriter::new(self.config);

        let mut summary = RunSummary::default();
        let mut batch = Batch::new();
        let mut artifact_counter: u32 = 1;

        for location in &locations {
            let record = match read_record(&location.path)? {
                RecordOutcome::Parsed(record) => record,
                RecordOutcome::Skipped { reason } => {
                    tracing::warn!(path = %location.path.display(), %reason, "skipping record");
                    summary.records_skipped.push(SkippedRecord {
                        path: location.path.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let serialized = serde_json::to_string(&record)?;
            let plan = budgeter.plan(&batch, &serialized);
            let byte_split = budgeter.byte_flush_before(&batch, serialized.len());

            if (plan.flush_before || byte_split) && !batch.is_empty() {
                flush(&writer, &mut batch, &mut artifact_counter, &mut summary)?;
            }

            if plan.flush_before {
                // Forced token split: the new batch opens at half the
                // candidate's own cost, and the candidate always goes in
                batch.reset_token_estimate(Budgeter::opening_estimate_after_split(&plan));
                batch.push(record, serialized.len());
            } else {
                batch.push(record, serialized.len());
                batch.add_token_estimate(plan.token_cost.tokens());
            }

            // After the pre-append splits above, only a record exceeding the
            // byte ceiling on its own can still be over it; isolate it now
            if budgeter.over_byte_limit(&batch) {
                flush(&writer, &mut batch, &mut artifact_counter, &mut summary)?;
            }
        }

        if !batch.is_empty() {
            flush(&writer, &mut batch, &mut artifact_counter, &mut summary)?;
        }

        tracing::info!(
            artifacts = summary.artifacts.len(),
            records = summary.records_written,
            skipped = summary.records_skipped.len(),
            "aggregation complete"
        );
        Ok(summary)
    }
}

fn flush(
    writer: &BatchWriter<'_>,
    batch: &mut Batch,
    artifact_counter: &mut u32,
    summary: &mut RunSummary,
) -> Result<(), BundleError> {
    let artifact = writer.write(batch, *artifact_counter)?;
    summary.records_written += batch.len();
    summary.artifacts.push(artifact);
    *artifact_counter += 1;
    batch.clear();
    Ok(())
}
