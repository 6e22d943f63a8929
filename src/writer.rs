//! Batch writer - serializes a completed batch to a numbered artifact
//!
//! One file write per batch: the artifact is fully materialized in memory,
//! then written in a single operation. There are no partial writes to roll
//! back. The first artifact takes the configured base name; later ones
//! insert `-N` before the extension, N starting at 2.
//!
//! Markdown assembly reverses the batch back to document order, renders
//! each page with full-batch context (internal links can only resolve
//! against URLs present in the same artifact), concatenates, splices the
//! ToC in enhanced mode and finally applies the configured post-processing
//! hook. JSON output is a pretty-printed array of the raw record objects
//! in document order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::batch::Batch;
use crate::config::{BundleConfig, OutputFormat};
use crate::digest::artifact_fingerprint;
use crate::error::BundleError;
use crate::normalizer::{normalize, BatchContext};
use crate::record::PageRecord;
use crate::toc::{insert_toc, render_toc, TocEntry};

/// One written output file
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub path: PathBuf,
    /// Number of records in the artifact
    pub records: usize,
    /// Truncated BLAKE3 fingerprint of the file bytes
    pub digest: String,
}

/// Writes completed batches as numbered artifacts
pub struct BatchWriter<'a> {
    config: &'a BundleConfig,
}

impl<'a> BatchWriter<'a> {
    pub fn new(config: &'a BundleConfig) -> Self {
        Self { config }
    }

    /// Serialize and write one batch; `counter` is the 1-based artifact index
    pub fn write(&self, batch: &Batch, counter: u32) -> Result<OutputArtifact, BundleError> {
        let path = artifact_path(
            &self.config.output_file_name,
            self.config.output_file_format,
            counter,
        );

        let text = match self.config.output_file_format {
            OutputFormat::Json => self.render_json(batch)?,
            OutputFormat::Markdown | OutputFormat::HumanReadableMarkdown => {
                self.render_markdown(batch)
            }
        };

        fs::write(&path, &text).map_err(|e| BundleError::io(&path, e))?;
        let digest = artifact_fingerprint(text.as_bytes());
        tracing::debug!(
            path = %path.display(),
            records = batch.len(),
            bytes = text.len(),
            %digest,
            "flushed batch"
        );

        Ok(OutputArtifact {
            path,
            records: batch.len(),
            digest,
        })
    }

    fn render_json(&self, batch: &Batch) -> Result<String, BundleError> {
        let records: Vec<&PageRecord> = batch.records_in_document_order().collect();
        let json = serde_json::to_string_pretty(&records)?;
        Ok(json)
    }

    fn render_markdown(&self, batch: &Batch) -> String {
        let records: Vec<&PageRecord> = batch.records_in_document_order().collect();
        let batch_urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
        let enhanced = self.config.output_file_format.is_enhanced();

        let mut document = String::new();
        let mut toc_entries: Vec<TocEntry> = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let ctx = BatchContext {
                base_url: &self.config.url,
                batch_urls: &batch_urls,
                is_first_page: index == 0,
                enhanced,
                default_code_language: self.config.default_code_language.as_deref(),
            };
            let page = normalize(record, &ctx);
            document.push_str(&page.markdown);
            toc_entries.extend(page.toc_entries);
        }

        if enhanced {
            document = insert_toc(document, &render_toc(&toc_entries));
        }

        if let Some(hook) = &self.config.on_process_markdown {
            document = hook(document);
        }

        document
    }
}

/// Artifact path from the configured base name
///
/// Any extension on the base name is stripped; the real extension comes
/// from the format. The 2nd and later artifacts get a `-N` suffix.
pub fn artifact_path(base_name: &str, format: OutputFormat, counter: u32) -> PathBuf {
    let stem = Path::new(base_name).with_extension("");
    let stem = stem.to_string_lossy();
    let ext = format.extension();
    if counter > 1 {
        PathBuf::from(format!("{}-{}.{}", stem, counter, ext))
    } else {
        PathBuf::from(format!("{}.{}", stem, ext))
    }
}
