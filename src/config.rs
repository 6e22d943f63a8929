//! Bundle configuration surface
//!
//! The configuration the aggregation core consumes. It is produced
//! elsewhere (a config file, a host program); this crate only reads it.
//! The JSON wire format uses camelCase names matching the crawl layer's
//! config files. The `on_process_markdown` hook cannot live in JSON and is
//! installed programmatically after loading.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::BundleError;

/// Post-processing hook applied to each assembled Markdown artifact
pub type MarkdownHook = Box<dyn Fn(String) -> String + Send + Sync>;

/// Output artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Pretty-printed JSON array of the raw records
    Json,
    /// Plain Markdown
    #[default]
    Markdown,
    /// Markdown with ToC and back-to-top links
    HumanReadableMarkdown,
}

impl OutputFormat {
    /// File extension for artifacts of this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown | OutputFormat::HumanReadableMarkdown => "md",
        }
    }

    /// Enhanced mode: ToC synthesis and back-to-top links
    pub fn is_enhanced(&self) -> bool {
        matches!(self, OutputFormat::HumanReadableMarkdown)
    }

    pub fn is_markdown(&self) -> bool {
        !matches!(self, OutputFormat::Json)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "markdown" => Ok(OutputFormat::Markdown),
            "human_readable_markdown" => Ok(OutputFormat::HumanReadableMarkdown),
            other => Err(format!(
                "unknown output format '{}' (expected json, markdown or human_readable_markdown)",
                other
            )),
        }
    }
}

/// Configuration consumed by the aggregation core
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleConfig {
    /// Crawl root URL: domain heading and link-base resolution
    pub url: String,
    /// Base name of the output file; any extension is a hint only
    pub output_file_name: String,
    #[serde(default)]
    pub output_file_format: OutputFormat,
    /// Byte ceiling per artifact, in megabytes; absent means unbounded
    #[serde(default)]
    pub max_file_size: Option<u64>,
    /// Token ceiling per artifact; absent means unbounded
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Advisory label, not interpreted by the core
    #[serde(default)]
    pub topic: Option<String>,
    /// Fallback language for untagged fenced code blocks
    #[serde(default)]
    pub default_code_language: Option<String>,
    /// Post-processing hook, applied to each Markdown artifact as a whole
    #[serde(skip)]
    pub on_process_markdown: Option<MarkdownHook>,
}

impl BundleConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, BundleError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            BundleError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            BundleError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })
    }

    /// Byte ceiling converted from megabytes, if bounded
    pub fn max_file_size_bytes(&self) -> Option<usize> {
        self.max_file_size.map(|mb| mb as usize * 1024 * 1024)
    }
}

impl fmt::Debug for BundleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleConfig")
            .field("url", &self.url)
            .field("output_file_name", &self.output_file_name)
            .field("output_file_format", &self.output_file_format)
            .field("max_file_size", &self.max_file_size)
            .field("max_tokens", &self.max_tokens)
            .field("topic", &self.topic)
            .field("default_code_language", &self.default_code_language)
            .field(
                "on_process_markdown",
                &self.on_process_markdown.as_ref().map(|_| "<hook>"),
            )
            .finish()
    }
}
