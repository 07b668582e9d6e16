//! Paper records and the single-paper analyzer.

use std::borrow::Cow;
use std::sync::Arc;

use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::analysis::prompts::PaperPrompts;
use crate::error::InferenceError;
use crate::llm::InferenceProvider;
use crate::util::{non_blank_lines, truncate_chars};

/// Token budget for each analysis facet.
pub const ANALYSIS_MAX_TOKENS: u32 = 300;

const ABSTRACT_CHARS: usize = 300;
const ABSTRACT_SECTION_CHARS: usize = 200;

/// Outcome of one generation call stored on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Facet {
    Generated(String),
    Failed(InferenceError),
}

impl Facet {
    pub fn from_result(result: Result<String, InferenceError>) -> Self {
        match result {
            Ok(text) => Self::Generated(text.trim().to_string()),
            Err(e) => Self::Failed(e),
        }
    }

    /// Model output, if the call succeeded.
    pub fn generated(&self) -> Option<&str> {
        match self {
            Self::Generated(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Display text: the output, or the error message for a failed call.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Generated(text) => Cow::Borrowed(text),
            Self::Failed(e) => Cow::Owned(e.to_string()),
        }
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

impl Serialize for Facet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Facet", 2)?;
        state.serialize_field("text", &self.text())?;
        state.serialize_field("failed", &self.is_failed())?;
        state.end()
    }
}

/// Processing state of a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperStatus {
    Processing,
    Completed,
}

impl std::fmt::Display for PaperStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A titled section summary shown with a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub summary: String,
    /// Set when `summary` carries an inference error rather than content.
    pub failed: bool,
}

/// Everything the analyzer produces for one document. The session turns it
/// into a [`PaperRecord`] by assigning an id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperAnalysis {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub year: i32,
    pub executive_summary: Facet,
    pub key_findings: Vec<String>,
    pub findings: Facet,
    pub methodology: Facet,
    pub sections: Vec<Section>,
    pub keywords: Vec<String>,
    pub category: String,
    pub status: PaperStatus,
}

impl PaperAnalysis {
    /// Assemble a completed analysis from the three facets.
    pub fn assemble(
        title: &str,
        text: &str,
        executive_summary: Facet,
        findings: Facet,
        methodology: Facet,
    ) -> Self {
        let key_findings = findings.generated().map(non_blank_lines).unwrap_or_default();

        let sections = vec![
            Section {
                title: "Abstract".to_string(),
                summary: truncate_chars(text, ABSTRACT_SECTION_CHARS).to_string(),
                failed: false,
            },
            Section {
                title: "Methodology".to_string(),
                summary: methodology.text().into_owned(),
                failed: methodology.is_failed(),
            },
            Section {
                title: "Findings".to_string(),
                summary: findings.text().into_owned(),
                failed: findings.is_failed(),
            },
        ];

        Self {
            title: title.to_string(),
            authors: vec!["AI Extracted".to_string()],
            abstract_text: truncate_chars(text, ABSTRACT_CHARS).to_string(),
            year: 2024,
            executive_summary,
            key_findings,
            findings,
            methodology,
            sections,
            keywords: vec!["AI".to_string(), "Research".to_string()],
            category: "Computer Science".to_string(),
            status: PaperStatus::Completed,
        }
    }

    /// Whether any facet failed.
    pub fn has_failures(&self) -> bool {
        self.executive_summary.is_failed() || self.findings.is_failed() || self.methodology.is_failed()
    }

    pub fn into_record(self, id: u64) -> PaperRecord {
        PaperRecord { id, analysis: self }
    }
}

/// An analyzed paper held in a session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperRecord {
    /// Session-local sequence number, starting at 1.
    pub id: u64,
    #[serde(flatten)]
    pub analysis: PaperAnalysis,
}

/// Runs the three analysis prompts for one document.
pub struct PaperAnalyzer {
    provider: Arc<dyn InferenceProvider>,
}

impl PaperAnalyzer {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    /// Analyze one paper. Calls are made one after another; a failed call is
    /// recorded on its facet and never aborts the analysis.
    pub async fn analyze(&self, title: &str, text: &str) -> PaperAnalysis {
        let prompts = PaperPrompts::build(title, text);
        tracing::info!(title, text_chars = text.chars().count(), "Analyzing paper");

        let executive_summary = self.facet("executive_summary", &prompts.summary).await;
        let findings = self.facet("key_findings", &prompts.findings).await;
        let methodology = self.facet("methodology", &prompts.methodology).await;

        let analysis = PaperAnalysis::assemble(title, text, executive_summary, findings, methodology);
        if analysis.has_failures() {
            tracing::warn!(title, "Paper analysis completed with failed facets");
        }
        analysis
    }

    async fn facet(&self, facet: &str, prompt: &str) -> Facet {
        let result = self.provider.generate(prompt, ANALYSIS_MAX_TOKENS).await;
        if let Err(ref e) = result {
            tracing::warn!(facet, error = %e, "Analysis call failed");
        }
        Facet::from_result(result)
    }
}
