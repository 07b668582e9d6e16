//! Paper analysis and comparison.
//!
//! Both pipelines are thin: they format prompts, send them one at a time
//! through an [`InferenceProvider`](crate::llm::InferenceProvider), and
//! assemble typed records from the answers.

mod compare;
mod paper;
mod prompts;

pub use compare::{
    Agreement, COMPARISON_MAX_TOKENS, ComparisonAnalysis, ComparisonEngine, ComparisonRecord,
    Contradiction, MAX_PAPERS, MIN_PAPERS, ResearchGap, UniqueContribution, validate_selection,
};
pub use paper::{
    ANALYSIS_MAX_TOKENS, Facet, PaperAnalysis, PaperAnalyzer, PaperRecord, PaperStatus, Section,
};
pub use prompts::{ComparisonPrompts, PaperPrompts, papers_block};
