//! Prompt templates for paper analysis and comparison.

use crate::analysis::paper::PaperRecord;
use crate::util::truncate_chars;

/// Characters of paper text included in each analysis prompt.
pub const PROMPT_CONTENT_CHARS: usize = 1000;

/// Characters of each executive summary included in comparison prompts.
pub const COMPARISON_SUMMARY_CHARS: usize = 200;

/// The three prompts sent for a single paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperPrompts {
    pub summary: String,
    pub findings: String,
    pub methodology: String,
}

impl PaperPrompts {
    pub fn build(title: &str, text: &str) -> Self {
        let content = truncate_chars(text, PROMPT_CONTENT_CHARS);
        Self {
            summary: format!(
                "Provide a brief executive summary (100-150 words) of this research paper:\n\
                 Title: {title}\n\
                 Content: {content}\n\
                 Summary:"
            ),
            findings: format!(
                "List 3-5 key findings from this research paper in bullet points:\n\
                 Title: {title}\n\
                 Content: {content}\n\
                 Key Findings:"
            ),
            methodology: format!(
                "Describe the research methodology used in this paper (50-100 words):\n\
                 Title: {title}\n\
                 Content: {content}\n\
                 Methodology:"
            ),
        }
    }
}

/// The three prompts sent for a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonPrompts {
    pub agreements: String,
    pub contradictions: String,
    pub gaps: String,
}

impl ComparisonPrompts {
    pub fn build(papers: &[PaperRecord]) -> Self {
        let papers_text = papers_block(papers);
        Self {
            agreements: format!(
                "Find 2-3 areas of agreement between these research papers:\n\
                 {papers_text}\n\
                 Agreements:"
            ),
            contradictions: format!(
                "Identify any contradictions or differences in these papers:\n\
                 {papers_text}\n\
                 Contradictions:"
            ),
            gaps: format!(
                "What research gaps can be identified from these papers?\n\
                 {papers_text}\n\
                 Research Gaps:"
            ),
        }
    }
}

/// One `title: summary` line per paper. Failed summaries contribute no text.
pub fn papers_block(papers: &[PaperRecord]) -> String {
    papers
        .iter()
        .map(|p| {
            let summary = p.analysis.executive_summary.generated().unwrap_or_default();
            format!(
                "{}: {}",
                p.analysis.title,
                truncate_chars(summary, COMPARISON_SUMMARY_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
