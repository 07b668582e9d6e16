//! Cross-paper comparison.
//!
//! A comparison sends three prompts (agreements, contradictions, gaps) over a
//! block built from each paper's title and the start of its executive
//! summary. Unique contributions are derived locally without another call.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::analysis::paper::{Facet, PaperRecord};
use crate::analysis::prompts::ComparisonPrompts;
use crate::error::CompareError;
use crate::llm::InferenceProvider;
use crate::util::{non_blank_lines, truncate_chars};

/// Fewest papers a comparison accepts.
pub const MIN_PAPERS: usize = 2;
/// Most papers a comparison accepts.
pub const MAX_PAPERS: usize = 5;
/// Token budget for each comparison facet.
pub const COMPARISON_MAX_TOKENS: u32 = 400;

const CONTRIBUTION_CHARS: usize = 100;
const GAP_IMPACT: &str = "Addressing these gaps could advance the field";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agreement {
    pub title: String,
    pub description: Facet,
    pub papers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contradiction {
    pub title: String,
    pub description: Facet,
    pub conflicting_views: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchGap {
    pub gap: Facet,
    pub potential_impact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueContribution {
    pub paper: String,
    pub contribution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonAnalysis {
    pub common_themes: Vec<String>,
    pub agreements: Vec<Agreement>,
    pub contradictions: Vec<Contradiction>,
    pub research_gaps: Vec<ResearchGap>,
    pub unique_contributions: Vec<UniqueContribution>,
}

/// Result of comparing 2 to 5 papers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    pub papers: Vec<PaperRecord>,
    pub analysis: ComparisonAnalysis,
}

impl ComparisonRecord {
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.papers.iter().map(|p| p.analysis.title.as_str())
    }
}

/// Check the size and distinctness of a selection.
pub fn validate_selection<'a, I>(titles: I) -> Result<(), CompareError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for title in titles {
        if !seen.insert(title) {
            return Err(CompareError::DuplicateTitle {
                title: title.to_string(),
            });
        }
    }

    match seen.len() {
        n if n < MIN_PAPERS => Err(CompareError::TooFewPapers {
            selected: n,
            min: MIN_PAPERS,
        }),
        n if n > MAX_PAPERS => Err(CompareError::TooManyPapers {
            selected: n,
            max: MAX_PAPERS,
        }),
        _ => Ok(()),
    }
}

/// Runs comparisons against an inference provider.
pub struct ComparisonEngine {
    provider: Arc<dyn InferenceProvider>,
}

impl ComparisonEngine {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    /// Compare the given papers. The selection is validated before any call
    /// is made; inference failures are recorded on the affected facets.
    pub async fn compare(&self, papers: Vec<PaperRecord>) -> Result<ComparisonRecord, CompareError> {
        validate_selection(papers.iter().map(|p| p.analysis.title.as_str()))?;

        let prompts = ComparisonPrompts::build(&papers);
        tracing::info!(papers = papers.len(), "Comparing papers");

        let agreements = self.facet("agreements", &prompts.agreements).await;
        let contradictions = self.facet("contradictions", &prompts.contradictions).await;
        let gaps = self.facet("gaps", &prompts.gaps).await;

        let analysis = assemble_analysis(&papers, agreements, contradictions, gaps);
        Ok(ComparisonRecord { papers, analysis })
    }

    async fn facet(&self, facet: &str, prompt: &str) -> Facet {
        let result = self.provider.generate(prompt, COMPARISON_MAX_TOKENS).await;
        if let Err(ref e) = result {
            tracing::warn!(facet, error = %e, "Comparison call failed");
        }
        Facet::from_result(result)
    }
}

fn assemble_analysis(
    papers: &[PaperRecord],
    agreements: Facet,
    contradictions: Facet,
    gaps: Facet,
) -> ComparisonAnalysis {
    let conflicting_views = contradictions
        .generated()
        .map(non_blank_lines)
        .unwrap_or_default();

    let unique_contributions = papers
        .iter()
        .map(|p| UniqueContribution {
            paper: p.analysis.title.clone(),
            contribution: truncate_chars(
                p.analysis.executive_summary.generated().unwrap_or_default(),
                CONTRIBUTION_CHARS,
            )
            .to_string(),
        })
        .collect();

    ComparisonAnalysis {
        common_themes: ["AI", "Research", "Analysis"]
            .into_iter()
            .map(String::from)
            .collect(),
        agreements: vec![Agreement {
            title: "Common Research Focus".to_string(),
            description: agreements,
            papers: papers.iter().map(|p| p.analysis.title.clone()).collect(),
        }],
        contradictions: vec![Contradiction {
            title: "Methodological Differences".to_string(),
            description: contradictions,
            conflicting_views,
        }],
        research_gaps: vec![ResearchGap {
            gap: gaps,
            potential_impact: GAP_IMPACT.to_string(),
        }],
        unique_contributions,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::analysis::paper::PaperAnalysis;
    use crate::error::InferenceError;

    struct CannedProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl InferenceProvider for CannedProvider {
        async fn generate(
            &self,
            prompt: &str,
            max_new_tokens: u32,
        ) -> Result<String, InferenceError> {
            assert_eq!(max_new_tokens, COMPARISON_MAX_TOKENS);
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(InferenceError::HttpStatus { status: 502 });
            }
            if prompt.ends_with("Contradictions:") {
                Ok("A uses RL\n\nB uses supervised learning\n".to_string())
            } else if prompt.ends_with("Agreements:") {
                Ok("Both study transformers".to_string())
            } else {
                Ok("Few evaluate on low-resource languages".to_string())
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn engine(fail: bool) -> (Arc<CannedProvider>, ComparisonEngine) {
        let provider = Arc::new(CannedProvider {
            calls: AtomicUsize::new(0),
            fail,
        });
        (provider.clone(), ComparisonEngine::new(provider))
    }

    fn paper(id: u64, title: &str, summary: &str) -> PaperRecord {
        PaperAnalysis::assemble(
            title,
            "",
            Facet::Generated(summary.to_string()),
            Facet::Generated(String::new()),
            Facet::Generated(String::new()),
        )
        .into_record(id)
    }

    #[test]
    fn test_validate_selection() {
        assert_eq!(
            validate_selection([]),
            Err(CompareError::TooFewPapers {
                selected: 0,
                min: 2
            })
        );
        assert_eq!(
            validate_selection(["A"]),
            Err(CompareError::TooFewPapers {
                selected: 1,
                min: 2
            })
        );
        assert!(validate_selection(["A", "B"]).is_ok());
        assert!(validate_selection(["A", "B", "C", "D", "E"]).is_ok());
        assert_eq!(
            validate_selection(["A", "B", "C", "D", "E", "F"]),
            Err(CompareError::TooManyPapers {
                selected: 6,
                max: 5
            })
        );
        assert_eq!(
            validate_selection(["A", "A"]),
            Err(CompareError::DuplicateTitle {
                title: "A".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_compare_two_papers() {
        let (provider, engine) = engine(false);
        let long = "x".repeat(150);
        let record = engine
            .compare(vec![paper(1, "A", &long), paper(2, "B", "short")])
            .await
            .unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(record.papers.len(), 2);
        assert_eq!(record.titles().collect::<Vec<_>>(), vec!["A", "B"]);

        let analysis = &record.analysis;
        assert_eq!(analysis.common_themes, vec!["AI", "Research", "Analysis"]);
        assert_eq!(analysis.agreements.len(), 1);
        assert_eq!(analysis.agreements[0].papers, vec!["A", "B"]);
        assert_eq!(
            analysis.agreements[0].description.generated(),
            Some("Both study transformers")
        );
        assert_eq!(
            analysis.contradictions[0].conflicting_views,
            vec!["A uses RL", "B uses supervised learning"]
        );
        assert_eq!(analysis.research_gaps[0].potential_impact, GAP_IMPACT);

        assert_eq!(
            analysis.unique_contributions,
            vec![
                UniqueContribution {
                    paper: "A".to_string(),
                    contribution: "x".repeat(100),
                },
                UniqueContribution {
                    paper: "B".to_string(),
                    contribution: "short".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_single_paper_makes_no_calls() {
        let (provider, engine) = engine(false);
        let err = engine.compare(vec![paper(1, "A", "s")]).await.unwrap_err();

        assert!(matches!(err, CompareError::TooFewPapers { selected: 1, .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_calls_still_produce_record() {
        let (_, engine) = engine(true);
        let record = engine
            .compare(vec![paper(1, "A", "a"), paper(2, "B", "b")])
            .await
            .unwrap();

        assert!(record.analysis.agreements[0].description.is_failed());
        assert!(record.analysis.contradictions[0].conflicting_views.is_empty());
        assert!(record.analysis.research_gaps[0].gap.text().contains("502"));
        assert_eq!(record.analysis.unique_contributions.len(), 2);
    }
}
