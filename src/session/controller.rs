//! User actions and their side effects.
//!
//! The controller runs whatever I/O an [`Action`] needs (PDF extraction,
//! inference calls) and hands the resolved outcome to the reducer. Requests
//! for one session are serialized by the caller, so an action always sees
//! the state left by the previous one.

use std::sync::Arc;

use crate::analysis::{ComparisonEngine, ComparisonRecord, PaperAnalysis, PaperAnalyzer};
use crate::error::{CompareError, MediaError};
use crate::llm::InferenceProvider;
use crate::media::{PdfExtractor, is_pdf_filename, title_from_filename};
use crate::session::reducer::{Mutation, reduce};
use crate::session::store::{Page, SessionState, StagedFile};

/// A file received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Something the user asked for.
#[derive(Debug)]
pub enum Action {
    Navigate(Page),
    Upload(Vec<UploadedFile>),
    /// Analyze every staged file.
    Analyze,
    /// Compare papers by id, in the order given.
    Compare(Vec<u64>),
    ResetComparison,
    /// The pending notices were rendered.
    NoticesShown,
}

/// Executes actions against a session.
pub struct ViewController {
    extractor: PdfExtractor,
    analyzer: PaperAnalyzer,
    engine: ComparisonEngine,
    max_upload_bytes: usize,
    max_staged_bytes: usize,
}

impl ViewController {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self {
            extractor: PdfExtractor::new(),
            analyzer: PaperAnalyzer::new(provider.clone()),
            engine: ComparisonEngine::new(provider),
            max_upload_bytes: usize::MAX,
            max_staged_bytes: usize::MAX,
        }
    }

    /// Reject individual files larger than `max` bytes.
    pub fn with_max_upload_bytes(mut self, max: usize) -> Self {
        self.max_upload_bytes = max;
        self
    }

    /// Cap the bytes one session may hold in staged files at once.
    pub fn with_max_staged_bytes(mut self, max: usize) -> Self {
        self.max_staged_bytes = max;
        self
    }

    pub async fn dispatch(&self, state: &mut SessionState, action: Action) {
        let mutation = match action {
            Action::Navigate(page) => Mutation::Navigated(page),
            Action::Upload(files) => self.stage(state.view.staged_bytes(), files),
            Action::Analyze => self.analyze_staged(&state.view.staged).await,
            Action::Compare(ids) => {
                let result = self.compare(state, &ids).await;
                Mutation::ComparisonFinished {
                    selection: ids,
                    result,
                }
            }
            Action::ResetComparison => Mutation::ComparisonReset,
            Action::NoticesShown => Mutation::NoticesShown,
        };
        state.touch();
        reduce(state, mutation);
    }

    fn stage(&self, already_staged: usize, files: Vec<UploadedFile>) -> Mutation {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        let mut staged_bytes = already_staged;

        for file in files {
            if file.filename.is_empty() && file.bytes.is_empty() {
                // Browsers submit an empty part when no file was chosen.
                continue;
            }
            if !is_pdf_filename(&file.filename) {
                rejected.push(MediaError::UnsupportedType {
                    filename: file.filename,
                });
            } else if file.bytes.len() > self.max_upload_bytes {
                rejected.push(MediaError::TooLarge {
                    size: file.bytes.len(),
                    max: self.max_upload_bytes,
                });
            } else if staged_bytes.saturating_add(file.bytes.len()) > self.max_staged_bytes {
                rejected.push(MediaError::TooLarge {
                    size: staged_bytes.saturating_add(file.bytes.len()),
                    max: self.max_staged_bytes,
                });
            } else {
                staged_bytes += file.bytes.len();
                accepted.push(StagedFile {
                    filename: file.filename,
                    bytes: file.bytes,
                });
            }
        }

        tracing::debug!(
            accepted = accepted.len(),
            rejected = rejected.len(),
            staged_bytes,
            "Staged uploaded files"
        );
        Mutation::FilesStaged { accepted, rejected }
    }

    /// Extract and analyze each staged file in upload order.
    async fn analyze_staged(&self, staged: &[StagedFile]) -> Mutation {
        let mut analyses: Vec<PaperAnalysis> = Vec::with_capacity(staged.len());
        let mut failures = Vec::new();

        for file in staged {
            let text = match self.extract(file).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        filename = %file.filename,
                        error = %e,
                        "Skipping unreadable PDF"
                    );
                    failures.push((file.filename.clone(), e));
                    continue;
                }
            };

            let title = title_from_filename(&file.filename);
            tracing::info!(title = %title, chars = text.chars().count(), "Analyzing paper");
            analyses.push(self.analyzer.analyze(&title, &text).await);
        }

        Mutation::PapersAnalyzed { analyses, failures }
    }

    async fn extract(&self, file: &StagedFile) -> Result<String, MediaError> {
        let extractor = self.extractor.clone();
        let bytes = file.bytes.clone();
        tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| MediaError::ExtractionFailed {
                reason: e.to_string(),
            })?
    }

    async fn compare(
        &self,
        state: &SessionState,
        ids: &[u64],
    ) -> Result<ComparisonRecord, CompareError> {
        let papers = ids
            .iter()
            .map(|&id| {
                state
                    .store
                    .paper(id)
                    .cloned()
                    .ok_or(CompareError::UnknownPaper { id })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.engine.compare(papers).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::error::InferenceError;
    use crate::session::store::NoticeLevel;

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl InferenceProvider for CountingProvider {
        async fn generate(&self, _prompt: &str, _max: u32) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("generated".to_string())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn controller() -> (Arc<CountingProvider>, ViewController) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        (provider.clone(), ViewController::new(provider))
    }

    fn file(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    fn seeded(titles: &[&str]) -> SessionState {
        let mut state = SessionState::new(Uuid::new_v4());
        for title in titles {
            state.store.add_paper(PaperAnalysis::assemble(
                title,
                "",
                crate::analysis::Facet::Generated(format!("{title} summary")),
                crate::analysis::Facet::Generated(String::new()),
                crate::analysis::Facet::Generated(String::new()),
            ));
        }
        state
    }

    #[tokio::test]
    async fn test_upload_filters_non_pdf_and_oversized() {
        let (_, controller) = controller();
        let controller = controller.with_max_upload_bytes(4);
        let mut state = SessionState::new(Uuid::new_v4());

        controller
            .dispatch(
                &mut state,
                Action::Upload(vec![
                    file("a.pdf", b"%PDF"),
                    file("notes.txt", b"hi"),
                    file("big.pdf", b"%PDF-1.7"),
                    file("", b""),
                ]),
            )
            .await;

        assert_eq!(state.view.staged.len(), 1);
        assert_eq!(state.view.staged[0].filename, "a.pdf");
        let warnings = state
            .view
            .notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Warning)
            .count();
        assert_eq!(warnings, 2);
    }

    #[tokio::test]
    async fn test_repeated_uploads_stop_at_staging_budget() {
        let (_, controller) = controller();
        let controller = controller
            .with_max_upload_bytes(1024)
            .with_max_staged_bytes(4096);
        let mut state = SessionState::new(Uuid::new_v4());

        for i in 0..200 {
            let upload = file(&format!("paper-{i}.pdf"), &[b'%'; 1024]);
            controller
                .dispatch(&mut state, Action::Upload(vec![upload]))
                .await;
        }

        assert_eq!(state.view.staged.len(), 4);
        assert_eq!(state.view.staged_bytes(), 4096);
        let rejected = state
            .view
            .notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Warning)
            .count();
        assert_eq!(rejected, 196);
    }

    #[tokio::test]
    async fn test_staging_budget_frees_after_analysis() {
        let (_, controller) = controller();
        let controller = controller.with_max_staged_bytes(16);
        let mut state = SessionState::new(Uuid::new_v4());

        controller
            .dispatch(&mut state, Action::Upload(vec![file("a.pdf", &[0; 16])]))
            .await;
        controller
            .dispatch(&mut state, Action::Upload(vec![file("b.pdf", &[0; 1])]))
            .await;
        assert_eq!(state.view.staged.len(), 1);

        controller.dispatch(&mut state, Action::Analyze).await;
        assert!(state.view.staged.is_empty());

        controller
            .dispatch(&mut state, Action::Upload(vec![file("b.pdf", &[0; 16])]))
            .await;
        assert_eq!(state.view.staged.len(), 1);
        assert_eq!(state.view.staged[0].filename, "b.pdf");
    }

    #[tokio::test]
    async fn test_analyze_skips_unreadable_files() {
        let (provider, controller) = controller();
        let mut state = SessionState::new(Uuid::new_v4());
        state.view.staged.push(StagedFile {
            filename: "broken.pdf".to_string(),
            bytes: b"not a pdf".to_vec(),
        });

        controller.dispatch(&mut state, Action::Analyze).await;

        assert!(state.store.papers().is_empty());
        assert!(state.view.staged.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(
            state
                .view
                .notices
                .iter()
                .any(|n| n.level == NoticeLevel::Error && n.message.contains("broken.pdf"))
        );
    }

    #[tokio::test]
    async fn test_compare_by_ids() {
        let (provider, controller) = controller();
        let mut state = seeded(&["A", "B", "C"]);

        controller.dispatch(&mut state, Action::Compare(vec![3, 1])).await;

        let record = state.store.comparison().unwrap();
        assert_eq!(record.titles().collect::<Vec<_>>(), vec!["C", "A"]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(state.view.page, Page::Compare);
    }

    #[tokio::test]
    async fn test_compare_unknown_id() {
        let (provider, controller) = controller();
        let mut state = seeded(&["A", "B"]);

        controller.dispatch(&mut state, Action::Compare(vec![1, 9])).await;

        assert!(state.store.comparison().is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(state.view.notices[0].message.contains('9'));
    }

    #[tokio::test]
    async fn test_compare_single_selection_records_nothing() {
        let (provider, controller) = controller();
        let mut state = seeded(&["A", "B"]);

        controller.dispatch(&mut state, Action::Compare(vec![1])).await;

        assert!(state.store.comparison().is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reset_after_compare() {
        let (_, controller) = controller();
        let mut state = seeded(&["A", "B"]);

        controller.dispatch(&mut state, Action::Compare(vec![1, 2])).await;
        assert!(state.store.comparison().is_some());
        controller.dispatch(&mut state, Action::ResetComparison).await;
        assert!(state.store.comparison().is_none());
        assert_eq!(state.store.papers().len(), 2);
    }
}
