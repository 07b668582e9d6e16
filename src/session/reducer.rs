//! Pure state transitions.
//!
//! Every change to a [`SessionState`] goes through [`reduce`]. Mutations
//! carry the already-computed results of any side effect, so the reducer
//! itself never performs I/O.
//!
//! ```text
//! Navigated ─────────► view.page
//! FilesStaged ───────► view.staged (+ notices for skipped files)
//! PapersAnalyzed ────► store.papers (ids assigned), view.staged cleared
//! ComparisonFinished ► store.comparison replaced, or error notice
//! ComparisonReset ───► store.comparison cleared
//! NoticesShown ──────► view.notices cleared
//! ```

use crate::analysis::{ComparisonRecord, PaperAnalysis};
use crate::error::{CompareError, MediaError};
use crate::session::store::{Notice, Page, SessionState, StagedFile};

/// A state change with its inputs fully resolved.
#[derive(Debug)]
pub enum Mutation {
    Navigated(Page),
    FilesStaged {
        accepted: Vec<StagedFile>,
        rejected: Vec<MediaError>,
    },
    PapersAnalyzed {
        analyses: Vec<PaperAnalysis>,
        failures: Vec<(String, MediaError)>,
    },
    ComparisonFinished {
        selection: Vec<u64>,
        result: Result<ComparisonRecord, CompareError>,
    },
    ComparisonReset,
    NoticesShown,
}

/// Apply a mutation to a session.
pub fn reduce(state: &mut SessionState, mutation: Mutation) {
    match mutation {
        Mutation::Navigated(page) => {
            state.view.page = page;
        }
        Mutation::FilesStaged { accepted, rejected } => {
            state.view.page = Page::Upload;
            for err in rejected {
                state.view.notices.push(Notice::warning(err.to_string()));
            }
            if !accepted.is_empty() {
                state.view.notices.push(Notice::info(format!(
                    "{} file(s) ready for analysis",
                    accepted.len()
                )));
            }
            state.view.staged.extend(accepted);
        }
        Mutation::PapersAnalyzed { analyses, failures } => {
            state.view.page = Page::Upload;
            state.view.staged.clear();

            for (filename, err) in failures {
                state
                    .view
                    .notices
                    .push(Notice::error(format!("{}: {}", filename, err)));
            }

            let count = analyses.len();
            let mut degraded = 0;
            for analysis in analyses {
                if analysis.has_failures() {
                    degraded += 1;
                }
                state.store.add_paper(analysis);
            }

            if count > 0 {
                state
                    .view
                    .notices
                    .push(Notice::success(format!("Analyzed {} paper(s)", count)));
            }
            if degraded > 0 {
                state.view.notices.push(Notice::warning(format!(
                    "{} paper(s) have sections the model could not generate",
                    degraded
                )));
            }
        }
        Mutation::ComparisonFinished { selection, result } => {
            state.view.page = Page::Compare;
            state.view.selection = selection;
            match result {
                Ok(record) => {
                    state.store.set_comparison(record);
                    state.view.notices.push(Notice::success("Comparison complete"));
                }
                Err(err) => {
                    state.view.notices.push(Notice::warning(err.to_string()));
                }
            }
        }
        Mutation::ComparisonReset => {
            state.view.page = Page::Compare;
            state.view.selection.clear();
            state.store.clear_comparison();
        }
        Mutation::NoticesShown => {
            state.view.notices.clear();
        }
    }
}
