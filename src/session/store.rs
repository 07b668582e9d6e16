//! Per-session state.
//!
//! [`SessionStore`] holds what the user produced (papers and the last
//! comparison). [`ViewState`] holds what the user is looking at. Both are
//! owned by one [`SessionState`]; nothing here is shared between sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::{ComparisonRecord, PaperAnalysis, PaperRecord};

/// The three views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Library,
    Upload,
    Compare,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Library, Page::Upload, Page::Compare];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Library => "/library",
            Self::Upload => "/upload",
            Self::Compare => "/compare",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Library => "Library",
            Self::Upload => "Upload Paper",
            Self::Compare => "Compare Papers",
        }
    }
}

/// A file waiting to be analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A one-shot message shown on the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Papers and the last comparison for one session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    papers: Vec<PaperRecord>,
    next_paper_id: u64,
    comparison: Option<ComparisonRecord>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            papers: Vec::new(),
            next_paper_id: 1,
            comparison: None,
        }
    }

    /// Append an analyzed paper, assigning the next id.
    pub fn add_paper(&mut self, analysis: PaperAnalysis) -> &PaperRecord {
        let id = self.next_paper_id;
        self.next_paper_id += 1;
        self.papers.push(analysis.into_record(id));
        &self.papers[self.papers.len() - 1]
    }

    pub fn papers(&self) -> &[PaperRecord] {
        &self.papers
    }

    pub fn paper(&self, id: u64) -> Option<&PaperRecord> {
        self.papers.iter().find(|p| p.id == id)
    }

    pub fn comparison(&self) -> Option<&ComparisonRecord> {
        self.comparison.as_ref()
    }

    /// Replace the held comparison. At most one is kept.
    pub fn set_comparison(&mut self, comparison: ComparisonRecord) {
        self.comparison = Some(comparison);
    }

    pub fn clear_comparison(&mut self) -> bool {
        self.comparison.take().is_some()
    }

    /// Number of distinct categories across papers.
    pub fn category_count(&self) -> usize {
        let mut categories: Vec<&str> = self
            .papers
            .iter()
            .map(|p| p.analysis.category.as_str())
            .collect();
        categories.sort_unstable();
        categories.dedup();
        categories.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// What the session is currently showing.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub page: Page,
    pub staged: Vec<StagedFile>,
    /// Paper ids picked for the last comparison request.
    pub selection: Vec<u64>,
    pub notices: Vec<Notice>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page: Page::Library,
            staged: Vec::new(),
            selection: Vec::new(),
            notices: Vec::new(),
        }
    }
}

impl ViewState {
    /// Total size of the files waiting to be analyzed.
    pub fn staged_bytes(&self) -> usize {
        self.staged.iter().map(|f| f.bytes.len()).sum()
    }
}

/// Everything held for one connected user.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: Uuid,
    pub store: SessionStore,
    pub view: ViewState,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionState {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            store: SessionStore::new(),
            view: ViewState::default(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}
