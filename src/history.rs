use crate::models::{ResumeDetail, ResumeSummary};
use crate::requests::{ApiCall, Command, Completion, Effect, Reply, RequestId};

pub const MAX_COMPARED: usize = 2;

/// Up to two detail records chosen for side-by-side review, keyed by the
/// summary id they were fetched for. Members leave only by deselection.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ComparisonSelection {
    entries: Vec<(i64, ResumeDetail)>,
}

impl ComparisonSelection {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_COMPARED
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.iter().any(|(key, _)| *key == id)
    }

    /// Adds a record; a third member or a duplicate id is silently refused.
    pub fn insert(&mut self, id: i64, detail: ResumeDetail) -> bool {
        if self.is_full() || self.contains(id) {
            return false;
        }
        self.entries.push((id, detail));
        true
    }

    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(key, _)| *key != id);
        self.entries.len() != before
    }

    pub fn details(&self) -> impl Iterator<Item = &ResumeDetail> {
        self.entries.iter().map(|(_, detail)| detail)
    }
}

/// How a row's comparison checkbox should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMark {
    Selected,
    Loading,
    Available,
    Disabled,
}

/// State behind the "Historical Viewer" tab.
#[derive(Debug, Default)]
pub struct HistoryState {
    rows: Vec<ResumeSummary>,
    cursor: usize,
    loaded: bool,
    list_request: Option<RequestId>,
    selected: Option<ResumeDetail>,
    details_request: Option<(RequestId, i64)>,
    comparison: ComparisonSelection,
    compare_requests: Vec<(RequestId, i64)>,
    compare_open: bool,
}

impl HistoryState {
    /// A freshly mounted history view starts loading the list straight away.
    pub fn mount() -> (Self, Vec<Effect>) {
        let mut state = Self::default();
        let effects = state.reload();
        (state, effects)
    }

    pub fn reload(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(previous) = self.list_request.take() {
            effects.push(Effect::Cancel(previous));
        }
        let command = Command::new(ApiCall::ListResumes);
        self.list_request = Some(command.id);
        effects.push(Effect::Dispatch(command));
        effects
    }

    pub fn rows(&self) -> &[ResumeSummary] {
        &self.rows
    }

    pub fn is_loading(&self) -> bool {
        self.list_request.is_some() && !self.loaded
    }

    /// The list has answered at least once and holds nothing.
    pub fn is_empty_state(&self) -> bool {
        self.loaded && self.rows.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_row(&self) -> Option<&ResumeSummary> {
        self.rows.get(self.cursor)
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn selected(&self) -> Option<&ResumeDetail> {
        self.selected.as_ref()
    }

    pub fn is_fetching_details(&self) -> bool {
        self.details_request.is_some()
    }

    pub fn open_details(&mut self, id: i64) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some((previous, _)) = self.details_request.take() {
            effects.push(Effect::Cancel(previous));
        }
        let command = Command::new(ApiCall::FetchResume(id));
        self.details_request = Some((command.id, id));
        effects.push(Effect::Dispatch(command));
        effects
    }

    pub fn close_details(&mut self) {
        self.selected = None;
    }

    pub fn comparison(&self) -> &ComparisonSelection {
        &self.comparison
    }

    fn pending_compare(&self, id: i64) -> Option<RequestId> {
        self.compare_requests
            .iter()
            .find(|(_, key)| *key == id)
            .map(|(request, _)| *request)
    }

    fn compare_slots_taken(&self) -> usize {
        self.comparison.len() + self.compare_requests.len()
    }

    pub fn compare_mark(&self, id: i64) -> CompareMark {
        if self.comparison.contains(id) {
            CompareMark::Selected
        } else if self.pending_compare(id).is_some() {
            CompareMark::Loading
        } else if self.compare_slots_taken() >= MAX_COMPARED {
            CompareMark::Disabled
        } else {
            CompareMark::Available
        }
    }

    pub fn toggle_comparison(&mut self, summary: &ResumeSummary) -> Vec<Effect> {
        let id = summary.id;
        if self.comparison.remove(id) {
            self.compare_open = false;
            return Vec::new();
        }
        if let Some(request) = self.pending_compare(id) {
            self.compare_requests.retain(|(r, _)| *r != request);
            return vec![Effect::Cancel(request)];
        }
        if self.compare_slots_taken() >= MAX_COMPARED {
            return Vec::new();
        }

        let command = Command::new(ApiCall::FetchResume(id));
        self.compare_requests.push((command.id, id));
        vec![Effect::Dispatch(command)]
    }

    pub fn can_compare(&self) -> bool {
        self.comparison.len() == MAX_COMPARED
    }

    pub fn open_compare(&mut self) -> bool {
        if self.can_compare() {
            self.compare_open = true;
        }
        self.compare_open
    }

    pub fn close_compare(&mut self) {
        self.compare_open = false;
    }

    pub fn compare_open(&self) -> bool {
        self.compare_open
    }

    /// Whether `id` is the pending details fetch.
    pub fn awaits_details(&self, id: RequestId) -> bool {
        self.details_request.is_some_and(|(r, _)| r == id)
    }

    pub fn owns(&self, id: RequestId) -> bool {
        self.list_request == Some(id)
            || self.details_request.is_some_and(|(r, _)| r == id)
            || self.compare_requests.iter().any(|(r, _)| *r == id)
    }

    pub fn pending_requests(&self) -> Vec<RequestId> {
        self.list_request
            .into_iter()
            .chain(self.details_request.map(|(r, _)| r))
            .chain(self.compare_requests.iter().map(|(r, _)| *r))
            .collect()
    }

    pub fn on_completion(&mut self, completion: Completion) -> Vec<Effect> {
        let Completion { id, result } = completion;

        if self.list_request == Some(id) {
            self.list_request = None;
            self.loaded = true;
            return match result {
                Ok(Reply::Summaries(rows)) => {
                    tracing::info!(count = rows.len(), "history loaded");
                    self.rows = rows;
                    self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
                    Vec::new()
                }
                other => failure("Failed to load history", other),
            };
        }

        if let Some((request, resume_id)) = self.details_request {
            if request == id {
                self.details_request = None;
                return match result {
                    Ok(Reply::Detail(detail)) => {
                        tracing::debug!(resume_id, "details loaded");
                        self.selected = Some(detail);
                        Vec::new()
                    }
                    other => failure("Failed to load details", other),
                };
            }
        }

        if let Some(pos) = self.compare_requests.iter().position(|(r, _)| *r == id) {
            let (_, resume_id) = self.compare_requests.remove(pos);
            return match result {
                Ok(Reply::Detail(detail)) => {
                    self.comparison.insert(resume_id, detail);
                    Vec::new()
                }
                other => failure("Failed to fetch resume details for comparison", other),
            };
        }

        Vec::new()
    }
}

fn failure(context: &str, result: Result<Reply, crate::api::ApiError>) -> Vec<Effect> {
    let reason = match result {
        Err(e) => {
            tracing::error!(error = %e, "{}", context);
            e.user_message()
        }
        Ok(_) => "unexpected response".to_string(),
    };
    vec![Effect::Alert(format!("{}: {}", context, reason))]
}
