use std::collections::VecDeque;
use std::path::PathBuf;

use crate::history::HistoryState;
use crate::requests::{Completion, Dispatch, Effect};
use crate::uploader::UploaderState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Analysis,
    History,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Analysis, Tab::History];

    pub fn index(self) -> usize {
        match self {
            Tab::Analysis => 0,
            Tab::History => 1,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Analysis => "Resume Analysis",
            Tab::History => "Historical Viewer",
        }
    }

    pub fn other(self) -> Tab {
        match self {
            Tab::Analysis => Tab::History,
            Tab::History => Tab::Analysis,
        }
    }
}

/// The one tab component currently alive. Replacing it drops its state.
#[derive(Debug)]
pub enum Mounted {
    Uploader(UploaderState),
    History(HistoryState),
}

impl Mounted {
    fn pending_requests(&self) -> Vec<crate::requests::RequestId> {
        match self {
            Mounted::Uploader(u) => u.pending_requests(),
            Mounted::History(h) => h.pending_requests(),
        }
    }
}

/// Everything the user can do, independent of which key triggers it.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Start,
    SelectTab(Tab),
    NextTab,
    BeginFileInput,
    InputChar(char),
    InputBackspace,
    InputSubmit,
    InputCancel,
    Submit,
    DismissOverlay,
    CursorUp,
    CursorDown,
    ScrollUp,
    ScrollDown,
    Reload,
    OpenDetails,
    CloseDetails,
    ToggleCompare,
    OpenCompare,
    CloseCompare,
    DismissAlert,
    Quit,
}

/// Root view switcher: landing panel first, then two tabs.
pub struct App<D: Dispatch> {
    dispatch: D,
    showing_landing: bool,
    tab: Tab,
    mounted: Option<Mounted>,
    alerts: VecDeque<String>,
    file_input: Option<String>,
    initial_file: Option<PathBuf>,
    scroll: u16,
    should_quit: bool,
}

impl<D: Dispatch> App<D> {
    pub fn new(dispatch: D) -> Self {
        Self {
            dispatch,
            showing_landing: true,
            tab: Tab::Analysis,
            mounted: None,
            alerts: VecDeque::new(),
            file_input: None,
            initial_file: None,
            scroll: 0,
            should_quit: false,
        }
    }

    /// Preselect a file for the uploader once it mounts.
    pub fn with_initial_file(mut self, file: Option<PathBuf>) -> Self {
        self.initial_file = file;
        self
    }

    pub fn showing_landing(&self) -> bool {
        self.showing_landing
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn uploader(&self) -> Option<&UploaderState> {
        match &self.mounted {
            Some(Mounted::Uploader(u)) => Some(u),
            _ => None,
        }
    }

    pub fn history(&self) -> Option<&HistoryState> {
        match &self.mounted {
            Some(Mounted::History(h)) => Some(h),
            _ => None,
        }
    }

    pub fn alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn file_input(&self) -> Option<&str> {
        self.file_input.as_deref()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatch
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Dispatch(command) => self.dispatch.dispatch(command),
                Effect::Cancel(id) => self.dispatch.cancel(id),
                Effect::Alert(message) => {
                    tracing::info!(%message, "alert");
                    self.alerts.push_back(message);
                }
            }
        }
    }

    fn start(&mut self) {
        if !self.showing_landing {
            return;
        }
        tracing::info!("leaving landing view");
        self.showing_landing = false;
        self.mount(self.tab);
    }

    fn mount(&mut self, tab: Tab) {
        self.tab = tab;
        self.scroll = 0;
        match tab {
            Tab::Analysis => {
                let mut uploader = UploaderState::default();
                let effects = match self.initial_file.take() {
                    Some(file) => uploader.select_file(file),
                    None => Vec::new(),
                };
                self.mounted = Some(Mounted::Uploader(uploader));
                self.apply(effects);
            }
            Tab::History => {
                let (history, effects) = HistoryState::mount();
                self.mounted = Some(Mounted::History(history));
                self.apply(effects);
            }
        }
    }

    fn unmount(&mut self) {
        if let Some(component) = self.mounted.take() {
            for id in component.pending_requests() {
                self.dispatch.cancel(id);
            }
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.showing_landing || tab == self.tab {
            return;
        }
        tracing::info!(from = ?self.tab, to = ?tab, "switching tab");
        self.file_input = None;
        self.unmount();
        self.mount(tab);
    }

    /// Route a finished request to the component still waiting for it.
    pub fn handle_completion(&mut self, completion: Completion) {
        self.dispatch.settle(completion.id);
        let id = completion.id;
        // Scroll restarts only when a new body replaces the one on screen.
        let replaces_view = completion.result.is_ok();
        let effects = match &mut self.mounted {
            Some(Mounted::Uploader(u)) if u.owns(id) => {
                if replaces_view {
                    self.scroll = 0;
                }
                u.on_completion(completion)
            }
            Some(Mounted::History(h)) if h.owns(id) => {
                if replaces_view && h.awaits_details(id) {
                    self.scroll = 0;
                }
                h.on_completion(completion)
            }
            _ => {
                tracing::debug!(request = %id, "dropping reply nobody is waiting for");
                return;
            }
        };
        self.apply(effects);
    }

    pub fn update(&mut self, action: Action) {
        if action == Action::Quit {
            self.should_quit = true;
            return;
        }
        // Alerts block everything else until acknowledged.
        if !self.alerts.is_empty() {
            if action == Action::DismissAlert {
                self.alerts.pop_front();
            }
            return;
        }

        match action {
            Action::Start => self.start(),
            Action::SelectTab(tab) => self.select_tab(tab),
            Action::NextTab => self.select_tab(self.tab.other()),
            Action::ScrollUp => self.scroll = self.scroll.saturating_sub(3),
            Action::ScrollDown => self.scroll = self.scroll.saturating_add(3),
            Action::BeginFileInput => {
                if self.uploader().is_some() {
                    let current = self
                        .uploader()
                        .and_then(|u| u.selected_file())
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    self.file_input = Some(current);
                }
            }
            Action::InputChar(c) => {
                if let Some(buf) = self.file_input.as_mut() {
                    buf.push(c);
                }
            }
            Action::InputBackspace => {
                if let Some(buf) = self.file_input.as_mut() {
                    buf.pop();
                }
            }
            Action::InputCancel => self.file_input = None,
            Action::InputSubmit => {
                let Some(buf) = self.file_input.take() else { return };
                let path = buf.trim();
                if path.is_empty() {
                    return;
                }
                let effects = match &mut self.mounted {
                    Some(Mounted::Uploader(u)) => u.select_file(PathBuf::from(path)),
                    _ => Vec::new(),
                };
                self.apply(effects);
            }
            other => self.update_component(other),
        }
    }

    fn update_component(&mut self, action: Action) {
        let effects = match (&mut self.mounted, action) {
            (Some(Mounted::Uploader(u)), Action::Submit) => u.submit(),
            (Some(Mounted::Uploader(u)), Action::DismissOverlay) => {
                u.dismiss_overlay();
                Vec::new()
            }
            (Some(Mounted::History(h)), Action::CursorUp) => {
                h.cursor_up();
                Vec::new()
            }
            (Some(Mounted::History(h)), Action::CursorDown) => {
                h.cursor_down();
                Vec::new()
            }
            (Some(Mounted::History(h)), Action::Reload) => h.reload(),
            (Some(Mounted::History(h)), Action::OpenDetails) => match h.current_row().map(|r| r.id) {
                Some(id) => h.open_details(id),
                None => Vec::new(),
            },
            (Some(Mounted::History(h)), Action::CloseDetails) => {
                h.close_details();
                Vec::new()
            }
            (Some(Mounted::History(h)), Action::ToggleCompare) => match h.current_row().cloned() {
                Some(row) => h.toggle_comparison(&row),
                None => Vec::new(),
            },
            (Some(Mounted::History(h)), Action::OpenCompare) => {
                h.open_compare();
                Vec::new()
            }
            (Some(Mounted::History(h)), Action::CloseCompare) => {
                h.close_compare();
                Vec::new()
            }
            _ => Vec::new(),
        };
        self.apply(effects);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::models::{ResumeDetail, ResumeSummary};
    use crate::requests::testing::RecordingDispatch;
    use crate::requests::{ApiCall, Reply};

    fn app() -> App<RecordingDispatch> {
        App::new(RecordingDispatch::default())
    }

    fn started() -> App<RecordingDispatch> {
        let mut app = app();
        app.update(Action::Start);
        app
    }

    fn summaries() -> Vec<ResumeSummary> {
        vec![
            ResumeSummary {
                id: 1,
                filename: "a.pdf".into(),
                name: Some("Ada".into()),
                email: None,
                phone: None,
                resume_rating: Some(8.0),
            },
            ResumeSummary {
                id: 2,
                filename: "b.pdf".into(),
                name: None,
                email: None,
                phone: None,
                resume_rating: Some(4.0),
            },
        ]
    }

    #[test]
    fn test_defaults_to_landing_then_analysis_tab() {
        let mut app = app();
        assert!(app.showing_landing());
        assert!(app.uploader().is_none() && app.history().is_none());

        app.update(Action::SelectTab(Tab::History));
        assert!(app.showing_landing());

        app.update(Action::Start);
        assert!(!app.showing_landing());
        assert_eq!(app.tab(), Tab::Analysis);
        assert_eq!(app.tab().index(), 0);
        assert!(app.uploader().is_some());
        assert!(app.dispatcher().dispatched.is_empty());
    }

    #[test]
    fn test_history_tab_loads_list_on_mount() {
        let mut app = started();
        app.update(Action::SelectTab(Tab::History));
        assert_eq!(app.tab().index(), 1);
        assert_eq!(app.dispatcher().last().call, ApiCall::ListResumes);

        let id = app.dispatcher().last().id;
        app.handle_completion(Completion {
            id,
            result: Ok(Reply::Summaries(summaries())),
        });
        assert_eq!(app.history().map(|h| h.rows().len()), Some(2));
    }

    #[test]
    fn test_switching_tab_cancels_and_ignores_inflight() {
        let mut app = started();
        app.update(Action::SelectTab(Tab::History));
        let list = app.dispatcher().last().id;

        app.update(Action::SelectTab(Tab::Analysis));
        assert_eq!(app.dispatcher().cancelled, vec![list]);

        app.handle_completion(Completion {
            id: list,
            result: Ok(Reply::Summaries(summaries())),
        });
        assert!(app.alert().is_none());
        assert!(app.uploader().is_some());
    }

    #[test]
    fn test_remount_starts_fresh() {
        let mut app = started();
        app.update(Action::BeginFileInput);
        for c in "cv.pdf".chars() {
            app.update(Action::InputChar(c));
        }
        app.update(Action::InputSubmit);
        assert!(app.uploader().and_then(|u| u.selected_file()).is_some());

        app.update(Action::NextTab);
        app.update(Action::NextTab);
        assert!(app.uploader().and_then(|u| u.selected_file()).is_none());
    }

    #[test]
    fn test_submit_without_file_raises_blocking_alert() {
        let mut app = started();
        app.update(Action::Submit);
        assert_eq!(app.alert(), Some("Select a PDF file"));
        assert!(app.dispatcher().dispatched.is_empty());

        // Blocked until dismissed.
        app.update(Action::NextTab);
        assert_eq!(app.tab(), Tab::Analysis);
        app.update(Action::DismissAlert);
        assert!(app.alert().is_none());
    }

    #[test]
    fn test_upload_roundtrip_through_app() {
        let mut app = App::new(RecordingDispatch::default()).with_initial_file(Some("cv.pdf".into()));
        app.update(Action::Start);
        app.update(Action::Submit);
        let command = app.dispatcher().last().clone();
        assert_eq!(command.call, ApiCall::Upload("cv.pdf".into()));
        assert!(app.uploader().is_some_and(|u| u.is_busy()));

        app.handle_completion(Completion {
            id: command.id,
            result: Ok(Reply::Detail(ResumeDetail {
                resume_rating: Some(7.0),
                ..Default::default()
            })),
        });
        let uploader = app.uploader().unwrap();
        assert!(!uploader.is_busy());
        assert!(uploader.overlay_open());

        app.update(Action::DismissOverlay);
        assert!(!app.uploader().unwrap().overlay_open());
    }

    #[test]
    fn test_failed_details_alerts() {
        let mut app = started();
        app.update(Action::SelectTab(Tab::History));
        let list = app.dispatcher().last().id;
        app.handle_completion(Completion {
            id: list,
            result: Ok(Reply::Summaries(summaries())),
        });

        app.update(Action::OpenDetails);
        let fetch = app.dispatcher().last().clone();
        assert_eq!(fetch.call, ApiCall::FetchResume(1));
        app.handle_completion(Completion {
            id: fetch.id,
            result: Err(ApiError::Status { code: 500, detail: None }),
        });
        assert!(app.alert().unwrap().starts_with("Failed to load details"));
        assert!(app.history().unwrap().selected().is_none());
    }

    #[test]
    fn test_compare_flow_through_app() {
        let mut app = started();
        app.update(Action::SelectTab(Tab::History));
        let list = app.dispatcher().last().id;
        app.handle_completion(Completion {
            id: list,
            result: Ok(Reply::Summaries(summaries())),
        });

        for (id, rating) in [(1, 8.0), (2, 4.0)] {
            app.update(Action::ToggleCompare);
            let fetch = app.dispatcher().last().clone();
            assert_eq!(fetch.call, ApiCall::FetchResume(id));
            app.handle_completion(Completion {
                id: fetch.id,
                result: Ok(Reply::Detail(ResumeDetail {
                    id: Some(id),
                    resume_rating: Some(rating),
                    ..Default::default()
                })),
            });
            app.update(Action::CursorDown);
        }

        app.update(Action::OpenCompare);
        let history = app.history().unwrap();
        assert!(history.compare_open());
        assert_eq!(history.comparison().len(), 2);
    }

    #[test]
    fn test_empty_input_keeps_previous_file() {
        let mut app = App::new(RecordingDispatch::default()).with_initial_file(Some("a.pdf".into()));
        app.update(Action::Start);
        app.update(Action::BeginFileInput);
        assert_eq!(app.file_input(), Some("a.pdf"));
        for _ in 0..5 {
            app.update(Action::InputBackspace);
        }
        app.update(Action::InputSubmit);
        assert_eq!(
            app.uploader().and_then(|u| u.selected_file()),
            Some(std::path::Path::new("a.pdf"))
        );
    }

    #[test]
    fn test_prompt_rejects_non_pdf() {
        let mut app = started();
        app.update(Action::BeginFileInput);
        for c in "notes.txt".chars() {
            app.update(Action::InputChar(c));
        }
        app.update(Action::InputSubmit);
        assert_eq!(app.alert(), Some("Select a PDF file"));
        assert!(app.uploader().and_then(|u| u.selected_file()).is_none());
    }

    #[test]
    fn test_late_compare_fetch_keeps_details_scroll() {
        let mut app = started();
        app.update(Action::SelectTab(Tab::History));
        let list = app.dispatcher().last().id;
        app.handle_completion(Completion {
            id: list,
            result: Ok(Reply::Summaries(summaries())),
        });

        app.update(Action::ToggleCompare);
        let compare = app.dispatcher().last().id;
        app.update(Action::OpenDetails);
        let details = app.dispatcher().last().id;
        app.handle_completion(Completion {
            id: details,
            result: Ok(Reply::Detail(ResumeDetail::default())),
        });
        app.update(Action::ScrollDown);
        assert_eq!(app.scroll(), 3);

        app.handle_completion(Completion {
            id: compare,
            result: Ok(Reply::Detail(ResumeDetail::default())),
        });
        assert_eq!(app.scroll(), 3);
        assert_eq!(app.history().unwrap().comparison().len(), 1);
    }

    #[test]
    fn test_upload_result_opens_at_top() {
        let mut app = App::new(RecordingDispatch::default()).with_initial_file(Some("cv.pdf".into()));
        app.update(Action::Start);
        app.update(Action::ScrollDown);
        app.update(Action::Submit);
        let id = app.dispatcher().last().id;
        assert_eq!(app.scroll(), 3);

        app.handle_completion(Completion {
            id,
            result: Ok(Reply::Detail(ResumeDetail::default())),
        });
        assert_eq!(app.scroll(), 0);
        assert!(app.uploader().unwrap().overlay_open());
    }
}
