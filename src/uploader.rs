use std::path::{Path, PathBuf};

use crate::models::ResumeDetail;
use crate::requests::{ApiCall, Command, Completion, Effect, Reply, RequestId};

pub const NO_FILE_MESSAGE: &str = "Select a PDF file";

/// Where a fresh analysis is shown. Dismissing the overlay is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultDisplay {
    #[default]
    Overlay,
    Inline,
}

/// State behind the "Resume Analysis" tab.
#[derive(Debug, Default)]
pub struct UploaderState {
    file: Option<PathBuf>,
    pending: Option<RequestId>,
    result: Option<ResumeDetail>,
    display: ResultDisplay,
}

impl UploaderState {
    /// Only `.pdf` paths are accepted; anything else leaves the current
    /// selection alone and raises the validation alert.
    pub fn select_file(&mut self, path: PathBuf) -> Vec<Effect> {
        if !is_pdf(&path) {
            tracing::debug!(file = %path.display(), "rejected non-PDF file");
            return vec![Effect::Alert(NO_FILE_MESSAGE.to_string())];
        }
        tracing::debug!(file = %path.display(), "file selected");
        self.file = Some(path);
        Vec::new()
    }

    pub fn selected_file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn result(&self) -> Option<&ResumeDetail> {
        self.result.as_ref()
    }

    pub fn display(&self) -> ResultDisplay {
        self.display
    }

    pub fn overlay_open(&self) -> bool {
        self.result.is_some() && self.display == ResultDisplay::Overlay
    }

    pub fn owns(&self, id: RequestId) -> bool {
        self.pending == Some(id)
    }

    pub fn pending_requests(&self) -> Vec<RequestId> {
        self.pending.into_iter().collect()
    }

    /// Upload the selected file. A submit while an upload is already in
    /// flight is ignored.
    pub fn submit(&mut self) -> Vec<Effect> {
        if self.is_busy() {
            tracing::debug!("upload already in flight, ignoring submit");
            return Vec::new();
        }
        let Some(file) = &self.file else {
            return vec![Effect::Alert(NO_FILE_MESSAGE.to_string())];
        };

        let command = Command::new(ApiCall::Upload(file.clone()));
        self.pending = Some(command.id);
        vec![Effect::Dispatch(command)]
    }

    pub fn on_completion(&mut self, completion: Completion) -> Vec<Effect> {
        if !self.owns(completion.id) {
            return Vec::new();
        }
        self.pending = None;

        match completion.result {
            Ok(Reply::Detail(detail)) => {
                tracing::info!(rating = ?detail.resume_rating, "analysis received");
                self.result = Some(detail);
                self.display = ResultDisplay::Overlay;
                Vec::new()
            }
            Ok(Reply::Summaries(_)) => {
                vec![Effect::Alert("Upload failed: unexpected response".to_string())]
            }
            Err(e) => {
                tracing::error!(error = %e, "upload failed");
                vec![Effect::Alert(format!("Upload failed: {}", e.user_message()))]
            }
        }
    }

    pub fn dismiss_overlay(&mut self) {
        if self.result.is_some() {
            self.display = ResultDisplay::Inline;
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    fn dispatched(effects: &[Effect]) -> &Command {
        match effects {
            [Effect::Dispatch(command)] => command,
            other => panic!("expected one dispatch, got {other:?}"),
        }
    }

    fn analysis(rating: f64) -> ResumeDetail {
        ResumeDetail {
            name: Some("Ada".into()),
            resume_rating: Some(rating),
            ..Default::default()
        }
    }

    #[test]
    fn test_submit_without_file_alerts_and_stays_idle() {
        let mut uploader = UploaderState::default();
        let effects = uploader.submit();
        assert_eq!(effects, vec![Effect::Alert(NO_FILE_MESSAGE.to_string())]);
        assert!(!uploader.is_busy());
        assert!(uploader.pending_requests().is_empty());
    }

    #[test]
    fn test_non_pdf_selection_is_rejected() {
        let mut uploader = UploaderState::default();
        assert!(uploader.select_file("cv.PDF".into()).is_empty());

        let effects = uploader.select_file("notes.txt".into());
        assert_eq!(effects, vec![Effect::Alert(NO_FILE_MESSAGE.to_string())]);
        assert_eq!(uploader.select_file("resume".into()).len(), 1);
        assert_eq!(uploader.selected_file(), Some(Path::new("cv.PDF")));
    }

    #[test]
    fn test_submit_issues_single_upload() {
        let mut uploader = UploaderState::default();
        uploader.select_file("cv.pdf".into());
        let effects = uploader.submit();
        let command = dispatched(&effects);
        assert_eq!(command.call, ApiCall::Upload("cv.pdf".into()));
        assert!(uploader.is_busy());
    }

    #[test]
    fn test_double_submit_is_ignored_while_busy() {
        let mut uploader = UploaderState::default();
        uploader.select_file("cv.pdf".into());
        let first = uploader.submit();
        assert_eq!(first.len(), 1);
        assert!(uploader.submit().is_empty());
        assert_eq!(uploader.pending_requests().len(), 1);
    }

    #[test]
    fn test_success_stores_result_and_opens_overlay() {
        let mut uploader = UploaderState::default();
        uploader.select_file("cv.pdf".into());
        let id = dispatched(&uploader.submit()).id;

        let effects = uploader.on_completion(Completion {
            id,
            result: Ok(Reply::Detail(analysis(8.0))),
        });
        assert!(effects.is_empty());
        assert!(!uploader.is_busy());
        assert_eq!(uploader.result().and_then(|r| r.resume_rating), Some(8.0));
        assert!(uploader.overlay_open());

        uploader.dismiss_overlay();
        assert_eq!(uploader.display(), ResultDisplay::Inline);
        uploader.dismiss_overlay();
        assert_eq!(uploader.display(), ResultDisplay::Inline);
    }

    #[test]
    fn test_next_upload_reopens_overlay() {
        let mut uploader = UploaderState::default();
        uploader.select_file("a.pdf".into());
        let id = dispatched(&uploader.submit()).id;
        uploader.on_completion(Completion {
            id,
            result: Ok(Reply::Detail(analysis(4.0))),
        });
        uploader.dismiss_overlay();

        uploader.select_file("b.pdf".into());
        let id = dispatched(&uploader.submit()).id;
        uploader.on_completion(Completion {
            id,
            result: Ok(Reply::Detail(analysis(9.0))),
        });
        assert!(uploader.overlay_open());
        assert_eq!(uploader.result().and_then(|r| r.resume_rating), Some(9.0));
    }

    #[test]
    fn test_failure_surfaces_detail_and_clears_busy() {
        let mut uploader = UploaderState::default();
        uploader.select_file("cv.pdf".into());
        let id = dispatched(&uploader.submit()).id;

        let effects = uploader.on_completion(Completion {
            id,
            result: Err(ApiError::Status {
                code: 500,
                detail: Some("Error processing resume: no text".into()),
            }),
        });
        assert_eq!(
            effects,
            vec![Effect::Alert("Upload failed: Error processing resume: no text".to_string())]
        );
        assert!(!uploader.is_busy());
        assert!(uploader.result().is_none());
    }

    #[test]
    fn test_failure_without_detail_uses_generic_message() {
        let mut uploader = UploaderState::default();
        uploader.select_file("cv.pdf".into());
        let id = dispatched(&uploader.submit()).id;

        let effects = uploader.on_completion(Completion {
            id,
            result: Err(ApiError::Status { code: 503, detail: None }),
        });
        assert_eq!(
            effects,
            vec![Effect::Alert("Upload failed: Request failed with status code 503".to_string())]
        );
    }

    #[test]
    fn test_reply_for_other_request_is_ignored() {
        let mut uploader = UploaderState::default();
        uploader.select_file("cv.pdf".into());
        uploader.submit();

        let effects = uploader.on_completion(Completion {
            id: RequestId::next(),
            result: Ok(Reply::Detail(analysis(8.0))),
        });
        assert!(effects.is_empty());
        assert!(uploader.is_busy());
        assert!(uploader.result().is_none());
    }
}
