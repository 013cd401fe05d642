use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::api::{ApiError, ResumeApi};
use crate::models::{ResumeDetail, ResumeSummary};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one issued request. Ids are never reused within a process, so a
/// reply can only ever match the request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    ListResumes,
    FetchResume(i64),
    Upload(PathBuf),
}

/// A request a component wants issued.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub id: RequestId,
    pub call: ApiCall,
}

impl Command {
    pub fn new(call: ApiCall) -> Self {
        Self {
            id: RequestId::next(),
            call,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Summaries(Vec<ResumeSummary>),
    Detail(ResumeDetail),
}

#[derive(Debug)]
pub struct Completion {
    pub id: RequestId,
    pub result: Result<Reply, ApiError>,
}

/// What a component asks of its host after handling input or a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Dispatch(Command),
    Cancel(RequestId),
    Alert(String),
}

/// Issues and cancels requests on behalf of the UI.
pub trait Dispatch {
    fn dispatch(&mut self, command: Command);
    fn cancel(&mut self, id: RequestId);

    /// Called once a completion for `id` has been received.
    fn settle(&mut self, _id: RequestId) {}
}

async fn perform(api: &dyn ResumeApi, call: ApiCall) -> Result<Reply, ApiError> {
    match call {
        ApiCall::ListResumes => api.list_resumes().await.map(Reply::Summaries),
        ApiCall::FetchResume(id) => api.get_resume(id).await.map(Reply::Detail),
        ApiCall::Upload(path) => api.upload_resume(&path).await.map(Reply::Detail),
    }
}

/// Runs each command as its own task on the tokio runtime and reports the
/// outcome on a channel the UI thread drains. Cancelling aborts the task.
pub struct Dispatcher {
    api: Arc<dyn ResumeApi>,
    runtime: Handle,
    tx: UnboundedSender<Completion>,
    inflight: HashMap<RequestId, JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn ResumeApi>, runtime: Handle) -> (Self, UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            api,
            runtime,
            tx,
            inflight: HashMap::new(),
        };
        (dispatcher, rx)
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }
}

impl Dispatch for Dispatcher {
    fn dispatch(&mut self, command: Command) {
        let Command { id, call } = command;
        tracing::debug!(request = %id, ?call, "dispatching");

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let handle = self.runtime.spawn(async move {
            let result = perform(api.as_ref(), call).await;
            if let Err(e) = &result {
                tracing::warn!(request = %id, error = %e, "request failed");
            }
            // The receiver is gone only when the UI has shut down.
            let _ = tx.send(Completion { id, result });
        });
        self.inflight.insert(id, handle);
    }

    fn cancel(&mut self, id: RequestId) {
        if let Some(handle) = self.inflight.remove(&id) {
            tracing::debug!(request = %id, "cancelling");
            handle.abort();
        }
    }

    fn settle(&mut self, id: RequestId) {
        self.inflight.remove(&id);
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        for (_, handle) in self.inflight.drain() {
            handle.abort();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::time::Duration;

    struct SlowApi;

    #[async_trait]
    impl ResumeApi for SlowApi {
        async fn list_resumes(&self) -> Result<Vec<ResumeSummary>, ApiError> {
            Ok(vec![ResumeSummary {
                id: 1,
                filename: "a.pdf".into(),
                name: None,
                email: None,
                phone: None,
                resume_rating: Some(8.0),
            }])
        }

        async fn get_resume(&self, _id: i64) -> Result<ResumeDetail, ApiError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ResumeDetail::default())
        }

        async fn upload_resume(&self, _file: &Path) -> Result<ResumeDetail, ApiError> {
            Err(ApiError::Status {
                code: 500,
                detail: Some("boom".into()),
            })
        }
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::next();
        let b = RequestId::next();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_dispatch_delivers_completion() {
        let (mut dispatcher, mut rx) = Dispatcher::new(Arc::new(SlowApi), Handle::current());
        let command = Command::new(ApiCall::ListResumes);
        let id = command.id;
        dispatcher.dispatch(command);

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.id, id);
        assert!(matches!(completion.result, Ok(Reply::Summaries(ref rows)) if rows.len() == 1));

        dispatcher.settle(id);
        assert_eq!(dispatcher.inflight(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_delivered_not_swallowed() {
        let (mut dispatcher, mut rx) = Dispatcher::new(Arc::new(SlowApi), Handle::current());
        dispatcher.dispatch(Command::new(ApiCall::Upload("cv.pdf".into())));

        let completion = rx.recv().await.unwrap();
        let err = completion.result.unwrap_err();
        assert_eq!(err.user_message(), "boom");
    }

    #[tokio::test]
    async fn test_cancelled_request_never_completes() {
        let (mut dispatcher, mut rx) = Dispatcher::new(Arc::new(SlowApi), Handle::current());
        let slow = Command::new(ApiCall::FetchResume(7));
        let slow_id = slow.id;
        dispatcher.dispatch(slow);
        dispatcher.cancel(slow_id);
        assert_eq!(dispatcher.inflight(), 0);

        let fast = Command::new(ApiCall::ListResumes);
        let fast_id = fast.id;
        dispatcher.dispatch(fast);

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.id, fast_id);

        drop(dispatcher);
        assert!(rx.recv().await.is_none());
    }
}
