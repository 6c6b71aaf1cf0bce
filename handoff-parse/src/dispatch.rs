//! Background section splitting over request/response messages.
//!
//! [`AsyncDispatcher`] owns at most one worker plus the table of pending
//! completions keyed by request id. Without a worker every call resolves
//! inline. Completion order follows response arrival, never request order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use handoff_core::{
    ContentPayload, HandoffConfig, HandoffError, Section, WorkerRequest, WorkerResponse,
};

use crate::sections::split_sections;
use crate::signals::scan_keywords;

/// Worker-side handling of one request.
pub fn handle_request(request: WorkerRequest) -> WorkerResponse {
    match request {
        WorkerRequest::ParseDocument { id, payload } => WorkerResponse::ParseResult {
            id,
            result: split_sections(&payload.content),
        },
        WorkerRequest::ExtractKeywords { id, payload } => WorkerResponse::KeywordsResult {
            id,
            result: scan_keywords(&payload.content),
        },
    }
}

type ParseCallback = Box<dyn FnOnce(Vec<Section>) + Send>;
type KeywordsCallback = Box<dyn FnOnce(Vec<String>) + Send>;

enum Completion {
    Parse(ParseCallback),
    Keywords(KeywordsCallback),
}

impl Completion {
    fn resolve(self, response: WorkerResponse) -> bool {
        match (self, response) {
            (Self::Parse(callback), WorkerResponse::ParseResult { result, .. }) => {
                callback(result);
                true
            }
            (Self::Keywords(callback), WorkerResponse::KeywordsResult { result, .. }) => {
                callback(result);
                true
            }
            (_, response) => {
                tracing::warn!(id = response.id(), "response kind does not match request");
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RequestKind {
    Parse,
    Keywords,
}

impl RequestKind {
    fn request(self, id: u64, content: String) -> WorkerRequest {
        let payload = ContentPayload { content };
        match self {
            Self::Parse => WorkerRequest::ParseDocument { id, payload },
            Self::Keywords => WorkerRequest::ExtractKeywords { id, payload },
        }
    }
}

/// Outstanding completions keyed by request id.
#[derive(Default)]
pub struct PendingTable {
    entries: Mutex<HashMap<u64, Completion>>,
}

impl PendingTable {
    fn entries(&self) -> MutexGuard<'_, HashMap<u64, Completion>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, id: u64, completion: Completion) {
        self.entries().insert(id, completion);
    }

    fn remove(&self, id: u64) -> Option<Completion> {
        self.entries().remove(&id)
    }

    /// Run and drop the completion registered for the response id.
    ///
    /// Returns false for ids that are unknown or already completed.
    pub fn complete(&self, response: WorkerResponse) -> bool {
        let id = response.id();
        let Some(completion) = self.remove(id) else {
            tracing::warn!(id, "response for unknown request id");
            return false;
        };
        completion.resolve(response)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Channel into a background execution context.
pub trait WorkerTransport: Send + Sync {
    fn post(&self, request: WorkerRequest) -> Result<(), HandoffError>;
}

/// Worker thread plus a listener thread that feeds responses back into the
/// pending table.
pub struct ThreadWorker {
    requests: Option<mpsc::Sender<WorkerRequest>>,
    worker: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl ThreadWorker {
    pub fn spawn(pending: Arc<PendingTable>) -> Result<Self, HandoffError> {
        let (request_tx, request_rx) = mpsc::channel::<WorkerRequest>();
        let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>();

        let worker = thread::Builder::new()
            .name("handoff-worker".to_string())
            .spawn(move || {
                for request in request_rx {
                    let id = request.id();
                    if response_tx.send(handle_request(request)).is_err() {
                        tracing::debug!(id, "listener gone, stopping worker");
                        break;
                    }
                }
            })
            .map_err(|err| HandoffError::WorkerUnavailable(err.to_string()))?;

        let listener = thread::Builder::new()
            .name("handoff-listener".to_string())
            .spawn(move || {
                for response in response_rx {
                    pending.complete(response);
                }
            })
            .map_err(|err| HandoffError::WorkerUnavailable(err.to_string()))?;

        tracing::info!("background handoff worker started");
        Ok(Self {
            requests: Some(request_tx),
            worker: Some(worker),
            listener: Some(listener),
        })
    }
}

impl WorkerTransport for ThreadWorker {
    fn post(&self, request: WorkerRequest) -> Result<(), HandoffError> {
        let sender = self
            .requests
            .as_ref()
            .ok_or(HandoffError::WorkerDisconnected)?;
        sender
            .send(request)
            .map_err(|_| HandoffError::WorkerDisconnected)
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker, which closes the
        // response channel and ends the listener.
        self.requests.take();
        for handle in [self.worker.take(), self.listener.take()].into_iter().flatten() {
            let _ = handle.join();
        }
    }
}

/// Result that arrives once, from whichever context ran the request.
pub struct PendingResult<T> {
    receiver: mpsc::Receiver<T>,
}

impl<T> PendingResult<T> {
    fn channel() -> (mpsc::Sender<T>, Self) {
        let (sender, receiver) = mpsc::channel();
        (sender, Self { receiver })
    }

    /// Block until the result arrives or its completion is dropped.
    pub fn wait(self) -> Result<T, HandoffError> {
        self.receiver
            .recv()
            .map_err(|_| HandoffError::WorkerDisconnected)
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, HandoffError> {
        self.receiver.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => HandoffError::Timeout,
            RecvTimeoutError::Disconnected => HandoffError::WorkerDisconnected,
        })
    }

    pub fn try_take(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

/// Service object for off-thread parsing. Construct once and share by
/// reference.
pub struct AsyncDispatcher {
    transport: Option<Box<dyn WorkerTransport>>,
    pending: Arc<PendingTable>,
    next_id: AtomicU64,
}

impl AsyncDispatcher {
    /// No background context; every request resolves inline.
    pub fn synchronous() -> Self {
        Self {
            transport: None,
            pending: Arc::new(PendingTable::default()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Start a [`ThreadWorker`], falling back to inline parsing when the
    /// config disables it or the threads cannot be spawned.
    pub fn with_thread_worker(config: &HandoffConfig) -> Self {
        if !config.use_background_worker {
            tracing::debug!("background worker disabled by config");
            return Self::synchronous();
        }

        let pending = Arc::new(PendingTable::default());
        match ThreadWorker::spawn(Arc::clone(&pending)) {
            Ok(worker) => Self {
                transport: Some(Box::new(worker)),
                pending,
                next_id: AtomicU64::new(0),
            },
            Err(err) => {
                tracing::warn!(error = %err, "falling back to synchronous parsing");
                Self::synchronous()
            }
        }
    }

    /// Use a caller-provided transport. Responses must come back through
    /// [`AsyncDispatcher::deliver`].
    pub fn with_transport(transport: Box<dyn WorkerTransport>) -> Self {
        Self {
            transport: Some(transport),
            pending: Arc::new(PendingTable::default()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn has_worker(&self) -> bool {
        self.transport.is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Hand a worker response to its waiting callback.
    pub fn deliver(&self, response: WorkerResponse) -> bool {
        self.pending.complete(response)
    }

    /// Split `content` in the background and call `callback` with the
    /// sections. Returns the request id, or `None` when it ran inline.
    pub fn parse_with<F>(&self, content: &str, callback: F) -> Option<u64>
    where
        F: FnOnce(Vec<Section>) + Send + 'static,
    {
        self.dispatch(RequestKind::Parse, content, Completion::Parse(Box::new(callback)))
    }

    pub fn extract_keywords_with<F>(&self, content: &str, callback: F) -> Option<u64>
    where
        F: FnOnce(Vec<String>) + Send + 'static,
    {
        self.dispatch(
            RequestKind::Keywords,
            content,
            Completion::Keywords(Box::new(callback)),
        )
    }

    pub fn parse_async(&self, content: &str) -> PendingResult<Vec<Section>> {
        let (sender, pending) = PendingResult::channel();
        self.parse_with(content, move |sections| {
            let _ = sender.send(sections);
        });
        pending
    }

    pub fn extract_keywords_async(&self, content: &str) -> PendingResult<Vec<String>> {
        let (sender, pending) = PendingResult::channel();
        self.extract_keywords_with(content, move |keywords| {
            let _ = sender.send(keywords);
        });
        pending
    }

    fn dispatch(&self, kind: RequestKind, content: &str, completion: Completion) -> Option<u64> {
        let Some(transport) = &self.transport else {
            completion.resolve(handle_request(kind.request(0, content.to_string())));
            return None;
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.pending.register(id, completion);
        match transport.post(kind.request(id, content.to_string())) {
            Ok(()) => {
                tracing::trace!(id, ?kind, "request posted to worker");
                Some(id)
            }
            Err(err) => {
                tracing::warn!(id, error = %err, "worker post failed, running inline");
                if let Some(completion) = self.pending.remove(id) {
                    completion.resolve(handle_request(kind.request(id, content.to_string())));
                }
                None
            }
        }
    }
}
