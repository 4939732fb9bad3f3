//! Render service - owns the worker thread, view state, and page cache.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use flume::{Receiver, Sender};
use log::{info, warn};

use super::DEFAULT_CACHE_CAPACITY;
use super::cache::PageCache;
use super::document::{PageSize, ViewerError};
use super::pipeline::RenderedPage;
use super::request::{RenderFault, RenderRequest, RenderResponse, RequestId};
use super::state::{Command, Effect, ViewState};
use super::worker::render_worker;

/// Document metadata reported by the worker once the file is parsed.
#[derive(Clone, Debug)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
}

/// Manages a loaded document: view state, render worker, and cache.
pub struct RenderService {
    state: ViewState,
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    response_tx: Sender<RenderResponse>,
    cache: Arc<Mutex<PageCache>>,
    next_request_id: u64,
    last_render: Option<RequestId>,
    doc_info: Option<DocumentInfo>,
    source: Option<PathBuf>,
}

impl RenderService {
    /// Load a document from a file with the default cache capacity.
    pub fn open(path: &Path) -> Result<Self, ViewerError> {
        Self::open_with_config(path, DEFAULT_CACHE_CAPACITY)
    }

    /// Load a document from a file.
    pub fn open_with_config(path: &Path, cache_capacity: usize) -> Result<Self, ViewerError> {
        let bytes = std::fs::read(path).map_err(|source| ViewerError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        let mut service = Self::from_bytes_with_config(bytes, cache_capacity);
        service.source = Some(path.to_path_buf());
        Ok(service)
    }

    /// Load a document from a raw byte buffer.
    ///
    /// Parsing happens on the worker thread; failures arrive as an `Error`
    /// response rather than here.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::from_bytes_with_config(bytes, DEFAULT_CACHE_CAPACITY)
    }

    #[must_use]
    pub fn from_bytes_with_config(bytes: Vec<u8>, cache_capacity: usize) -> Self {
        let cache = Arc::new(Mutex::new(PageCache::new(cache_capacity)));
        let (request_tx, response_tx, response_rx) = spawn_worker(bytes, Arc::clone(&cache));

        Self {
            state: ViewState::new(),
            request_tx,
            response_rx,
            response_tx,
            cache,
            next_request_id: 1,
            last_render: None,
            doc_info: None,
            source: None,
        }
    }

    /// Get current view state
    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Get document metadata, if the worker has reported it yet
    #[must_use]
    pub fn document_info(&self) -> Option<&DocumentInfo> {
        self.doc_info.as_ref()
    }

    /// Apply a command to the view state and carry out its effects
    pub fn apply_command(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::InvalidateCache => {
                    self.cache
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .invalidate_all();
                }

                Effect::RenderCurrentPage => {
                    self.request_page(self.state.current_page());
                }

                Effect::ReloadDocument => {
                    self.reload();
                }
            }
        }
    }

    /// Request a page to be rendered with the current view parameters
    pub fn request_page(&mut self, page: usize) -> RequestId {
        let id = self.next_id();
        let params = self.state.render_params();

        let _ = self
            .request_tx
            .send(RenderRequest::Page { id, page, params });
        self.last_render = Some(id);

        id
    }

    /// Render the current page
    pub fn render_current(&mut self) -> RequestId {
        self.request_page(self.state.current_page())
    }

    /// Ask the worker for a page's intrinsic size
    pub fn request_page_size(&mut self, page: usize) -> RequestId {
        let id = self.next_id();
        let _ = self.request_tx.send(RenderRequest::PageSize { id, page });
        id
    }

    /// Poll for completed responses without blocking
    pub fn poll_responses(&mut self) -> Vec<RenderResponse> {
        let mut responses = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            self.note_response(&response);
            responses.push(response);
        }
        responses
    }

    /// Block until the worker reports document metadata.
    ///
    /// Returns the fault if the document failed to parse.
    pub fn wait_document_info(&mut self, timeout: Duration) -> Result<DocumentInfo, RenderFault> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(info) = &self.doc_info {
                return Ok(info.clone());
            }
            let response = self.recv_until(deadline, "document to open")?;
            if let RenderResponse::Error { error, .. } = response {
                return Err(error);
            }
        }
    }

    /// Block until the most recently requested render completes.
    ///
    /// Responses for superseded or stale requests are skipped; a
    /// document-level fault is terminal.
    pub fn wait_page(&mut self, timeout: Duration) -> Result<Arc<RenderedPage>, RenderFault> {
        let Some(expected) = self.last_render else {
            return Err(RenderFault::generic("no render request in flight"));
        };

        let deadline = Instant::now() + timeout;
        loop {
            match self.recv_until(deadline, "page render")? {
                RenderResponse::Page { id, data, .. } if id == expected => return Ok(data),
                RenderResponse::Error { id, error }
                    if id == expected || id == RequestId::DOCUMENT =>
                {
                    return Err(error);
                }
                RenderResponse::Error { error, .. } => {
                    warn!("stale render failed: {error}");
                }
                _ => {}
            }
        }
    }

    /// Block until a specific page-size request completes.
    pub fn wait_page_size(
        &mut self,
        request: RequestId,
        timeout: Duration,
    ) -> Result<PageSize, RenderFault> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.recv_until(deadline, "page size")? {
                RenderResponse::PageSize { id, size, .. } if id == request => return Ok(size),
                RenderResponse::Error { id, error }
                    if id == request || id == RequestId::DOCUMENT =>
                {
                    return Err(error);
                }
                _ => {}
            }
        }
    }

    fn recv_until(
        &mut self,
        deadline: Instant,
        what: &str,
    ) -> Result<RenderResponse, RenderFault> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.response_rx.recv_timeout(remaining) {
            Ok(response) => {
                self.note_response(&response);
                Ok(response)
            }
            Err(_) => Err(RenderFault::generic(format!(
                "timed out waiting for {what}"
            ))),
        }
    }

    fn note_response(&mut self, response: &RenderResponse) {
        if let RenderResponse::DocumentInfo { page_count, title } = response {
            info!("document loaded: {page_count} pages");
            self.doc_info = Some(DocumentInfo {
                page_count: *page_count,
                title: title.clone(),
            });
            let _ = self.state.apply(Command::SetPageCount(*page_count));
        }
    }

    /// Replace the loaded document wholesale with a new byte buffer.
    pub fn load_bytes(&mut self, bytes: Vec<u8>) {
        self.shutdown();
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .invalidate_all();

        let (request_tx, response_tx, response_rx) = spawn_worker(bytes, Arc::clone(&self.cache));
        self.request_tx = request_tx;
        self.response_tx = response_tx;
        self.response_rx = response_rx;
        self.doc_info = None;
        self.last_render = None;
    }

    fn reload(&mut self) {
        let Some(path) = self.source.clone() else {
            warn!("reload requested for a document with no backing file");
            return;
        };
        match std::fs::read(&path) {
            Ok(bytes) => self.load_bytes(bytes),
            Err(source) => {
                let error = RenderFault::from(ViewerError::FileRead {
                    path: path.display().to_string(),
                    source,
                });
                let _ = self.response_tx.send(RenderResponse::Error {
                    id: RequestId::DOCUMENT,
                    error,
                });
            }
        }
    }

    /// Shutdown the worker
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker(
    bytes: Vec<u8>,
    cache: Arc<Mutex<PageCache>>,
) -> (
    Sender<RenderRequest>,
    Sender<RenderResponse>,
    Receiver<RenderResponse>,
) {
    // flume rather than std::sync::mpsc so the service can keep a cloned
    // response sender for reporting its own faults into the same stream
    // the host already polls.
    let (request_tx, request_rx) = flume::unbounded();
    let (response_tx, response_rx) = flume::unbounded();

    let worker_tx = response_tx.clone();
    std::thread::spawn(move || render_worker(bytes, request_rx, worker_tx, cache));

    (request_tx, response_tx, response_rx)
}
