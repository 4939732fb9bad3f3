//! Render worker - owns the engine document on a dedicated thread.
//!
//! A single worker serves one display surface, so renders are strictly
//! serialized: a new render never starts writing before the previous one
//! has finished. Requests that pile up while a render is in progress are
//! collapsed to the newest one.

use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::debug;

use super::cache::{CacheKey, PageCache};
use super::document::Document;
use super::pipeline::render_page;
use super::request::{RenderFault, RenderParams, RenderRequest, RenderResponse, RequestId};

/// Main worker function - runs in a dedicated thread
pub fn render_worker(
    bytes: Vec<u8>,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
    cache: Arc<Mutex<PageCache>>,
) {
    let doc = match Document::from_bytes(&bytes) {
        Ok(doc) => doc,
        Err(e) => {
            let _ = responses.send(RenderResponse::Error {
                id: RequestId::DOCUMENT,
                error: RenderFault::from(e),
            });
            return;
        }
    };

    let _ = responses.send(RenderResponse::DocumentInfo {
        page_count: doc.page_count(),
        title: doc.title(),
    });

    while let Ok(first) = requests.recv() {
        let mut batch = vec![first];
        while let Ok(more) = requests.try_recv() {
            batch.push(more);
        }

        // Latest-wins: only the newest queued page render is worth doing,
        // the rest are answered as superseded.
        let newest_page = batch
            .iter()
            .rposition(|r| matches!(r, RenderRequest::Page { .. }));

        let mut shutdown = false;
        for (idx, request) in batch.into_iter().enumerate() {
            match request {
                RenderRequest::Page { id, page, .. } if Some(idx) != newest_page => {
                    debug!("render of page {page} superseded before it started");
                    let _ = responses.send(RenderResponse::Superseded(id));
                }

                RenderRequest::Page { id, page, params } => {
                    handle_page_request(&doc, id, page, &params, &cache, &responses);
                }

                RenderRequest::PageSize { id, page } => {
                    let response = match doc.page_size(page) {
                        Ok(size) => RenderResponse::PageSize { id, page, size },
                        Err(e) => RenderResponse::Error {
                            id,
                            error: RenderFault::from(e),
                        },
                    };
                    let _ = responses.send(response);
                }

                RenderRequest::Shutdown => {
                    shutdown = true;
                    break;
                }
            }
        }
        if shutdown {
            break;
        }
    }
}

fn handle_page_request(
    doc: &Document,
    id: RequestId,
    page: usize,
    params: &RenderParams,
    cache: &Arc<Mutex<PageCache>>,
    responses: &Sender<RenderResponse>,
) {
    let key = CacheKey::from_params(page, params);

    let cached = cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get(&key);
    if let Some(data) = cached {
        debug!("page {page} served from cache");
        let _ = responses.send(RenderResponse::Page { id, page, data });
        return;
    }

    match render_page(doc, page, params) {
        Ok(data) => {
            let data = cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(key, data);
            let _ = responses.send(RenderResponse::Page { id, page, data });
        }
        Err(e) => {
            let _ = responses.send(RenderResponse::Error { id, error: e });
        }
    }
}
