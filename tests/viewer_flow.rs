//! End-to-end tests over an in-memory single-page PDF.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pagepane::test_utils::minimal_pdf;
use pagepane::viewer::{
    Command, Document, PageCache, RenderParams, RenderRequest, RenderResponse, RenderService,
    RequestId, SurfaceSize, ViewerError, fit_scale, render_page, render_worker, surface_size,
};

const TIMEOUT: Duration = Duration::from_secs(60);

fn params(scale: f32, dpr: f32) -> RenderParams {
    RenderParams {
        scale,
        device_pixel_ratio: dpr,
        container: SurfaceSize::default(),
    }
}

#[test]
fn open_reports_page_count_and_size() {
    let doc = Document::from_bytes(&minimal_pdf(200, 300)).expect("parse");
    assert_eq!(doc.page_count(), 1);

    let size = doc.page_size(0).expect("page size");
    assert!((size.width - 200.0).abs() < 0.5);
    assert!((size.height - 300.0).abs() < 0.5);
}

#[test]
fn out_of_range_page_is_reported() {
    let doc = Document::from_bytes(&minimal_pdf(200, 300)).expect("parse");
    match doc.page_size(5) {
        Err(ViewerError::PageNotFound { page, page_count }) => {
            assert_eq!(page, 5);
            assert_eq!(page_count, 1);
        }
        other => panic!("expected PageNotFound, got {other:?}"),
    }
}

#[test]
fn malformed_bytes_fail_to_parse() {
    assert!(matches!(
        Document::from_bytes(b"definitely not a pdf"),
        Err(ViewerError::DocumentParse(_))
    ));
}

#[test]
fn render_respects_device_pixel_ratio() {
    let doc = Document::from_bytes(&minimal_pdf(200, 300)).expect("parse");

    let page = render_page(&doc, 0, &params(1.0, 1.0)).expect("render at dpr 1");
    assert_eq!((page.width_px, page.height_px), (200, 300));
    assert_eq!(page.pixels.len(), 200 * 300 * 3);

    let page = render_page(&doc, 0, &params(1.0, 2.0)).expect("render at dpr 2");
    assert_eq!((page.width_px, page.height_px), (400, 600));
    assert_eq!(page.pixels.len(), 400 * 600 * 3);
}

#[test]
fn render_scales_the_viewport() {
    let doc = Document::from_bytes(&minimal_pdf(200, 300)).expect("parse");
    let page = render_page(&doc, 0, &params(0.5, 1.0)).expect("render");
    assert_eq!((page.width_px, page.height_px), (100, 150));
    assert_eq!(page.viewport_width, 100.0);
    assert_eq!(page.viewport_height, 150.0);
}

#[test]
fn fit_scale_drives_render_size() {
    let doc = Document::from_bytes(&minimal_pdf(200, 300)).expect("parse");
    let size = doc.page_size(0).expect("page size");

    let scale = fit_scale(size.width, size.height, 100.0, 100.0);
    assert!((scale - 100.0 / 300.0).abs() < 1e-4);

    let page = render_page(&doc, 0, &params(scale, 1.0)).expect("render");
    let expected = surface_size(size.width * scale, size.height * scale, 1.0);
    assert_eq!((page.width_px, page.height_px), expected);
}

#[test]
fn fractional_viewport_is_floored() {
    let doc = Document::from_bytes(&minimal_pdf(200, 300)).expect("parse");

    // viewport 200.4 x 300.6 at dpr 2: the engine rounds the pixmap out to
    // 401 px wide, the surface is floored to 400
    let page = render_page(&doc, 0, &params(1.002, 2.0)).expect("render");
    assert_eq!((page.width_px, page.height_px), (400, 601));
    assert_eq!(page.pixels.len(), 400 * 601 * 3);
}

#[test]
fn empty_page_renders_white() {
    let doc = Document::from_bytes(&minimal_pdf(50, 50)).expect("parse");
    let page = render_page(&doc, 0, &params(1.0, 1.0)).expect("render");
    assert!(page.pixels.iter().all(|&b| b == 0xFF));
}

#[test]
fn service_end_to_end() {
    let mut service = RenderService::from_bytes(minimal_pdf(200, 300));
    let info = service.wait_document_info(TIMEOUT).expect("document info");
    assert_eq!(info.page_count, 1);
    assert_eq!(service.state().page_count(), 1);

    service.apply_command(Command::SetContainer(SurfaceSize::new(300, 300)));
    service.apply_command(Command::SetScale(0.5));
    service.render_current();

    let page = service.wait_page(TIMEOUT).expect("rendered page");
    assert_eq!(page.page, 0);
    assert_eq!((page.width_px, page.height_px), (100, 150));
}

#[test]
fn service_surfaces_parse_failures() {
    let mut service = RenderService::from_bytes(b"not a pdf".to_vec());
    assert!(service.wait_document_info(TIMEOUT).is_err());
}

#[test]
fn render_wait_fails_fast_on_parse_failure() {
    // caller skips wait_document_info and asks for a render right away: the
    // document-level fault must end the wait, not leave it spinning until
    // the timeout
    let mut service = RenderService::from_bytes(b"junk".to_vec());
    service.render_current();

    let err = service.wait_page(TIMEOUT).expect_err("document never parsed");
    assert!(err.to_string().contains("parse"), "{err}");
}

#[test]
fn service_reports_page_sizes() {
    let mut service = RenderService::from_bytes(minimal_pdf(200, 300));
    let _ = service.wait_document_info(TIMEOUT).expect("document info");

    let request = service.request_page_size(0);
    let size = service.wait_page_size(request, TIMEOUT).expect("page size");
    assert!((size.width - 200.0).abs() < 0.5);

    let request = service.request_page_size(7);
    assert!(service.wait_page_size(request, TIMEOUT).is_err());
}

#[test]
fn queued_renders_collapse_to_newest() {
    let (request_tx, request_rx) = flume::unbounded();
    let (response_tx, response_rx) = flume::unbounded();
    let cache = Arc::new(Mutex::new(PageCache::new(4)));

    // queue everything before the worker starts, so the whole burst lands
    // in one batch
    for (i, scale) in [1.0f32, 1.1, 1.2].iter().enumerate() {
        request_tx
            .send(RenderRequest::Page {
                id: RequestId::new(i as u64 + 1),
                page: 0,
                params: params(*scale, 1.0),
            })
            .unwrap();
    }
    request_tx.send(RenderRequest::Shutdown).unwrap();

    render_worker(minimal_pdf(100, 100), request_rx, response_tx, cache);

    let mut superseded = Vec::new();
    let mut rendered = Vec::new();
    while let Ok(response) = response_rx.try_recv() {
        match response {
            RenderResponse::Superseded(id) => superseded.push(id),
            RenderResponse::Page { id, .. } => rendered.push(id),
            RenderResponse::DocumentInfo { .. } | RenderResponse::PageSize { .. } => {}
            RenderResponse::Error { error, .. } => panic!("render failed: {error}"),
        }
    }

    assert_eq!(superseded, vec![RequestId::new(1), RequestId::new(2)]);
    assert_eq!(rendered, vec![RequestId::new(3)]);
}

#[test]
fn repeated_render_is_served_from_cache() {
    let (request_tx, request_rx) = flume::unbounded();
    let (response_tx, response_rx) = flume::unbounded();
    let cache = Arc::new(Mutex::new(PageCache::new(4)));

    request_tx
        .send(RenderRequest::Page {
            id: RequestId::new(1),
            page: 0,
            params: params(1.0, 1.0),
        })
        .unwrap();
    request_tx.send(RenderRequest::Shutdown).unwrap();
    render_worker(
        minimal_pdf(100, 100),
        request_rx,
        response_tx,
        Arc::clone(&cache),
    );
    drop(response_rx);

    let cached = cache
        .lock()
        .unwrap()
        .get(&pagepane::viewer::CacheKey::from_params(0, &params(1.0, 1.0)));
    assert!(cached.is_some());
}
