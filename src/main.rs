use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};

use pagepane::notification::{NotificationLevel, NotificationManager};
use pagepane::settings::Settings;
use pagepane::viewer::{
    Command, RenderService, RenderedPage, SurfaceSize, ViewerError, clamp_zoom, percentage,
};

const OPEN_TIMEOUT: Duration = Duration::from_secs(30);
const RENDER_TIMEOUT: Duration = Duration::from_secs(120);

/// Render a PDF page to a PNG with zoom and fit-to-container scaling.
#[derive(Parser, Debug)]
#[command(name = "pagepane", version)]
struct Args {
    /// Path to the PDF file
    pdf: Option<PathBuf>,

    /// Page number to render (1-indexed)
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Explicit zoom factor; overrides the fit-to-container scale
    #[arg(short, long)]
    zoom: Option<f32>,

    /// Zoom-in steps applied after the initial scale
    #[arg(long, default_value_t = 0, value_name = "STEPS")]
    zoom_in: u32,

    /// Zoom-out steps applied after the initial scale
    #[arg(long, default_value_t = 0, value_name = "STEPS")]
    zoom_out: u32,

    /// Container to fit the page into, as WIDTHxHEIGHT in logical pixels
    #[arg(long, value_parser = parse_surface_size, value_name = "WxH")]
    fit: Option<SurfaceSize>,

    /// Device pixel ratio of the target display
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Output PNG path
    #[arg(short, long, default_value = "page.png")]
    output: PathBuf,
}

fn parse_surface_size(s: &str) -> Result<SurfaceSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = w.trim().parse().map_err(|_| format!("bad width '{w}'"))?;
    let height = h.trim().parse().map_err(|_| format!("bad height '{h}'"))?;
    Ok(SurfaceSize { width, height })
}

fn main() {
    let args = Args::parse();
    let settings = Settings::load_or_default();
    let mut notifications = NotificationManager::new(Duration::from_secs(10));

    if let Err(e) = init_logging(&settings) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    let code = match run(&args, &settings) {
        Ok(()) => 0,
        Err(e) => {
            error!("{e:#}");
            notifications.push(format!("{e:#}"), NotificationLevel::Error);
            1
        }
    };

    for notification in notifications.active() {
        eprintln!("[{}] {}", notification.level, notification.message);
    }
    std::process::exit(code);
}

fn init_logging(settings: &Settings) -> Result<()> {
    let path = settings
        .log_file
        .clone()
        .unwrap_or_else(|| PathBuf::from("pagepane.log"));
    WriteLogger::init(LevelFilter::Info, LogConfig::default(), File::create(path)?)?;
    Ok(())
}

fn run(args: &Args, settings: &Settings) -> Result<()> {
    let Some(path) = &args.pdf else {
        bail!("{}", ViewerError::NoFileSelected);
    };

    let mut service = RenderService::open_with_config(path, settings.cache_capacity)
        .with_context(|| format!("failed to load {}", path.display()))?;

    let info = service
        .wait_document_info(OPEN_TIMEOUT)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", path.display()))?;
    info!("loaded {} ({} pages)", path.display(), info.page_count);
    if let Some(title) = &info.title {
        info!("title: {title}");
    }

    if args.page == 0 || args.page > info.page_count {
        bail!(
            "{}",
            ViewerError::PageNotFound {
                page: args.page,
                page_count: info.page_count,
            }
        );
    }
    let page_index = args.page - 1;

    service.apply_command(Command::SetDevicePixelRatio(args.dpr));
    if let Some(fit) = args.fit {
        service.apply_command(Command::SetContainer(fit));
    }
    service.apply_command(Command::GoToPage(page_index));

    match (args.zoom, args.fit) {
        (Some(zoom), _) => service.apply_command(Command::SetScale(zoom)),
        (None, Some(_)) => {
            let request = service.request_page_size(page_index);
            let size = service
                .wait_page_size(request, OPEN_TIMEOUT)
                .map_err(|e| anyhow::anyhow!("failed to measure page {}: {e}", args.page))?;
            service.apply_command(Command::FitToContainer(size));
        }
        (None, None) => {}
    }

    if args.zoom_in > 0 || args.zoom_out > 0 {
        let mut scale = service.state().scale();
        for _ in 0..args.zoom_in {
            scale = clamp_zoom(scale, settings.zoom_in_rate);
        }
        for _ in 0..args.zoom_out {
            scale = clamp_zoom(scale, settings.zoom_out_rate);
        }
        service.apply_command(Command::SetScale(scale));
    }

    println!("zoom: {}%", percentage(service.state().scale()));

    service.render_current();
    let page = service
        .wait_page(RENDER_TIMEOUT)
        .map_err(|e| anyhow::anyhow!("failed to render page {}: {e}", args.page))?;
    save_png(&page, &args.output)?;
    println!(
        "wrote {} ({}x{} px)",
        args.output.display(),
        page.width_px,
        page.height_px
    );

    Ok(())
}

fn save_png(page: &RenderedPage, path: &Path) -> Result<()> {
    let image = image::RgbImage::from_raw(page.width_px, page.height_px, page.pixels.clone())
        .context("rendered page buffer does not match its dimensions")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagepane::test_utils::minimal_pdf;
    use pagepane::viewer::surface_size;

    #[test]
    fn missing_file_is_rejected_before_any_load() {
        let args = Args::try_parse_from(["pagepane"]).expect("parse");
        assert!(args.pdf.is_none());

        let err = run(&args, &Settings::default()).expect_err("must fail");
        assert_eq!(err.to_string(), ViewerError::NoFileSelected.to_string());
    }

    #[test]
    fn surface_size_argument_parses_both_separators() {
        assert_eq!(parse_surface_size("800x600"), Ok(SurfaceSize::new(800, 600)));
        assert_eq!(parse_surface_size("800X600"), Ok(SurfaceSize::new(800, 600)));
        assert!(parse_surface_size("800").is_err());
        assert!(parse_surface_size("800xtall").is_err());
    }

    #[test]
    fn fit_flow_writes_a_fitted_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, minimal_pdf(200, 300)).expect("write pdf");
        let out = dir.path().join("page.png");

        let args = Args::try_parse_from([
            "pagepane",
            pdf.to_str().expect("utf8 path"),
            "--fit",
            "100x100",
            "--output",
            out.to_str().expect("utf8 path"),
        ])
        .expect("parse");

        run(&args, &Settings::default()).expect("run");

        let scale = 100.0f32 / 300.0;
        let written = image::image_dimensions(&out).expect("read png");
        assert_eq!(written, surface_size(200.0 * scale, 300.0 * scale, 1.0));
    }
}
