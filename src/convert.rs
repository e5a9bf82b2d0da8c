//! Conversion entry points.
//!
//! The pipeline is linear and blocking: open the document, then for each
//! selected page render → invert → append, then finish the output.
//! [`convert_sync`] runs it on the calling thread; [`convert`] moves the same
//! work onto tokio's blocking pool for async callers.

use crate::config::ConversionConfig;
use crate::error::{DarkModeError, PageError};
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
use crate::page::{InvertedPage, Page};
use crate::pipeline::invert::PageInverter;
use crate::pipeline::write::OutputWriter;
use crate::pipeline::{input, render};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a PDF to dark mode.
///
/// # Arguments
/// * `input`  — path to the source PDF
/// * `output` — destination file (PDF output) or directory (image output);
///   `None` picks [`input::default_output_path`]
/// * `config` — conversion configuration
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some pages were skipped
/// (check `output.stats.failed_pages`). A document with zero pages produces
/// an empty output and no error.
///
/// # Errors
/// Returns `Err(DarkModeError)` for fatal errors only:
/// - file not found / permission denied / not a PDF / corrupt / encrypted
/// - a page failed while `skip_failed_pages` is off
/// - the output could not be written
pub fn convert_sync(
    input_path: impl AsRef<Path>,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DarkModeError> {
    let total_start = Instant::now();

    // ── Step 1: Resolve input and output ─────────────────────────────────
    let pdf_path = input::resolve_input(input_path)?;
    let out_path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input::default_output_path(&pdf_path, config.output_format));
    info!(
        "Starting conversion: {} → {}",
        pdf_path.display(),
        out_path.display()
    );

    // ── Step 2: Open document ────────────────────────────────────────────
    let pdfium = render::bind_pdfium(config.pdfium_library.as_deref())?;
    let document = render::open_document(&pdfium, &pdf_path, config.password.as_deref())?;
    let metadata = render::document_metadata(&document);
    let total_pages = metadata.page_count;

    // ── Step 3: Compute page indices ─────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    debug!(
        "Selected {} of {} pages for conversion",
        page_indices.len(),
        total_pages
    );

    // ── Step 4: Prepare stages and output ───────────────────────────────
    let inverter = PageInverter::new(config.mode);
    let render_config = render::render_config(config);
    let writer = OutputWriter::create(&pdfium, &out_path, config.output_format)?;
    let selected = page_indices.len();

    // ── Step 5: Render, invert and append each page ──────────────────────
    let (pages, timings, output_path) = run_pages(
        &page_indices,
        |idx| render::render_page(&document, idx, &render_config),
        &inverter,
        writer,
        config,
    )?;

    // ── Step 6: Compute stats ────────────────────────────────────────────
    let processed = pages.iter().filter(|p| p.is_ok()).count();
    let failed = pages.len() - processed;

    let stats = ConversionStats {
        total_pages,
        processed_pages: processed,
        failed_pages: failed,
        skipped_pages: total_pages.saturating_sub(selected),
        render_duration_ms: timings.render.as_millis() as u64,
        invert_duration_ms: timings.invert.as_millis() as u64,
        write_duration_ms: timings.write.as_millis() as u64,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages, {}ms total → {}",
        processed,
        selected,
        stats.total_duration_ms,
        output_path.display()
    );

    Ok(ConversionOutput {
        output_path,
        output_format: config.output_format,
        pages,
        metadata,
        stats,
    })
}

/// Async wrapper around [`convert_sync`].
///
/// pdfium is CPU-bound and not async-safe, so the whole pipeline runs inside
/// `tokio::task::spawn_blocking`.
pub async fn convert(
    input_path: impl AsRef<Path>,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DarkModeError> {
    let input_path = input_path.as_ref().to_path_buf();
    let output_path = output_path.map(Path::to_path_buf);
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        convert_sync(&input_path, output_path.as_deref(), &config)
    })
    .await
    .map_err(|e| DarkModeError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Convert PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed when the
/// call returns. There is no input file name to derive an output name from,
/// so `output_path` is required.
pub async fn convert_from_bytes(
    bytes: &[u8],
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DarkModeError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| DarkModeError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| DarkModeError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_path_buf();
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(&path, Some(output_path), config).await
}

/// Extract PDF metadata without converting any page.
pub async fn inspect(
    input_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, DarkModeError> {
    let pdf_path: PathBuf = input::resolve_input(input_path)?;
    let config = config.clone();
    tokio::task::spawn_blocking(move || render::extract_metadata(&pdf_path, &config))
        .await
        .map_err(|e| DarkModeError::Internal(format!("Metadata task panicked: {}", e)))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Push every selected page through render → invert → write and finish the
/// writer.
///
/// Page-local failures are skipped or escalated per `skip_failed_pages`. On
/// any error the writer is aborted, so no partial output is left behind.
fn run_pages<R>(
    page_indices: &[usize],
    mut render: R,
    inverter: &PageInverter,
    mut writer: OutputWriter<'_>,
    config: &ConversionConfig,
) -> Result<(Vec<PageResult>, StageTimings, PathBuf), DarkModeError>
where
    R: FnMut(usize) -> Result<Page, PageError>,
{
    let progress = config.progress_callback.as_deref();
    let selected = page_indices.len();
    if let Some(cb) = progress {
        cb.on_conversion_start(selected);
    }

    let mut timings = StageTimings::default();
    let mut pages = Vec::with_capacity(selected);

    let mut failure = None;
    for &idx in page_indices {
        let page_num = idx + 1;
        if let Some(cb) = progress {
            cb.on_page_start(page_num, selected);
        }

        match timings.process(&mut render, idx, inverter) {
            Ok(inverted) => {
                let start = Instant::now();
                let file = writer.push(&inverted);
                timings.write += start.elapsed();
                let file = match file {
                    Ok(file) => file,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                };
                let (width, height) = inverted.image.dimensions();
                if let Some(cb) = progress {
                    cb.on_page_complete(page_num, selected, width, height);
                }
                pages.push(PageResult {
                    page_num,
                    width,
                    height,
                    file,
                    error: None,
                });
            }
            Err(e) => {
                if let Some(cb) = progress {
                    cb.on_page_error(page_num, selected, &e.to_string());
                }
                if !config.skip_failed_pages {
                    failure = Some(DarkModeError::PageFailed(e));
                    break;
                }
                warn!("Skipping {}", e);
                pages.push(PageResult::failed(e));
            }
        }
    }

    let finished = match failure {
        None => {
            let start = Instant::now();
            let finished = writer.finish();
            timings.write += start.elapsed();
            finished
        }
        Some(e) => {
            writer.abort();
            Err(e)
        }
    };

    match finished {
        Ok(output_path) => {
            if let Some(cb) = progress {
                let processed = pages.iter().filter(|p| p.is_ok()).count();
                cb.on_conversion_complete(selected, processed);
            }
            Ok((pages, timings, output_path))
        }
        Err(e) => {
            warn!("Conversion aborted: {}", e);
            if let Some(cb) = progress {
                cb.on_conversion_failed(&e.to_string());
            }
            Err(e)
        }
    }
}

#[derive(Debug, Default)]
struct StageTimings {
    render: std::time::Duration,
    invert: std::time::Duration,
    write: std::time::Duration,
}

impl StageTimings {
    /// Render and invert one page, accumulating stage durations.
    fn process<R>(
        &mut self,
        render: &mut R,
        idx: usize,
        inverter: &PageInverter,
    ) -> Result<InvertedPage, PageError>
    where
        R: FnMut(usize) -> Result<Page, PageError>,
    {
        let start = Instant::now();
        let page = render(idx);
        self.render += start.elapsed();
        let page = page?;

        let start = Instant::now();
        let inverted = inverter.invert_page(&page);
        self.invert += start.elapsed();
        inverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImageFileFormat, InversionMode};
    use crate::page::PageSize;
    use crate::pipeline::write::ImageDirWriter;
    use crate::progress::ConversionProgressCallback;
    use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl EventLog {
        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
        fn push(&self, event: String) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl ConversionProgressCallback for EventLog {
        fn on_conversion_start(&self, total_pages: usize) {
            self.push(format!("start {total_pages}"));
        }
        fn on_page_complete(&self, page_num: usize, _total: usize, _w: u32, _h: u32) {
            self.push(format!("ok {page_num}"));
        }
        fn on_page_error(&self, page_num: usize, _total: usize, _error: &str) {
            self.push(format!("error {page_num}"));
        }
        fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
            self.push(format!("complete {success_count}/{total_pages}"));
        }
        fn on_conversion_failed(&self, _error: &str) {
            self.push("failed".to_string());
        }
    }

    fn white_page(index: usize) -> Page {
        Page {
            index,
            size: PageSize::LETTER,
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 4, Rgb([255, 255, 255]))),
        }
    }

    /// Page 2 renders to a 16-bit bitmap, which the inverter rejects.
    fn render_with_bad_second_page(index: usize) -> Result<Page, PageError> {
        if index == 1 {
            let deep: ImageBuffer<Rgb<u16>, Vec<u16>> = ImageBuffer::new(6, 4);
            return Ok(Page {
                index,
                size: PageSize::LETTER,
                image: DynamicImage::ImageRgb16(deep),
            });
        }
        Ok(white_page(index))
    }

    fn config_with(log: &Arc<EventLog>, skip_failed_pages: bool) -> ConversionConfig {
        ConversionConfig::builder()
            .skip_failed_pages(skip_failed_pages)
            .progress_callback(log.clone())
            .build()
            .unwrap()
    }

    fn png_writer(dir: &Path) -> OutputWriter<'static> {
        OutputWriter::Images(ImageDirWriter::new(dir, ImageFileFormat::Png).unwrap())
    }

    #[test]
    fn failed_page_is_skipped_and_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("doc_darkmode");
        let log = Arc::new(EventLog::default());
        let config = config_with(&log, true);

        let (pages, _, output_path) = run_pages(
            &[0, 1, 2],
            render_with_bad_second_page,
            &PageInverter::new(InversionMode::Negate),
            png_writer(&out_dir),
            &config,
        )
        .expect("skipping policy keeps going");

        assert_eq!(output_path, out_dir);
        let numbers: Vec<usize> = pages.iter().map(|p| p.page_num).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(pages[0].is_ok() && pages[2].is_ok());
        assert!(matches!(
            pages[1].error,
            Some(PageError::InvertFailed { page: 2, .. })
        ));
        assert!(out_dir.join("page-0001.png").is_file());
        assert!(!out_dir.join("page-0002.png").exists());
        assert!(out_dir.join("page-0003.png").is_file());
        assert_eq!(
            log.events(),
            vec!["start 3", "ok 1", "error 2", "ok 3", "complete 2/3"]
        );
    }

    #[test]
    fn failed_page_aborts_in_strict_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("doc_darkmode");
        let log = Arc::new(EventLog::default());
        let config = config_with(&log, false);

        let render = |index: usize| {
            if index == 1 {
                Err(PageError::RenderFailed {
                    page: 2,
                    detail: "broken content stream".into(),
                })
            } else {
                Ok(white_page(index))
            }
        };

        let err = run_pages(
            &[0, 1, 2],
            render,
            &PageInverter::new(InversionMode::Negate),
            png_writer(&out_dir),
            &config,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DarkModeError::PageFailed(PageError::RenderFailed { page: 2, .. })
        ));
        // page 1 was written before the failure and must be cleaned up
        assert!(!out_dir.exists());
        assert_eq!(log.events(), vec!["start 3", "ok 1", "error 2", "failed"]);
    }

    #[test]
    fn stage_timings_skip_invert_after_render_failure() {
        let mut timings = StageTimings::default();
        let mut render = |index: usize| -> Result<Page, PageError> {
            Err(PageError::RenderFailed {
                page: index + 1,
                detail: "no such page".into(),
            })
        };
        let err = timings
            .process(&mut render, 4, &PageInverter::new(InversionMode::Negate))
            .unwrap_err();
        assert_eq!(err.page(), 5);
        assert_eq!(timings.invert, std::time::Duration::ZERO);
    }
}
