//! PDF loading and rasterisation via pdfium.
//!
//! pdfium holds thread-local state and every [`PdfDocument`] borrows the
//! [`Pdfium`] instance that opened it, so a conversion binds the library
//! once, opens the input and renders pages one at a time on the same thread.
//!
//! Render size is `dpi / 72` times the page size in points, capped at
//! `max_rendered_pixels` on either edge so an oversized page cannot exhaust
//! memory.

use crate::config::ConversionConfig;
use crate::error::{DarkModeError, PageError};
use crate::output::DocumentMetadata;
use crate::page::{Page, PageSize};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming an explicit pdfium library file or directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium shared library.
///
/// Lookup order: `library` (a file, or a directory containing the platform
/// library), then `$PDFIUM_LIB_PATH`, then the working directory, then the
/// system library path.
pub fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, DarkModeError> {
    let explicit = library
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(Into::into));

    let bindings = match explicit {
        Some(path) => {
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| DarkModeError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Open a PDF, classifying failures as password or corruption errors.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, DarkModeError> {
    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                DarkModeError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                DarkModeError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            DarkModeError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    info!(
        "PDF loaded: {} pages ({})",
        document.pages().len(),
        pdf_path.display()
    );
    Ok(document)
}

/// Build the pdfium render settings for a conversion.
pub fn render_config(config: &ConversionConfig) -> PdfRenderConfig {
    let cap = pixel_cap(config);
    PdfRenderConfig::new()
        .scale_page_by_factor(config.render_scale())
        .set_maximum_width(cap)
        .set_maximum_height(cap)
        .render_form_data(true)
}

/// Edge cap in the signed form pdfium expects.
fn pixel_cap(config: &ConversionConfig) -> i32 {
    i32::try_from(config.max_rendered_pixels).unwrap_or(i32::MAX)
}

/// Rasterise one page (0-based `index`).
pub fn render_page(
    document: &PdfDocument<'_>,
    index: usize,
    render_config: &PdfRenderConfig,
) -> Result<Page, PageError> {
    let fail = |detail: String| PageError::RenderFailed {
        page: index + 1,
        detail,
    };

    let page_index = PdfPageIndex::try_from(index)
        .map_err(|_| fail(format!("page index {index} exceeds pdfium's limit")))?;

    let page = document
        .pages()
        .get(page_index)
        .map_err(|e| fail(format!("{:?}", e)))?;

    let size = PageSize {
        width_pt: page.width().value,
        height_pt: page.height().value,
    };

    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| fail(format!("{:?}", e)))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        index + 1,
        image.width(),
        image.height()
    );

    Ok(Page { index, size, image })
}

/// Read document metadata from an opened document without rendering.
pub fn document_metadata(document: &PdfDocument<'_>) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

/// Open a PDF and read its metadata.
pub fn extract_metadata(
    pdf_path: &Path,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, DarkModeError> {
    let pdfium = bind_pdfium(config.pdfium_library.as_deref())?;
    let document = open_document(&pdfium, pdf_path, config.password.as_deref())?;
    Ok(document_metadata(&document))
}
