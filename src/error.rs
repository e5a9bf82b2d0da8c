//! Error types for the pdf-darkmode library.
//!
//! Three error types reflect three failure scopes:
//!
//! * [`DarkModeError`] — **Fatal**: the conversion cannot proceed at all
//!   (unreadable input, wrong password, output cannot be written). Returned
//!   as `Err(DarkModeError)` from the top-level `convert*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed to rasterise or
//!   invert while the rest of the document is fine. Stored inside
//!   [`crate::output::PageResult`] so callers can see which pages were
//!   skipped.
//!
//! * [`InvertError`] — returned by the pure pixel transform in
//!   [`crate::pipeline::invert`]; it knows nothing about page numbers and is
//!   wrapped into a [`PageError`] by the pipeline.

use image::ColorType;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-darkmode library.
#[derive(Debug, Error)]
pub enum DarkModeError {
    // ── Unreadable input ──────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── Page errors (strict mode) ─────────────────────────────────────────
    /// A page failed and `skip_failed_pages` is off.
    #[error("Conversion aborted: {0}")]
    PageFailed(#[source] PageError),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file or directory.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// pdfium could not assemble or serialise the output document.
    #[error("Failed to build output PDF '{path}': {detail}")]
    PdfWriteFailed { path: PathBuf, detail: String },

    /// An inverted page could not be encoded as an image file.
    #[error("Failed to encode page {page} as {format}: {detail}")]
    ImageEncodeFailed {
        page: usize,
        format: String,
        detail: String,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium into a directory on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DarkModeError {
    /// True when the input file itself could not be used.
    ///
    /// Front ends surface these as "cannot open this file" rather than as a
    /// conversion failure.
    pub fn is_unreadable_file(&self) -> bool {
        matches!(
            self,
            DarkModeError::FileNotFound { .. }
                | DarkModeError::PermissionDenied { .. }
                | DarkModeError::NotAPdf { .. }
                | DarkModeError::CorruptPdf { .. }
                | DarkModeError::PasswordRequired { .. }
                | DarkModeError::WrongPassword { .. }
        )
    }
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The rendered bitmap could not be inverted.
    #[error("Page {page}: inversion failed: {detail}")]
    InvertFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. } | PageError::InvertFailed { page, .. } => *page,
        }
    }
}

/// Why a bitmap was rejected by the inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvertError {
    #[error("image has zero dimensions ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("unsupported channel depth: {0:?} (expected 8 bits per channel)")]
    UnsupportedDepth(ColorType),
}
