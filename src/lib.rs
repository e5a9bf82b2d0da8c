//! # pdf-darkmode
//!
//! Convert PDF documents to dark mode by rasterising every page and
//! inverting its colours.
//!
//! Rewriting a PDF's content streams to swap colours breaks on scanned
//! pages, embedded images and anything drawn with unusual colour spaces.
//! Rasterising each page and inverting the bitmap works on every document
//! pdfium can render, at the cost of the output being image-only.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   validate the local file (%PDF magic bytes)
//!  ├─ 2. Render  rasterise each selected page via pdfium
//!  ├─ 3. Invert  negate channels, or mirror lightness and keep hue
//!  └─ 4. Write   one full-page image per page into a new PDF or a directory
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_darkmode::{convert_sync, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     // writes paper_darkmode.pdf next to the input
//!     let output = convert_sync("paper.pdf", None, &config)?;
//!     eprintln!(
//!         "{} pages → {}",
//!         output.stats.processed_pages,
//!         output.output_path.display()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-darkmode` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## PDFium
//!
//! Rendering and writing use the pdfium shared library through
//! `pdfium-render`. It is located via [`ConversionConfig::pdfium_library`],
//! then `PDFIUM_LIB_PATH`, then the working directory, then the system
//! library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, ImageFileFormat, InversionMode, OutputFormat,
    PageSelection,
};
pub use convert::{convert, convert_from_bytes, convert_sync, inspect};
pub use error::{DarkModeError, InvertError, PageError};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
pub use page::{InvertedPage, Page, PageSize};
pub use pipeline::input::default_output_path;
pub use pipeline::invert::PageInverter;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
