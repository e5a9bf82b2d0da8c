//! Pipeline stages for dark-mode conversion.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ invert ──▶ write
//! (path)    (pdfium)   (pixels)   (PDF / images)
//! ```
//!
//! 1. [`input`]  — validate the user-supplied path and pick the output name
//! 2. [`render`] — bind pdfium, open the document, rasterise one page
//! 3. [`invert`] — the dark-mode pixel transform; the only stage with no I/O
//! 4. [`write`]  — append inverted pages to the output PDF or image directory

pub mod input;
pub mod invert;
pub mod render;
pub mod write;
