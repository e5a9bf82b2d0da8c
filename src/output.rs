//! Result types returned by the conversion entry points.

use crate::config::OutputFormat;
use crate::error::{DarkModeError, PageError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a conversion produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Written PDF file, or directory of page images.
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
    /// One entry per selected page, in page order.
    pub pages: Vec<PageResult>,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Treat any page failure as an error.
    ///
    /// Conversions skip failed pages by default; callers that need a
    /// complete document can use this to turn partial success into `Err`.
    pub fn into_result(self) -> Result<Self, DarkModeError> {
        match self.pages.iter().find_map(|p| p.error.clone()) {
            Some(e) => Err(DarkModeError::PageFailed(e)),
            None => Ok(self),
        }
    }

    /// Errors of every page that was skipped.
    pub fn page_errors(&self) -> impl Iterator<Item = &PageError> {
        self.pages.iter().filter_map(|p| p.error.as_ref())
    }
}

/// Outcome for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Pixel width of the inverted bitmap (0 if the page failed).
    pub width: u32,
    /// Pixel height of the inverted bitmap (0 if the page failed).
    pub height: u32,
    /// Image file written for this page (image-directory output only).
    pub file: Option<PathBuf>,
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn failed(error: PageError) -> Self {
        Self {
            page_num: error.page(),
            width: 0,
            height: 0,
            file: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters and timings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages written to the output.
    pub processed_pages: usize,
    /// Selected pages that failed and were skipped.
    pub failed_pages: usize,
    /// Pages not covered by the page selection.
    pub skipped_pages: usize,
    pub render_duration_ms: u64,
    pub invert_duration_ms: u64,
    pub write_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Document information read without rendering any page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_with(pages: Vec<PageResult>) -> ConversionOutput {
        ConversionOutput {
            output_path: PathBuf::from("out.pdf"),
            output_format: OutputFormat::Pdf,
            pages,
            metadata: DocumentMetadata::default(),
            stats: ConversionStats::default(),
        }
    }

    fn ok_page(n: usize) -> PageResult {
        PageResult {
            page_num: n,
            width: 10,
            height: 20,
            file: None,
            error: None,
        }
    }

    #[test]
    fn into_result_passes_clean_output() {
        let out = output_with(vec![ok_page(1), ok_page(2)]);
        assert!(out.into_result().is_ok());
    }

    #[test]
    fn into_result_surfaces_first_page_error() {
        let bad = PageResult::failed(PageError::RenderFailed {
            page: 2,
            detail: "boom".into(),
        });
        assert_eq!(bad.page_num, 2);
        assert!(!bad.is_ok());

        let out = output_with(vec![ok_page(1), bad]);
        assert_eq!(out.page_errors().count(), 1);
        match out.into_result() {
            Err(DarkModeError::PageFailed(e)) => assert_eq!(e.page(), 2),
            other => panic!("expected PageFailed, got {other:?}"),
        }
    }

    #[test]
    fn output_serialises_to_json() {
        let out = output_with(vec![ok_page(1)]);
        let json = serde_json::to_string(&out).expect("serialise");
        assert!(json.contains("\"page_num\":1"));
        assert!(json.contains("\"pdf\""));
    }
}
