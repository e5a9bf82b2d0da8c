//! Configuration types for dark-mode conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Setters clamp values into their valid
//! range; [`ConversionConfigBuilder::build`] rejects the combinations that
//! cannot be clamped.

use crate::error::DarkModeError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Lowest accepted rendering DPI.
pub const MIN_DPI: u32 = 72;
/// Highest accepted rendering DPI.
pub const MAX_DPI: u32 = 600;
/// Smallest accepted render cap, in pixels per edge.
pub const MIN_RENDERED_PIXELS: u32 = 100;

/// Configuration for a PDF dark-mode conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_darkmode::{ConversionConfig, InversionMode};
///
/// let config = ConversionConfig::builder()
///     .dpi(200)
///     .mode(InversionMode::Lightness)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–600. Default: 300.
    ///
    /// The output PDF embeds the inverted bitmap, so this is also the
    /// resolution of the result. 300 DPI keeps body text crisp when zoomed;
    /// 150 is enough for on-screen reading and produces files a quarter of
    /// the size.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 6000.
    ///
    /// A safety cap independent of DPI: a 300-DPI render of an A0 poster
    /// would otherwise allocate a ~10 000 × 14 000 px bitmap.
    pub max_rendered_pixels: u32,

    /// Inversion policy applied to every page. Default: [`InversionMode::Negate`].
    pub mode: InversionMode,

    /// What to write. Default: [`OutputFormat::Pdf`].
    pub output_format: OutputFormat,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Skip pages that fail to render or invert instead of aborting. Default: true.
    ///
    /// Skipped pages are reported in [`crate::output::PageResult::error`]
    /// and are missing from the output document.
    pub skip_failed_pages: bool,

    /// Explicit pdfium library file or directory. Default: None.
    ///
    /// When unset the library is looked up in the working directory and then
    /// on the system library path.
    pub pdfium_library: Option<PathBuf>,

    /// Optional per-page progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 6000,
            mode: InversionMode::default(),
            output_format: OutputFormat::default(),
            pages: PageSelection::default(),
            password: None,
            skip_failed_pages: true,
            pdfium_library: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("mode", &self.mode)
            .field("output_format", &self.output_format)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("skip_failed_pages", &self.skip_failed_pages)
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Scale factor from PDF user space (72 units per inch) to pixels.
    pub fn render_scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.clamp(MIN_RENDERED_PIXELS, i32::MAX as u32);
        self
    }

    pub fn mode(mut self, mode: InversionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn skip_failed_pages(mut self, v: bool) -> Self {
        self.config.skip_failed_pages = v;
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, DarkModeError> {
        let c = &self.config;
        if c.dpi < MIN_DPI || c.dpi > MAX_DPI {
            return Err(DarkModeError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if let PageSelection::Range(start, end) = c.pages {
            if start == 0 || start > end {
                return Err(DarkModeError::InvalidConfig(format!(
                    "Invalid page range {start}-{end}: pages are 1-indexed and start must be <= end"
                )));
            }
        }
        if let OutputFormat::Images {
            format: ImageFileFormat::Jpeg { quality },
        } = c.output_format
        {
            if quality == 0 || quality > 100 {
                return Err(DarkModeError::InvalidConfig(format!(
                    "JPEG quality must be 1–100, got {quality}"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How page colours are inverted.
///
/// | Mode | Effect |
/// |------|--------|
/// | `Negate` | every channel `v` → `255 - v`; hues rotate to their complement |
/// | `Lightness` | light ↔ dark swap only; a red heading stays red |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InversionMode {
    /// Plain per-channel negation. (default)
    #[default]
    Negate,
    /// Invert HSL lightness, keep hue and saturation.
    Lightness,
}

/// Encoding used for image-directory output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFileFormat {
    /// Lossless PNG. (default)
    #[default]
    Png,
    /// JPEG at the given quality (1–100).
    Jpeg { quality: u8 },
}

impl ImageFileFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFileFormat::Png => "png",
            ImageFileFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// What the conversion produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A new PDF with one full-page image per inverted page. (default)
    #[default]
    Pdf,
    /// A directory with one image file per inverted page.
    Images { format: ImageFileFormat },
}

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// Parses `all`, `5`, `3-15` or `1,3,5` (1-indexed, whitespace ignored).
impl FromStr for PageSelection {
    type Err = DarkModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = |why: &str| DarkModeError::InvalidConfig(format!("pages '{text}': {why}"));
        let number = |part: &str| match part.trim().parse::<usize>() {
            Ok(0) => Err(invalid("page numbers start at 1")),
            Ok(n) => Ok(n),
            Err(_) => Err(invalid(&format!("'{}' is not a page number", part.trim()))),
        };

        if text.eq_ignore_ascii_case("all") {
            Ok(PageSelection::All)
        } else if text.contains(',') {
            text.split(',')
                .map(number)
                .collect::<Result<Vec<_>, _>>()
                .map(PageSelection::Set)
        } else if let Some((start, end)) = text.split_once('-') {
            match (number(start)?, number(end)?) {
                (start, end) if start > end => Err(invalid("range start is after its end")),
                (start, end) => Ok(PageSelection::Range(start, end)),
            }
        } else {
            number(text).map(PageSelection::Single)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_desktop_tool() {
        let c = ConversionConfig::default();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.mode, InversionMode::Negate);
        assert_eq!(c.output_format, OutputFormat::Pdf);
        assert_eq!(c.pages, PageSelection::All);
        assert!(c.skip_failed_pages);
    }

    #[test]
    fn dpi_is_clamped() {
        let c = ConversionConfig::builder().dpi(10).build().unwrap();
        assert_eq!(c.dpi, MIN_DPI);
        let c = ConversionConfig::builder().dpi(5000).build().unwrap();
        assert_eq!(c.dpi, MAX_DPI);
    }

    #[test]
    fn pixel_cap_stays_within_pdfium_range() {
        let c = ConversionConfig::builder()
            .max_rendered_pixels(u32::MAX)
            .build()
            .unwrap();
        assert_eq!(c.max_rendered_pixels, i32::MAX as u32);
        let c = ConversionConfig::builder()
            .max_rendered_pixels(1)
            .build()
            .unwrap();
        assert_eq!(c.max_rendered_pixels, MIN_RENDERED_PIXELS);
    }

    #[test]
    fn render_scale_follows_dpi() {
        let c = ConversionConfig::builder().dpi(144).build().unwrap();
        assert!((c.render_scale() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = ConversionConfig::builder()
            .pages(PageSelection::Range(5, 2))
            .build()
            .unwrap_err();
        assert!(matches!(err, DarkModeError::InvalidConfig(_)));
    }

    #[test]
    fn jpeg_quality_is_validated() {
        let bad = ConversionConfig::builder()
            .output_format(OutputFormat::Images {
                format: ImageFileFormat::Jpeg { quality: 0 },
            })
            .build();
        assert!(bad.is_err());
        let ok = ConversionConfig::builder()
            .output_format(OutputFormat::Images {
                format: ImageFileFormat::Jpeg { quality: 90 },
            })
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ConversionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::All.to_indices(0), Vec::<usize>::new());
        assert_eq!(PageSelection::Single(2).to_indices(3), vec![1]);
        assert_eq!(PageSelection::Single(9).to_indices(3), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 10).to_indices(4), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3, 0]).to_indices(5),
            vec![0, 2]
        );
    }

    #[test]
    fn page_selection_parses_cli_forms() {
        assert_eq!(" ALL ".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!("5".parse::<PageSelection>().unwrap(), PageSelection::Single(5));
        assert_eq!(
            "3 - 15".parse::<PageSelection>().unwrap(),
            PageSelection::Range(3, 15)
        );
        assert_eq!(
            "1, 3,5".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
    }

    #[test]
    fn page_selection_rejects_bad_forms() {
        for bad in ["0", "9-2", "1,x", "0,2", "first", "", "2-"] {
            assert!(
                matches!(
                    bad.parse::<PageSelection>(),
                    Err(DarkModeError::InvalidConfig(_))
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn image_extensions() {
        assert_eq!(ImageFileFormat::Png.extension(), "png");
        assert_eq!(ImageFileFormat::Jpeg { quality: 80 }.extension(), "jpg");
    }
}
