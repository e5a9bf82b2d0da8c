//! Output assembly: collect inverted pages into a PDF or an image directory.
//!
//! Pages are appended one at a time as the pipeline produces them, so only a
//! single bitmap is held in memory. [`OutputWriter::finish`] makes the result
//! visible:
//!
//! * PDF output is serialised by pdfium and written to a temp file in the
//!   target directory, then renamed over the destination. A crash never leaves
//!   a half-written PDF behind.
//! * Image output writes `page-NNNN.<ext>` files into the target directory as
//!   pages arrive. [`OutputWriter::abort`] removes them again when the
//!   conversion fails part-way.

use crate::config::{ImageFileFormat, OutputFormat};
use crate::error::DarkModeError;
use crate::page::InvertedPage;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name for a page image (1-based page number).
pub fn page_file_name(page_num: usize, format: ImageFileFormat) -> String {
    format!("page-{:04}.{}", page_num, format.extension())
}

/// Sink for inverted pages.
pub enum OutputWriter<'a> {
    Pdf(PdfWriter<'a>),
    Images(ImageDirWriter),
}

impl<'a> OutputWriter<'a> {
    /// Create the writer matching `format`.
    pub fn create(
        pdfium: &'a Pdfium,
        path: &Path,
        format: OutputFormat,
    ) -> Result<Self, DarkModeError> {
        match format {
            OutputFormat::Pdf => Ok(OutputWriter::Pdf(PdfWriter::new(pdfium, path)?)),
            OutputFormat::Images { format } => {
                Ok(OutputWriter::Images(ImageDirWriter::new(path, format)?))
            }
        }
    }

    /// Append one page. Returns the image file written, if any.
    pub fn push(&mut self, page: &InvertedPage) -> Result<Option<PathBuf>, DarkModeError> {
        match self {
            OutputWriter::Pdf(w) => w.push(page).map(|_| None),
            OutputWriter::Images(w) => w.push(page).map(Some),
        }
    }

    /// Discard whatever was produced so far.
    pub fn abort(self) {
        match self {
            // Nothing reaches the disk before `finish`.
            OutputWriter::Pdf(_) => {}
            OutputWriter::Images(w) => w.abort(),
        }
    }

    /// Flush the output to its final location.
    pub fn finish(self) -> Result<PathBuf, DarkModeError> {
        match self {
            OutputWriter::Pdf(w) => w.finish(),
            OutputWriter::Images(w) => Ok(w.dir),
        }
    }
}

/// Builds a new PDF with one full-page image per inverted page.
pub struct PdfWriter<'a> {
    document: PdfDocument<'a>,
    path: PathBuf,
    pages: usize,
}

impl<'a> PdfWriter<'a> {
    pub fn new(pdfium: &'a Pdfium, path: &Path) -> Result<Self, DarkModeError> {
        let document = pdfium
            .create_new_pdf()
            .map_err(|e| pdf_error(path, format!("create document: {:?}", e)))?;
        Ok(Self {
            document,
            path: path.to_path_buf(),
            pages: 0,
        })
    }

    /// Add a page the size of the source page and stretch the bitmap over it.
    pub fn push(&mut self, page: &InvertedPage) -> Result<(), DarkModeError> {
        let width = PdfPoints::new(page.size.width_pt);
        let height = PdfPoints::new(page.size.height_pt);

        let mut pdf_page = self
            .document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(|e| pdf_error(&self.path, format!("page {}: {:?}", page.number(), e)))?;

        let image = DynamicImage::ImageRgb8(page.image.clone());
        pdf_page
            .objects_mut()
            .create_image_object(
                PdfPoints::ZERO,
                PdfPoints::ZERO,
                &image,
                Some(width),
                Some(height),
            )
            .map_err(|e| {
                pdf_error(
                    &self.path,
                    format!("page {} image: {:?}", page.number(), e),
                )
            })?;

        self.pages += 1;
        debug!(
            "Added page {} to output PDF ({:.0}x{:.0} pt)",
            page.number(),
            page.size.width_pt,
            page.size.height_pt
        );
        Ok(())
    }

    /// Serialise the document and atomically move it into place.
    pub fn finish(self) -> Result<PathBuf, DarkModeError> {
        let bytes = self
            .document
            .save_to_bytes()
            .map_err(|e| pdf_error(&self.path, format!("save: {:?}", e)))?;
        write_atomic(&self.path, &bytes)?;
        debug!(
            "Saved {} page(s), {} bytes → {}",
            self.pages,
            bytes.len(),
            self.path.display()
        );
        Ok(self.path)
    }
}

/// Writes each inverted page as an image file into a directory.
pub struct ImageDirWriter {
    dir: PathBuf,
    format: ImageFileFormat,
    written: Vec<PathBuf>,
    created_dir: bool,
}

impl ImageDirWriter {
    pub fn new(dir: &Path, format: ImageFileFormat) -> Result<Self, DarkModeError> {
        let created_dir = !dir.exists();
        std::fs::create_dir_all(dir).map_err(|e| DarkModeError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            format,
            written: Vec::new(),
            created_dir,
        })
    }

    pub fn push(&mut self, page: &InvertedPage) -> Result<PathBuf, DarkModeError> {
        let path = self.dir.join(page_file_name(page.number(), self.format));
        let encode_error = |detail: String| DarkModeError::ImageEncodeFailed {
            page: page.number(),
            format: self.format.extension().to_string(),
            detail,
        };

        let file = File::create(&path).map_err(|e| DarkModeError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
        self.written.push(path.clone());
        let mut out = BufWriter::new(file);

        match self.format {
            ImageFileFormat::Png => page
                .image
                .write_to(&mut out, ImageFormat::Png)
                .map_err(|e| encode_error(e.to_string()))?,
            ImageFileFormat::Jpeg { quality } => JpegEncoder::new_with_quality(&mut out, quality)
                .encode_image(&page.image)
                .map_err(|e| encode_error(e.to_string()))?,
        }

        out.flush().map_err(|e| DarkModeError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Remove the page files written so far, and the directory if this
    /// writer created it.
    pub fn abort(self) {
        for path in &self.written {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
        if self.created_dir {
            // Fails harmlessly if something else was put there meanwhile.
            let _ = std::fs::remove_dir(&self.dir);
        }
        debug!(
            "Discarded {} page file(s) in {}",
            self.written.len(),
            self.dir.display()
        );
    }
}

/// Write `bytes` to `path` via a temp file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DarkModeError> {
    let write_err = |source: std::io::Error| DarkModeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn pdf_error(path: &Path, detail: String) -> DarkModeError {
    DarkModeError::PdfWriteFailed {
        path: path.to_path_buf(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageSize;
    use image::{Rgb, RgbImage};

    fn inverted(index: usize) -> InvertedPage {
        InvertedPage {
            index,
            size: PageSize::LETTER,
            image: RgbImage::from_pixel(8, 6, Rgb([0, 0, 0])),
        }
    }

    #[test]
    fn page_file_names_are_one_based_and_padded() {
        assert_eq!(page_file_name(1, ImageFileFormat::Png), "page-0001.png");
        assert_eq!(
            page_file_name(123, ImageFileFormat::Jpeg { quality: 90 }),
            "page-0123.jpg"
        );
    }

    #[test]
    fn image_dir_writer_writes_png_pages() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("doc_darkmode");
        let mut w = ImageDirWriter::new(&out_dir, ImageFileFormat::Png).unwrap();

        let first = w.push(&inverted(0)).unwrap();
        let second = w.push(&inverted(1)).unwrap();
        assert_eq!(w.written.len(), 2);
        assert_eq!(first, out_dir.join("page-0001.png"));
        assert_eq!(second, out_dir.join("page-0002.png"));

        let decoded = image::open(&first).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 6));
        assert_eq!(decoded.get_pixel(3, 3).0, [0, 0, 0]);
    }

    #[test]
    fn image_dir_writer_writes_jpeg_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut w =
            ImageDirWriter::new(dir.path(), ImageFileFormat::Jpeg { quality: 85 }).unwrap();
        let path = w.push(&inverted(4)).unwrap();
        assert_eq!(path.file_name().unwrap(), "page-0005.jpg");
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn empty_image_dir_is_still_created() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested").join("empty");
        let w = ImageDirWriter::new(&out_dir, ImageFileFormat::Png).unwrap();
        assert!(out_dir.is_dir());
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 0);
        assert!(w.written.is_empty());
    }

    #[test]
    fn abort_removes_pages_and_created_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("doc_darkmode");
        let mut w = ImageDirWriter::new(&out_dir, ImageFileFormat::Png).unwrap();
        w.push(&inverted(0)).unwrap();
        w.push(&inverted(1)).unwrap();

        OutputWriter::Images(w).abort();
        assert!(!out_dir.exists());
    }

    #[test]
    fn abort_keeps_existing_dir_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut w = ImageDirWriter::new(dir.path(), ImageFileFormat::Png).unwrap();
        w.push(&inverted(0)).unwrap();

        w.abort();
        assert!(dir.path().join("notes.txt").is_file());
        assert!(!dir.path().join("page-0001.png").exists());
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"old").unwrap();
        write_atomic(&path, b"%PDF-new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-new");
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
