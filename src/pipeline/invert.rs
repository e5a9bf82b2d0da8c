//! Page colour inversion: the dark-mode transform.
//!
//! Two policies are offered (see [`InversionMode`]):
//!
//! * **Negate** replaces every channel `v` with `255 - v`. White paper turns
//!   black and black text turns white, but every hue is replaced by its
//!   complement, so a blue link becomes orange.
//!
//! * **Lightness** mirrors HSL lightness and keeps hue and saturation. For a
//!   pixel with extreme channels `max` and `min`, HSL lightness is
//!   `(max + min) / 2` and chroma is `max - min`. Adding the same offset
//!   `255 - max - min` to every channel leaves chroma and hue untouched and
//!   maps lightness `L` to `255 - L`. The offset keeps every channel inside
//!   `[255 - max, 255 - min]`, so no clamping is needed and applying the
//!   transform twice restores the original exactly.
//!
//! Both transforms are pure functions of the pixel data.

use crate::config::InversionMode;
use crate::error::{InvertError, PageError};
use crate::page::{InvertedPage, Page};
use image::{imageops, ColorType, DynamicImage, RgbImage};
use tracing::{debug, warn};

/// Applies one [`InversionMode`] to page bitmaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInverter {
    mode: InversionMode,
}

impl PageInverter {
    pub fn new(mode: InversionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> InversionMode {
        self.mode
    }

    /// Invert a bitmap.
    ///
    /// Accepts any 8-bit-per-channel colour type; alpha is dropped and the
    /// result is always RGB8 with the same width and height as the input.
    ///
    /// # Errors
    /// * [`InvertError::EmptyImage`] if either dimension is zero.
    /// * [`InvertError::UnsupportedDepth`] for 16-bit and float images.
    pub fn invert(&self, image: &DynamicImage) -> Result<RgbImage, InvertError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(InvertError::EmptyImage { width, height });
        }

        let mut rgb = match image.color() {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => image.to_rgb8(),
            other => return Err(InvertError::UnsupportedDepth(other)),
        };

        match self.mode {
            InversionMode::Negate => imageops::invert(&mut rgb),
            InversionMode::Lightness => invert_lightness(&mut rgb),
        }

        Ok(rgb)
    }

    /// Invert one rendered page, carrying its index and size through.
    pub fn invert_page(&self, page: &Page) -> Result<InvertedPage, PageError> {
        let image = self
            .invert(&page.image)
            .map_err(|e| PageError::InvertFailed {
                page: page.number(),
                detail: e.to_string(),
            })?;

        debug!(
            "Inverted page {} ({:?}) → {}x{} px",
            page.number(),
            self.mode,
            image.width(),
            image.height()
        );

        Ok(InvertedPage {
            index: page.index,
            size: page.size,
            image,
        })
    }

    /// Invert an in-memory document.
    ///
    /// Returns the inverted pages in input order together with the errors of
    /// pages that could not be inverted. Failed pages are left out of the
    /// first vector; every other page keeps its relative position.
    pub fn invert_document(&self, pages: Vec<Page>) -> (Vec<InvertedPage>, Vec<PageError>) {
        let mut inverted = Vec::with_capacity(pages.len());
        let mut errors = Vec::new();

        for page in &pages {
            match self.invert_page(page) {
                Ok(p) => inverted.push(p),
                Err(e) => {
                    warn!("{}", e);
                    errors.push(e);
                }
            }
        }

        (inverted, errors)
    }
}

/// Mirror HSL lightness in place, keeping hue and saturation.
fn invert_lightness(image: &mut RgbImage) {
    for pixel in image.pixels_mut() {
        let [r, g, b] = pixel.0;
        let max = r.max(g).max(b) as i16;
        let min = r.min(g).min(b) as i16;
        let shift = 255 - max - min;
        // every channel lies in [min, max], so c + shift lies in [255 - max, 255 - min]
        pixel.0 = [r, g, b].map(|c| (c as i16 + shift) as u8);
    }
}
