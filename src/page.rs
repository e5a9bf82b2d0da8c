//! In-memory page bitmaps flowing between pipeline stages.

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Physical page size in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    /// US Letter, the fallback for bitmaps with no source page.
    pub const LETTER: PageSize = PageSize {
        width_pt: 612.0,
        height_pt: 792.0,
    };

    /// Physical size of a bitmap printed at `dpi`.
    pub fn from_pixels(width: u32, height: u32, dpi: u32) -> Self {
        let dpi = dpi.max(1) as f32;
        Self {
            width_pt: width as f32 * 72.0 / dpi,
            height_pt: height as f32 * 72.0 / dpi,
        }
    }
}

/// A page rasterised from the source document.
#[derive(Debug, Clone)]
pub struct Page {
    /// 0-based index in the source document.
    pub index: usize,
    /// Physical size of the source page.
    pub size: PageSize,
    /// Rendered bitmap. Any 8-bit colour type is accepted by the inverter.
    pub image: image::DynamicImage,
}

impl Page {
    /// 1-based page number, as shown to users.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// The dark-mode version of a [`Page`]: same index, size and pixel dimensions.
#[derive(Debug, Clone)]
pub struct InvertedPage {
    pub index: usize,
    pub size: PageSize,
    pub image: RgbImage,
}

impl InvertedPage {
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
