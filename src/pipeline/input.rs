//! Input resolution and output naming.
//!
//! The input must be a local file that starts with the `%PDF` magic bytes.
//! Checking the header up front gives callers a clear "not a PDF" error
//! instead of an opaque pdfium load failure.

use crate::config::OutputFormat;
use crate::error::DarkModeError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to the input file stem to name the output.
pub const OUTPUT_SUFFIX: &str = "_darkmode";

/// Validate that `path` is an existing, readable PDF file.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<PathBuf, DarkModeError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(DarkModeError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            match f.read_exact(&mut magic) {
                Ok(()) if &magic == b"%PDF" => {}
                Ok(()) => return Err(DarkModeError::NotAPdf { path, magic }),
                // shorter than the header
                Err(_) => return Err(DarkModeError::NotAPdf { path, magic }),
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DarkModeError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(DarkModeError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Default output location next to the input.
///
/// `report.pdf` becomes `report_darkmode.pdf` for PDF output and the
/// directory `report_darkmode/` for image output.
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = format!("{stem}{OUTPUT_SUFFIX}");

    let target = match format {
        OutputFormat::Pdf => {
            let ext = input
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "pdf".to_string());
            format!("{name}.{ext}")
        }
        OutputFormat::Images { .. } => name,
    };

    input.with_file_name(target)
}
