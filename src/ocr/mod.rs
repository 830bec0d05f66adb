// src/ocr/mod.rs
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

use crate::error::ScrapeError;

/// Run tesseract over the bulletin image, producing `<output_stem>.pdf`
/// with a searchable text layer. Returns the path of the PDF.
pub fn image_to_pdf(img_path: &Path, output_stem: &str) -> Result<PathBuf, ScrapeError> {
    info!(img = %img_path.display(), "converting image to PDF with tesseract");

    let status = Command::new("tesseract")
        .arg(img_path)
        .arg(output_stem)
        .arg("pdf")
        .status()
        .map_err(|e| ScrapeError::Ocr(format!("failed to launch tesseract: {}", e)))?;
    if !status.success() {
        return Err(ScrapeError::Ocr(format!("tesseract exited with {}", status)));
    }

    let pdf = PathBuf::from(format!("{}.pdf", output_stem));
    if !pdf.is_file() {
        return Err(ScrapeError::Ocr(format!(
            "tesseract reported success but produced no {}",
            pdf.display()
        )));
    }
    Ok(pdf)
}
